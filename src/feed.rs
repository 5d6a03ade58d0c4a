//! Genre feed assembly: exclusion filtering, grouping by genre in
//! first-discovery order, and a per-section uniform shuffle.

use crate::models::{GenreSection, ShowRecord};
use crate::tvmaze::ShowSource;
use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Drops every record whose id is in `excluded_ids`, keeping the order of the rest.
pub fn filter_excluded(
    records: &[Arc<ShowRecord>],
    excluded_ids: &HashSet<i64>,
) -> Vec<Arc<ShowRecord>> {
    if excluded_ids.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| !excluded_ids.contains(&r.id))
        .cloned()
        .collect()
}

/// Groups records into genre sections with a fresh random member order per call.
pub fn assemble_feed(records: &[Arc<ShowRecord>]) -> Vec<GenreSection> {
    assemble_feed_with_rng(records, &mut rand::thread_rng())
}

/// Same as [`assemble_feed`] with an explicit randomness source.
///
/// Section order is the order in which a genre label is first seen while scanning
/// records left to right, and each record's genres in their listed order. A record
/// listing a genre twice is a member of that section twice. Records without genres
/// appear nowhere.
pub fn assemble_feed_with_rng<R: Rng + ?Sized>(
    records: &[Arc<ShowRecord>],
    rng: &mut R,
) -> Vec<GenreSection> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sections: Vec<GenreSection> = Vec::new();

    for record in records {
        for genre in &record.genres {
            let slot = match index.get(genre.as_str()) {
                Some(&i) => i,
                None => {
                    index.insert(genre.as_str(), sections.len());
                    sections.push(GenreSection {
                        genre_label: genre.clone(),
                        members: Vec::new(),
                    });
                    sections.len() - 1
                }
            };
            sections[slot].members.push(Arc::clone(record));
        }
    }

    for section in &mut sections {
        section.members = shuffled(&section.members, rng);
    }
    sections
}

/// Returns a uniformly random permutation of `items` (Fisher-Yates); `items` is untouched.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// Splits `items` into consecutive rows of `width`; the last row may be shorter.
pub fn chunk_rows<T: Clone>(items: &[T], width: usize) -> Vec<Vec<T>> {
    if width == 0 {
        return Vec::new();
    }
    items.chunks(width).map(|c| c.to_vec()).collect()
}

/// Show Source -> exclusion filter -> feed assembler, shared by every caller that
/// needs a home feed.
#[derive(Clone)]
pub struct FeedPipeline {
    source: Arc<dyn ShowSource>,
    excluded_ids: Arc<HashSet<i64>>,
}

impl FeedPipeline {
    pub fn new(source: Arc<dyn ShowSource>, excluded_ids: HashSet<i64>) -> Self {
        Self {
            source,
            excluded_ids: Arc::new(excluded_ids),
        }
    }

    pub fn excluded_ids(&self) -> &HashSet<i64> {
        &self.excluded_ids
    }

    pub async fn run(&self) -> Result<Vec<GenreSection>> {
        let catalog = self.source.fetch_catalog().await?;
        let fetched = catalog.len();
        let kept = filter_excluded(&catalog, &self.excluded_ids);
        let sections = assemble_feed(&kept);
        debug!(
            fetched,
            excluded = fetched - kept.len(),
            sections = sections.len(),
            "Assembled feed"
        );
        Ok(sections)
    }
}
