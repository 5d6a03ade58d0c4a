use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single catalog entry as handed to the feed assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRecord {
    pub id: i64,
    pub name: String,
    /// Duplicates are kept; each occurrence is an independent membership.
    pub genres: Vec<String>,
    pub image_ref: Option<String>,
}

impl ShowRecord {
    pub fn new(id: i64, name: impl Into<String>, genres: Vec<String>) -> Self {
        Self {
            id,
            name: name.into(),
            genres,
            image_ref: None,
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// One genre row of the home feed. Members are shared with the fetched catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreSection {
    pub genre_label: String,
    pub members: Vec<Arc<ShowRecord>>,
}

impl GenreSection {
    pub fn member_ids(&self) -> Vec<i64> {
        self.members.iter().map(|m| m.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDetails {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub summary: Option<String>,
    pub language: Option<String>,
    pub genres: Vec<String>,
    pub rating: Option<f32>,
    pub premiered: Option<String>,
    pub runtime: Option<u32>,
}

// Wire shapes of the show-metadata API.

#[derive(Debug, Deserialize)]
pub(crate) struct ApiImage {
    pub medium: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiRating {
    pub average: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiShow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub image: Option<ApiImage>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub rating: Option<ApiRating>,
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiSearchHit {
    pub show: ApiShow,
}

impl From<ApiShow> for ShowRecord {
    fn from(show: ApiShow) -> Self {
        ShowRecord {
            id: show.id,
            name: show.name,
            genres: show.genres.unwrap_or_default(),
            image_ref: show.image.and_then(|i| i.medium),
        }
    }
}

impl From<ApiShow> for ShowDetails {
    fn from(show: ApiShow) -> Self {
        let summary = show
            .summary
            .as_deref()
            .map(crate::text::clean_summary)
            .filter(|s| !s.is_empty());
        ShowDetails {
            id: show.id,
            name: show.name,
            image: show.image.and_then(|i| i.original),
            summary,
            language: show.language,
            genres: show.genres.unwrap_or_default(),
            rating: show.rating.and_then(|r| r.average),
            premiered: show.premiered,
            runtime: show.runtime,
        }
    }
}
