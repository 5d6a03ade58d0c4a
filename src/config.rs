use crate::tvmaze::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::env;
use std::net::SocketAddr;

const DEFAULT_FEED_QUERY: &str = "all";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3147";

/// Where the home feed's shows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Search(String),
    Index { page: u32 },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub catalog: CatalogSource,
    pub excluded_ids: HashSet<i64>,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("TVMAZE_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let query = lookup("FEED_QUERY").unwrap_or_else(|| DEFAULT_FEED_QUERY.to_string());
        let catalog = if query.trim().is_empty() {
            let page = match lookup("FEED_PAGE") {
                Some(raw) if !raw.trim().is_empty() => raw
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("FEED_PAGE is not a page number: '{}'", raw))?,
                _ => 0,
            };
            CatalogSource::Index { page }
        } else {
            CatalogSource::Search(query.trim().to_string())
        };

        let excluded_ids = match lookup("EXCLUDED_SHOW_IDS") {
            Some(raw) => parse_id_list(&raw)?,
            None => HashSet::new(),
        };

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDR is not a socket address: '{}'", bind_raw))?;

        Ok(Self {
            base_url,
            catalog,
            excluded_ids,
            bind_addr,
        })
    }
}

/// Parses a comma-separated list of show ids; blank entries are skipped.
pub fn parse_id_list(raw: &str) -> Result<HashSet<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("EXCLUDED_SHOW_IDS has a non-numeric entry: '{}'", s))
        })
        .collect()
}
