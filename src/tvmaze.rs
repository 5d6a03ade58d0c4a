use crate::config::{CatalogSource, Config};
use crate::models::{ApiSearchHit, ApiShow, ShowDetails, ShowRecord};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";

#[async_trait]
pub trait ShowSource: Send + Sync {
    /// Shows backing the home feed.
    async fn fetch_catalog(&self) -> Result<Vec<Arc<ShowRecord>>>;
    async fn search(&self, query: &str) -> Result<Vec<Arc<ShowRecord>>>;
    /// `Ok(None)` when the id is unknown upstream.
    async fn fetch_show(&self, id: i64) -> Result<Option<ShowDetails>>;
}

#[derive(Debug, Clone)]
pub struct TvMazeClient {
    client: Client,
    base_url: String,
    catalog: CatalogSource,
}

impl TvMazeClient {
    pub fn new(base_url: impl Into<String>, catalog: CatalogSource) -> Result<Self> {
        let user_agent = format!("showreel/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build show API HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            catalog,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url.clone(), config.catalog.clone())
    }

    async fn search_hits(&self, query: &str) -> Result<Vec<Arc<ShowRecord>>> {
        let url = format!(
            "{}/search/shows?q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        let hits: Vec<ApiSearchHit> = self.get_json(&url).await?;
        Ok(hits
            .into_iter()
            .map(|h| Arc::new(ShowRecord::from(h.show)))
            .collect())
    }

    async fn index_page(&self, page: u32) -> Result<Vec<Arc<ShowRecord>>> {
        let url = format!("{}/shows?page={page}", self.base_url);
        let shows: Vec<ApiShow> = self.get_json(&url).await?;
        Ok(shows
            .into_iter()
            .map(|s| Arc::new(ShowRecord::from(s)))
            .collect())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        self.get_json_opt(url)
            .await?
            .ok_or_else(|| anyhow!("{} -> 404 Not Found", url))
    }

    async fn get_json_opt<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<Option<T>> {
        debug!(url = %url, "GET");
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", url, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(Some(parsed))
    }
}

#[async_trait]
impl ShowSource for TvMazeClient {
    async fn fetch_catalog(&self) -> Result<Vec<Arc<ShowRecord>>> {
        match &self.catalog {
            CatalogSource::Search(query) => self.search_hits(query).await,
            CatalogSource::Index { page } => self.index_page(*page).await,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Arc<ShowRecord>>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.search_hits(query).await
    }

    async fn fetch_show(&self, id: i64) -> Result<Option<ShowDetails>> {
        let url = format!("{}/shows/{id}", self.base_url);
        let show: Option<ApiShow> = self.get_json_opt(&url).await?;
        Ok(show.map(ShowDetails::from))
    }
}
