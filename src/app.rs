use crate::config::Config;
use crate::feed::{chunk_rows, FeedPipeline};
use crate::session::SessionState;
use crate::tvmaze::{ShowSource, TvMazeClient};
use anyhow::Result;
use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 16 * 1024;
const SEARCH_ROW_WIDTH: usize = 3;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ShowSource>,
    pub feed: FeedPipeline,
    pub session: Arc<SessionState>,
}

impl AppState {
    pub fn new(source: Arc<dyn ShowSource>, config: &Config) -> Self {
        let feed = FeedPipeline::new(source.clone(), config.excluded_ids.clone());
        Self {
            source,
            feed,
            session: Arc::new(SessionState::new()),
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let source: Arc<dyn ShowSource> = Arc::new(TvMazeClient::from_config(&config)?);
    info!(
        "Using show API at {} (catalog: {:?})",
        config.base_url, config.catalog
    );
    let state = AppState::new(source, &config);
    if !state.feed.excluded_ids().is_empty() {
        info!(
            "Excluding {} show id(s) from the feed",
            state.feed.excluded_ids().len()
        );
    }
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/feed", get(feed))
        .route("/search", get(search))
        .route("/shows/:id", get(show_details))
        .route("/session", get(session))
        .route("/session/reset", post(reset_session))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn feed(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.feed.run().await {
        Ok(sections) => {
            let first_load = state.session.take_first_load();
            info!(sections = sections.len(), first_load, "Serving feed");
            (
                StatusCode::OK,
                Json(json!({
                    "firstLoad": first_load,
                    "generatedAt": Utc::now().to_rfc3339(),
                    "sections": sections,
                })),
            )
        }
        Err(e) => upstream_error("Failed to load feed", e),
    }
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<Value>) {
    let query = params.q.unwrap_or_default().trim().to_string();
    match state.source.search(&query).await {
        Ok(results) => {
            let rows = chunk_rows(&results, SEARCH_ROW_WIDTH);
            (
                StatusCode::OK,
                Json(json!({
                    "query": query,
                    "results": results,
                    "rows": rows,
                })),
            )
        }
        Err(e) => upstream_error("Search failed", e),
    }
}

async fn show_details(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> (StatusCode, Json<Value>) {
    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => {
            warn!("Rejecting show lookup: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "message": "Show id must be an integer"})),
            );
        }
    };
    match state.source.fetch_show(id).await {
        Ok(Some(details)) => (StatusCode::OK, Json(json!(details))),
        Ok(None) => {
            warn!("Show {} not found", id);
            (
                StatusCode::NOT_FOUND,
                Json(json!({"status": "error", "message": format!("No show with id {}", id)})),
            )
        }
        Err(e) => upstream_error("Failed to load show", e),
    }
}

async fn session(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "firstLoad": state.session.is_first_load() }))
}

async fn reset_session(State(state): State<AppState>) -> Json<Value> {
    state.session.reset();
    info!("Session first-load flag reset");
    Json(json!({ "firstLoad": true }))
}

fn upstream_error(context: &str, err: anyhow::Error) -> (StatusCode, Json<Value>) {
    error!("{}: {:#}", context, err);
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({"status": "error", "message": format!("{}: {}", context, err)})),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
