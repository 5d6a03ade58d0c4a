use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use showreel::app::{build_router, AppState};
use showreel::config::Config;
use showreel::models::{ShowDetails, ShowRecord};
use showreel::tvmaze::ShowSource;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

struct FakeSource {
    catalog: Vec<Arc<ShowRecord>>,
    details: Option<ShowDetails>,
    fail: AtomicBool,
    searches: Mutex<Vec<String>>,
    catalog_calls: AtomicUsize,
}

impl FakeSource {
    fn new(catalog: Vec<Arc<ShowRecord>>) -> Self {
        Self {
            catalog,
            details: None,
            fail: AtomicBool::new(false),
            searches: Mutex::new(Vec::new()),
            catalog_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ShowSource for FakeSource {
    async fn fetch_catalog(&self) -> anyhow::Result<Vec<Arc<ShowRecord>>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("upstream unavailable");
        }
        Ok(self.catalog.clone())
    }

    async fn search(&self, query: &str) -> anyhow::Result<Vec<Arc<ShowRecord>>> {
        self.searches.lock().unwrap().push(query.to_string());
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .catalog
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&query.to_lowercase()))
            .cloned()
            .collect())
    }

    async fn fetch_show(&self, id: i64) -> anyhow::Result<Option<ShowDetails>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("upstream unavailable");
        }
        Ok(self.details.clone().filter(|d| d.id == id))
    }
}

fn show(id: i64, name: &str, genres: &[&str]) -> Arc<ShowRecord> {
    Arc::new(
        ShowRecord::new(id, name, genres.iter().map(|g| g.to_string()).collect())
            .with_image(format!("https://static.example/{id}.jpg")),
    )
}

fn catalog() -> Vec<Arc<ShowRecord>> {
    vec![
        show(1, "Under the Dome", &["Drama", "Science-Fiction", "Thriller"]),
        show(2, "Person of Interest", &["Action", "Crime", "Science-Fiction"]),
        show(3, "Bitten", &["Drama", "Horror", "Romance"]),
        show(4, "Heroes", &["Drama", "Action", "Science-Fiction"]),
        show(5, "True Detective", &["Drama", "Crime", "Thriller"]),
        show(6, "The Untitled Pilot", &[]),
        show(7, "The 100", &["Action", "Adventure", "Science-Fiction"]),
    ]
}

fn dome_details() -> ShowDetails {
    ShowDetails {
        id: 1,
        name: "Under the Dome".to_string(),
        image: Some("https://static.example/1-original.jpg".to_string()),
        summary: Some("A small town is cut off from the world.".to_string()),
        language: Some("English".to_string()),
        genres: vec!["Drama".to_string(), "Science-Fiction".to_string()],
        rating: Some(6.5),
        premiered: Some("2013-06-24".to_string()),
        runtime: Some(60),
    }
}

fn config_with_exclusions(ids: &[i64]) -> Config {
    let mut config = Config::from_lookup(|_| None).expect("defaults are valid");
    config.excluded_ids = ids.iter().copied().collect();
    config
}

fn app_with(source: Arc<FakeSource>, excluded: &[i64]) -> Router {
    let state = AppState::new(source, &config_with_exclusions(excluded));
    build_router(state)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let res = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn section_labels(body: &Value) -> Vec<String> {
    body["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["genreLabel"].as_str().unwrap().to_string())
        .collect()
}

fn member_ids(section: &Value) -> Vec<i64> {
    section["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app_with(Arc::new(FakeSource::new(catalog())), &[]);
    let res = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn feed_groups_shows_by_genre_in_discovery_order() {
    let app = app_with(Arc::new(FakeSource::new(catalog())), &[]);
    let (status, body) = get_json(&app, "/feed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        section_labels(&body),
        vec![
            "Drama",
            "Science-Fiction",
            "Thriller",
            "Action",
            "Crime",
            "Horror",
            "Romance",
            "Adventure"
        ]
    );

    let sections = body["sections"].as_array().unwrap();
    let mut drama = member_ids(&sections[0]);
    drama.sort_unstable();
    assert_eq!(drama, vec![1, 3, 4, 5]);
    let mut scifi = member_ids(&sections[1]);
    scifi.sort_unstable();
    assert_eq!(scifi, vec![1, 2, 4, 7]);

    let all: HashSet<i64> = sections.iter().flat_map(member_ids).collect();
    assert!(!all.contains(&6));

    let first = &sections[0]["members"][0];
    assert!(first["name"].is_string());
    assert!(first["imageRef"].as_str().unwrap().starts_with("https://"));
    assert!(body["generatedAt"].is_string());
}

#[tokio::test]
async fn feed_applies_static_exclusions() {
    let app = app_with(Arc::new(FakeSource::new(catalog())), &[3]);
    let (status, body) = get_json(&app, "/feed").await;
    assert_eq!(status, StatusCode::OK);
    let labels = section_labels(&body);
    assert!(!labels.contains(&"Horror".to_string()));
    assert!(!labels.contains(&"Romance".to_string()));
    let all: Vec<i64> = body["sections"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(member_ids)
        .collect();
    assert!(!all.contains(&3));
}

#[tokio::test]
async fn first_load_flag_clears_after_first_feed() {
    let source = Arc::new(FakeSource::new(catalog()));
    let app = app_with(source.clone(), &[]);

    let (_, session) = get_json(&app, "/session").await;
    assert_eq!(session["firstLoad"], Value::Bool(true));

    let (_, first) = get_json(&app, "/feed").await;
    assert_eq!(first["firstLoad"], Value::Bool(true));
    let (_, second) = get_json(&app, "/feed").await;
    assert_eq!(second["firstLoad"], Value::Bool(false));

    let res = app
        .clone()
        .oneshot(Request::post("/session/reset").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let (_, third) = get_json(&app, "/feed").await;
    assert_eq!(third["firstLoad"], Value::Bool(true));
    assert_eq!(source.catalog_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn upstream_failure_returns_bad_gateway_and_keeps_first_load() {
    let source = Arc::new(FakeSource::new(catalog()));
    source.fail.store(true, Ordering::SeqCst);
    let app = app_with(source.clone(), &[]);

    let (status, body) = get_json(&app, "/feed").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("upstream unavailable"));

    source.fail.store(false, Ordering::SeqCst);
    let (status, body) = get_json(&app, "/feed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstLoad"], Value::Bool(true));
}

#[tokio::test]
async fn search_returns_rows_of_three() {
    let source = Arc::new(FakeSource::new(catalog()));
    let app = app_with(source.clone(), &[]);

    let (status, body) = get_json(&app, "/search?q=e").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "e");
    let results = body["results"].as_array().unwrap();
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(results.len(), 7);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].as_array().unwrap().len(), 3);
    assert_eq!(rows[2].as_array().unwrap().len(), 1);
    assert_eq!(rows[0][0]["id"], results[0]["id"]);
    assert_eq!(rows[2][0]["id"], results[6]["id"]);
    assert_eq!(source.searches.lock().unwrap().as_slice(), ["e"]);
}

#[tokio::test]
async fn search_without_query_is_empty() {
    let app = app_with(Arc::new(FakeSource::new(catalog())), &[]);
    let (status, body) = get_json(&app, "/search").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
    assert_eq!(body["rows"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn search_echoes_the_trimmed_query() {
    let source = Arc::new(FakeSource::new(catalog()));
    let app = app_with(source.clone(), &[]);

    let (status, body) = get_json(&app, "/search?q=%20%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "");
    assert_eq!(body["results"].as_array().unwrap().len(), 0);

    let (_, body) = get_json(&app, "/search?q=%20Bitten%20").await;
    assert_eq!(body["query"], "Bitten");
    assert_eq!(body["results"][0]["id"], 3);
    assert_eq!(source.searches.lock().unwrap().as_slice(), ["", "Bitten"]);
}

#[tokio::test]
async fn show_details_found_missing_and_malformed() {
    let mut fake = FakeSource::new(catalog());
    fake.details = Some(dome_details());
    let app = app_with(Arc::new(fake), &[]);

    let (status, body) = get_json(&app, "/shows/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Under the Dome");
    assert_eq!(body["runtime"], 60);
    assert_eq!(body["premiered"], "2013-06-24");

    let (status, body) = get_json(&app, "/shows/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");

    let (status, body) = get_json(&app, "/shows/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("integer"));
}
