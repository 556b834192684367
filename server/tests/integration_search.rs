use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use search_core::{EngineConfig, SearchEngine};
use serde_json::Value;
use server::{router, AppState};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

fn write_data(dir: &Path) {
    fs::write(
        dir.join("index_inverse.txt"),
        "03/03/2013,74752:date\n\
         15/03/2013,74753:date\n\
         280,74752:numero,74753:numero\n\
         focus,74752:rubrique\n\
         cuisin,74752:texte,74753:texte\n\
         moléculair,74752:texte\n\
         presence_image,74752:images\n",
    )
    .unwrap();
    fs::write(dir.join("lexicon.txt"), "cuisine→cuisin\nmoléculaire→moléculair\n").unwrap();
}

fn app(dir: &Path, admin_token: Option<&str>) -> Router {
    let config = EngineConfig::with_data_dir(dir);
    let engine = SearchEngine::open(&config).unwrap();
    router(AppState::new(engine, config, admin_token.map(String::from)))
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn search_returns_matching_articles() {
    let dir = tempdir().unwrap();
    write_data(dir.path());

    let uri = "/search?q=Je%20voudrais%20les%20articles%20qui%20parlent%20de%20cuisine%20mol%C3%A9culaire.";
    let (status, body) = call(app(dir.path(), None), get(uri)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["doc_type"], "article");
    assert_eq!(json["total_hits"], 1);
    assert_eq!(json["results"][0]["id"], "74752");
    assert_eq!(json["results"][0]["date"], "03/03/2013");
    assert_eq!(json["results"][0]["rubrique"], "focus");
}

#[tokio::test]
async fn search_sorts_by_date() {
    let dir = tempdir().unwrap();
    write_data(dir.path());

    let (_, body) = call(app(dir.path(), None), get("/search?q=articles%20cuisine&sort=desc")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    let ids: Vec<&str> = json["results"].as_array().unwrap().iter().map(|h| h["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["74753", "74752"]);
}

#[tokio::test]
async fn unconstrained_query_is_flagged() {
    let dir = tempdir().unwrap();
    write_data(dir.path());

    let (status, body) = call(app(dir.path(), None), get("/search?q=")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["constrained"], false);
    assert_eq!(json["total_hits"], 0);
}

#[tokio::test]
async fn analyze_exposes_the_corrected_query() {
    let dir = tempdir().unwrap();
    write_data(dir.path());

    let (status, body) = call(app(dir.path(), None), get("/analyze?q=rubriques%20focus%20pas%20cuisine")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["doc_type"], "rubrique");
    assert_eq!(json["sections"][0], "focus");
    assert_eq!(json["keywords"][0], "pas cuisin");
}

#[tokio::test]
async fn reload_requires_the_admin_token() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let app = app(dir.path(), Some("secret"));

    let req = Request::post("/admin/reload").body(Body::empty()).unwrap();
    let (status, _) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::post("/admin/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, body) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["num_docs"], 2);

    let (_, body) = call(app, get("/health")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["meta"].is_null());
}
