//! Integration tests against a real bound `axum` router, each using its own
//! `tempfile`-isolated content root (§10.4).

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use serde_json::json;
use tower::ServiceExt;
use wikifs_server::state::AppState;

const TOKEN: &str = "alice-token";

async fn test_app() -> (tempfile::TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("users.db"), format!("alice {TOKEN}\n")).unwrap();
    let state = AppState::new(dir.path().to_path_buf()).expect("state init");
    let app = wikifs_server::build_router(state);
    (dir, app)
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .header("Authorization", TOKEN)
        .body(Body::empty())
        .unwrap()
}

fn post_json(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("Authorization", TOKEN)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn create_then_download_round_trips_empty_content() {
    let (_dir, app) = test_app().await;

    let resp = app.clone().oneshot(get("/wikifs/create?path=_page")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.clone().oneshot(get("/wikifs/download?path=_page")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["lock_is_yours"], true);
    assert_eq!(json["content"], base64::engine::general_purpose::STANDARD.encode(""));
}

#[tokio::test]
async fn create_twice_conflicts() {
    let (_dir, app) = test_app().await;
    app.clone().oneshot(get("/wikifs/create?path=_page")).await.unwrap();
    let resp = app.clone().oneshot(get("/wikifs/create?path=_page")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn upload_without_lock_is_forbidden() {
    let (dir, app) = test_app().await;
    std::fs::write(dir.path().join("_page"), "hi").unwrap();

    let content = base64::engine::general_purpose::STANDARD.encode("new content");
    let resp = app
        .clone()
        .oneshot(post_json("/wikifs/upload?path=_page", json!({ "content": content })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn chmod_writable_then_readonly_commits_exactly_once() {
    let (dir, app) = test_app().await;
    app.clone().oneshot(get("/wikifs/create?path=_page")).await.unwrap();

    let content = base64::engine::general_purpose::STANDARD.encode("hello wiki");
    let resp = app
        .clone()
        .oneshot(post_json("/wikifs/upload?path=_page", json!({ "content": content })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Clearing the write bits should commit the pending edit and release the lock.
    let resp = app
        .clone()
        .oneshot(post_json("/wikifs/chmod?path=_page", json!({ "mode": 0o444 })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.clone().oneshot(get("/wikifs/getattr?path=_page")).await.unwrap();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["st_mode"], 0o100444);

    let log = std::process::Command::new("git")
        .args(["log", "--oneline"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    let commit_count = String::from_utf8_lossy(&log.stdout).lines().count();
    assert_eq!(commit_count, 1);
}

#[tokio::test]
async fn readdir_hides_lock_files() {
    let (dir, app) = test_app().await;
    app.clone().oneshot(get("/wikifs/create?path=_page")).await.unwrap();
    std::fs::write(dir.path().join("not_a_wiki_file.txt"), "x").unwrap();

    let resp = app.clone().oneshot(get("/wikifs/readdir?path=")).await.unwrap();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let names: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(names, vec!["_page".to_string()]);
}

#[tokio::test]
async fn remove_missing_file_is_not_found() {
    let (_dir, app) = test_app().await;
    let resp = app.clone().oneshot(get("/wikifs/remove?path=_missing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unauthorized_without_token() {
    let (_dir, app) = test_app().await;
    let req = Request::builder()
        .method("GET")
        .uri("/wikifs/getattr?path=_page")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rename_moves_lock_and_content() {
    let (_dir, app) = test_app().await;
    app.clone().oneshot(get("/wikifs/create?path=_old")).await.unwrap();

    let resp = app
        .clone()
        .oneshot(post_json("/wikifs/rename?path=_old", json!({ "new_path": "_new" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.clone().oneshot(get("/wikifs/getattr?path=_new")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.clone().oneshot(get("/wikifs/getattr?path=_old")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
