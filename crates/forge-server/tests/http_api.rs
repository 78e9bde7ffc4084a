//! End-to-end HTTP surface tests, driving the Axum router in-process
//! against a fresh `tempfile::TempDir` repository root.
//!
//! Covers the concrete scenarios: basic branch creation, commit minting,
//! the correct-pointer deletion gate, name sanitisation, a burst of
//! concurrent branch creates on one mesh, and rescan recovery from an
//! out-of-band filesystem change.
#![allow(clippy::all, clippy::pedantic, clippy::nursery)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use forge_core::Repository;
use forge_server::http::router;
use http_body_util::BodyExt as _;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt as _;

fn test_router() -> (TempDir, axum::Router) {
    let dir = TempDir::new().unwrap();
    let repo = Repository::open(dir.path()).unwrap();
    (dir, router(Arc::new(repo)))
}

async fn call(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(serde_json::to_vec(&v).unwrap()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok_and_data_root() {
    let (dir, app) = test_router();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data_root"], dir.path().display().to_string());
}

#[tokio::test]
async fn basic_create_shows_up_in_forest() {
    let (_dir, app) = test_router();

    let (status, body) = call(
        &app,
        Method::POST,
        "/mesh/M/branch",
        Some(json!({"branch": "main"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "created");

    let (_, forest) = call(&app, Method::GET, "/forest", None).await;
    assert_eq!(forest["meshes"]["M"]["branches"]["main"]["commits"], json!([]));
}

#[tokio::test]
async fn commit_minting_writes_manifest_fields() {
    let (_dir, app) = test_router();
    call(
        &app,
        Method::POST,
        "/mesh/M/branch",
        Some(json!({"branch": "main"})),
    )
    .await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/mesh/M/commit",
        Some(json!({"branch": "main", "message": "init", "tag": "v0"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "created");
    assert_eq!(body["commit"]["message"], "init");
    assert_eq!(body["commit"]["tag"], "v0");
    assert!(body["commit"]["id"].as_str().unwrap().len() >= "YYYY-MM-DD_HH-MM-SS".len());
}

#[tokio::test]
async fn correct_pointer_gate_blocks_until_reassigned() {
    let (_dir, app) = test_router();
    call(
        &app,
        Method::POST,
        "/mesh/M/branch",
        Some(json!({"branch": "main"})),
    )
    .await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/mesh/M/correct",
        Some(json!({"branch": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    call(
        &app,
        Method::POST,
        "/mesh/M/branch",
        Some(json!({"branch": "nope"})),
    )
    .await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/mesh/M/correct",
        Some(json!({"branch": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["correct_branch"], "nope");

    let (status, _) = call(&app, Method::DELETE, "/mesh/M/branch/nope", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    call(
        &app,
        Method::POST,
        "/mesh/M/correct",
        Some(json!({"branch": "main"})),
    )
    .await;
    let (status, body) = call(&app, Method::DELETE, "/mesh/M/branch/nope", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");
}

#[tokio::test]
async fn names_are_sanitised_on_the_wire() {
    let (_dir, app) = test_router();
    let (status, body) = call(
        &app,
        Method::POST,
        "/mesh/..%2F..%2Fbad/branch",
        Some(json!({"branch": "../evil name"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mesh"], "....bad");
    assert_eq!(body["branch"], "..evil_name");
}

#[tokio::test]
async fn read_and_delete_endpoints_echo_sanitised_names() {
    let (_dir, app) = test_router();
    call(
        &app,
        Method::POST,
        "/mesh/My%20Mesh/branch",
        Some(json!({"branch": "fun branch"})),
    )
    .await;

    let (status, body) = call(&app, Method::GET, "/mesh/My%20Mesh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mesh"], "My_Mesh");
    assert!(body["branches"].as_object().unwrap().contains_key("fun_branch"));

    let (_, body) = call(&app, Method::GET, "/mesh/My%20Mesh/branches", None).await;
    assert_eq!(body["mesh"], "My_Mesh");
    assert_eq!(body["branches"], json!(["fun_branch"]));

    let (_, body) = call(
        &app,
        Method::GET,
        "/mesh/My%20Mesh/branch/fun%20branch/commits",
        None,
    )
    .await;
    assert_eq!(body["mesh"], "My_Mesh");
    assert_eq!(body["branch"], "fun_branch");

    let (_, body) = call(
        &app,
        Method::DELETE,
        "/mesh/My%20Mesh/branch/fun%20branch",
        None,
    )
    .await;
    assert_eq!(body["mesh"], "My_Mesh");
    assert_eq!(body["branch"], "fun_branch");
    assert_eq!(body["status"], "deleted");
}

#[tokio::test]
async fn fifty_concurrent_branch_creates_all_land() {
    let (_dir, app) = test_router();

    let mut handles = Vec::with_capacity(50);
    for i in 0..50 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            call(
                &app,
                Method::POST,
                "/mesh/M/branch",
                Some(json!({"branch": format!("b{i}")})),
            )
            .await
        }));
    }
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = call(&app, Method::GET, "/mesh/M/branches", None).await;
    assert_eq!(body["branches"].as_array().unwrap().len(), 50);

    let (_, forest) = call(&app, Method::GET, "/forest", None).await;
    assert_eq!(forest["meshes"]["M"]["branches"].as_object().unwrap().len(), 50);
}

#[tokio::test]
async fn rescan_recovers_out_of_band_branch() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("M").join("side")).unwrap();

    let repo = Repository::open(dir.path()).unwrap();
    let app = router(Arc::new(repo));

    let (status, _) = call(&app, Method::POST, "/rescan", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, forest) = call(&app, Method::GET, "/forest", None).await;
    assert!(forest["meshes"]["M"]["branches"]
        .as_object()
        .unwrap()
        .contains_key("side"));
}
