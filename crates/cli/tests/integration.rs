//! End-to-end tests for the bx binary
//!
//! Each test runs the compiled binary against a local mock dashboard, with
//! its configuration isolated in a temporary directory.

use std::path::Path;
use std::process::Output;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run bx with the given configuration directory
async fn run_bx(args: &[&str], config_dir: &Path) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_bx"))
        .args(args)
        .env("BX_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .env_remove("BX_TOKEN")
        .env_remove("BX_PASSWORD")
        .output()
        .await
        .expect("Failed to execute bx")
}

/// Start a mock dashboard and register it as the `local` alias
async fn setup() -> (MockServer, TempDir) {
    let server = MockServer::start().await;
    let config_dir = TempDir::new().unwrap();
    let output = run_bx(&["alias", "set", "local", &server.uri()], config_dir.path()).await;
    assert!(output.status.success(), "alias set failed: {output:?}");
    (server, config_dir)
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[tokio::test]
async fn test_alias_set_list_remove() {
    let config_dir = TempDir::new().unwrap();

    let output = run_bx(
        &["alias", "set", "r2", "https://dash.example.com", "--token", "s3cr3t"],
        config_dir.path(),
    )
    .await;
    assert!(output.status.success());

    let output = run_bx(&["alias", "list", "--json"], config_dir.path()).await;
    let list = stdout_json(&output);
    assert_eq!(list["aliases"][0]["name"], "r2");
    assert_eq!(list["aliases"][0]["auth"], "bearer");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("s3cr3t"));

    let output = run_bx(&["alias", "remove", "r2"], config_dir.path()).await;
    assert!(output.status.success());

    let output = run_bx(&["alias", "remove", "r2"], config_dir.path()).await;
    assert_eq!(output.status.code(), Some(5));
}

#[tokio::test]
async fn test_alias_set_rejects_bad_endpoint() {
    let config_dir = TempDir::new().unwrap();
    let output = run_bx(&["alias", "set", "bad", "ftp://example.com"], config_dir.path()).await;
    assert_eq!(output.status.code(), Some(2));
}

#[tokio::test]
async fn test_unknown_alias_is_not_found() {
    let config_dir = TempDir::new().unwrap();
    let output = run_bx(&["ls", "nowhere/photos"], config_dir.path()).await;
    assert_eq!(output.status.code(), Some(5));
}

#[tokio::test]
async fn test_ls_json() {
    let (server, config_dir) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/buckets/photos"))
        .and(query_param("prefix", "ZG9jcy8="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                {"key": "docs/a.txt", "size": 5},
                {"key": "docs/.hidden", "size": 1}
            ],
            "delimitedPrefixes": ["docs/sub/"],
            "truncated": false
        })))
        .mount(&server)
        .await;

    let output = run_bx(&["ls", "local/photos/docs", "--json"], config_dir.path()).await;
    assert!(output.status.success(), "{output:?}");

    let listing = stdout_json(&output);
    let files = listing["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "a.txt");
    assert_eq!(files[0]["hash"], "YS50eHQ=");
    assert_eq!(listing["folders"][0]["name"], "sub");
}

#[tokio::test]
async fn test_mkdir_sends_encoded_key() {
    let (server, config_dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/buckets/photos/folder"))
        .and(body_json(json!({"key": "ZG9jcy8="})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_bx(&["mkdir", "local/photos/docs"], config_dir.path()).await;
    assert!(output.status.success(), "{output:?}");
}

#[tokio::test]
async fn test_rm_maps_missing_object_to_exit_code() {
    let (server, config_dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/buckets/photos/delete"))
        .and(body_json(json!({"key": "ZG9jcy9hLnR4dA=="})))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such object"))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_bx(&["rm", "local/photos/docs/a.txt"], config_dir.path()).await;
    assert_eq!(output.status.code(), Some(5));
}

#[tokio::test]
async fn test_mv_conflict() {
    let (server, config_dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/buckets/photos/move"))
        .and(body_json(json!({"oldKey": "YS50eHQ=", "newKey": "Yi50eHQ="})))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_bx(&["mv", "local/photos/a.txt", "b.txt"], config_dir.path()).await;
    assert_eq!(output.status.code(), Some(6));
}

#[tokio::test]
async fn test_cp_upload_and_download() {
    let (server, config_dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/buckets/photos/upload"))
        .and(query_param("key", "YS50eHQ="))
        .and(query_param("httpMetadata", "eyJjb250ZW50VHlwZSI6InRleHQvcGxhaW4ifQ=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "a.txt", "size": 5})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/buckets/photos/YS50eHQ="))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let work = TempDir::new().unwrap();
    let local = work.path().join("a.txt");
    std::fs::write(&local, b"hello").unwrap();

    let output = run_bx(
        &["cp", &local.to_string_lossy(), "local/photos/", "--json"],
        config_dir.path(),
    )
    .await;
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output)["size_bytes"], 5);

    let download_dir = work.path().join("out");
    std::fs::create_dir(&download_dir).unwrap();
    let output = run_bx(
        &["cp", "local/photos/a.txt", &download_dir.to_string_lossy()],
        config_dir.path(),
    )
    .await;
    assert!(output.status.success(), "{output:?}");
    assert_eq!(std::fs::read(download_dir.join("a.txt")).unwrap(), b"hello");
}

#[tokio::test]
async fn test_cp_uses_multipart_above_threshold() {
    let (server, config_dir) = setup().await;
    let config_path = config_dir.path().join("config.toml");
    let config = std::fs::read_to_string(&config_path).unwrap();
    std::fs::write(
        &config_path,
        config.replace("multipart_threshold_mib = 100", "multipart_threshold_mib = 0"),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/buckets/photos/multipart/create"))
        .and(query_param("key", "YmlnLmJpbg=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uploadId": "up-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/buckets/photos/multipart/upload"))
        .and(query_param("uploadId", "up-1"))
        .and(query_param("partNumber", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"partNumber": 1, "etag": "e1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/buckets/photos/multipart/complete"))
        .and(body_json(json!({
            "key": "YmlnLmJpbg==",
            "uploadId": "up-1",
            "parts": [{"partNumber": 1, "etag": "e1"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "big.bin", "size": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let work = TempDir::new().unwrap();
    let local = work.path().join("big.bin");
    std::fs::write(&local, b"payload").unwrap();

    let output = run_bx(
        &["cp", &local.to_string_lossy(), "local/photos/", "--json"],
        config_dir.path(),
    )
    .await;
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output)["multipart"], true);
}

#[tokio::test]
async fn test_cat_writes_body_to_stdout() {
    let (server, config_dir) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/buckets/photos/ZG9jcy9hLnR4dA=="))
        .respond_with(ResponseTemplate::new(200).set_body_string("line one\n"))
        .mount(&server)
        .await;

    let output = run_bx(&["cat", "local/photos/docs/a.txt"], config_dir.path()).await;
    assert!(output.status.success(), "{output:?}");
    assert_eq!(output.stdout, b"line one\n");
}

#[tokio::test]
async fn test_meta_replaces_metadata() {
    let (server, config_dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/buckets/photos/YS50eHQ="))
        .and(body_json(json!({"customMetadata": {"owner": "ana"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "a.txt",
            "customMetadata": {"owner": "ana"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_bx(
        &["meta", "local/photos/a.txt", "--set", "owner=ana", "--json"],
        config_dir.path(),
    )
    .await;
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output)["custom_metadata"]["owner"], "ana");
}
