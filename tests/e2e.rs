//! End-to-end test of the standalone download mode
//!
//! Verifies the complete flow without the HTTP API:
//! 1. Search a mock provider with the real client
//! 2. Fetch each result from a mock image host
//! 3. Write files into `<base_dir>/<sanitized query>/`
//! 4. Verify names, contents and the per-item error log

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use imagebox::config::{ByteSize, Config};
use imagebox::registry::{JobRegistry, JobStatus};
use imagebox::search::{SearchClient, SearchQuery};
use imagebox::worker::{BatchDownloadJob, ImageFetcher, SinkTarget};

async fn provider(State(base): State<String>) -> impl IntoResponse {
    Json(json!({
        "results": [
            { "properties": { "url": format!("{base}/img/photo.webp?size=large") } },
            { "properties": { "url": "" }, "thumbnail": { "src": format!("{base}/img/small") } },
            { "properties": { "url": format!("{base}/img/huge.png") } },
            { "properties": { "url": format!("{base}/img/slow.gif") } },
        ]
    }))
}

async fn image(Path(name): Path<String>) -> impl IntoResponse {
    match name.as_str() {
        "photo.webp" => ([(header::CONTENT_TYPE, "image/webp")], vec![1u8; 64]).into_response(),
        "small" => ([(header::CONTENT_TYPE, "image/gif")], vec![2u8; 16]).into_response(),
        "huge.png" => ([(header::CONTENT_TYPE, "image/png")], vec![3u8; 4096]).into_response(),
        "slow.gif" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ([(header::CONTENT_TYPE, "image/gif")], vec![4u8; 16]).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let app = Router::new()
        .route("/search", get(provider))
        .route("/img/{name}", get(image))
        .with_state(base.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base
}

#[tokio::test]
async fn test_folder_download_end_to_end() {
    let base = start_upstream().await;
    let output = TempDir::new().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.search.endpoint = format!("{base}/search");
    config.search.api_key = Some("test-key".to_string());
    config.fetch.max_image_bytes = ByteSize(1024);

    let search = SearchClient::new(config.search.clone()).unwrap();
    let fetcher = ImageFetcher::new(&config.fetch).unwrap();

    let registry = JobRegistry::new();
    let query = SearchQuery::new("night sky", 4, 50).unwrap();
    let entry = registry.create(&query);

    let job = BatchDownloadJob::builder()
        .query(query)
        .search(Arc::new(search))
        .fetcher(Arc::new(fetcher))
        .target(SinkTarget::Folder {
            base_dir: output.path().to_path_buf(),
        })
        .fetch_timeout(Duration::from_millis(500))
        .politeness_delay(Duration::from_millis(5))
        .build();

    let snapshot = job.run(entry.clone()).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.total, 4);
    assert_eq!(snapshot.succeeded, 2);
    assert_eq!(snapshot.failed, 2);

    let codes: Vec<(usize, &str)> = snapshot
        .errors
        .iter()
        .map(|e| (e.index, e.code.as_str()))
        .collect();
    assert_eq!(codes, vec![(3, "too_large"), (4, "timeout")]);

    let folder = output.path().join("night_sky");
    assert_eq!(snapshot.directory.as_deref(), Some(folder.as_path()));

    let mut files: Vec<String> = std::fs::read_dir(&folder)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec!["night_sky_01.webp", "night_sky_02.gif"]);

    assert_eq!(std::fs::read(folder.join("night_sky_01.webp")).unwrap(), vec![1u8; 64]);
    assert_eq!(std::fs::read(folder.join("night_sky_02.gif")).unwrap(), vec![2u8; 16]);

    // The registry reflects the same terminal state
    assert_eq!(registry.get(entry.id()).unwrap().status, JobStatus::Completed);
    assert!(registry.retrieve_sink(entry.id()).is_ok());
}
