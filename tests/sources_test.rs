//! Embed sources client tests
//!
//! Tests path building, provider filtering, and upstream error mapping.

use cinedeck::api::{SourceRequest, SourcesClient, SourcesError};
use cinedeck::models::StreamKind;
use mockito::{Matcher, Server};
use tokio_test::{assert_err, assert_ok};

const TWO_PROVIDERS: &str = r#"[
    {
        "source": {
            "provider": "vidsrc",
            "files": [
                {"file": "https://cdn.example/550/master.m3u8", "type": "hls", "quality": "auto", "lang": "en"},
                {"file": "https://cdn.example/550/1080.mp4", "type": "mp4", "quality": "1080p"}
            ],
            "subtitles": [{"url": "https://subs.example/550/en.srt", "lang": "English"}]
        }
    },
    {
        "source": {"provider": "broken", "files": []},
        "ERROR": "scrape failed"
    },
    {
        "ERROR": {"message": "timeout"}
    },
    {
        "source": {
            "provider": "embedsu",
            "files": [{"file": "https://other.example/x.m3u8", "type": "hls", "quality": "720p"}]
        },
        "ERROR": null
    }
]"#;

#[tokio::test]
async fn test_movie_sources_drop_failed_entries() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/movie/550")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TWO_PROVIDERS)
        .create_async()
        .await;

    let client = SourcesClient::with_base_url(server.url());
    let providers = assert_ok!(client.fetch(&SourceRequest::movie("550")).await);

    mock.assert_async().await;

    // Order preserved, errored and sourceless entries dropped
    let names: Vec<&str> = providers.iter().map(|p| p.provider.as_str()).collect();
    assert_eq!(names, vec!["vidsrc", "embedsu"]);

    let vidsrc = &providers[0];
    assert_eq!(vidsrc.files.len(), 2);
    assert_eq!(vidsrc.files[0].kind, StreamKind::Hls);
    assert_eq!(vidsrc.files[1].kind, StreamKind::Mp4);
    assert_eq!(vidsrc.qualities(), vec!["auto", "1080p"]);
    assert_eq!(vidsrc.subtitles[0].lang, "English");
}

#[tokio::test]
async fn test_episode_path_with_provider() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/tv/vidsrc/1399")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("s".into(), "2".into()),
            Matcher::UrlEncoded("e".into(), "5".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"[{"source": {"provider": "vidsrc", "files": [{"file": "https://cdn.example/e.m3u8", "type": "hls", "quality": "auto"}]}}]"#,
        )
        .create_async()
        .await;

    let client = SourcesClient::with_base_url(format!("{}/", server.url()));
    let request = SourceRequest::episode("1399", 2, 5).with_provider(Some("vidsrc".into()));
    let providers = assert_ok!(client.fetch(&request).await);

    mock.assert_async().await;
    assert_eq!(providers.len(), 1);
}

#[tokio::test]
async fn test_all_entries_failed() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/movie/1")
        .with_status(200)
        .with_body(r#"[{"ERROR": "nothing"}, {"source": null}]"#)
        .create_async()
        .await;

    let client = SourcesClient::with_base_url(server.url());
    let err = assert_err!(client.fetch(&SourceRequest::movie("1")).await);

    mock.assert_async().await;
    assert!(matches!(err, SourcesError::NoValidSources));
    assert_eq!(err.to_string(), "No valid video sources available");
}

#[tokio::test]
async fn test_upstream_error_uses_body_message() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/movie/2")
        .with_status(500)
        .with_body(r#"{"error": "provider offline"}"#)
        .create_async()
        .await;

    let client = SourcesClient::with_base_url(server.url());
    let err = assert_err!(client.fetch(&SourceRequest::movie("2")).await);

    mock.assert_async().await;
    assert_eq!(
        err.to_string(),
        "Failed to fetch video sources: provider offline"
    );
}

#[tokio::test]
async fn test_upstream_error_without_body() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/movie/3")
        .with_status(502)
        .create_async()
        .await;

    let client = SourcesClient::with_base_url(server.url());
    let err = assert_err!(client.fetch(&SourceRequest::movie("3")).await);

    mock.assert_async().await;
    match err {
        SourcesError::Upstream(msg) => assert!(msg.contains("502"), "got {}", msg),
        other => panic!("Expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unconfigured_client() {
    let client = SourcesClient::new(None);
    assert!(!client.is_configured());

    let err = assert_err!(client.fetch(&SourceRequest::movie("550")).await);
    assert_eq!(err.to_string(), "API URL is not configured");

    let client = SourcesClient::new(Some("  ".trim().to_string()));
    assert!(!client.is_configured());
}
