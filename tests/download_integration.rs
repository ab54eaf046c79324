//! Integration tests for the HTTP page source.

use cookbooker_core::download::{FetchError, HttpClient, PageSource};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[macro_use]
mod support;

#[tokio::test]
async fn test_fetch_page_returns_body_bytes_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_image_server!();

    let body: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    Mock::given(method("GET"))
        .and(path("/image"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new()?;
    let fetched = client
        .fetch_page(&format!("{}/image?seq=4", mock_server.uri()))
        .await?;

    assert_eq!(fetched, body);
    Ok(())
}

#[tokio::test]
async fn test_fetch_page_maps_error_status() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_image_server!();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new()?;
    let url = format!("{}/image?seq=9", mock_server.uri());
    let err = client.fetch_page(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::HttpStatus { status: 404, .. }));
    assert_eq!(err.url(), url);
    Ok(())
}

#[tokio::test]
async fn test_fetch_page_accepts_empty_body() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_image_server!();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new()?;
    let fetched = client
        .fetch_page(&format!("{}/image?seq=1", mock_server.uri()))
        .await?;
    assert!(fetched.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_fetch_page_rejects_malformed_url() {
    let client = HttpClient::new().unwrap();
    let err = client.fetch_page("::not-a-url").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl { .. }));
}
