//! HTTP client for the image retrieval backend.
//!
//! One endpoint: `POST /next-image/`. The response is classified by
//! `parse_response`, kept free of IO so it can be tested directly.

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::feed::Category;

pub const NEXT_IMAGE_PATH: &str = "/next-image/";
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Longest slice of an error body kept for logging
const ERROR_BODY_CHARS: usize = 200;

/// Errors produced while retrieving the next image
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Backend answered 403 with a wait duration.
    #[error("rate limited: retry in {wait_seconds}s")]
    RateLimited { wait_seconds: u32 },

    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// Any other non-success status. `body` is a trimmed excerpt.
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body did not match the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Successful response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextImage {
    pub category: Category,
    pub image_base64: String,
}

#[derive(Deserialize)]
struct RateLimitBody {
    detail: RateLimitDetail,
}

#[derive(Deserialize)]
struct RateLimitDetail {
    wait_seconds: u32,
    #[serde(default)]
    message: Option<String>,
}

pub struct ImageClient {
    http: reqwest::Client,
    url: String,
}

impl ImageClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::HttpClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            url: endpoint_url(base_url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask the backend for the next classified image
    pub async fn retrieve_next(&self) -> Result<NextImage, FetchError> {
        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        parse_response(status, &text)
    }
}

/// Join the base URL and the endpoint path without doubling slashes
fn endpoint_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), NEXT_IMAGE_PATH)
}

fn parse_response(status: u16, body: &str) -> Result<NextImage, FetchError> {
    match status {
        200..=299 => serde_json::from_str::<NextImage>(body)
            .map_err(|e| FetchError::Malformed(e.to_string())),
        403 => {
            let limited: RateLimitBody = serde_json::from_str(body)
                .map_err(|e| FetchError::Malformed(format!("403 without wait_seconds: {}", e)))?;
            if let Some(message) = &limited.detail.message {
                tracing::debug!("Backend rate limit message: {}", message);
            }
            Err(FetchError::RateLimited {
                wait_seconds: limited.detail.wait_seconds,
            })
        }
        _ => Err(FetchError::Status {
            status,
            body: body_excerpt(body),
        }),
    }
}

fn body_excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    #[test]
    fn test_parse_success() {
        let body = r#"{"category":"cat","imageBase64":"AAA"}"#;
        let image = parse_response(200, body).unwrap();
        assert_eq!(image.category, Category::Cat);
        assert_eq!(image.image_base64, "AAA");
    }

    #[test]
    fn test_parse_rate_limited() {
        let body = r#"{"detail":{"message":"Please wait 45 seconds","wait_seconds":45}}"#;
        let err = parse_response(403, body).unwrap_err();
        assert!(matches!(err, FetchError::RateLimited { wait_seconds: 45 }));
    }

    #[test]
    fn test_parse_403_without_wait_is_malformed() {
        let err = parse_response(403, r#"{"detail":"Forbidden"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_parse_server_error() {
        let err = parse_response(500, r#"{"detail":"Internal server error"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(
            err.to_string(),
            r#"server returned status 500: {"detail":"Internal server error"}"#
        );
    }

    #[test]
    fn test_long_error_body_is_cut() {
        let body = "x".repeat(1000);
        let err = parse_response(502, &body).unwrap_err();
        let FetchError::Status { body, .. } = &err else {
            panic!("expected status error, got {:?}", err);
        };
        assert_eq!(body.chars().count(), ERROR_BODY_CHARS + 1);
        assert!(body.ends_with('…'));
        assert!(err.to_string().starts_with("server returned status 502: xxx"));
    }

    #[test]
    fn test_parse_unknown_category_is_malformed() {
        let body = r#"{"category":"bird","imageBase64":"AAA"}"#;
        assert!(matches!(parse_response(200, body), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(parse_response(200, "not json"), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_endpoint_url() {
        assert_eq!(endpoint_url("http://127.0.0.1:8001"), "http://127.0.0.1:8001/next-image/");
        assert_eq!(endpoint_url("http://127.0.0.1:8001/"), "http://127.0.0.1:8001/next-image/");
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_retrieve_next_posts_json() {
        let app = Router::new().route(
            "/next-image/",
            post(|headers: HeaderMap| async move {
                let content_type = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if content_type != "application/json" {
                    return (StatusCode::BAD_REQUEST, Json(serde_json::json!({})));
                }
                (
                    StatusCode::OK,
                    Json(serde_json::json!({ "category": "dog", "imageBase64": "BBB" })),
                )
            }),
        );
        let base = serve(app).await;

        let client = ImageClient::new(&base, Duration::from_secs(5)).unwrap();
        let image = client.retrieve_next().await.unwrap();
        assert_eq!(image.category, Category::Dog);
        assert_eq!(image.image_base64, "BBB");
    }

    #[tokio::test]
    async fn test_retrieve_next_rate_limited() {
        let app = Router::new().route(
            "/next-image/",
            post(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(serde_json::json!({ "detail": { "wait_seconds": 12 } })),
                )
            }),
        );
        let base = serve(app).await;

        let client = ImageClient::new(&base, Duration::from_secs(5)).unwrap();
        let err = client.retrieve_next().await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimited { wait_seconds: 12 }));
    }

    #[tokio::test]
    async fn test_retrieve_next_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ImageClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = client.retrieve_next().await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }
}
