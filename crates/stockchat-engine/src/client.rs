//! HTTP client for the natural-language query backend.
//!
//! The backend exposes a single `POST /api/query` endpoint taking
//! `{"query": "..."}` and answering with a JSON object whose `summary`
//! field holds the answer text. Only a 2xx response carrying a string
//! `summary` counts as success.

use crate::config::{Config, ConfigError};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Request body sent to the query endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueryRequest<'a> {
    /// The user's question, already trimmed.
    pub query: &'a str,
}

/// Response body from the query endpoint.
///
/// The backend also echoes the query and returns the generated SQL and raw
/// rows. Those are informational: a value of an unexpected type is dropped
/// rather than failing the response. Only `summary` is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResponse {
    /// Natural-language answer.
    pub summary: String,
    /// Echo of the submitted query.
    #[serde(default, deserialize_with = "string_or_none")]
    pub query: Option<String>,
    /// SQL the backend generated for the query.
    #[serde(default, deserialize_with = "string_or_none")]
    pub sql: Option<String>,
    /// Rows returned by the generated SQL, as sent.
    #[serde(default)]
    pub results: Option<serde_json::Value>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

impl QueryResponse {
    /// Build a response carrying only a summary.
    pub fn summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            query: None,
            sql: None,
            results: None,
        }
    }
}

/// Something that can answer a query.
///
/// The dispatcher only depends on this trait, so tests can drive it with a
/// scripted client instead of a live backend.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Send one query and wait for its single response.
    async fn query(&self, text: &str) -> Result<QueryResponse, QueryError>;
}

/// [`QueryClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpQueryClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpQueryClient {
    /// Create a client posting to the given endpoint URL.
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Create a client for the query endpoint of the configured backend.
    pub fn from_config(config: &Config) -> Result<Self, QueryError> {
        let endpoint = config.query_endpoint().map_err(QueryError::Config)?;
        Ok(Self::new(endpoint))
    }

    /// The URL queries are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn query(&self, text: &str) -> Result<QueryResponse, QueryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&QueryRequest { query: text })
            .send()
            .await
            .map_err(QueryError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status {
                status: status.as_u16(),
                message: backend_error_message(&body),
            });
        }

        let body = response.bytes().await.map_err(QueryError::Transport)?;
        serde_json::from_slice(&body).map_err(QueryError::Decode)
    }
}

/// Pull the `error` field out of a backend error body, falling back to the
/// raw body text.
pub(crate) fn backend_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Errors that can occur while querying the backend.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The endpoint URL could not be built.
    #[error("Invalid endpoint: {0}")]
    Config(#[source] ConfigError),

    /// Connection, timeout or body read failure.
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend answered 2xx but the body is not a valid response.
    #[error("Malformed response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The task running the request ended without producing a response.
    #[error("Request interrupted: {0}")]
    Interrupted(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer) -> HttpQueryClient {
        let config = Config::default().with_api_url(server.uri());
        HttpQueryClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(QueryRequest {
            query: "AAPL price?",
        })
        .unwrap();
        insta::assert_json_snapshot!(body, @r#"
        {
          "query": "AAPL price?"
        }
        "#);
    }

    #[test]
    fn test_backend_error_message() {
        assert_eq!(
            backend_error_message(r#"{"error": "No query provided"}"#),
            "No query provided"
        );
        assert_eq!(backend_error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_query_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .and(body_json(json!({ "query": "AAPL price?" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "AAPL price?",
                "sql": "SELECT close FROM stock_prices WHERE stock = 'AAPL'",
                "results": [{ "close": 190.0 }],
                "summary": "$190"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).query("AAPL price?").await.unwrap();
        assert_eq!(response.summary, "$190");
        assert_eq!(response.query.as_deref(), Some("AAPL price?"));
        assert!(response.sql.is_some());
        assert_eq!(
            response
                .results
                .as_ref()
                .and_then(serde_json::Value::as_array)
                .map(Vec::len),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_query_summary_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "summary": "ok" })))
            .mount(&server)
            .await;

        let response = client_for(&server).query("anything").await.unwrap();
        assert_eq!(response, QueryResponse::summary("ok"));
    }

    #[tokio::test]
    async fn test_query_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "error": "Error executing query: boom" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).query("bad").await.unwrap_err();
        match err {
            QueryError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Error executing query: boom");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_tolerates_odd_optional_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summary": "No rows matched.",
                "sql": 42,
                "query": null,
                "results": {}
            })))
            .mount(&server)
            .await;

        let response = client_for(&server).query("ZZZZ price?").await.unwrap();
        assert_eq!(response.summary, "No rows matched.");
        assert_eq!(response.sql, None);
        assert_eq!(response.query, None);
        assert_eq!(response.results, Some(json!({})));
    }

    #[tokio::test]
    async fn test_query_missing_summary_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "$190" })))
            .mount(&server)
            .await;

        let err = client_for(&server).query("AAPL price?").await.unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
    }

    #[tokio::test]
    async fn test_query_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).query("AAPL price?").await.unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
    }

    #[tokio::test]
    async fn test_query_connection_refused() {
        // Grab a free port, then release it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = Config::default().with_api_url(format!("http://{addr}"));
        let client = HttpQueryClient::from_config(&config).unwrap();

        let err = client.query("AAPL price?").await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let config = Config::default().with_api_url("::::");
        assert!(matches!(
            HttpQueryClient::from_config(&config),
            Err(QueryError::Config(_))
        ));
    }
}
