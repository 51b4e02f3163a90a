use crate::chat::ChatRequest;
use crate::library::LibraryEntry;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod dispatch;

pub use dispatch::Backend;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network unreachable: {0}")]
    Transport(String),
    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),
    #[error("malformed response: {0}")]
    Protocol(String),
    #[error("invalid request path: {0}")]
    InvalidPath(String),
    #[error("{0}")]
    Application(String),
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

#[derive(Debug, Deserialize)]
struct LibraryListing {
    items: Vec<LibraryEntry>,
}

/// Thin JSON-over-HTTP client for the Herotopia backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|err| ApiError::InvalidPath(format!("{endpoint}: {err}")))
    }

    /// Absolute URL under which the backend serves a library file.
    pub fn file_url(&self, path: &str) -> Result<Url, ApiError> {
        self.endpoint_url(&format!("library/{}", path.trim_start_matches('/')))
    }

    /// Issues one call and returns the decoded envelope.
    ///
    /// `success: false` is not inspected here; see [`ApiClient::chat`] and
    /// [`ApiClient::library`] for the typed variants.
    pub async fn request(
        &self,
        endpoint: &str,
        payload: Option<&Value>,
        method: Method,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint_url(endpoint)?;
        debug!(%url, %method, "api request");

        let mut builder = self.http.request(method, url);
        if let Some(payload) = payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await.map_err(|err| {
            warn!(endpoint, error = %err, "api request failed");
            ApiError::Transport(err.to_string())
        })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        decode_response(status, &body)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError> {
        let payload =
            serde_json::to_value(request).map_err(|err| ApiError::Protocol(err.to_string()))?;
        let envelope = self.request("/chat", Some(&payload), Method::POST).await?;
        let reply: ChatReply = open_envelope(envelope)?;
        Ok(reply.response)
    }

    pub async fn library(&self) -> Result<Vec<LibraryEntry>, ApiError> {
        let envelope = self.request("/library", None, Method::GET).await?;
        let listing: LibraryListing = open_envelope(envelope)?;
        Ok(listing.items)
    }

    /// Raw bytes of a library file, unchanged.
    pub async fn fetch_file(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.file_url(path)?;
        debug!(%url, "fetching library file");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(body.to_vec())
    }
}

fn decode_response(status: StatusCode, body: &[u8]) -> Result<Value, ApiError> {
    if !status.is_success() {
        return Err(ApiError::HttpStatus(status.as_u16()));
    }
    serde_json::from_slice(body).map_err(|err| ApiError::Protocol(err.to_string()))
}

fn open_envelope<T: DeserializeOwned>(envelope: Value) -> Result<T, ApiError> {
    let success = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        let message = envelope
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        return Err(ApiError::Application(message));
    }

    serde_json::from_value(envelope).map_err(|err| ApiError::Protocol(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{decode_response, open_envelope, ApiClient, ApiError, ChatReply, LibraryListing};
    use reqwest::{StatusCode, Url};
    use serde_json::json;

    #[test]
    fn non_success_status_is_http_status_error() {
        let error = decode_response(StatusCode::NOT_FOUND, br#"{"success": false}"#)
            .expect_err("404 should fail");
        assert_eq!(error, ApiError::HttpStatus(404));
        assert_eq!(error.to_string(), "HTTP error! status: 404");
    }

    #[test]
    fn unparsable_body_is_protocol_error() {
        let error = decode_response(StatusCode::OK, b"<html>oops</html>")
            .expect_err("html body should fail");
        assert!(matches!(error, ApiError::Protocol(_)));
    }

    #[test]
    fn envelope_is_returned_without_interpretation() {
        let value = decode_response(StatusCode::OK, br#"{"success": false, "error": "busy"}"#)
            .expect("well-formed body should decode");
        assert_eq!(value, json!({"success": false, "error": "busy"}));
    }

    #[test]
    fn failed_envelope_becomes_application_error() {
        let error = open_envelope::<ChatReply>(json!({"success": false, "error": "Model not loaded"}))
            .expect_err("success=false should fail");
        assert_eq!(error, ApiError::Application("Model not loaded".to_string()));
    }

    #[test]
    fn successful_envelope_without_payload_is_protocol_error() {
        let error = open_envelope::<LibraryListing>(json!({"success": true}))
            .expect_err("missing items should fail");
        assert!(matches!(error, ApiError::Protocol(_)));
    }

    #[test]
    fn successful_envelope_decodes_payload() {
        let reply: ChatReply = open_envelope(json!({"success": true, "response": "Hi!"}))
            .expect("reply should decode");
        assert_eq!(reply.response, "Hi!");
    }

    #[test]
    fn file_url_is_rooted_at_library_prefix() {
        let client = ApiClient::new(Url::parse("http://127.0.0.1:5000/").expect("valid url"));
        let url = client
            .file_url("Science/cell.png")
            .expect("file url should build");
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/library/Science/cell.png");
    }

    #[test]
    fn unjoinable_endpoint_is_a_path_error() {
        let client = ApiClient::new(Url::parse("http://127.0.0.1:5000/").expect("valid url"));
        let error = client
            .endpoint_url("http://[oops")
            .expect_err("broken host should not join");
        assert!(matches!(error, ApiError::InvalidPath(_)));
        assert!(error.to_string().starts_with("invalid request path: "));
    }
}
