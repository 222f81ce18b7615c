//! Request execution and error translation.

use std::collections::HashMap;

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};

/// Send one request, translating failure statuses into [`Error::Api`].
///
/// The body, when present, is an already-serialized JSON document.
pub(crate) async fn send_request(
    http: &reqwest::Client,
    method: Method,
    url: Url,
    body: Option<String>,
) -> Result<Response> {
    tracing::debug!(target: "seq_client::transport", "{} {}", method, url);

    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body);
    }

    let response = request.send().await?;
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let message = extract_error_message(response).await;
    Err(Error::Api { status, message })
}

/// Pull the server's error message out of a failure response.
///
/// The server reports errors as a JSON object with an `Error` key. A body
/// that is missing, unreadable, not JSON, or without that key yields
/// `None`, and the caller falls back to the generic message.
async fn extract_error_message(response: Response) -> Option<String> {
    let body = response.text().await.ok()?;
    let payload: HashMap<String, serde_json::Value> = serde_json::from_str(&body).ok()?;
    match payload.get("Error")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// Decode a success response body as JSON.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body: bytes::Bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Read a success response body as text.
pub(crate) async fn read_text(response: Response) -> Result<String> {
    Ok(response.text().await?)
}
