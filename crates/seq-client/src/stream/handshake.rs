//! WebSocket handshake construction.

use reqwest::cookie::{CookieStore, Jar};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use url::Url;

use crate::error::{Error, Result};
use crate::http::API_KEY_HEADER;

/// Build the handshake request for a stream URL.
///
/// The server authenticates the handshake exactly like a plain HTTP
/// request, so cookies recorded against the HTTP origin are replayed and
/// the API key header is attached. The cookie lookup happens before the
/// scheme swap because the jar is keyed by the origin the HTTP client
/// uses.
pub(crate) fn build_request(url: &Url, api_key: Option<&str>, cookies: &Jar) -> Result<Request> {
    let cookie_header = cookies.cookies(url);

    let mut url = url.clone();
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::WebSocket(format!(
                "cannot stream over scheme `{other}`"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::WebSocket(format!("cannot switch stream URL to `{scheme}`")))?;

    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| Error::WebSocket(e.to_string()))?;

    let headers = request.headers_mut();
    if let Some(cookie) = cookie_header {
        headers.insert(http::header::COOKIE, cookie);
    }
    if let Some(key) = api_key {
        let name = http::HeaderName::try_from(API_KEY_HEADER)?;
        let value = http::HeaderValue::try_from(key)?;
        headers.insert(name, value);
    }

    Ok(request)
}
