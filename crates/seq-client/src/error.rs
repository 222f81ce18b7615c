//! Error types for the Seq client.

/// A specialized Result type for Seq client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to a Seq server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The entity does not carry the requested link.
    #[error("Link `{link}` is not available on entity {entity}")]
    LinkNotAvailable {
        /// The link name that was requested.
        link: String,
        /// The entity type the link was looked up on.
        entity: String,
    },

    /// Parameters were supplied that the link's template does not declare.
    #[error("The URI template does not contain parameter(s): {names}")]
    UnknownParameters {
        /// The offending parameter names, comma separated.
        names: String,
    },

    /// A link href is not a valid URI template.
    #[error("Invalid URI template `{template}`: {message}")]
    Template { template: String, message: String },

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The server reported a failure status (4xx or 5xx).
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("the Seq request failed"))]
    Api {
        /// The HTTP status code.
        status: u16,
        /// Error message from the response body, when the server sent one.
        message: Option<String>,
    },

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl Error {
    /// The HTTP status code, for errors the server reported.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_server_message() {
        let err = Error::Api {
            status: 400,
            message: Some("a signal must have a title".to_string()),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("400"));
        assert!(rendered.contains("a signal must have a title"));
    }

    #[test]
    fn test_api_error_display_falls_back_without_message() {
        let err = Error::Api {
            status: 500,
            message: None,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("500"));
        assert!(rendered.contains("the Seq request failed"));
    }

    #[test]
    fn test_status_accessor() {
        let err = Error::Api {
            status: 404,
            message: None,
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(Error::Timeout.status(), None);
    }
}
