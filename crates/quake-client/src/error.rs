//! Error types for the quake client

use quake_inventory::FetchError;
use thiserror::Error;

/// Errors that can occur when talking to the quake REST API
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// API returned an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from server
        message: String,
    },
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_decode() => FetchError::Decode(e.to_string()),
            ClientError::Http(e) => FetchError::Transport(e.to_string()),
            ClientError::Json(e) => FetchError::Decode(e.to_string()),
            ClientError::Url(e) => FetchError::Transport(format!("invalid URL: {e}")),
            ClientError::Api { status, message } if status == 401 || status == 403 => {
                FetchError::Unauthorized(message)
            }
            ClientError::Api { status, message } => FetchError::Api { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let unauthorized = ClientError::Api {
            status: 401,
            message: "token expired".into(),
        };
        assert_eq!(
            FetchError::from(unauthorized),
            FetchError::Unauthorized("token expired".into())
        );

        let forbidden = ClientError::Api {
            status: 403,
            message: String::new(),
        };
        assert!(matches!(FetchError::from(forbidden), FetchError::Unauthorized(_)));

        let unavailable = ClientError::Api {
            status: 503,
            message: "maintenance".into(),
        };
        let mapped = FetchError::from(unavailable);
        assert!(mapped.is_retryable());
        assert_eq!(
            mapped,
            FetchError::Api {
                status: 503,
                message: "maintenance".into()
            }
        );
    }

    #[test]
    fn test_json_maps_to_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(FetchError::from(ClientError::Json(err)), FetchError::Decode(_)));
    }
}
