use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    /// Connection, DNS, timeout or body read failure. No decode was attempted.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not valid JSON or did not match the expected shape.
    #[error("Failed to decode response (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// Non-success status, only reported under `StatusPolicy::Strict`.
    #[error("Graph API error {status}: {}", api_summary(code, message, body))]
    Api {
        status: u16,
        code: Option<String>,
        message: Option<String>,
        body: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Failed to decode attachment content: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub type GraphResult<T> = Result<T, GraphError>;

fn api_summary(code: &Option<String>, message: &Option<String>, body: &str) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (None, Some(message)) => message.clone(),
        (Some(code), None) => code.clone(),
        (None, None) => body.to_string(),
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

impl GraphError {
    /// Build an `Api` error, pulling `code` and `message` out of the Graph
    /// error envelope when the body carries one.
    pub(crate) fn api(status: u16, body: String) -> Self {
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => (None, None),
        };
        GraphError::Api {
            status,
            code,
            message,
            body,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, GraphError::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, GraphError::Decode { .. })
    }

    /// HTTP status attached to the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Decode { status, .. } | GraphError::Api { status, .. } => Some(*status),
            GraphError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
