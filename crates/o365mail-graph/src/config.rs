use std::time::Duration;

use crate::error::{GraphError, GraphResult};

pub const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// What to do with a non-2xx response before decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Decode the body as the success shape regardless of status.
    /// A Graph error envelope then surfaces as `GraphError::Decode`
    /// carrying the status code.
    #[default]
    PassThrough,
    /// Return `GraphError::Api` for any non-2xx status without decoding.
    Strict,
}

/// Connection settings for [`GraphMailClient`](crate::GraphMailClient)
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// API root, e.g. `https://graph.microsoft.com/v1.0`
    pub base_url: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub status_policy: StatusPolicy,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: GRAPH_BASE.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            status_policy: StatusPolicy::default(),
        }
    }
}

impl GraphConfig {
    /// Validate `base_url` and strip any trailing slash so endpoint paths
    /// can be appended directly.
    pub(crate) fn normalized_base_url(&self) -> GraphResult<String> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let parsed = url::Url::parse(trimmed)
            .map_err(|e| GraphError::Config(format!("invalid base URL {trimmed:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GraphError::Config(format!(
                "unsupported base URL scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(trimmed.to_string())
    }
}
