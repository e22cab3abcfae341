use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::config::{GraphConfig, StatusPolicy};
use crate::error::{GraphError, GraphResult};
use crate::types::*;

/// OData filter matching messages by sender address
pub fn sender_filter(address: &str) -> String {
    format!("(from/emailAddress/address) eq '{}'", address)
}

/// Read-only client for the Graph mail endpoints.
///
/// Immutable once built; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GraphMailClient {
    client: reqwest::Client,
    headers: HeaderMap,
    base_url: String,
    timeout: Option<Duration>,
    status_policy: StatusPolicy,
    message_id: Option<String>,
}

impl fmt::Debug for GraphMailClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphMailClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("status_policy", &self.status_policy)
            .field("message_id", &self.message_id)
            .finish_non_exhaustive()
    }
}

impl GraphMailClient {
    /// Client with default configuration against the public Graph endpoint
    pub fn new(access_token: impl Into<String>) -> GraphResult<Self> {
        Self::builder(access_token).build()
    }

    pub fn builder(access_token: impl Into<String>) -> GraphMailClientBuilder {
        GraphMailClientBuilder::new(access_token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    /// Message id set at construction, used by [`get_message_attachments`](Self::get_message_attachments)
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn messages_url(&self) -> String {
        format!("{}/me/messages", self.base_url)
    }

    pub fn messages_from_url(&self, address: &str) -> String {
        let filter: String = form_urlencoded::byte_serialize(sender_filter(address).as_bytes()).collect();
        format!("{}/me/messages?$filter={}", self.base_url, filter)
    }

    pub fn attachments_url(&self, message_id: &str) -> String {
        format!("{}/me/messages/{}/attachments", self.base_url, message_id)
    }

    pub fn top_level_folders_url(&self) -> String {
        format!("{}/me/mailFolders/", self.base_url)
    }

    pub fn child_folders_url(&self, parent_folder_id: &str) -> String {
        format!("{}/me/mailFolders/{}/childFolders", self.base_url, parent_folder_id)
    }

    pub fn folder_messages_url(&self, folder_id: &str) -> String {
        format!("{}/me/mailFolders/{}/messages", self.base_url, folder_id)
    }

    /// List messages across the mailbox (first page only)
    pub async fn list_inbox_messages(&self) -> GraphResult<MessageCollection> {
        debug!("Graph: listing messages");
        let list: MessageCollection = self.get_json(&self.messages_url()).await?;
        info!("Graph: got {} messages, has_more={}", list.len(), list.has_more());
        Ok(list)
    }

    /// List messages whose `from` address equals `address`
    pub async fn list_inbox_messages_from(&self, address: &str) -> GraphResult<MessageCollection> {
        debug!("Graph: listing messages from {}", address);
        let list: MessageCollection = self.get_json(&self.messages_from_url(address)).await?;
        info!("Graph: got {} messages from {}", list.len(), address);
        Ok(list)
    }

    /// List attachments of the message id configured on the builder
    pub async fn get_message_attachments(&self) -> GraphResult<AttachmentCollection> {
        let message_id = self.message_id.as_deref().ok_or_else(|| {
            GraphError::InvalidArgument("no message id configured on the client".to_string())
        })?;
        self.list_message_attachments(message_id).await
    }

    /// List attachments of a message, including their base64 payloads
    pub async fn list_message_attachments(&self, message_id: &str) -> GraphResult<AttachmentCollection> {
        require_id("message id", message_id)?;
        debug!("Graph: listing attachments for {}", message_id);
        let list: AttachmentCollection = self.get_json(&self.attachments_url(message_id)).await?;
        info!("Graph: found {} attachments for {}", list.len(), message_id);
        Ok(list)
    }

    /// List the mailbox's top-level folders
    pub async fn list_top_level_folders(&self) -> GraphResult<FolderCollection> {
        debug!("Graph: listing top-level folders");
        let list: FolderCollection = self.get_json(&self.top_level_folders_url()).await?;
        info!("Graph: found {} folders", list.len());
        Ok(list)
    }

    pub async fn list_child_folders(&self, parent_folder_id: &str) -> GraphResult<FolderCollection> {
        require_id("parent folder id", parent_folder_id)?;
        debug!("Graph: listing child folders of {}", parent_folder_id);
        let list: FolderCollection = self.get_json(&self.child_folders_url(parent_folder_id)).await?;
        info!("Graph: found {} child folders under {}", list.len(), parent_folder_id);
        Ok(list)
    }

    pub async fn list_folder_messages(&self, folder_id: &str) -> GraphResult<MessageCollection> {
        require_id("folder id", folder_id)?;
        debug!("Graph: listing messages folder={}", folder_id);
        let list: MessageCollection = self.get_json(&self.folder_messages_url(folder_id)).await?;
        info!(
            "Graph: got {} messages in {}, has_more={}",
            list.len(),
            folder_id,
            list.has_more()
        );
        Ok(list)
    }

    /// GET `url` and decode the body as `T`.
    ///
    /// Transport failures (including reading the body) return before any
    /// decode is attempted.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let mut request = self.client.get(url).headers(self.headers.clone());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("Graph: GET {} returned {}", url, status);
            if self.status_policy == StatusPolicy::Strict {
                let body = response.text().await?;
                return Err(GraphError::api(status.as_u16(), body));
            }
        }

        let body = response.bytes().await?;
        debug!("Graph: read {} bytes (HTTP {})", body.len(), status.as_u16());

        serde_json::from_slice(&body).map_err(|source| GraphError::Decode {
            status: status.as_u16(),
            source,
        })
    }
}

fn require_id(what: &str, id: &str) -> GraphResult<()> {
    if id.is_empty() {
        return Err(GraphError::InvalidArgument(format!("{what} must not be empty")));
    }
    Ok(())
}

/// The three headers sent with every request
fn request_headers(access_token: &str) -> GraphResult<HeaderMap> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", access_token))
        .map_err(|_| GraphError::Config("access token is not a valid header value".to_string()))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(headers)
}

/// Builder for [`GraphMailClient`].
///
/// Defaults come from [`GraphConfig::default`]; a prebuilt `reqwest::Client`
/// can be injected to control the transport (proxies, TLS, test doubles).
pub struct GraphMailClientBuilder {
    access_token: String,
    config: GraphConfig,
    message_id: Option<String>,
    http_client: Option<reqwest::Client>,
}

impl GraphMailClientBuilder {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            config: GraphConfig::default(),
            message_id: None,
            http_client: None,
        }
    }

    /// Replace the whole configuration at once
    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Per-request timeout; `None` disables it
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn status_policy(mut self, policy: StatusPolicy) -> Self {
        self.config.status_policy = policy;
        self
    }

    pub fn message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> GraphResult<GraphMailClient> {
        let base_url = self.config.normalized_base_url()?;
        let headers = request_headers(&self.access_token)?;

        if let Some(id) = &self.message_id {
            require_id("message id", id)?;
        }

        let client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder().build()?,
        };

        debug!("Graph: client ready for {}", base_url);

        Ok(GraphMailClient {
            client,
            headers,
            base_url,
            timeout: self.config.timeout,
            status_policy: self.config.status_policy,
            message_id: self.message_id,
        })
    }
}
