use async_trait::async_trait;

use crate::client::GraphMailClient;
use crate::error::GraphResult;
use crate::types::{AttachmentCollection, FolderCollection, MessageCollection};

/// Read-only mailbox operations.
///
/// Implemented by [`GraphMailClient`]; code that only needs to read mail can
/// depend on this trait and be handed a test double instead.
#[async_trait]
pub trait MailApi: Send + Sync {
    async fn list_inbox_messages(&self) -> GraphResult<MessageCollection>;

    async fn list_inbox_messages_from(&self, address: &str) -> GraphResult<MessageCollection>;

    /// Attachments of the message id the implementation was configured with
    async fn get_message_attachments(&self) -> GraphResult<AttachmentCollection>;

    async fn list_message_attachments(&self, message_id: &str) -> GraphResult<AttachmentCollection>;

    async fn list_top_level_folders(&self) -> GraphResult<FolderCollection>;

    async fn list_child_folders(&self, parent_folder_id: &str) -> GraphResult<FolderCollection>;

    async fn list_folder_messages(&self, folder_id: &str) -> GraphResult<MessageCollection>;
}

#[async_trait]
impl MailApi for GraphMailClient {
    async fn list_inbox_messages(&self) -> GraphResult<MessageCollection> {
        GraphMailClient::list_inbox_messages(self).await
    }

    async fn list_inbox_messages_from(&self, address: &str) -> GraphResult<MessageCollection> {
        GraphMailClient::list_inbox_messages_from(self, address).await
    }

    async fn get_message_attachments(&self) -> GraphResult<AttachmentCollection> {
        GraphMailClient::get_message_attachments(self).await
    }

    async fn list_message_attachments(&self, message_id: &str) -> GraphResult<AttachmentCollection> {
        GraphMailClient::list_message_attachments(self, message_id).await
    }

    async fn list_top_level_folders(&self) -> GraphResult<FolderCollection> {
        GraphMailClient::list_top_level_folders(self).await
    }

    async fn list_child_folders(&self, parent_folder_id: &str) -> GraphResult<FolderCollection> {
        GraphMailClient::list_child_folders(self, parent_folder_id).await
    }

    async fn list_folder_messages(&self, folder_id: &str) -> GraphResult<MessageCollection> {
        GraphMailClient::list_folder_messages(self, folder_id).await
    }
}
