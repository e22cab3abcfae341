use base64::Engine;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::GraphResult;

/// `@odata.type` of attachments that carry inline `contentBytes`
pub const FILE_ATTACHMENT_TYPE: &str = "#microsoft.graph.fileAttachment";

/// Envelope for Graph API list endpoints.
///
/// `value` is required: a body without it fails to decode, an empty array
/// decodes to an empty vector. `next_link` is captured but never followed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphCollection<T> {
    #[serde(rename = "@odata.context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(rename = "@odata.nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    pub value: Vec<T>,
}

impl<T> GraphCollection<T> {
    /// Whether the server advertised another page
    pub fn has_more(&self) -> bool {
        self.next_link.is_some()
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.value.iter()
    }
}

impl<T> IntoIterator for GraphCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.value.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a GraphCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.value.iter()
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub type MessageCollection = GraphCollection<GraphMessage>;
pub type AttachmentCollection = GraphCollection<GraphAttachment>;
pub type FolderCollection = GraphCollection<GraphFolder>;

/// A message from Graph API, as returned by the list endpoints (full body included)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMessage {
    #[serde(rename = "@odata.etag", default)]
    pub etag: Option<String>,
    pub id: String,
    #[serde(default)]
    pub change_key: Option<String>,
    #[serde(default)]
    pub internet_message_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub parent_folder_id: Option<String>,

    #[serde(default)]
    pub created_date_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub last_modified_date_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub received_date_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub sent_date_time: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body_preview: Option<String>,
    #[serde(default)]
    pub body: Option<GraphItemBody>,
    #[serde(default)]
    pub web_link: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub has_attachments: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_draft: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_read_receipt_requested: bool,
    /// The service sends either `null` or a bool here
    #[serde(default)]
    pub is_delivery_receipt_requested: Value,
    #[serde(default)]
    pub importance: Option<String>,
    #[serde(default)]
    pub inference_classification: Option<String>,
    #[serde(default)]
    pub flag: Option<GraphFlag>,

    #[serde(default)]
    pub sender: Option<GraphRecipient>,
    #[serde(default)]
    pub from: Option<GraphRecipient>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to_recipients: Vec<GraphRecipient>,

    // Element shape is not pinned down by the service data we see; keep raw JSON.
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cc_recipients: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bcc_recipients: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reply_to: Vec<Value>,
}

impl GraphMessage {
    /// Address of the `from` recipient, if any
    pub fn from_address(&self) -> Option<&str> {
        self.from
            .as_ref()
            .and_then(|r| r.email_address.address.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphItemBody {
    /// `"html"` or `"text"`
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphRecipient {
    #[serde(rename = "emailAddress", default, deserialize_with = "null_as_default")]
    pub email_address: GraphEmailAddress,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphEmailAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphFlag {
    #[serde(rename = "flagStatus", default, deserialize_with = "null_as_default")]
    pub flag_status: String,
}

/// An attachment of a message
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphAttachment {
    #[serde(rename = "@odata.type", default)]
    pub odata_type: Option<String>,
    pub id: String,
    #[serde(default)]
    pub last_modified_date_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Size in bytes
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_inline: bool,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub content_location: Value,
    /// Base64 (standard alphabet) encoded payload
    #[serde(default)]
    pub content_bytes: Option<String>,
}

impl GraphAttachment {
    pub fn is_file_attachment(&self) -> bool {
        self.odata_type.as_deref() == Some(FILE_ATTACHMENT_TYPE)
    }

    /// Decode `contentBytes`. Item and reference attachments carry no
    /// payload and decode to an empty vector.
    pub fn decode_content(&self) -> GraphResult<Vec<u8>> {
        match self.content_bytes.as_deref() {
            Some(encoded) => Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?),
            None => Ok(Vec::new()),
        }
    }
}

/// A mail folder from Graph API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFolder {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    /// Not resolved client-side
    #[serde(default)]
    pub parent_folder_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub child_folder_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unread_item_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_item_count: i64,
}

impl GraphFolder {
    pub fn has_children(&self) -> bool {
        self.child_folder_count > 0
    }
}
