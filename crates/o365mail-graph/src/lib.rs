//! Microsoft Graph mail client
//!
//! Read-only binding for the Graph v1.0 mail endpoints: mailbox messages
//! (optionally filtered by sender), message attachments, and the mail
//! folder tree. Each call is a single authenticated GET; pagination links
//! are exposed but not followed.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use api::MailApi;
pub use client::{sender_filter, GraphMailClient, GraphMailClientBuilder};
pub use config::{GraphConfig, StatusPolicy, DEFAULT_TIMEOUT_SECS, GRAPH_BASE};
pub use error::{GraphError, GraphResult};
pub use types::*;
