use anyhow::Result;
use o365mail_graph::{AttachmentCollection, FolderCollection, GraphMessage, MessageCollection};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Table
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn more_marker(has_more: bool) -> &'static str {
    if has_more {
        "\n(more results available; only the first page is shown)"
    } else {
        ""
    }
}

fn sender(message: &GraphMessage) -> String {
    let Some(from) = &message.from else {
        return "-".to_string();
    };
    match (&from.email_address.name, &from.email_address.address) {
        (Some(name), Some(address)) if !name.is_empty() => format!("{name} <{address}>"),
        (_, Some(address)) => address.clone(),
        (Some(name), None) => name.clone(),
        (None, None) => "-".to_string(),
    }
}

pub fn format_messages(format: OutputFormat, messages: &MessageCollection) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(messages);
    }
    if messages.is_empty() {
        return Ok("No messages found.".to_string());
    }

    let mut lines = Vec::with_capacity(messages.len());
    for msg in messages {
        let received = msg
            .received_date_time
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let unread = if msg.is_read { ' ' } else { '*' };
        let clip = if msg.has_attachments { "@" } else { " " };
        lines.push(format!(
            "{unread}{clip} {received}  {}  {}  [{}]",
            sender(msg),
            msg.subject.as_deref().unwrap_or("(no subject)"),
            msg.id
        ));
    }
    Ok(format!("{}{}", lines.join("\n"), more_marker(messages.has_more())))
}

pub fn format_attachments(format: OutputFormat, attachments: &AttachmentCollection) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(attachments);
    }
    if attachments.is_empty() {
        return Ok("No attachments.".to_string());
    }

    let lines: Vec<String> = attachments
        .iter()
        .map(|a| {
            format!(
                "{}  {}  {} bytes{}  [{}]",
                a.name.as_deref().unwrap_or("(unnamed)"),
                a.content_type.as_deref().unwrap_or("application/octet-stream"),
                a.size,
                if a.is_inline { " (inline)" } else { "" },
                a.id
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

pub fn format_folders(format: OutputFormat, folders: &FolderCollection) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(folders);
    }
    if folders.is_empty() {
        return Ok("No folders.".to_string());
    }

    let lines: Vec<String> = folders
        .iter()
        .map(|f| {
            format!(
                "{}{}  {}/{} unread  [{}]",
                f.display_name,
                if f.has_children() { "/" } else { "" },
                f.unread_item_count,
                f.total_item_count,
                f.id
            )
        })
        .collect();
    Ok(format!("{}{}", lines.join("\n"), more_marker(folders.has_more())))
}
