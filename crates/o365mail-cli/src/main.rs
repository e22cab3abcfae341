//! o365mail - read Microsoft 365 mail from the command line
//!
//! Thin front end over `o365mail-graph`. The bearer token is taken as-is
//! from `--token` / `O365_ACCESS_TOKEN`; acquiring it is up to the caller.

mod output;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use o365mail_graph::{
    AttachmentCollection, GraphMailClient, StatusPolicy, DEFAULT_TIMEOUT_SECS, GRAPH_BASE,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "o365mail", version, about = "Read Microsoft 365 mail via the Graph API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Bearer access token for Microsoft Graph
    #[arg(long, env = "O365_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// Graph API root
    #[arg(long, env = "O365_GRAPH_BASE_URL", default_value = GRAPH_BASE)]
    base_url: String,

    /// Per-request timeout in seconds (0 disables it)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Fail on non-2xx responses instead of decoding the body
    #[arg(long, global = true)]
    strict: bool,

    /// Output structured JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List mailbox messages, optionally only those from one sender
    Inbox {
        #[arg(long)]
        from: Option<String>,
    },
    /// List a message's attachments
    Attachments {
        message_id: String,
        /// Write decoded file attachments into this directory
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// List top-level folders, or the children of one folder
    Folders {
        #[arg(long)]
        parent: Option<String>,
    },
    /// List the messages in one folder
    FolderMessages { folder_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("o365mail=info,o365mail_graph=info")),
        )
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from_json_flag(cli.json);

    let timeout = (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs));
    let policy = if cli.strict {
        StatusPolicy::Strict
    } else {
        StatusPolicy::PassThrough
    };

    let client = GraphMailClient::builder(cli.token)
        .base_url(cli.base_url)
        .timeout(timeout)
        .status_policy(policy)
        .build()
        .context("failed to set up Graph client")?;

    let rendered = match cli.command {
        Commands::Inbox { from } => {
            let messages = match from.as_deref() {
                Some(address) => client
                    .list_inbox_messages_from(address)
                    .await
                    .with_context(|| format!("failed to list messages from {address}"))?,
                None => client
                    .list_inbox_messages()
                    .await
                    .context("failed to list messages")?,
            };
            output::format_messages(format, &messages)?
        }
        Commands::Attachments { message_id, save } => {
            let attachments = client
                .list_message_attachments(&message_id)
                .await
                .with_context(|| format!("failed to list attachments of {message_id}"))?;
            if let Some(dir) = save {
                save_attachments(&dir, &attachments)?;
            }
            output::format_attachments(format, &attachments)?
        }
        Commands::Folders { parent } => {
            let folders = match parent.as_deref() {
                Some(parent) => client
                    .list_child_folders(parent)
                    .await
                    .with_context(|| format!("failed to list child folders of {parent}"))?,
                None => client
                    .list_top_level_folders()
                    .await
                    .context("failed to list folders")?,
            };
            output::format_folders(format, &folders)?
        }
        Commands::FolderMessages { folder_id } => {
            let messages = client
                .list_folder_messages(&folder_id)
                .await
                .with_context(|| format!("failed to list messages in {folder_id}"))?;
            output::format_messages(format, &messages)?
        }
    };

    println!("{rendered}");
    Ok(())
}

/// Write decoded file attachments into `dir`, returning the paths written.
///
/// File names never leave `dir`: only the last component of the server name
/// is used, and a clashing name gets a numeric suffix instead of being
/// overwritten.
fn save_attachments(dir: &Path, attachments: &AttachmentCollection) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    let mut taken = HashSet::new();
    for attachment in attachments.iter().filter(|a| a.is_file_attachment()) {
        let name = attachment
            .name
            .as_deref()
            .and_then(safe_file_name)
            .or_else(|| safe_file_name(&attachment.id.replace(['/', '\\'], "_")))
            .unwrap_or_else(|| "attachment".to_string());
        let path = unique_path(dir, &name, &mut taken);

        let data = attachment
            .decode_content()
            .with_context(|| format!("failed to decode attachment {}", attachment.id))?;
        std::fs::write(&path, &data).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Saved {} ({} bytes)", path.display(), data.len());
        written.push(path);
    }
    Ok(written)
}

/// Last path component of `raw`, split on either separator style
fn safe_file_name(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}

fn unique_path(dir: &Path, name: &str, taken: &mut HashSet<PathBuf>) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() && taken.insert(candidate.clone()) {
        return candidate;
    }

    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let extension = Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{stem}-{n}{extension}")))
        .find(|p| !p.exists() && !taken.contains(p))
        .map(|p| {
            taken.insert(p.clone());
            p
        })
        .unwrap_or(candidate)
}
