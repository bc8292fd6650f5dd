//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the nowapi binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::DisplayValue;

/// ServiceNow API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "nowapi", about = "ServiceNow API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read and write table records.
    #[command(subcommand)]
    Table(TableCommand),

    /// Manage attachments.
    #[command(subcommand, alias = "attachments")]
    Attachment(AttachmentCommand),

    /// Mobile sync config and checksums.
    #[command(subcommand)]
    Sync(SyncCommand),

    /// OAuth helpers.
    #[command(subcommand)]
    Oauth(OAuthCommand),
}

/// Table API operations.
#[derive(Subcommand, Debug)]
pub enum TableCommand {
    /// Get a single record.
    Get {
        /// Table name, e.g. `incident`.
        table: String,

        /// The record's sys_id.
        sys_id: String,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// List records with optional filtering and paging.
    List {
        /// Table name, e.g. `incident`.
        table: String,

        /// Encoded query, e.g. `active=true^ORDERBYnumber`.
        #[arg(long)]
        query: Option<String>,

        /// Maximum number of records.
        #[arg(long)]
        limit: Option<u32>,

        /// Index of the first record.
        #[arg(long)]
        offset: Option<u32>,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Create a record.
    Create {
        table: String,

        /// Field values as a JSON object.
        #[arg(long, value_parser = parse_json_object)]
        data: Value,
    },

    /// Update the given fields of a record.
    Update {
        table: String,
        sys_id: String,

        /// Field values as a JSON object.
        #[arg(long, value_parser = parse_json_object)]
        data: Value,
    },

    /// Replace a record.
    Replace {
        table: String,
        sys_id: String,

        /// Field values as a JSON object.
        #[arg(long, value_parser = parse_json_object)]
        data: Value,
    },

    /// Delete a record.
    Delete { table: String, sys_id: String },
}

/// Field selection shared by `table get` and `table list`.
#[derive(Args, Debug, Default)]
pub struct ViewArgs {
    /// Comma-separated column names.
    #[arg(long)]
    pub fields: Option<String>,

    /// How reference and choice fields are rendered.
    #[arg(long, value_enum)]
    pub display_value: Option<Display>,
}

/// `sysparm_display_value` choices.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Display {
    /// Display values.
    True,
    /// Stored values.
    False,
    /// Both.
    All,
}

impl From<Display> for DisplayValue {
    fn from(value: Display) -> Self {
        match value {
            Display::True => DisplayValue::True,
            Display::False => DisplayValue::False,
            Display::All => DisplayValue::All,
        }
    }
}

/// Attachment API operations.
#[derive(Subcommand, Debug)]
pub enum AttachmentCommand {
    /// Show attachment metadata.
    Get { sys_id: String },

    /// List attachments.
    List {
        /// Encoded query against `sys_attachment`.
        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        offset: Option<u32>,
    },

    /// Download an attachment's content.
    Download {
        sys_id: String,

        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Upload a file and attach it to a record.
    Upload {
        /// Table of the owning record.
        table: String,

        /// sys_id of the owning record.
        sys_id: String,

        /// File to upload.
        file: PathBuf,

        /// Name stored on the attachment; defaults to the file's name.
        #[arg(long)]
        file_name: Option<String>,

        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },

    /// Delete an attachment.
    Delete { sys_id: String },
}

/// Sync API operations.
#[derive(Subcommand, Debug)]
pub enum SyncCommand {
    /// Fetch an app's config.
    Config { app_id: String },

    /// Fetch the checksum of an app's config.
    ConfigChecksum { app_id: String },

    /// Fetch the checksum of an app's data.
    DataChecksum { app_id: String },
}

/// OAuth operations.
#[derive(Subcommand, Debug)]
pub enum OAuthCommand {
    /// Print the URL a user opens to authorize the client.
    AuthorizeUrl {
        #[arg(long, env = "NOW_CLIENT_ID")]
        client_id: String,

        #[arg(long, env = "NOW_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,
    },
}

/// Parse a `--data` argument.
pub fn parse_json_object(value: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(value) {
        Ok(json @ Value::Object(_)) => Ok(json),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}
