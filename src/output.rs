//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use serde_json::Value;

use crate::{App, Attachment, Checksum, Record};

/// Trait for human-readable key-value output.
///
/// Implemented by entity types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for Record {
    fn pretty_print(&self) -> String {
        let header = format!("Record: {}", self.sys_id);
        let width = self.fields.keys().map(String::len).max().unwrap_or(0).max(14);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        let mut keys: Vec<&String> = self.fields.keys().collect();
        keys.sort();
        for key in keys {
            let shown = match self.display_value(key) {
                Some(value) => value.to_string(),
                None => match &self.fields[key] {
                    Value::Null => String::new(),
                    other => other.to_string(),
                },
            };
            lines.push(format!("{:<width$}  {}", format!("{key}:"), shown, width = width + 1));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Attachment {
    fn pretty_print(&self) -> String {
        let header = format!("Attachment: {}", self.sys_id);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![
            header,
            divider,
            format!("File:           {}", self.file_name),
            format!("Table:          {} / {}", self.table_name, self.table_sys_id),
        ];

        if let Some(ref content_type) = self.content_type {
            lines.push(format!("Content Type:   {}", content_type));
        }

        if let Some(size) = self.size_bytes {
            lines.push(format!("Size:           {} bytes", size));
        }

        if let Some(ref created) = self.sys_created_on {
            lines.push(format!("Created:        {}", created));
        }

        if let Some(ref link) = self.download_link {
            lines.push(format!("Download:       {}", link));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for App {
    fn pretty_print(&self) -> String {
        let header = format!("App: {}", self.id);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![
            header,
            divider,
            format!("Tables:         {}", self.tables.len()),
            format!("Lists:          {}", self.lists.len()),
            format!("Forms:          {}", self.forms.len()),
            format!("Producers:      {}", self.record_producers.len()),
        ];

        for table in &self.tables {
            lines.push(format!(
                "  {} ({}, {} fields)",
                table.name,
                table.label,
                table.fields.len()
            ));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Checksum {
    fn pretty_print(&self) -> String {
        format!("Checksum:       {}", self.checksum)
    }
}
