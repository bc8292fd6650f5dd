//! Mobile sync configuration and payloads.

use serde::{Deserialize, Serialize};

/// Checksum of a config or data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub checksum: i64,
}

/// A payload together with its checksum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecksumData<T> {
    pub checksum: i64,
    pub data: T,
}

/// Application configuration as served by the sync endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    #[serde(default)]
    pub tables: Vec<AppTable>,
    #[serde(default)]
    pub lists: Vec<AppList>,
    #[serde(default)]
    pub forms: Vec<AppForm>,
    #[serde(default)]
    pub record_producers: Vec<RecordProducer>,
}

impl App {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&AppTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppTable {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub fields: Vec<AppField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppField {
    pub sys_id: String,
    pub label: String,
    pub name: String,
    pub table: String,
    /// Glide field type, e.g. `integer` or `choice`.
    #[serde(rename = "type", default)]
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppForm {
    pub sys_id: String,
    pub label: String,
    #[serde(default)]
    pub elements: Vec<AppElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppList {
    pub sys_id: String,
    pub label: String,
    #[serde(default)]
    pub elements: Vec<AppElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppElement {
    pub sys_id: String,
    pub position: i64,
    pub element: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordProducer {
    pub sys_id: String,
}

/// Record data for an app. The sync endpoint defines its layout per app, so
/// it is carried as plain JSON.
pub type AppData = serde_json::Value;
