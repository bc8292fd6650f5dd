//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use serde_json::{json, Map, Value};

use crate::{App, AppData, AppElement, AppField, AppForm, AppTable, Attachment, Record};

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    pub const USERNAME: &'static str = "admin";
    pub const PASSWORD: &'static str = "admin";
    pub const CLIENT_ID: &'static str = "mobile-client";
    pub const CLIENT_SECRET: &'static str = "mobile-secret";
    pub const ACCESS_TOKEN: &'static str = "access-seed";
    pub const REFRESH_TOKEN: &'static str = "refresh-seed";
    pub const AUTHORIZATION_CODE: &'static str = "auth-code";
    pub const INCIDENT_SYS_ID: &'static str = "abc123";
    pub const ATTACHMENT_SYS_ID: &'static str = "59a2f54f0a0a0b1200e2d1e6b4f4f5c1";
    pub const APP_ID: &'static str = "x_flowm_app";

    // =========================================================================
    // Record Fixtures
    // =========================================================================

    /// Create a record from a sys_id and a JSON object of columns.
    pub fn record(sys_id: &str, fields: Value) -> Record {
        Record {
            sys_id: sys_id.to_string(),
            fields: fields.as_object().cloned().unwrap_or_else(Map::new),
        }
    }

    /// Create an incident with the usual audit columns.
    pub fn incident(sys_id: &str, number: &str, short_description: &str, priority: u8) -> Record {
        Self::record(
            sys_id,
            json!({
                "number": number,
                "short_description": short_description,
                "priority": priority.to_string(),
                "active": "true",
                "state": "1",
                "caller_id": {
                    "link": "https://instance.service-now.com/api/now/table/sys_user/6816f79cc0a8016401c5a33be04be441",
                    "value": "6816f79cc0a8016401c5a33be04be441"
                },
                "sys_created_on": "2024-03-01 09:15:00",
                "sys_created_by": "admin",
                "sys_updated_on": "2024-03-02 10:30:00",
                "sys_updated_by": "admin",
                "sys_mod_count": "2"
            }),
        )
    }

    // =========================================================================
    // Attachment Fixtures
    // =========================================================================

    /// Create attachment metadata for a text file on a record.
    pub fn text_attachment(sys_id: &str, table: &str, table_sys_id: &str, file_name: &str, size: u64) -> Attachment {
        Attachment {
            sys_id: sys_id.to_string(),
            file_name: file_name.to_string(),
            table_name: table.to_string(),
            table_sys_id: table_sys_id.to_string(),
            content_type: Some("text/plain".to_string()),
            size_bytes: Some(size),
            download_link: None,
            sys_created_on: Some("2024-03-01 09:20:00".to_string()),
            sys_created_by: Some("admin".to_string()),
        }
    }

    // =========================================================================
    // Sync Fixtures
    // =========================================================================

    /// Create an app config exposing the incident table on one form.
    pub fn incident_app(id: &str) -> App {
        let field = |sys_id: &str, label: &str, name: &str, field_type: &str| AppField {
            sys_id: sys_id.to_string(),
            label: label.to_string(),
            name: name.to_string(),
            table: "incident".to_string(),
            field_type: field_type.to_string(),
        };

        App {
            id: id.to_string(),
            tables: vec![AppTable {
                name: "incident".to_string(),
                label: "Incident".to_string(),
                fields: vec![
                    field("f1", "Number", "number", "string"),
                    field("f2", "Short description", "short_description", "string"),
                    field("f3", "Priority", "priority", "integer"),
                ],
            }],
            lists: vec![],
            forms: vec![AppForm {
                sys_id: "form1".to_string(),
                label: "Incident".to_string(),
                elements: vec![
                    AppElement {
                        sys_id: "e1".to_string(),
                        position: 0,
                        element: "short_description".to_string(),
                    },
                    AppElement {
                        sys_id: "e2".to_string(),
                        position: 1,
                        element: "priority".to_string(),
                    },
                ],
            }],
            record_producers: vec![],
        }
    }

    /// Record data for [`incident_app`](Self::incident_app).
    pub fn incident_app_data() -> AppData {
        json!({
            "incident": [
                {"sys_id": Self::INCIDENT_SYS_ID, "number": "INC0010001", "priority": "1"}
            ]
        })
    }

    // =========================================================================
    // Scenario Builders
    // =========================================================================

    /// Create a default set of test data for common scenarios.
    pub fn default_scenario() -> DefaultScenario {
        DefaultScenario::new()
    }
}

/// A complete test scenario with related entities and accounts.
pub struct DefaultScenario {
    pub records: Vec<(String, Record)>,
    pub attachments: Vec<(Attachment, Vec<u8>)>,
    pub apps: Vec<(App, AppData)>,
}

impl DefaultScenario {
    fn new() -> Self {
        let records = vec![
            (
                "incident".to_string(),
                Fixtures::incident(Fixtures::INCIDENT_SYS_ID, "INC0010001", "Email server down", 1),
            ),
            (
                "incident".to_string(),
                Fixtures::incident("def456", "INC0010002", "Printer jammed", 4),
            ),
            (
                "sys_user".to_string(),
                Fixtures::record(
                    "6816f79cc0a8016401c5a33be04be441",
                    json!({"user_name": "admin", "name": "System Administrator"}),
                ),
            ),
        ];

        let content = b"hello world\n".to_vec();
        let attachments = vec![(
            Fixtures::text_attachment(
                Fixtures::ATTACHMENT_SYS_ID,
                "incident",
                Fixtures::INCIDENT_SYS_ID,
                "notes.txt",
                content.len() as u64,
            ),
            content,
        )];

        let apps = vec![(
            Fixtures::incident_app(Fixtures::APP_ID),
            Fixtures::incident_app_data(),
        )];

        Self {
            records,
            attachments,
            apps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_has_system_columns() {
        let incident = Fixtures::incident("abc", "INC1", "Broken", 2);
        let system = incident.system().unwrap();
        assert_eq!(system.sys_mod_count, 2);
        assert_eq!(incident.value("priority"), Some("2"));
        assert_eq!(incident.value("caller_id"), Some("6816f79cc0a8016401c5a33be04be441"));
    }

    #[test]
    fn test_incident_app() {
        let app = Fixtures::incident_app("x_app");
        assert_eq!(app.id, "x_app");
        assert_eq!(app.table("incident").unwrap().fields.len(), 3);
    }

    #[test]
    fn test_default_scenario() {
        let scenario = Fixtures::default_scenario();
        assert!(!scenario.records.is_empty());
        assert!(!scenario.attachments.is_empty());
        assert!(!scenario.apps.is_empty());
    }
}
