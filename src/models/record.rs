//! Table records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::error::Result;
use crate::locale::parse_glide_date_time;

/// A field returned with `sysparm_display_value=all`. `sys_id` comes back in
/// this shape too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelValue {
    #[serde(alias = "display_value")]
    pub label: String,
    pub value: String,
}

/// Audit fields present on every table.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemRecord {
    pub sys_id: String,
    pub sys_created_on: String,
    pub sys_created_by: String,
    /// Sent as a string by the Table API; numbers are accepted too.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub sys_mod_count: u64,
    pub sys_updated_on: String,
    pub sys_updated_by: String,
}

impl SystemRecord {
    pub fn created_on(&self) -> Result<NaiveDateTime> {
        parse_glide_date_time(&self.sys_created_on)
    }

    pub fn updated_on(&self) -> Result<NaiveDateTime> {
        parse_glide_date_time(&self.sys_updated_on)
    }
}

/// A row from any table.
///
/// Only `sys_id` is typed; every other column lands in `fields`, since
/// which columns come back depends on the table and on `sysparm_fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "plain_or_labelled")]
    pub sys_id: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Accept a bare string or a [`LabelValue`], keeping the stored value.
fn plain_or_labelled<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Column {
        Plain(String),
        Labelled(LabelValue),
    }

    Ok(match Column::deserialize(deserializer)? {
        Column::Plain(value) => value,
        Column::Labelled(lv) => lv.value,
    })
}

impl Record {
    /// Raw JSON for a column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Stored value of a column.
    ///
    /// Works for plain string columns and for `{ display_value, value }`
    /// objects returned with `sysparm_display_value=all`.
    pub fn value(&self, name: &str) -> Option<&str> {
        if name == "sys_id" {
            return Some(&self.sys_id);
        }
        match self.fields.get(name)? {
            Value::String(s) => Some(s),
            Value::Object(obj) => obj.get("value").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Display value of a column, falling back to the stored value.
    pub fn display_value(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            Value::Object(obj) => obj
                .get("display_value")
                .or_else(|| obj.get("label"))
                .and_then(Value::as_str),
            _ => self.value(name),
        }
    }

    /// The audit columns, if they were all returned.
    pub fn system(&self) -> Option<SystemRecord> {
        let mut obj = Map::new();
        obj.insert("sys_id".to_string(), Value::String(self.sys_id.clone()));
        for key in [
            "sys_created_on",
            "sys_created_by",
            "sys_mod_count",
            "sys_updated_on",
            "sys_updated_by",
        ] {
            obj.insert(key.to_string(), Value::String(self.value(key)?.to_string()));
        }
        serde_json::from_value(Value::Object(obj)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_flattens_fields() {
        let record: Record = serde_json::from_value(json!({
            "sys_id": "abc123",
            "short_description": "Printer on fire",
            "caller_id": {"display_value": "Abel Tuter", "value": "62826bf0"}
        }))
        .unwrap();

        assert_eq!(record.sys_id, "abc123");
        assert_eq!(record.value("short_description"), Some("Printer on fire"));
        assert_eq!(record.value("caller_id"), Some("62826bf0"));
        assert_eq!(record.display_value("caller_id"), Some("Abel Tuter"));
        assert_eq!(record.value("sys_id"), Some("abc123"));
        assert!(record.value("missing").is_none());
    }

    #[test]
    fn test_system_record() {
        let record: Record = serde_json::from_value(json!({
            "sys_id": "abc123",
            "sys_created_on": "2025-05-30 16:24:06",
            "sys_created_by": "admin",
            "sys_mod_count": "4",
            "sys_updated_on": "2025-05-31 08:00:00",
            "sys_updated_by": "admin"
        }))
        .unwrap();

        let system = record.system().unwrap();
        assert_eq!(system.sys_mod_count, 4);
        assert_eq!(
            system.created_on().unwrap().to_string(),
            "2025-05-30 16:24:06"
        );
    }

    #[test]
    fn test_system_record_missing_fields() {
        let record = Record {
            sys_id: "x".to_string(),
            ..Default::default()
        };
        assert!(record.system().is_none());
    }

    #[test]
    fn test_mod_count_accepts_numbers() {
        let system: SystemRecord = serde_json::from_value(json!({
            "sys_id": "a",
            "sys_created_on": "",
            "sys_created_by": "",
            "sys_mod_count": 7,
            "sys_updated_on": "",
            "sys_updated_by": ""
        }))
        .unwrap();
        assert_eq!(system.sys_mod_count, 7);
    }

    #[test]
    fn test_labelled_sys_id() {
        let record: Record = serde_json::from_value(json!({
            "sys_id": {"display_value": "abc123", "value": "abc123"},
            "number": {"display_value": "INC0010001", "value": "INC0010001"}
        }))
        .unwrap();

        assert_eq!(record.sys_id, "abc123");
        assert!(!record.fields.contains_key("sys_id"));
        assert_eq!(record.display_value("number"), Some("INC0010001"));
    }

    #[test]
    fn test_label_value_alias() {
        let lv: LabelValue =
            serde_json::from_value(json!({"display_value": "High", "value": "1"})).unwrap();
        assert_eq!(lv.label, "High");
    }
}
