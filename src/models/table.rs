//! Table API query parameters.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// How reference and choice fields are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayValue {
    /// Display values.
    True,
    /// Stored values.
    False,
    /// Both, as `{ display_value, value }` objects.
    All,
}

/// UI view used to pick the returned fields when listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListView {
    Desktop,
    Mobile,
    Both,
}

/// Parameters for deleting a record.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDeleteParams {
    pub sysparm_query_no_domain: Option<bool>,
}

/// Parameters for fetching a single record.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableGetParams {
    pub sysparm_display_value: Option<DisplayValue>,
    pub sysparm_exclude_reference_link: Option<bool>,
    /// Comma-separated column names.
    pub sysparm_fields: Option<String>,
    pub sysparm_view: Option<String>,
    pub sysparm_query_no_domain: Option<bool>,
}

/// Parameters for listing records.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableListParams {
    pub sysparm_display_value: Option<DisplayValue>,
    pub sysparm_exclude_reference_link: Option<bool>,
    pub sysparm_fields: Option<String>,
    pub sysparm_limit: Option<u32>,
    pub sysparm_no_count: Option<bool>,
    pub sysparm_offset: Option<u32>,
    /// Encoded query, e.g. `active=true^ORDERBYnumber`.
    pub sysparm_query: Option<String>,
    pub sysparm_query_category: Option<String>,
    pub sysparm_query_no_domain: Option<bool>,
    pub sysparm_suppress_pagination_header: Option<bool>,
    pub sysparm_view: Option<ListView>,
}

/// Parameters for creating, updating or replacing a record.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableWriteParams {
    pub sysparm_display_value: Option<DisplayValue>,
    pub sysparm_exclude_reference_link: Option<bool>,
    pub sysparm_fields: Option<String>,
    /// Treat input values as display values.
    pub sysparm_input_display_value: Option<bool>,
    pub sysparm_view: Option<String>,
    pub sysparm_query_no_domain: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_params_skip_none() {
        let params = TableListParams {
            sysparm_limit: Some(2),
            sysparm_display_value: Some(DisplayValue::All),
            sysparm_view: Some(ListView::Mobile),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "sysparm_limit": 2,
                "sysparm_display_value": "all",
                "sysparm_view": "mobile"
            })
        );
    }

    #[test]
    fn test_default_params_are_empty() {
        assert_eq!(
            serde_json::to_value(TableGetParams::default()).unwrap(),
            json!({})
        );
    }
}
