//! Attachment API shapes.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, DisplayFromStr, PickFirst};

/// Metadata of a `sys_attachment` record.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub sys_id: String,
    pub file_name: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub table_sys_id: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub download_link: Option<String>,
    #[serde(default)]
    pub sys_created_on: Option<String>,
    #[serde(default)]
    pub sys_created_by: Option<String>,
}

/// Parameters for listing attachments.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentListParams {
    pub sysparm_limit: Option<u32>,
    pub sysparm_offset: Option<u32>,
    /// Encoded query against `sys_attachment`.
    pub sysparm_query: Option<String>,
}

/// Optional parameters for uploads.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentUploadParams {
    pub creation_time: Option<String>,
    pub encryption_context: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attachment_from_table_api_shape() {
        let attachment: Attachment = serde_json::from_value(json!({
            "sys_id": "59a2f54f",
            "file_name": "hello.txt",
            "table_name": "sys_user",
            "table_sys_id": "a11589fd",
            "content_type": "text/plain",
            "size_bytes": "12",
            "download_link": "https://example.test/api/now/attachment/59a2f54f/file"
        }))
        .unwrap();

        assert_eq!(attachment.size_bytes, Some(12));
        assert_eq!(attachment.content_type.as_deref(), Some("text/plain"));
    }
}
