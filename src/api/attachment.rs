//! Attachment API wrapper.

use serde_json::Value;

use crate::auth::Credentials;
use crate::client::{default_base_url, NowClient};
use crate::error::Result;
use crate::models::{Attachment, AttachmentListParams, AttachmentUploadParams};
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Attachment API path.
pub const DEFAULT_ATTACHMENT_URL: &str = "/api/now/attachment";

/// Upload, download and manage `sys_attachment` records.
#[derive(Debug, Clone)]
pub struct AttachmentApi {
    client: NowClient,
}

impl AttachmentApi {
    /// Create a wrapper with its own client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(credentials: Credentials, base_url: Option<&str>) -> Result<Self> {
        let base_url = base_url.map_or_else(default_base_url, str::to_string);
        let client = NowClient::new(DEFAULT_ATTACHMENT_URL, &base_url)?;
        client.set_credentials(credentials);
        Ok(Self { client })
    }

    /// Create a wrapper on the same instance and credentials as `client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_client(client: &NowClient) -> Result<Self> {
        Ok(Self {
            client: client.for_api_path(DEFAULT_ATTACHMENT_URL)?,
        })
    }

    pub fn client(&self) -> &NowClient {
        &self.client
    }

    pub fn route(&self) -> String {
        self.client.route()
    }

    /// DELETE `/{sys_id}`.
    pub async fn delete_record(&self, sys_id: &str) -> Result<ApiResponse<Value>> {
        self.client.delete(&attachment_path(sys_id)).await
    }

    /// GET `/{sys_id}`: attachment metadata.
    pub async fn get_record(&self, sys_id: &str) -> Result<ApiResponse<Attachment>> {
        self.client.get(&attachment_path(sys_id)).await
    }

    /// GET the attachment collection.
    pub async fn get_records(
        &self,
        params: &AttachmentListParams,
    ) -> Result<ApiResponse<Vec<Attachment>>> {
        self.client.get_with_query("", params).await
    }

    /// GET `/{sys_id}/file`: the file content, as raw bytes.
    pub async fn get_attachment(&self, sys_id: &str) -> Result<ApiResponse<Vec<u8>>> {
        let request = ApiRequest::get(format!("{}/file", attachment_path(sys_id)))
            .header("Accept", "*/*")?;
        self.client.download(&request).await
    }

    /// POST `/file`: upload `data` and attach it to `table`/`sys_id`.
    pub async fn post_attachment(
        &self,
        table: &str,
        sys_id: &str,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
        params: &AttachmentUploadParams,
    ) -> Result<ApiResponse<Attachment>> {
        let request = ApiRequest::post("/file")
            .query_param("table_name", table)
            .query_param("table_sys_id", sys_id)
            .query_param("file_name", file_name)
            .query(params)?
            .bytes(content_type, data);
        self.client.request(&request).await
    }
}

fn attachment_path(sys_id: &str) -> String {
    format!("/{}", urlencoding::encode(sys_id))
}
