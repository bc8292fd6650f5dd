//! Table API wrapper.

use serde::Serialize;
use serde_json::Value;

use crate::auth::Credentials;
use crate::client::{default_base_url, NowClient};
use crate::error::Result;
use crate::models::{Record, TableDeleteParams, TableGetParams, TableListParams, TableWriteParams};
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Table API path.
pub const DEFAULT_TABLE_URL: &str = "/api/now/table";

/// CRUD on records of any table.
///
/// # Example
///
/// ```no_run
/// use nowapi::{Credentials, TableApi, TableListParams};
///
/// # async fn example() -> nowapi::Result<()> {
/// let api = TableApi::new(Credentials::basic("admin", "pw"), Some("https://dev1.service-now.com"))?;
///
/// let params = TableListParams {
///     sysparm_limit: Some(10),
///     sysparm_query: Some("active=true".to_string()),
///     ..Default::default()
/// };
/// let response = api.get_records("incident", &params).await?;
/// for record in response.data().into_iter().flatten() {
///     println!("{}", record.sys_id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TableApi {
    client: NowClient,
}

impl TableApi {
    /// Create a wrapper with its own client.
    ///
    /// `base_url` defaults to [`default_base_url`].
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(credentials: Credentials, base_url: Option<&str>) -> Result<Self> {
        let base_url = base_url.map_or_else(default_base_url, str::to_string);
        let client = NowClient::new(DEFAULT_TABLE_URL, &base_url)?;
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
            client: client.for_api_path(DEFAULT_TABLE_URL)?,
        })
    }

    pub fn client(&self) -> &NowClient {
        &self.client
    }

    pub fn route(&self) -> String {
        self.client.route()
    }

    /// DELETE `/{table}/{sys_id}`.
    pub async fn delete_record(
        &self,
        table: &str,
        sys_id: &str,
        params: &TableDeleteParams,
    ) -> Result<ApiResponse<Value>> {
        let request = ApiRequest::delete(record_path(table, sys_id)).query(params)?;
        self.client.request(&request).await
    }

    /// GET `/{table}/{sys_id}`.
    pub async fn get_record(
        &self,
        table: &str,
        sys_id: &str,
        params: &TableGetParams,
    ) -> Result<ApiResponse<Record>> {
        let request = ApiRequest::get(record_path(table, sys_id)).query(params)?;
        self.client.request(&request).await
    }

    /// GET `/{table}`.
    pub async fn get_records(
        &self,
        table: &str,
        params: &TableListParams,
    ) -> Result<ApiResponse<Vec<Record>>> {
        let request = ApiRequest::get(table_path(table)).query(params)?;
        self.client.request(&request).await
    }

    /// PATCH `/{table}/{sys_id}`: update the given fields.
    pub async fn patch_record<B: Serialize + ?Sized>(
        &self,
        table: &str,
        sys_id: &str,
        body: &B,
        params: &TableWriteParams,
    ) -> Result<ApiResponse<Record>> {
        let request = ApiRequest::patch(record_path(table, sys_id))
            .query(params)?
            .json(body)?;
        self.client.request(&request).await
    }

    /// POST `/{table}`: create a record.
    pub async fn post_record<B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
        params: &TableWriteParams,
    ) -> Result<ApiResponse<Record>> {
        let request = ApiRequest::post(table_path(table)).query(params)?.json(body)?;
        self.client.request(&request).await
    }

    /// PUT `/{table}/{sys_id}`: replace a record.
    pub async fn put_record<B: Serialize + ?Sized>(
        &self,
        table: &str,
        sys_id: &str,
        body: &B,
        params: &TableWriteParams,
    ) -> Result<ApiResponse<Record>> {
        let request = ApiRequest::put(record_path(table, sys_id))
            .query(params)?
            .json(body)?;
        self.client.request(&request).await
    }
}

fn table_path(table: &str) -> String {
    format!("/{}", urlencoding::encode(table))
}

fn record_path(table: &str, sys_id: &str) -> String {
    format!("/{}/{}", urlencoding::encode(table), urlencoding::encode(sys_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route() {
        let api = TableApi::new(Credentials::basic("a", "b"), Some("https://example.test")).unwrap();
        assert_eq!(api.route(), "https://example.test/api/now/table");
        assert!(api.client().is_authenticated());
    }

    #[test]
    fn test_paths_are_encoded() {
        assert_eq!(record_path("incident", "abc123"), "/incident/abc123");
        assert_eq!(record_path("u table", "a/b"), "/u%20table/a%2Fb");
    }
}
