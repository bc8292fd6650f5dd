//! Mobile sync API wrapper.

use crate::auth::Credentials;
use crate::client::{default_base_url, NowClient};
use crate::error::Result;
use crate::models::{App, AppData, Checksum, ChecksumData};
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Sync API path on the scoped app.
pub const DEFAULT_SYNC_URL: &str = "/api/x_flowm_mobile/sync";

/// Config and data synchronisation for mobile apps.
///
/// Configs and data sets come with checksums so a device can poll the cheap
/// checksum endpoints and only download when something changed.
#[derive(Debug, Clone)]
pub struct SyncApi {
    client: NowClient,
}

impl SyncApi {
    /// Create a wrapper with its own client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(credentials: Credentials, base_url: Option<&str>) -> Result<Self> {
        let base_url = base_url.map_or_else(default_base_url, str::to_string);
        let client = NowClient::new(DEFAULT_SYNC_URL, &base_url)?;
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
            client: client.for_api_path(DEFAULT_SYNC_URL)?,
        })
    }

    pub fn client(&self) -> &NowClient {
        &self.client
    }

    pub fn route(&self) -> String {
        self.client.route()
    }

    /// GET `/config?id=`.
    pub async fn get_config(&self, app_id: &str) -> Result<ApiResponse<ChecksumData<App>>> {
        self.client
            .request(&ApiRequest::get("/config").query_param("id", app_id))
            .await
    }

    /// GET `/config/checksum?id=`.
    pub async fn get_config_checksum(&self, app_id: &str) -> Result<ApiResponse<Checksum>> {
        self.client
            .request(&ApiRequest::get("/config/checksum").query_param("id", app_id))
            .await
    }

    /// POST `/data` with the app config to fetch its records.
    pub async fn get_data(&self, config: &App) -> Result<ApiResponse<ChecksumData<AppData>>> {
        self.client.post("/data", config).await
    }

    /// GET `/data/checksum?id=`.
    pub async fn get_data_checksum(&self, app_id: &str) -> Result<ApiResponse<Checksum>> {
        self.client
            .request(&ApiRequest::get("/data/checksum").query_param("id", app_id))
            .await
    }

    /// POST `/data/sync`: push local changes.
    pub async fn sync_data(&self, data: &AppData) -> Result<ApiResponse<bool>> {
        self.client.post("/data/sync", data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route() {
        let api = SyncApi::new(Credentials::basic("a", "b"), Some("https://example.test")).unwrap();
        assert_eq!(api.route(), "https://example.test/api/x_flowm_mobile/sync");
    }
}
