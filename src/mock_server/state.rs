//! Mock server state management.
//!
//! Provides the in-memory data store for the mock ServiceNow instance:
//! table rows, attachments, sync apps, and the accounts and tokens used to
//! authenticate against it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::{
    format_glide_date_time, generate_characters, App, AppData, Attachment, CharacterSet,
    OAuthToken, Record,
};

/// State shared between the server and its handlers.
pub(crate) type SharedState = Arc<RwLock<MockState>>;

/// Lifetime reported for issued access tokens, in seconds.
pub const TOKEN_LIFETIME: i64 = 1800;

/// An attachment's metadata together with its content.
#[derive(Debug, Clone)]
pub struct StoredAttachment {
    pub meta: Attachment,
    pub content: Vec<u8>,
}

/// A sync app: its config, its record data and their checksums.
#[derive(Debug, Clone)]
pub struct MockApp {
    pub config: App,
    pub config_checksum: i64,
    pub data: AppData,
    pub data_checksum: i64,
}

/// Shared state for the mock server.
///
/// Authentication is only enforced once a Basic user or an OAuth client has
/// been registered; an empty state accepts every request.
#[derive(Debug, Default)]
pub struct MockState {
    /// Rows per table, keyed by sys_id.
    pub tables: HashMap<String, BTreeMap<String, Record>>,

    /// Attachments keyed by sys_id.
    pub attachments: BTreeMap<String, StoredAttachment>,

    /// Sync apps keyed by app id.
    pub apps: HashMap<String, MockApp>,

    /// Payloads received on the data sync endpoint, in arrival order.
    pub synced: Vec<AppData>,

    /// Basic credentials, username to password.
    pub users: HashMap<String, String>,

    /// OAuth clients, client id to secret.
    pub oauth_clients: HashMap<String, String>,

    /// Unused authorization codes, code to client id.
    pub authorization_codes: HashMap<String, String>,

    /// Live access tokens.
    pub access_tokens: HashSet<String>,

    /// Live refresh tokens, token to client id. Each is single use.
    pub refresh_tokens: HashMap<String, String>,

    /// Number of tokens issued so far.
    pub tokens_issued: u64,
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a row to a table.
    pub fn with_record(mut self, table: &str, record: Record) -> Self {
        self.insert_record(table, record);
        self
    }

    /// Add an attachment with its content.
    pub fn with_attachment(mut self, meta: Attachment, content: impl Into<Vec<u8>>) -> Self {
        self.attachments.insert(
            meta.sys_id.clone(),
            StoredAttachment {
                meta,
                content: content.into(),
            },
        );
        self
    }

    /// Add a sync app.
    pub fn with_app(mut self, config: App, data: AppData) -> Self {
        self.apps.insert(
            config.id.clone(),
            MockApp {
                config_checksum: checksum(&serde_json::to_value(&config).unwrap_or_default()),
                data_checksum: checksum(&data),
                config,
                data,
            },
        );
        self
    }

    /// Register a Basic user.
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.users
            .insert(username.to_string(), password.to_string());
        self
    }

    /// Register an OAuth client.
    pub fn with_oauth_client(mut self, client_id: &str, client_secret: &str) -> Self {
        self.oauth_clients
            .insert(client_id.to_string(), client_secret.to_string());
        self
    }

    /// Make an authorization code redeemable by `client_id`.
    pub fn with_authorization_code(mut self, code: &str, client_id: &str) -> Self {
        self.authorization_codes
            .insert(code.to_string(), client_id.to_string());
        self
    }

    /// Seed a live token pair for `client_id`.
    pub fn with_tokens(mut self, client_id: &str, access_token: &str, refresh_token: &str) -> Self {
        self.access_tokens.insert(access_token.to_string());
        self.refresh_tokens
            .insert(refresh_token.to_string(), client_id.to_string());
        self
    }

    /// Whether requests must carry valid credentials.
    pub fn auth_required(&self) -> bool {
        !self.users.is_empty() || !self.oauth_clients.is_empty()
    }

    /// Check an `Authorization` header value.
    pub fn is_authorized(&self, header: Option<&str>) -> bool {
        if !self.auth_required() {
            return true;
        }
        let Some((scheme, value)) = header.and_then(|h| h.split_once(' ')) else {
            return false;
        };

        if scheme.eq_ignore_ascii_case("basic") {
            let Ok(decoded) = STANDARD.decode(value.trim()) else {
                return false;
            };
            let decoded = String::from_utf8_lossy(&decoded);
            return match decoded.split_once(':') {
                Some((user, password)) => self.users.get(user).is_some_and(|p| p == password),
                None => false,
            };
        }

        scheme.eq_ignore_ascii_case("bearer") && self.access_tokens.contains(value.trim())
    }

    /// Revoke an access token, as if it had expired. Returns whether it was live.
    pub fn expire_access_token(&mut self, token: &str) -> bool {
        self.access_tokens.remove(token)
    }

    /// Revoke every access token.
    pub fn expire_all_access_tokens(&mut self) {
        self.access_tokens.clear();
    }

    /// Whether the client id and secret match a registered client.
    pub fn verify_client(&self, client_id: &str, client_secret: &str) -> bool {
        self.oauth_clients
            .get(client_id)
            .is_some_and(|secret| secret == client_secret)
    }

    /// Redeem an authorization code for a fresh token pair.
    pub fn redeem_code(&mut self, code: &str, client_id: &str) -> Option<OAuthToken> {
        if self.authorization_codes.get(code).map(String::as_str) != Some(client_id) {
            return None;
        }
        self.authorization_codes.remove(code);
        Some(self.issue_token(client_id))
    }

    /// Rotate a refresh token. The old refresh token stops working.
    pub fn redeem_refresh_token(&mut self, refresh_token: &str, client_id: &str) -> Option<OAuthToken> {
        if self.refresh_tokens.get(refresh_token).map(String::as_str) != Some(client_id) {
            return None;
        }
        self.refresh_tokens.remove(refresh_token);
        Some(self.issue_token(client_id))
    }

    fn issue_token(&mut self, client_id: &str) -> OAuthToken {
        self.tokens_issued += 1;
        let access_token = format!("access-{}", self.tokens_issued);
        let refresh_token = format!("refresh-{}", self.tokens_issued);

        self.access_tokens.insert(access_token.clone());
        self.refresh_tokens
            .insert(refresh_token.clone(), client_id.to_string());

        OAuthToken {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: TOKEN_LIFETIME,
            scope: Some("useraccount".to_string()),
        }
    }

    /// Get a row.
    pub fn get_record(&self, table: &str, sys_id: &str) -> Option<&Record> {
        self.tables.get(table)?.get(sys_id)
    }

    /// List the rows of a table matching an encoded query.
    ///
    /// Only `field=value` terms joined with `^` are understood; other terms
    /// (ordering, operators) are ignored.
    pub fn list_records(&self, table: &str, query: Option<&str>) -> Vec<&Record> {
        let terms = parse_query(query);
        self.tables
            .get(table)
            .map(|rows| {
                rows.values()
                    .filter(|r| terms.iter().all(|(k, v)| r.value(k) == Some(v.as_str())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Create a row, stamping sys_id and the audit columns.
    pub fn create_record(&mut self, table: &str, fields: Map<String, Value>) -> Record {
        let now = now();
        let mut record = Record {
            sys_id: new_sys_id(),
            fields,
        };
        record.fields.remove("sys_id");
        for key in ["sys_created_on", "sys_updated_on"] {
            record.fields.insert(key.to_string(), Value::String(now.clone()));
        }
        for key in ["sys_created_by", "sys_updated_by"] {
            record.fields.insert(key.to_string(), Value::String("admin".to_string()));
        }
        record
            .fields
            .insert("sys_mod_count".to_string(), Value::String("0".to_string()));

        self.insert_record(table, record.clone());
        record
    }

    /// Update a row. With `replace`, non-system columns not in `fields` are
    /// dropped; otherwise they are kept.
    pub fn update_record(
        &mut self,
        table: &str,
        sys_id: &str,
        fields: Map<String, Value>,
        replace: bool,
    ) -> Option<Record> {
        let record = self.tables.get_mut(table)?.get_mut(sys_id)?;

        if replace {
            record.fields.retain(|k, _| k.starts_with("sys_"));
        }
        for (key, value) in fields {
            if !key.starts_with("sys_") {
                record.fields.insert(key, value);
            }
        }

        let count = record
            .value("sys_mod_count")
            .and_then(|c| c.parse::<u64>().ok())
            .unwrap_or(0);
        record
            .fields
            .insert("sys_mod_count".to_string(), Value::String((count + 1).to_string()));
        record
            .fields
            .insert("sys_updated_on".to_string(), Value::String(now()));

        Some(record.clone())
    }

    /// Delete a row. Returns whether it existed.
    pub fn delete_record(&mut self, table: &str, sys_id: &str) -> bool {
        self.tables
            .get_mut(table)
            .and_then(|rows| rows.remove(sys_id))
            .is_some()
    }

    /// List attachments matching an encoded query on their metadata.
    pub fn list_attachments(&self, query: Option<&str>) -> Vec<&Attachment> {
        let terms = parse_query(query);
        self.attachments
            .values()
            .map(|a| &a.meta)
            .filter(|meta| {
                terms.iter().all(|(k, v)| {
                    let actual = match k.as_str() {
                        "table_name" => Some(meta.table_name.as_str()),
                        "table_sys_id" => Some(meta.table_sys_id.as_str()),
                        "file_name" => Some(meta.file_name.as_str()),
                        "content_type" => meta.content_type.as_deref(),
                        _ => None,
                    };
                    actual == Some(v.as_str())
                })
            })
            .collect()
    }

    /// Store an uploaded file and return its metadata.
    pub fn create_attachment(
        &mut self,
        table_name: &str,
        table_sys_id: &str,
        file_name: &str,
        content_type: &str,
        content: Vec<u8>,
        base_url: &str,
    ) -> Attachment {
        let sys_id = new_sys_id();
        let meta = Attachment {
            download_link: Some(format!("{base_url}/api/now/attachment/{sys_id}/file")),
            sys_id: sys_id.clone(),
            file_name: file_name.to_string(),
            table_name: table_name.to_string(),
            table_sys_id: table_sys_id.to_string(),
            content_type: Some(content_type.to_string()),
            size_bytes: Some(content.len() as u64),
            sys_created_on: Some(now()),
            sys_created_by: Some("admin".to_string()),
        };
        self.attachments.insert(
            sys_id,
            StoredAttachment {
                meta: meta.clone(),
                content,
            },
        );
        meta
    }

    /// Record a sync payload and move the data checksum of the app it names.
    pub fn sync_data(&mut self, data: AppData) {
        if let Some(app) = data
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| self.apps.get_mut(id))
        {
            app.data_checksum = app.data_checksum.wrapping_add(1);
        }
        self.synced.push(data);
    }

    fn insert_record(&mut self, table: &str, record: Record) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(record.sys_id.clone(), record);
    }
}

/// A fresh 32-character sys_id.
pub fn new_sys_id() -> String {
    generate_characters(32, CharacterSet::az09)
}

/// Java-style string hash of the JSON text, as the sync endpoint reports.
pub fn checksum(value: &Value) -> i64 {
    let text = value.to_string();
    let hash = text
        .encode_utf16()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(i32::from(c)));
    i64::from(hash)
}

fn now() -> String {
    format_glide_date_time(Utc::now().naive_utc())
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .unwrap_or_default()
        .split('^')
        .filter_map(|term| term.split_once('='))
        .filter(|(k, _)| !k.is_empty() && !k.starts_with("ORDERBY"))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(sys_id: &str, fields: Value) -> Record {
        let mut record: Record = serde_json::from_value(fields).unwrap();
        record.sys_id = sys_id.to_string();
        record
    }

    #[test]
    fn test_state_add_and_get_record() {
        let state = MockState::new().with_record("incident", record("abc123", json!({"number": "INC1"})));

        let found = state.get_record("incident", "abc123");
        assert!(found.is_some());
        assert_eq!(found.unwrap().value("number"), Some("INC1"));
        assert!(state.get_record("problem", "abc123").is_none());
    }

    #[test]
    fn test_state_list_records_with_query() {
        let state = MockState::new()
            .with_record("incident", record("a", json!({"active": "true", "priority": "1"})))
            .with_record("incident", record("b", json!({"active": "true", "priority": "3"})))
            .with_record("incident", record("c", json!({"active": "false", "priority": "1"})));

        assert_eq!(state.list_records("incident", None).len(), 3);
        assert_eq!(state.list_records("incident", Some("active=true")).len(), 2);
        assert_eq!(
            state
                .list_records("incident", Some("active=true^priority=1^ORDERBYnumber"))
                .len(),
            1
        );
        assert!(state.list_records("nope", None).is_empty());
    }

    #[test]
    fn test_create_and_update_record() {
        let mut state = MockState::new();
        let created = state.create_record(
            "incident",
            json!({"short_description": "Printer on fire", "priority": "2"})
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(created.sys_id.len(), 32);
        assert_eq!(created.value("sys_mod_count"), Some("0"));

        let patched = state
            .update_record(
                "incident",
                &created.sys_id,
                json!({"priority": "1"}).as_object().unwrap().clone(),
                false,
            )
            .unwrap();
        assert_eq!(patched.value("priority"), Some("1"));
        assert_eq!(patched.value("short_description"), Some("Printer on fire"));
        assert_eq!(patched.value("sys_mod_count"), Some("1"));

        let replaced = state
            .update_record(
                "incident",
                &created.sys_id,
                json!({"priority": "4"}).as_object().unwrap().clone(),
                true,
            )
            .unwrap();
        assert!(replaced.get("short_description").is_none());
        assert_eq!(replaced.value("sys_created_by"), Some("admin"));

        assert!(state.delete_record("incident", &created.sys_id));
        assert!(!state.delete_record("incident", &created.sys_id));
    }

    #[test]
    fn test_open_state_accepts_anything() {
        let state = MockState::new();
        assert!(state.is_authorized(None));
    }

    #[test]
    fn test_basic_authorization() {
        let state = MockState::new().with_user("admin", "admin");
        let good = format!("Basic {}", STANDARD.encode("admin:admin"));
        let bad = format!("Basic {}", STANDARD.encode("admin:wrong"));

        assert!(state.is_authorized(Some(&good)));
        assert!(!state.is_authorized(Some(&bad)));
        assert!(!state.is_authorized(None));
    }

    #[test]
    fn test_refresh_rotates_tokens() {
        let mut state = MockState::new()
            .with_oauth_client("id", "secret")
            .with_tokens("id", "access-seed", "refresh-seed");

        assert!(state.is_authorized(Some("Bearer access-seed")));
        assert!(state.expire_access_token("access-seed"));
        assert!(!state.is_authorized(Some("Bearer access-seed")));

        let token = state.redeem_refresh_token("refresh-seed", "id").unwrap();
        assert_eq!(token.access_token, "access-1");
        assert!(state.is_authorized(Some("Bearer access-1")));

        // single use
        assert!(state.redeem_refresh_token("refresh-seed", "id").is_none());
        // bound to its client
        assert!(state.redeem_refresh_token(&token.refresh_token, "other").is_none());
    }

    #[test]
    fn test_authorization_code_is_single_use() {
        let mut state = MockState::new()
            .with_oauth_client("id", "secret")
            .with_authorization_code("code-1", "id");

        assert!(state.verify_client("id", "secret"));
        assert!(!state.verify_client("id", "nope"));
        assert!(state.redeem_code("code-1", "id").is_some());
        assert!(state.redeem_code("code-1", "id").is_none());
    }

    #[test]
    fn test_checksum_is_stable() {
        let value = json!({"a": 1});
        assert_eq!(checksum(&value), checksum(&value));
        assert_ne!(checksum(&value), checksum(&json!({"a": 2})));
    }
}
