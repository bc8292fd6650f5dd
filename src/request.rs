//! Request descriptors.
//!
//! An [`ApiRequest`] captures everything needed to send one call: method,
//! target, query, headers and body. It is built once and can be sent more
//! than once, which is what lets the executor replay it after a token
//! refresh.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::{NowError, Result};

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as `application/json`.
    Json(Value),
    /// Sent as-is with the given content type.
    Bytes { content_type: String, data: Vec<u8> },
}

/// Description of a single API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<RequestBody>,
    omit_api_path: bool,
}

impl ApiRequest {
    /// A request with the given method against `url`.
    ///
    /// `url` is normally a path relative to the client's API path, e.g.
    /// `/incident/abc123`.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            omit_api_path: false,
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Add query parameters from any struct or map that serializes to a
    /// flat JSON object. `None` fields are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`NowError::InvalidQuery`] if `query` is not a flat object.
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        self.query.extend(query_pairs(query)?);
        Ok(self)
    }

    /// Add a single query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a header.
    ///
    /// # Errors
    ///
    /// Returns [`NowError::InvalidHeader`] if the name or value is not legal.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| NowError::InvalidHeader(format!("{name}: {e}")))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| NowError::InvalidHeader(format!("{name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Merge a prepared header map.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`NowError::ParseError`] if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Set a raw body with its content type.
    #[must_use]
    pub fn bytes(mut self, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Bytes {
            content_type: content_type.into(),
            data,
        });
        self
    }

    /// Resolve `url` against the base URL only, skipping the API path.
    #[must_use]
    pub fn omit_api_path(mut self) -> Self {
        self.omit_api_path = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn omits_api_path(&self) -> bool {
        self.omit_api_path
    }

    /// The full URL this request targets.
    ///
    /// Absolute `http(s)://` URLs are used verbatim; otherwise the result is
    /// `base_url + api_path + url`, or `base_url + url` when the API path is
    /// omitted.
    pub fn resolve(&self, base_url: &str, api_path: &str) -> String {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            return self.url.clone();
        }
        if self.omit_api_path {
            format!("{base_url}{}", self.url)
        } else {
            format!("{base_url}{api_path}{}", self.url)
        }
    }
}

/// Flatten a serializable value into query pairs.
fn query_pairs<Q: Serialize + ?Sized>(query: &Q) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(query)?;
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => return Err(NowError::InvalidQuery(format!("expected an object, got {other}"))),
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) => pairs.push((key, s)),
            Value::Bool(_) | Value::Number(_) => pairs.push((key, value.to_string())),
            Value::Array(_) | Value::Object(_) => {
                return Err(NowError::InvalidQuery(format!("'{key}' is not a scalar")));
            }
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Params {
        sysparm_limit: Option<u32>,
        sysparm_query: Option<String>,
        sysparm_exclude_reference_link: Option<bool>,
    }

    #[test]
    fn test_resolve_prefixes_api_path() {
        let req = ApiRequest::get("/incident/abc123");
        assert_eq!(
            req.resolve("https://example.test", "/api/now/table"),
            "https://example.test/api/now/table/incident/abc123"
        );
    }

    #[test]
    fn test_resolve_omit_api_path() {
        let req = ApiRequest::post("/api/x/oauth_relay").omit_api_path();
        assert_eq!(
            req.resolve("https://example.test", "/api/now/table"),
            "https://example.test/api/x/oauth_relay"
        );
    }

    #[test]
    fn test_resolve_absolute_url_is_verbatim() {
        let req = ApiRequest::get("https://other.test/x");
        assert_eq!(req.resolve("https://example.test", "/api"), "https://other.test/x");
    }

    #[test]
    fn test_query_skips_none_and_stringifies_scalars() {
        let req = ApiRequest::get("/incident")
            .query(&Params {
                sysparm_limit: Some(2),
                sysparm_query: None,
                sysparm_exclude_reference_link: Some(true),
            })
            .unwrap();

        let pairs: BTreeMap<_, _> = req.query_pairs().iter().cloned().collect();
        assert_eq!(pairs.get("sysparm_limit").map(String::as_str), Some("2"));
        assert_eq!(
            pairs.get("sysparm_exclude_reference_link").map(String::as_str),
            Some("true")
        );
        assert!(!pairs.contains_key("sysparm_query"));
    }

    #[test]
    fn test_query_rejects_non_object() {
        let result = ApiRequest::get("/x").query(&vec![1, 2]);
        assert!(matches!(result, Err(NowError::InvalidQuery(_))));
    }

    #[test]
    fn test_invalid_header_is_an_error() {
        let result = ApiRequest::get("/x").header("Bad Header", "v");
        assert!(matches!(result, Err(NowError::InvalidHeader(_))));
    }
}
