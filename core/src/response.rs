//! HTTP response as seen by a runner

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Response returned by an [`HttpClient`](crate::HttpClient)
///
/// Header names are stored lower-cased. The JSON body is parsed lazily, at
/// most once, the first time an expectation or extraction asks for it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Lower-cased header name to value
    pub headers: BTreeMap<String, String>,
    /// Response body as text
    pub body: String,
    json: OnceLock<Option<Value>>,
}

impl HttpResponse {
    /// Create a response without headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self::from_parts(status, BTreeMap::new(), body)
    }

    /// Create a response from all of its parts
    pub fn from_parts(
        status: u16,
        headers: BTreeMap<String, String>,
        body: impl Into<String>,
    ) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        Self {
            status,
            headers,
            body: body.into(),
            json: OnceLock::new(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parsed JSON body, `None` if the body is not JSON
    pub fn json(&self) -> Option<&Value> {
        self.json
            .get_or_init(|| serde_json::from_str(&self.body).ok())
            .as_ref()
    }

    /// Status below 400
    pub fn is_success_status(&self) -> bool {
        self.status < 400
    }
}

/// Textual form of a JSON value used for captured variables
///
/// Strings lose their quotes; `null` yields `None`.
pub fn value_to_binding(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200, "").with_header("X-Request-Id", "abc");
        assert_eq!(response.header("x-request-id"), Some("abc"));
        assert_eq!(response.header("X-REQUEST-ID"), Some("abc"));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn test_json_body_parsed() {
        let response = HttpResponse::new(200, r#"{"id": 1234, "title": "t"}"#);
        let json = response.json().unwrap();
        assert_eq!(json["id"], 1234);
        // Cached
        assert!(std::ptr::eq(json, response.json().unwrap()));
    }

    #[test]
    fn test_non_json_body() {
        let response = HttpResponse::new(503, "Service Unavailable");
        assert!(response.json().is_none());
        assert!(!response.is_success_status());
    }

    #[test]
    fn test_value_to_binding() {
        assert_eq!(value_to_binding(&json!("abc")), Some("abc".to_string()));
        assert_eq!(value_to_binding(&json!(1234)), Some("1234".to_string()));
        assert_eq!(value_to_binding(&json!(true)), Some("true".to_string()));
        assert_eq!(value_to_binding(&json!(null)), None);
        assert_eq!(value_to_binding(&json!([1, 2])), Some("[1,2]".to_string()));
    }
}
