//! Request templates and placeholder rendering
//!
//! A [`RequestTemplate`] is an immutable description of one HTTP call.
//! Placeholders use the `{{name}}` syntax and may appear in the URL, header
//! values and body. Rendering is pure: the same bindings always produce the
//! same [`RenderedRequest`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Variable bindings visible to a template
pub type Bindings = HashMap<String, String>;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// Upper-case method name
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(format!("Unknown HTTP method: {}", s)),
        }
    }
}

/// Template rendering errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A placeholder had no bound value
    #[error("missing binding for placeholder `{name}`")]
    MissingBinding {
        /// Placeholder name
        name: String,
    },
}

/// Immutable description of one HTTP call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTemplate {
    method: HttpMethod,
    url_template: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body_template: Option<String>,
}

impl RequestTemplate {
    /// Create a template without headers or body
    pub fn new(method: HttpMethod, url_template: impl Into<String>) -> Self {
        Self {
            method,
            url_template: url_template.into(),
            headers: BTreeMap::new(),
            body_template: None,
        }
    }

    /// GET template
    pub fn get(url_template: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url_template)
    }

    /// POST template
    pub fn post(url_template: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url_template)
    }

    /// Add a header (the value may contain placeholders)
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body template
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body_template = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `Content-Type`
    pub fn json_body<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(value)?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }

    /// HTTP method
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Unrendered URL
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Unrendered headers
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Unrendered body
    pub fn body_template(&self) -> Option<&str> {
        self.body_template.as_deref()
    }

    /// Placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let sources = std::iter::once(self.url_template.as_str())
            .chain(self.headers.values().map(String::as_str))
            .chain(self.body_template.as_deref());

        for source in sources {
            for name in placeholder_names(source) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// Substitute placeholders
    ///
    /// Fails with [`TemplateError::MissingBinding`] on the first placeholder
    /// without a value.
    pub fn render(&self, bindings: &Bindings) -> Result<RenderedRequest, TemplateError> {
        let url = substitute(&self.url_template, bindings)?;

        let mut headers = BTreeMap::new();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), substitute(value, bindings)?);
        }

        let body = match &self.body_template {
            Some(body) => Some(substitute(body, bindings)?),
            None => None,
        };

        Ok(RenderedRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }
}

/// A request ready to be sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    /// Header name to value
    pub headers: BTreeMap<String, String>,
    /// Request body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Iterate over placeholder names; an unterminated `{{` ends the scan
fn placeholder_names(template: &str) -> impl Iterator<Item = &str> {
    let mut rest = template;
    std::iter::from_fn(move || {
        let open = rest.find(OPEN)?;
        let after = &rest[open + OPEN.len()..];
        let close = after.find(CLOSE)?;
        rest = &after[close + CLOSE.len()..];
        Some(after[..close].trim())
    })
}

fn substitute(template: &str, bindings: &Bindings) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(OPEN) {
        let after = &rest[open + OPEN.len()..];
        let Some(close) = after.find(CLOSE) else {
            break;
        };

        out.push_str(&rest[..open]);
        let name = after[..close].trim();
        match bindings.get(name) {
            Some(value) => out.push_str(value),
            None => {
                return Err(TemplateError::MissingBinding {
                    name: name.to_string(),
                })
            }
        }
        rest = &after[close + CLOSE.len()..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_url_headers_and_body() {
        let template = RequestTemplate::post("{{base_url}}/api/v1/task")
            .header("Content-Type", "application/json")
            .header("X-User", "vu-{{ __vu }}")
            .body(r#"{"title":"{{title}}"}"#);

        let rendered = template
            .render(&bindings(&[
                ("base_url", "http://localhost:8000"),
                ("__vu", "3"),
                ("title", "t"),
            ]))
            .unwrap();

        assert_eq!(rendered.method, HttpMethod::Post);
        assert_eq!(rendered.url, "http://localhost:8000/api/v1/task");
        assert_eq!(rendered.headers["X-User"], "vu-3");
        assert_eq!(rendered.headers["Content-Type"], "application/json");
        assert_eq!(rendered.body.as_deref(), Some(r#"{"title":"t"}"#));
    }

    #[test]
    fn test_render_is_idempotent() {
        let template = RequestTemplate::get("{{base_url}}/api/v1/task/{{id}}");
        let vars = bindings(&[("base_url", "http://h"), ("id", "42")]);

        let first = template.render(&vars).unwrap();
        let second = template.render(&vars).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.url, "http://h/api/v1/task/42");
    }

    #[test]
    fn test_missing_binding_fails_every_time() {
        let template = RequestTemplate::get("{{base_url}}/api/v1/task/{{id}}");
        let vars = bindings(&[("base_url", "http://h")]);

        for _ in 0..3 {
            assert_eq!(
                template.render(&vars),
                Err(TemplateError::MissingBinding {
                    name: "id".to_string()
                })
            );
        }
    }

    #[test]
    fn test_missing_binding_in_body() {
        let template = RequestTemplate::post("http://h/x").body("{{payload}}");
        let err = template.render(&Bindings::new()).unwrap_err();
        assert_eq!(err.to_string(), "missing binding for placeholder `payload`");
    }

    #[test]
    fn test_unterminated_placeholder_is_literal() {
        let template = RequestTemplate::get("http://h/{{id");
        let rendered = template.render(&Bindings::new()).unwrap();
        assert_eq!(rendered.url, "http://h/{{id");
        assert!(template.placeholders().is_empty());
    }

    #[test]
    fn test_json_body_without_placeholders_untouched() {
        let template = RequestTemplate::post("http://h/x")
            .json_body(&serde_json::json!({"a": {"b": {"c": 1}}}))
            .unwrap();

        let rendered = template.render(&Bindings::new()).unwrap();
        assert_eq!(rendered.body.as_deref(), Some(r#"{"a":{"b":{"c":1}}}"#));
        assert_eq!(rendered.headers["Content-Type"], "application/json");
    }

    #[test]
    fn test_placeholders_in_order_without_duplicates() {
        let template = RequestTemplate::post("{{base_url}}/task/{{id}}")
            .header("X-Trace", "{{trace}}")
            .body("{{id}}-{{title}}");

        assert_eq!(
            template.placeholders(),
            vec!["base_url", "id", "trace", "title"]
        );
    }

    #[test]
    fn test_method_parse_and_display() {
        assert_eq!("post".parse::<HttpMethod>(), Ok(HttpMethod::Post));
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert!("FETCH".parse::<HttpMethod>().is_err());
        assert_eq!(serde_json::to_string(&HttpMethod::Get).unwrap(), "\"GET\"");
    }
}
