//! Scenarios: ordered request steps with captures and checks
//!
//! A [`Scenario`] replaces a load-test script with data. Each
//! [`ScenarioStep`] renders one [`RequestTemplate`], checks the response
//! against its [`Expectation`]s and captures values through
//! [`Extraction`]s. Captured values are bound for the remaining steps of
//! the same pass only.

use crate::config::ConfigError;
use crate::response::{value_to_binding, HttpResponse};
use crate::template::{Bindings, RequestTemplate};
use serde::{Deserialize, Deserializer, Serialize};

/// Binding holding the virtual user id
pub const VU_BINDING: &str = "__vu";

/// Binding holding the iteration index of the current pass
pub const ITERATION_BINDING: &str = "__iter";

/// Where an extraction reads its value from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum ExtractSource {
    /// JSON pointer into the response body (e.g. `/id`)
    JsonPointer {
        /// RFC 6901 pointer; a bare field name means a top-level field
        #[serde(deserialize_with = "deserialize_pointer")]
        pointer: String,
    },
    /// Response header
    Header {
        /// Header name, case-insensitive
        name: String,
    },
}

/// Capture a response value into a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Variable bound for later steps
    pub variable: String,
    /// Value source
    pub source: ExtractSource,
}

impl Extraction {
    /// Capture from the JSON body. A bare field name is treated as a top-level pointer.
    pub fn json(variable: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            source: ExtractSource::JsonPointer {
                pointer: normalize_pointer(pointer.into()),
            },
        }
    }

    /// Capture a response header
    pub fn header(variable: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            source: ExtractSource::Header { name: name.into() },
        }
    }

    /// Read the value from `response`
    pub fn apply(&self, response: &HttpResponse) -> Result<String, String> {
        match &self.source {
            ExtractSource::JsonPointer { pointer } => {
                let json = response.json().ok_or_else(|| {
                    format!("cannot capture `{}`: body is not JSON", self.variable)
                })?;
                json.pointer(pointer)
                    .and_then(value_to_binding)
                    .ok_or_else(|| {
                        format!("cannot capture `{}`: no value at {}", self.variable, pointer)
                    })
            }
            ExtractSource::Header { name } => response
                .header(name)
                .map(str::to_string)
                .ok_or_else(|| format!("cannot capture `{}`: no header {}", self.variable, name)),
        }
    }
}

/// A check applied to every response of a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    /// Exact status code
    Status {
        /// Expected code
        code: u16,
    },
    /// Any 2xx status
    SuccessStatus,
    /// JSON body has a value at `pointer` (`null` counts as present)
    JsonField {
        /// RFC 6901 pointer; a bare field name means a top-level field
        #[serde(deserialize_with = "deserialize_pointer")]
        pointer: String,
    },
    /// Body contains `text`
    BodyContains {
        /// Expected substring
        text: String,
    },
}

impl Expectation {
    /// Exact status code check
    pub fn status(code: u16) -> Self {
        Expectation::Status { code }
    }

    /// JSON field presence check
    pub fn json_field(pointer: impl Into<String>) -> Self {
        Expectation::JsonField {
            pointer: normalize_pointer(pointer.into()),
        }
    }

    /// Body substring check
    pub fn body_contains(text: impl Into<String>) -> Self {
        Expectation::BodyContains { text: text.into() }
    }

    /// Short description used in failure messages
    pub fn describe(&self) -> String {
        match self {
            Expectation::Status { code } => format!("is status {code}"),
            Expectation::SuccessStatus => "is status 2xx".to_string(),
            Expectation::JsonField { pointer } => {
                format!("is {} present", pointer.trim_start_matches('/'))
            }
            Expectation::BodyContains { text } => format!("body contains {text:?}"),
        }
    }

    /// Evaluate against a response
    pub fn check(&self, response: &HttpResponse) -> Result<(), String> {
        let passed = match self {
            Expectation::Status { code } => response.status == *code,
            Expectation::SuccessStatus => (200..300).contains(&response.status),
            Expectation::JsonField { pointer } => response
                .json()
                .and_then(|json| json.pointer(pointer))
                .is_some(),
            Expectation::BodyContains { text } => response.body.contains(text.as_str()),
        };

        if passed {
            Ok(())
        } else {
            Err(format!(
                "check failed: {} (status {})",
                self.describe(),
                response.status
            ))
        }
    }
}

fn normalize_pointer(pointer: String) -> String {
    if pointer.is_empty() || pointer.starts_with('/') {
        pointer
    } else {
        format!("/{pointer}")
    }
}

fn deserialize_pointer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(normalize_pointer)
}

/// One request of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStep {
    /// Step name, used to group results
    pub name: String,
    /// Request to issue
    pub request: RequestTemplate,
    /// Values captured for later steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extractions: Vec<Extraction>,
    /// Response checks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expectations: Vec<Expectation>,
}

impl ScenarioStep {
    /// Create a step without captures or checks
    pub fn new(name: impl Into<String>, request: RequestTemplate) -> Self {
        Self {
            name: name.into(),
            request,
            extractions: Vec::new(),
            expectations: Vec::new(),
        }
    }

    /// Add a capture
    pub fn extract(mut self, extraction: Extraction) -> Self {
        self.extractions.push(extraction);
        self
    }

    /// Add a check
    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// Named, ordered sequence of steps plus static variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Variables bound at the start of every pass
    #[serde(default)]
    pub variables: Bindings,
    /// Steps in execution order
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Create an empty scenario
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Bindings::new(),
            steps: Vec::new(),
        }
    }

    /// Bind a static variable
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Append a step
    pub fn step(mut self, step: ScenarioStep) -> Self {
        self.steps.push(step);
        self
    }

    /// A scenario needs at least one step
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::InvalidScenario(format!(
                "scenario `{}` has no steps",
                self.name
            )));
        }
        Ok(())
    }

    /// `(step, placeholder)` pairs that nothing binds before the step runs
    ///
    /// Static variables, built-in bindings and captures of earlier steps
    /// count as bound.
    pub fn unresolved_placeholders(&self) -> Vec<(String, String)> {
        let mut known: Vec<&str> = self.variables.keys().map(String::as_str).collect();
        known.push(VU_BINDING);
        known.push(ITERATION_BINDING);

        let mut unresolved = Vec::new();
        for step in &self.steps {
            for name in step.request.placeholders() {
                if !known.contains(&name.as_str()) {
                    unresolved.push((step.name.clone(), name));
                }
            }
            known.extend(step.extractions.iter().map(|e| e.variable.as_str()));
        }
        unresolved
    }
}
