//! Task request body

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/task`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    /// Task title
    pub title: String,
    /// Free-form description
    pub details: String,
    /// Creation date as `YYYY-MM-DD`
    pub created_date: String,
}

impl Default for TaskPayload {
    fn default() -> Self {
        Self {
            title: "My First Task".to_string(),
            details: "Here you go, this is what i should do".to_string(),
            created_date: "2021-10-25".to_string(),
        }
    }
}

impl TaskPayload {
    /// Payload with the given title and default details
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_camel_case() {
        let json = serde_json::to_value(TaskPayload::default()).unwrap();

        assert_eq!(json["title"], "My First Task");
        assert_eq!(json["details"], "Here you go, this is what i should do");
        assert_eq!(json["createdDate"], "2021-10-25");
        assert!(json.get("created_date").is_none());
    }

    #[test]
    fn test_titled_payload() {
        let payload = TaskPayload::titled("t");
        assert_eq!(payload.title, "t");
        assert_eq!(payload.created_date, "2021-10-25");
    }
}
