use serde::Deserialize;

/// Payload of `GET /api/user/me`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: serde_json::Value,
}

impl CurrentUser {
    pub fn display_name(&self) -> String {
        match &self.user {
            serde_json::Value::String(name) => name.clone(),
            serde_json::Value::Null => "(unknown)".to_string(),
            other => other.to_string(),
        }
    }
}
