use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimal navigation state needed to put the user back where they were
/// after a restart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAppState {
    pub active_session_id: Option<String>,
    pub active_tab_index: Option<u32>,
    pub active_workspace_id: Option<String>,
    #[serde(default)]
    pub additional_data: HashMap<String, serde_json::Value>,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl SavedAppState {
    pub fn new() -> Self {
        Self {
            saved_at: Utc::now(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.active_session_id = Some(session_id.into());
        self
    }

    pub fn with_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.active_workspace_id = Some(workspace_id.into());
        self
    }

    pub fn with_tab(mut self, index: u32) -> Self {
        self.active_tab_index = Some(index);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.additional_data.insert(key.into(), value);
        self
    }

    /// Stamps the snapshot with the current time.
    pub fn touch(mut self) -> Self {
        self.saved_at = Utc::now();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.active_session_id.is_none()
            && self.active_tab_index.is_none()
            && self.active_workspace_id.is_none()
            && self.additional_data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keys() {
        let state = SavedAppState::new()
            .with_session("sess-1")
            .with_workspace("ws-9")
            .with_tab(2)
            .with_data("scroll", serde_json::json!(120));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["activeSessionId"], "sess-1");
        assert_eq!(json["activeWorkspaceId"], "ws-9");
        assert_eq!(json["activeTabIndex"], 2);
        assert_eq!(json["additionalData"]["scroll"], 120);
        assert!(json.get("savedAt").is_some());
    }

    #[test]
    fn test_parse_without_optional_fields() {
        let state: SavedAppState = serde_json::from_str(r#"{"activeSessionId":"abc"}"#).unwrap();
        assert_eq!(state.active_session_id.as_deref(), Some("abc"));
        assert!(state.additional_data.is_empty());
        assert!(!state.is_empty());
    }

    #[test]
    fn test_empty() {
        assert!(SavedAppState::new().is_empty());
    }
}
