use crate::time::TimeValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub project_start: TimeValue,
    #[serde(default)]
    pub manager: String,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            name: "New Project".to_string(),
            description: "No description".to_string(),
            // 2025-01-06, a Monday
            project_start: TimeValue::compose(2025, 1, 6, 0, 0, 0).unwrap_or_default(),
            manager: String::new(),
        }
    }
}
