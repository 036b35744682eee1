use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Contents of `global_preferences.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPreferences {
    pub last_opened_profile: Option<String>,
}

impl GlobalPreferences {
    /// Lenient read: anything unexpected falls back to the defaults.
    pub fn from_json_lenient(content: &str) -> Self {
        let parsed: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(_) => return Self::default(),
        };

        let Some(object) = parsed.as_object() else {
            return Self::default();
        };

        Self {
            last_opened_profile: object
                .get("last_opened_profile")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}
