use serde::{Deserialize, Serialize};

/// Separator between breadcrumb segments (`behavior.action.phase`).
pub const BREADCRUMB_DELIMITER: char = '.';

/// Where the bot currently is, as reported by its breadcrumb.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub current_position: String,
    pub current_behavior: String,
    pub current_action: String,
    pub action_phase: String,
    /// `behavior.action`, or just the behavior when no action is known.
    pub progress_path: String,
}

impl Session {
    /// Decompose a breadcrumb. An empty breadcrumb yields all-empty fields.
    pub fn from_position(position: &str) -> Self {
        let position = position.trim();
        if position.is_empty() {
            return Self::default();
        }

        let mut parts = position.splitn(3, BREADCRUMB_DELIMITER).map(str::trim);
        let behavior = parts.next().unwrap_or_default().to_string();
        let action = parts.next().unwrap_or_default().to_string();
        let phase = parts.next().unwrap_or_default().to_string();

        let progress_path = if action.is_empty() {
            behavior.clone()
        } else {
            format!("{behavior}{BREADCRUMB_DELIMITER}{action}")
        };

        Self {
            current_position: position.to_string(),
            current_behavior: behavior,
            current_action: action,
            action_phase: phase,
            progress_path,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current_position.is_empty()
    }
}
