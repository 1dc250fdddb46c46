use serde::{Deserialize, Serialize};
use std::fmt;

/// Tri-state progress of a behavior, action, or operation.
///
/// A node's status comes from its own marker only. Nothing is inferred from
/// the node's position among its siblings, and several siblings may carry
/// `Current` when upstream data says so.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Current,
    Completed,
    #[default]
    Pending,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" | "in_progress" | "active" => Ok(Self::Current),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            "pending" | "todo" | "not_started" => Ok(Self::Pending),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_aliases() {
        assert_eq!("current".parse::<Status>().unwrap(), Status::Current);
        assert_eq!("Done".parse::<Status>().unwrap(), Status::Completed);
        assert_eq!(" todo ".parse::<Status>().unwrap(), Status::Pending);
        assert!("finished-ish".parse::<Status>().is_err());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&Status::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        assert_eq!(Status::Current.to_string(), "current");
    }
}
