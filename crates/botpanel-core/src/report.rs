use crate::instructions::InstructionsModel;
use crate::progress::BehaviorNode;
use crate::scope::ScopeTree;
use crate::session::Session;
use serde::{Deserialize, Serialize};

/// Name reported when the report identifies no bot.
pub const UNKNOWN_BOT: &str = "unknown bot";

/// The normalized view of one bot status report.
///
/// Built fresh by every parse; every field has a default so partial reports
/// still produce a complete value.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StatusReport {
    #[serde(default)]
    pub bot: BotInfo,
    #[serde(default)]
    pub progress: Vec<BehaviorNode>,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub scope: ScopeTree,
    #[serde(default)]
    pub instructions: InstructionsModel,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub run_examples: Vec<RunExample>,
    #[serde(default)]
    pub commands: CommandsSummary,
}

impl StatusReport {
    /// True when nothing was recovered from the input.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BotInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_directory: Option<String>,
}

impl Default for BotInfo {
    fn default() -> Self {
        Self {
            name: UNKNOWN_BOT.to_string(),
            bot_directory: None,
            workspace_name: None,
            workspace_directory: None,
        }
    }
}

/// A CLI parameter the bot accepts.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Parameter {
    pub flag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub syntax: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunExample {
    pub command: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// The "Commands" line: its raw text and the individual command names.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandsSummary {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<String>,
}
