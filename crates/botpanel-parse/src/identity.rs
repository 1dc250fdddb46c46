//! Who the report is about and where the bot currently is.

use crate::marker;
use crate::text::grammar::{self, Header};
use crate::text::{first_fenced, Sections};
use crate::value::opt_str;
use botpanel_core::{BotInfo, Session, UNKNOWN_BOT};
use serde_json::Value;

const BOT_DIRECTORY_LABELS: &[&str] = &["bot path:", "bot directory:", "bot dir:"];
const WORKSPACE_NAME_LABELS: &[&str] = &["workspace:", "workspace name:"];
const WORKSPACE_DIRECTORY_LABELS: &[&str] = &["workspace path:", "workspace directory:"];

pub(crate) fn bot_from_value(bot: Option<&Value>) -> BotInfo {
    let Some(bot) = bot else {
        return BotInfo::default();
    };
    if let Some(name) = bot.as_str().map(str::trim).filter(|s| !s.is_empty()) {
        return BotInfo {
            name: name.to_string(),
            ..BotInfo::default()
        };
    }
    BotInfo {
        name: opt_str(bot, "name").unwrap_or_else(|| UNKNOWN_BOT.to_string()),
        bot_directory: opt_str(bot, "bot_directory"),
        workspace_name: opt_str(bot, "workspace_name"),
        workspace_directory: opt_str(bot, "workspace_directory"),
    }
}

/// Bot name from the `Bot:` line; detail labels may sit in the preamble or
/// anywhere in the bot section.
pub(crate) fn bot_from_text(sections: &Sections<'_>) -> BotInfo {
    let name = sections
        .bot
        .first()
        .map(|line| grammar::header_remainder(line, Header::Bot))
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_BOT)
        .to_string();

    let detail_lines: Vec<&str> = sections
        .preamble
        .iter()
        .chain(sections.bot.iter())
        .copied()
        .collect();
    let labelled = |labels: &[&str]| {
        detail_lines
            .iter()
            .find_map(|line| grammar::labelled_value(line, labels))
            .map(str::to_string)
    };

    BotInfo {
        name,
        bot_directory: labelled(BOT_DIRECTORY_LABELS),
        workspace_name: labelled(WORKSPACE_NAME_LABELS),
        workspace_directory: labelled(WORKSPACE_DIRECTORY_LABELS),
    }
}

/// `session.currentPosition`, or a bare breadcrumb string.
pub(crate) fn session_from_value(session: Option<&Value>) -> Session {
    let position = match session {
        Some(Value::String(s)) => Some(s.clone()),
        Some(obj) => opt_str(obj, "current_position"),
        None => None,
    };
    position
        .map(|p| Session::from_position(&p))
        .unwrap_or_default()
}

/// The breadcrumb is the first non-empty line of the progress section's
/// first fenced block that is not itself a progress row.
pub(crate) fn session_from_text(sections: &Sections<'_>) -> Session {
    let Some(progress) = sections.progress.as_deref() else {
        return Session::default();
    };
    first_fenced(progress)
        .unwrap_or_default()
        .into_iter()
        .map(grammar::clean_value)
        .find(|line| !line.is_empty() && marker::split_marker(line).is_none())
        .map(Session::from_position)
        .unwrap_or_default()
}
