//! Format dispatcher: structured payload first, free-text grammar second.

use crate::error::DecodeError;
use crate::identity::{bot_from_text, bot_from_value, session_from_text, session_from_value};
use crate::instructions::{classify, declared_action};
use crate::progress::{progress_from_lines, progress_from_value};
use crate::scope::{scope_from_lines, scope_from_value};
use crate::text::{self, InstructionsBlock, Sections};
use crate::usage::{
    commands_from_text, commands_from_value, parameters_from_lines, parameters_from_value,
    run_examples_from_lines, run_examples_from_value,
};
use crate::value::field;
use botpanel_core::{Session, StatusReport};
use serde_json::Value;
use tracing::debug;

/// A decoded value must carry at least one of these to count as a report.
const REPORT_KEYS: &[&str] = &[
    "bot",
    "behaviors",
    "session",
    "scope",
    "instructions",
    "parameters",
    "run_examples",
    "commands",
];

#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Action name fed to the instructions classifier instead of the one
    /// the report declares.
    pub action: Option<String>,
    /// Skip structured detection and read the input as free text.
    pub text_only: bool,
}

/// Normalize a raw report. Never fails: unreadable input yields a report
/// with every field defaulted.
pub fn dispatch(raw: &str) -> StatusReport {
    dispatch_with(raw, &DispatchOptions::default())
}

pub fn dispatch_with(raw: &str, options: &DispatchOptions) -> StatusReport {
    let action = options.action.as_deref();
    if !options.text_only {
        match decode_payload(raw) {
            Ok(payload) => return report_from_value(&payload, action),
            Err(err) => debug!(error = %err, "structured decode failed, reading as free text"),
        }
    }
    report_from_text(raw, action)
}

/// Normalize a report through the free-text grammar only.
pub fn dispatch_text(raw: &str) -> StatusReport {
    report_from_text(raw, None)
}

/// Normalize an already-decoded payload. A string value is read as free
/// text.
pub fn dispatch_value(payload: &Value) -> StatusReport {
    if let Some(text) = payload.as_str() {
        return report_from_text(text, None);
    }
    match check_payload(payload) {
        Ok(()) => report_from_value(payload, None),
        Err(err) => {
            debug!(error = %err, "decoded value is not a report");
            StatusReport::default()
        }
    }
}

/// Decode the first JSON value starting at the first `{` outside the
/// instructions block. Text after the value is ignored.
pub fn decode_payload(raw: &str) -> Result<Value, DecodeError> {
    let start = text::payload_start(raw).ok_or(DecodeError::NoPayload)?;
    let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
    let payload = stream.next().ok_or(DecodeError::NoPayload)??;
    check_payload(&payload)?;
    Ok(payload)
}

fn check_payload(payload: &Value) -> Result<(), DecodeError> {
    if !payload.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    if !REPORT_KEYS.iter().any(|key| field(payload, key).is_some()) {
        return Err(DecodeError::UnrecognizedPayload);
    }
    Ok(())
}

/// Override, then the breadcrumb's action, then the payload's own action.
fn resolve_action(override_action: Option<&str>, session: &Session, raw: Option<&Value>) -> String {
    override_action
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .or_else(|| Some(session.current_action.clone()).filter(|a| !a.is_empty()))
        .or_else(|| raw.map(declared_action))
        .unwrap_or_default()
}

fn report_from_value(payload: &Value, action: Option<&str>) -> StatusReport {
    let session = session_from_value(field(payload, "session"));
    let raw_instructions = field(payload, "instructions");
    let action = resolve_action(action, &session, raw_instructions);

    StatusReport {
        bot: bot_from_value(field(payload, "bot")),
        progress: progress_from_value(field(payload, "behaviors")),
        scope: scope_from_value(field(payload, "scope")),
        instructions: raw_instructions
            .map(|raw| classify(raw, &action))
            .unwrap_or_default(),
        parameters: parameters_from_value(field(payload, "parameters")),
        run_examples: run_examples_from_value(field(payload, "run_examples")),
        commands: commands_from_value(field(payload, "commands")),
        session,
    }
}

fn report_from_text(raw: &str, action: Option<&str>) -> StatusReport {
    let sections = Sections::split(raw);
    let session = session_from_text(&sections);
    let raw_instructions = sections.instructions.as_ref().and_then(instructions_payload);
    let action = resolve_action(action, &session, raw_instructions.as_ref());

    StatusReport {
        bot: bot_from_text(&sections),
        progress: progress_from_lines(sections.progress_lines()),
        scope: sections
            .scope
            .as_deref()
            .map(scope_from_lines)
            .unwrap_or_default(),
        instructions: raw_instructions
            .map(|raw| classify(&raw, &action))
            .unwrap_or_default(),
        parameters: sections
            .args
            .as_deref()
            .map(parameters_from_lines)
            .unwrap_or_default(),
        run_examples: sections
            .run
            .as_deref()
            .map(run_examples_from_lines)
            .unwrap_or_default(),
        commands: sections.commands.map(commands_from_text).unwrap_or_default(),
        session,
    }
}

/// Raw instructions from the text block: a fenced JSON or YAML payload is
/// decoded, anything else is taken as plain instruction text.
fn instructions_payload(block: &InstructionsBlock) -> Option<Value> {
    let text = match block {
        InstructionsBlock::Fenced { lang, body } => {
            if let Some(decoded) = decode_fenced(lang, body) {
                return Some(decoded);
            }
            body
        }
        InstructionsBlock::Text(text) => text,
    };
    (!text.trim().is_empty()).then(|| Value::String(text.clone()))
}

fn decode_fenced(lang: &str, body: &str) -> Option<Value> {
    let decoded = match lang {
        "yaml" | "yml" => serde_yaml::from_str::<Value>(body).map_err(|e| e.to_string()),
        "json" | "" => serde_json::from_str::<Value>(body).map_err(|e| e.to_string()),
        _ => return None,
    };
    match decoded {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(err) => {
            debug!(lang, error = %err, "fenced instructions are not structured");
            None
        }
    }
}
