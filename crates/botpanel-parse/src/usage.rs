//! CLI usage hints: accepted parameters, run examples, and the commands line.

use crate::text::block_lines;
use crate::value::{field, get_str, opt_str, scalar_text, string_list};
use botpanel_core::{CommandsSummary, Parameter, RunExample};
use serde_json::Value;

const COMMENT_PREFIX: char = '#';
const INLINE_COMMENT: &str = " # ";
const DESCRIPTION_SEPARATOR: &str = " - ";
const COLUMN_GAP: &str = "  ";
const COMMAND_SEPARATOR: char = '|';
const SHELL_PROMPT: &str = "$ ";

// ── Parameters ──

pub(crate) fn parameters_from_value(v: Option<&Value>) -> Vec<Parameter> {
    let Some(Value::Array(items)) = v else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(line) => parameter_from_line(line),
            Value::Object(_) => Some(Parameter {
                flag: opt_str(item, "flag").or_else(|| opt_str(item, "name"))?,
                syntax: get_str(item, "syntax"),
                description: get_str(item, "description"),
            }),
            _ => None,
        })
        .collect()
}

/// `Args:` block lines, one parameter per line.
pub(crate) fn parameters_from_lines(lines: &[&str]) -> Vec<Parameter> {
    block_lines(lines)
        .into_iter()
        .filter_map(parameter_from_line)
        .collect()
}

/// `--flag <syntax> - description`, or columns separated by two spaces.
fn parameter_from_line(line: &str) -> Option<Parameter> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
        return None;
    }
    let (head, description) = line
        .split_once(DESCRIPTION_SEPARATOR)
        .or_else(|| line.split_once(COLUMN_GAP))
        .map(|(head, desc)| (head.trim(), desc.trim()))
        .unwrap_or((line, ""));
    let (flag, syntax) = head
        .split_once(char::is_whitespace)
        .map(|(flag, syntax)| (flag, syntax.trim()))
        .unwrap_or((head, ""));
    Some(Parameter {
        flag: flag.to_string(),
        syntax: syntax.to_string(),
        description: description.to_string(),
    })
}

// ── Run examples ──

pub(crate) fn run_examples_from_value(v: Option<&Value>) -> Vec<RunExample> {
    let Some(Value::Array(items)) = v else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => Some(RunExample {
                command: opt_str(item, "command")?,
                description: get_str(item, "description"),
            }),
            other => {
                let (command, description) = split_inline_comment(&scalar_text(other)?);
                (!command.is_empty()).then_some(RunExample {
                    command,
                    description,
                })
            }
        })
        .collect()
}

/// `Run:` block lines. A standalone `# comment` describes the next command;
/// a trailing ` # comment` describes its own line.
pub(crate) fn run_examples_from_lines(lines: &[&str]) -> Vec<RunExample> {
    let mut examples = Vec::new();
    let mut pending: Option<String> = None;

    for line in block_lines(lines) {
        let line = line.trim();
        if let Some(comment) = line.strip_prefix(COMMENT_PREFIX) {
            pending = Some(comment.trim().to_string()).filter(|c| !c.is_empty());
            continue;
        }
        let (command, inline) = split_inline_comment(line);
        if command.is_empty() {
            continue;
        }
        let description = if inline.is_empty() {
            pending.take().unwrap_or_default()
        } else {
            pending = None;
            inline
        };
        examples.push(RunExample {
            command,
            description,
        });
    }
    examples
}

fn split_inline_comment(line: &str) -> (String, String) {
    let line = line.trim();
    let line = line.strip_prefix(SHELL_PROMPT).unwrap_or(line);
    match line.split_once(INLINE_COMMENT) {
        Some((command, comment)) => (command.trim().to_string(), comment.trim().to_string()),
        None => (line.to_string(), String::new()),
    }
}

// ── Commands ──

pub(crate) fn commands_from_value(v: Option<&Value>) -> CommandsSummary {
    match v {
        Some(Value::String(text)) => commands_from_text(text),
        Some(list @ Value::Array(_)) => {
            let list = string_list(Some(list));
            CommandsSummary {
                text: list.join(" | "),
                list,
            }
        }
        Some(obj @ Value::Object(_)) => {
            let text = get_str(obj, "text");
            let list = string_list(field(obj, "list"));
            if list.is_empty() {
                commands_from_text(&text)
            } else {
                CommandsSummary { text, list }
            }
        }
        _ => CommandsSummary::default(),
    }
}

/// The tail of a `Commands` line, e.g. `:** **status | next | back**`.
pub(crate) fn commands_from_text(tail: &str) -> CommandsSummary {
    let text = tail
        .replace("**", "")
        .trim_matches(|c: char| c.is_whitespace() || c == ':')
        .to_string();
    let list = text
        .split(COMMAND_SEPARATOR)
        .map(|item| item.trim().trim_matches('`').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    CommandsSummary { text, list }
}
