//! Behavior → action → operation tree.

use crate::marker;
use crate::text::grammar;
use crate::value::{field, get_array, node_name, opt_str};
use botpanel_core::{ActionNode, BehaviorNode, OperationNode, Status};
use serde_json::Value;
use tracing::trace;

/// Separator between a node name and its description on a progress line.
const DESCRIPTION_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    Behavior,
    Action,
    Operation,
}

impl Level {
    /// Two columns of indentation per level; anything deeper is an operation.
    fn from_indent(indent: usize) -> Self {
        match indent / 2 {
            0 => Self::Behavior,
            1 => Self::Action,
            _ => Self::Operation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProgressLine<'a> {
    pub level: Level,
    pub status: Status,
    pub name: &'a str,
    pub description: Option<&'a str>,
}

/// Classify one free-text line. Lines without a recognized marker, or with
/// an empty name, are not progress lines.
pub(crate) fn classify_line(line: &str) -> Option<ProgressLine<'_>> {
    let level = Level::from_indent(grammar::indent_width(line));
    let (status, rest) = marker::split_marker(line.trim_start())?;
    let rest = rest.trim_end();
    let (name, description) = match rest.split_once(DESCRIPTION_SEPARATOR) {
        Some((name, desc)) => (name.trim(), Some(desc.trim()).filter(|d| !d.is_empty())),
        None => (rest.trim_end_matches(" -").trim(), None),
    };
    if name.is_empty() {
        return None;
    }
    Some(ProgressLine {
        level,
        status,
        name,
        description,
    })
}

/// Build the tree from free-text lines.
///
/// Actions attach to the latest behavior and operations to the latest action
/// of that behavior; orphans are dropped.
pub(crate) fn progress_from_lines(lines: &[&str]) -> Vec<BehaviorNode> {
    let mut tree: Vec<BehaviorNode> = Vec::new();

    for line in lines {
        let Some(parsed) = classify_line(line) else {
            continue;
        };
        let description = parsed.description.map(str::to_string);
        match parsed.level {
            Level::Behavior => tree.push(BehaviorNode {
                description,
                ..BehaviorNode::new(parsed.name, parsed.status)
            }),
            Level::Action => match tree.last_mut() {
                Some(behavior) => behavior.actions.push(ActionNode {
                    description,
                    ..ActionNode::new(parsed.name, parsed.status)
                }),
                None => trace!(line = %line, "action line before any behavior"),
            },
            Level::Operation => match tree.last_mut().and_then(|b| b.actions.last_mut()) {
                Some(action) => action.operations.push(OperationNode {
                    description,
                    ..OperationNode::new(parsed.name, parsed.status)
                }),
                None => trace!(line = %line, "operation line without an open action"),
            },
        }
    }

    tree
}

/// Map the structured `behaviors` list.
pub(crate) fn progress_from_value(behaviors: Option<&Value>) -> Vec<BehaviorNode> {
    let Some(Value::Array(items)) = behaviors else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|b| {
            let name = node_name(b)?;
            let actions = get_array(b, "actions")
                .iter()
                .filter_map(|a| {
                    let name = node_name(a)?;
                    let operations = get_array(a, "operations")
                        .iter()
                        .filter_map(|o| {
                            Some(OperationNode {
                                description: opt_str(o, "description"),
                                ..OperationNode::new(node_name(o)?, node_status(o))
                            })
                        })
                        .collect();
                    Some(ActionNode {
                        description: opt_str(a, "description"),
                        operations,
                        ..ActionNode::new(name, node_status(a))
                    })
                })
                .collect();
            Some(BehaviorNode {
                description: opt_str(b, "description"),
                actions,
                ..BehaviorNode::new(name, node_status(b))
            })
        })
        .collect()
}

/// Status of a structured node: a status word or a marker token. Anything
/// else, including a bare string entry, is pending.
fn node_status(v: &Value) -> Status {
    field(v, "status")
        .and_then(Value::as_str)
        .and_then(|s| {
            s.parse::<Status>()
                .ok()
                .or_else(|| marker::status_for_marker(s))
        })
        .unwrap_or_default()
}
