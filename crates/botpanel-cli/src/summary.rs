//! One-screen plain-text overview of a normalized report.

use botpanel_core::{ScopeVariant, Status, StatusReport};

fn marker(status: Status) -> &'static str {
    match status {
        Status::Current => "[*]",
        Status::Completed => "[-]",
        Status::Pending => "[ ]",
    }
}

fn with_detail(name: &str, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{name} ({detail})"),
        None => name.to_string(),
    }
}

fn tree_line(depth: usize, status: Status, name: &str, description: Option<&str>) -> String {
    let indent = "  ".repeat(depth + 1);
    match description {
        Some(desc) => format!("{indent}{} {name} - {desc}", marker(status)),
        None => format!("{indent}{} {name}", marker(status)),
    }
}

pub fn render(report: &StatusReport) -> String {
    let mut lines = Vec::new();

    let bot = &report.bot;
    lines.push(format!(
        "Bot: {}",
        with_detail(&bot.name, bot.bot_directory.as_deref())
    ));
    if let Some(workspace) = &bot.workspace_name {
        lines.push(format!(
            "Workspace: {}",
            with_detail(workspace, bot.workspace_directory.as_deref())
        ));
    }
    if !report.session.is_empty() {
        lines.push(format!("Position: {}", report.session.current_position));
    }

    if !report.progress.is_empty() {
        lines.push("Progress:".to_string());
        for behavior in &report.progress {
            lines.push(tree_line(
                0,
                behavior.status,
                &behavior.name,
                behavior.description.as_deref(),
            ));
            for action in &behavior.actions {
                lines.push(tree_line(1, action.status, &action.name, action.description.as_deref()));
                for op in &action.operations {
                    lines.push(tree_line(2, op.status, &op.name, op.description.as_deref()));
                }
            }
        }
    }

    let scope = &report.scope;
    match &scope.variant {
        ScopeVariant::AllFiles { filter } => lines.push(format!("Scope: {filter}")),
        ScopeVariant::ExplicitFiles { files } => {
            lines.push(format!("Scope: {} file(s)", files.len()));
            for file in files {
                lines.push(format!("  {}", file.path));
            }
        }
        ScopeVariant::StoryHierarchy { epics, filter } => {
            let stories: usize = epics.iter().map(|e| e.story_count()).sum();
            let mut line = format!("Scope: {} epic(s), {stories} stories", epics.len());
            if let Some(filter) = filter {
                line.push_str(&format!(" [{filter}]"));
            }
            lines.push(line);
            for epic in epics {
                lines.push(format!("  {} ({} stories)", epic.name, epic.story_count()));
            }
        }
    }
    if let Some(graph) = &scope.links.graph {
        lines.push(format!("  graph: {graph}"));
    }
    if let Some(map) = &scope.links.map {
        lines.push(format!("  map: {map}"));
    }

    let instructions = &report.instructions;
    if let Some(base) = &instructions.base {
        lines.push(format!("Instructions: {} line(s)", base.lines.len()));
    }
    if let Some(section) = &instructions.section {
        lines.push(format!("Section: {}", section.name()));
    }

    if !report.parameters.is_empty() {
        let flags: Vec<&str> = report.parameters.iter().map(|p| p.flag.as_str()).collect();
        lines.push(format!("Parameters: {}", flags.join(", ")));
    }
    for example in &report.run_examples {
        lines.push(format!("Run: {}", example.command));
    }
    if !report.commands.list.is_empty() {
        lines.push(format!("Commands: {}", report.commands.list.join(" | ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use botpanel_core::UNKNOWN_BOT;

    #[test]
    fn empty_report_shows_sentinel_and_default_scope() {
        let out = render(&StatusReport::default());
        assert_eq!(out, format!("Bot: {UNKNOWN_BOT}\nScope: all (entire project)"));
    }

    #[test]
    fn summarizes_progress_and_hierarchy() {
        let raw = "\
## Bot: story_bot
## Progress
```
shape.clarify
```
[*] shape - Shape the map
  [-] gather
  [*] clarify
## Scope
📦 Checkout
  📁 Payments
    📄 Pay by card
    📄 Refund
**Commands:** **status** | **next**
";
        let out = render(&botpanel_parse::dispatch(raw));
        assert!(out.contains("Bot: story_bot"));
        assert!(out.contains("Position: shape.clarify"));
        assert!(out.contains("  [*] shape - Shape the map"));
        assert!(out.contains("    [-] gather"));
        assert!(out.contains("Scope: 1 epic(s), 2 stories"));
        assert!(out.contains("  Checkout (2 stories)"));
        assert!(out.contains("Commands: status | next"));
    }
}
