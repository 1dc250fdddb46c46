//! Splits a free-text report into its sections.
//!
//! A small state machine over lines: the current section changes only on a
//! header line seen outside a fence. The instructions block is read eagerly
//! because its free-text form may contain anything, headers included.

use super::grammar::{self, Header};

/// Raw content of the `INSTRUCTIONS SECTION:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InstructionsBlock {
    Fenced { lang: String, body: String },
    Text(String),
}

#[derive(Debug, Default)]
pub(crate) struct Sections<'a> {
    /// Lines before the first header.
    pub preamble: Vec<&'a str>,
    /// Bot section, starting with the `Bot:` line itself.
    pub bot: Vec<&'a str>,
    pub progress: Option<Vec<&'a str>>,
    pub scope: Option<Vec<&'a str>>,
    pub instructions: Option<InstructionsBlock>,
    pub args: Option<Vec<&'a str>>,
    pub run: Option<Vec<&'a str>>,
    /// Remainder of the `Commands` line.
    pub commands: Option<&'a str>,
}

impl<'a> Sections<'a> {
    pub(crate) fn split(text: &'a str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut sections = Sections::default();
        let mut current: Option<Header> = None;
        let mut seen_header = false;
        let mut in_fence = false;
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];

            if !in_fence {
                if let Some(header) = grammar::classify_header(line) {
                    seen_header = true;
                    match header {
                        Header::Instructions => {
                            let (block, next) = read_instructions(&lines, i + 1);
                            if sections.instructions.is_none() {
                                sections.instructions = block;
                            }
                            current = None;
                            i = next;
                            continue;
                        }
                        Header::Commands => {
                            if sections.commands.is_none() {
                                sections.commands =
                                    Some(grammar::header_tail(line, Header::Commands));
                            }
                            current = None;
                        }
                        Header::CliStatus => current = None,
                        Header::Bot => {
                            sections.bot.push(line);
                            current = Some(header);
                        }
                        _ => {
                            sections.open(header);
                            current = Some(header);
                        }
                    }
                    i += 1;
                    continue;
                }
            }

            if grammar::fence_info(line).is_some() {
                in_fence = !in_fence;
            }

            match current {
                Some(header) => sections.push(header, line),
                None if !seen_header => sections.preamble.push(line),
                None => {}
            }
            i += 1;
        }

        sections
    }

    fn open(&mut self, header: Header) {
        if let Some(slot) = self.slot(header) {
            slot.get_or_insert_with(Vec::new);
        }
    }

    fn push(&mut self, header: Header, line: &'a str) {
        if header == Header::Bot {
            self.bot.push(line);
        } else if let Some(slot) = self.slot(header) {
            slot.get_or_insert_with(Vec::new).push(line);
        }
    }

    fn slot(&mut self, header: Header) -> Option<&mut Option<Vec<&'a str>>> {
        match header {
            Header::Progress => Some(&mut self.progress),
            Header::Scope => Some(&mut self.scope),
            Header::Args => Some(&mut self.args),
            Header::Run => Some(&mut self.run),
            _ => None,
        }
    }

    /// Lines the progress tree is read from: the progress section when there
    /// is one, otherwise the preamble.
    pub(crate) fn progress_lines(&self) -> &[&'a str] {
        self.progress.as_deref().unwrap_or(self.preamble.as_slice())
    }
}

/// Read the instructions block starting at `start`. Returns the block and the
/// index of the first line after it.
pub(super) fn read_instructions(lines: &[&str], start: usize) -> (Option<InstructionsBlock>, usize) {
    let first = match lines[start.min(lines.len())..]
        .iter()
        .position(|l| !l.trim().is_empty())
    {
        Some(offset) => start + offset,
        None => return (None, lines.len()),
    };

    if let Some(lang) = grammar::fence_info(lines[first]) {
        let body_start = first + 1;
        let close = lines[body_start..]
            .iter()
            .position(|l| grammar::fence_info(l).is_some())
            .map(|offset| body_start + offset);
        let body_end = close.unwrap_or(lines.len());
        let body = lines[body_start..body_end].join("\n");
        let next = close.map_or(lines.len(), |c| c + 1);
        return (
            Some(InstructionsBlock::Fenced {
                lang: lang.to_ascii_lowercase(),
                body,
            }),
            next,
        );
    }

    let end = (first..lines.len())
        .find(|&k| grammar::is_rule_line(lines[k]) && followed_by_cli_status(lines, k + 1))
        .unwrap_or(lines.len());
    let body = lines[first..end].join("\n").trim_end().to_string();
    let block = (!body.is_empty()).then_some(InstructionsBlock::Text(body));
    (block, end)
}

fn followed_by_cli_status(lines: &[&str], from: usize) -> bool {
    lines
        .get(from..)
        .and_then(|rest| rest.iter().find(|l| !l.trim().is_empty()))
        .is_some_and(|l| grammar::classify_header(l) == Some(Header::CliStatus))
}
