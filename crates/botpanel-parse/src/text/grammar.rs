//! Named line rules for the free-text report.
//!
//! Each rule looks at a single line. Section state lives in
//! [`super::sections`]; the extractors combine both.

use crate::marker;
use regex::Regex;
use std::sync::LazyLock;

/// Minimum width of the `=` rule that closes free-text instructions.
pub(crate) const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Header {
    Bot,
    Progress,
    Scope,
    Instructions,
    Args,
    Run,
    Commands,
    CliStatus,
}

/// Scope row glyphs.
pub(crate) const EPIC_GLYPH: &str = "📦";
pub(crate) const FEATURE_GLYPH: &str = "📁";
pub(crate) const STORY_GLYPH: &str = "📄";

/// Header literals, matched case-insensitively after leading noise. Literals
/// without a trailing colon must end at a word boundary.
const HEADER_RULES: &[(&str, Header)] = &[
    ("instructions section:", Header::Instructions),
    ("cli status", Header::CliStatus),
    ("bot:", Header::Bot),
    ("progress", Header::Progress),
    ("scope", Header::Scope),
    ("args:", Header::Args),
    ("run:", Header::Run),
    ("commands", Header::Commands),
];

/// Inline `[label](target)` link.
static LINK_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());

/// Strip decoration that may precede a header: whitespace, markdown
/// emphasis and heading marks, and any non-ASCII symbol such as emoji.
pub(crate) fn strip_noise(line: &str) -> &str {
    line.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, '#' | '*' | '>' | '_' | '|') || !c.is_ascii()
    })
}

/// Case-insensitive prefix match returning the text after the literal.
pub(crate) fn strip_literal<'a>(s: &'a str, literal: &str) -> Option<&'a str> {
    let head = s.get(..literal.len())?;
    if !head.eq_ignore_ascii_case(literal) {
        return None;
    }
    let rest = &s[literal.len()..];
    let bounded = literal.ends_with(':')
        || rest.is_empty()
        || !rest.starts_with(|c: char| c.is_ascii_alphanumeric());
    bounded.then_some(rest)
}

/// True for progress and scope rows, which are never headers even when
/// their text happens to start with a header literal.
pub(crate) fn is_tree_row(line: &str) -> bool {
    let t = line.trim_start();
    marker::split_marker(t).is_some()
        || [EPIC_GLYPH, FEATURE_GLYPH, STORY_GLYPH]
            .iter()
            .any(|g| t.starts_with(g))
}

pub(crate) fn classify_header(line: &str) -> Option<Header> {
    if is_tree_row(line) {
        return None;
    }
    let cleaned = strip_noise(line);
    HEADER_RULES
        .iter()
        .find(|(literal, header)| header_match(cleaned, literal, *header).is_some())
        .map(|(_, header)| *header)
}

/// Headers named by an ordinary word must stand alone on their line or be
/// followed by `:` or `(`, so prose such as "Progress is tracked" is content.
const STANDALONE_HEADERS: &[Header] = &[Header::Progress, Header::Scope, Header::Commands];

fn header_match<'a>(cleaned: &'a str, literal: &str, header: Header) -> Option<&'a str> {
    let rest = strip_literal(cleaned, literal)?;
    if !STANDALONE_HEADERS.contains(&header) {
        return Some(rest);
    }
    let tail = rest.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_'));
    let header_shaped = tail.starts_with([':', '('])
        || tail.chars().all(|c| c.is_whitespace() || matches!(c, '*' | '_') || !c.is_ascii());
    header_shaped.then_some(rest)
}

/// Raw text following a header literal on its line.
pub(crate) fn header_tail(line: &str, header: Header) -> &str {
    let cleaned = strip_noise(line);
    HEADER_RULES
        .iter()
        .filter(|(_, h)| *h == header)
        .find_map(|(literal, _)| header_match(cleaned, literal, header))
        .unwrap_or_default()
}

/// Header tail with separators and emphasis trimmed, e.g.
/// `## 🤖 **Bot:** story_bot` gives `story_bot`.
pub(crate) fn header_remainder(line: &str, header: Header) -> &str {
    clean_value(header_tail(line, header))
}

/// Value after a `key:` label (any of `keys`), if the line carries one.
pub(crate) fn labelled_value<'a>(line: &'a str, keys: &[&str]) -> Option<&'a str> {
    let cleaned = strip_noise(line);
    keys.iter()
        .find_map(|key| strip_literal(cleaned, key))
        .map(clean_value)
        .filter(|v| !v.is_empty())
}

/// Trim separators, emphasis, and code ticks around a value.
pub(crate) fn clean_value(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '*' | '`' | '_'))
}

/// Fence opener/closer. Returns the info string (e.g. `json`).
pub(crate) fn fence_info(line: &str) -> Option<&str> {
    line.trim().strip_prefix("```").map(str::trim)
}

pub(crate) fn is_rule_line(line: &str) -> bool {
    let t = line.trim();
    t.len() >= RULE_WIDTH && t.bytes().all(|b| b == b'=')
}

/// Leading indentation in columns; a tab counts as two.
pub(crate) fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 2 } else { 1 })
        .sum()
}

/// All `[label](target)` tokens on a line.
pub(crate) fn link_tokens(line: &str) -> Vec<(&str, &str)> {
    LINK_TOKEN
        .captures_iter(line)
        .filter_map(|caps| {
            let label = caps.get(1)?.as_str().trim();
            let target = caps.get(2)?.as_str().trim();
            Some((label, target))
        })
        .collect()
}

/// The line with every link token removed.
pub(crate) fn without_links(line: &str) -> String {
    LINK_TOKEN.replace_all(line, "").into_owned()
}
