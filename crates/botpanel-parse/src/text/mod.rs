pub(crate) mod grammar;
pub(crate) mod sections;

pub(crate) use sections::{InstructionsBlock, Sections};

use grammar::Header;

/// Lines inside the first fenced block, or `None` when there is no fence.
pub(crate) fn first_fenced<'a>(lines: &[&'a str]) -> Option<Vec<&'a str>> {
    let open = lines
        .iter()
        .position(|l| grammar::fence_info(l).is_some())?;
    let body = lines[open + 1..]
        .iter()
        .take_while(|l| grammar::fence_info(l).is_none())
        .copied()
        .collect();
    Some(body)
}

/// Body lines of a block section: the first fence's content when fenced,
/// otherwise every line. Blank lines are dropped.
pub(crate) fn block_lines<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    first_fenced(lines)
        .unwrap_or_else(|| lines.to_vec())
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .collect()
}

/// Byte offset of the first `{` that could open a report payload. Braces
/// inside the instructions block belong to the instructions, not the report.
pub(crate) fn payload_start(raw: &str) -> Option<usize> {
    let mut offsets = Vec::new();
    let mut lines = Vec::new();
    let mut offset = 0;
    for chunk in raw.split_inclusive('\n') {
        offsets.push(offset);
        lines.push(chunk.trim_end_matches(['\n', '\r']));
        offset += chunk.len();
    }

    let mut in_fence = false;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if !in_fence && grammar::classify_header(line) == Some(Header::Instructions) {
            i = sections::read_instructions(&lines, i + 1).1;
            continue;
        }
        if grammar::fence_info(line).is_some() {
            in_fence = !in_fence;
        }
        if let Some(col) = line.find('{') {
            return Some(offsets[i] + col);
        }
        i += 1;
    }
    None
}
