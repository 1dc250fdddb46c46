//! Status markers shared by both report syntaxes.

use botpanel_core::Status;

/// Bracket and pictograph markers. Longer tokens come first so `▶️` wins
/// over its bare `▶` prefix.
const MARKERS: &[(&str, Status)] = &[
    ("[*]", Status::Current),
    ("[-]", Status::Completed),
    ("[x]", Status::Completed),
    ("[X]", Status::Completed),
    ("[ ]", Status::Pending),
    ("▶️", Status::Current),
    ("▶", Status::Current),
    ("✅", Status::Completed),
    ("⬜", Status::Pending),
];

/// Status for a complete marker token, or `None` for anything else.
pub fn status_for_marker(token: &str) -> Option<Status> {
    let token = token.trim();
    MARKERS
        .iter()
        .find(|(marker, _)| *marker == token)
        .map(|(_, status)| *status)
}

/// Split a leading marker off `s`. The marker must be followed by whitespace
/// or the end of the string. Returns the status and the remaining text.
pub fn split_marker(s: &str) -> Option<(Status, &str)> {
    MARKERS.iter().find_map(|(marker, status)| {
        let rest = s.strip_prefix(marker)?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            Some((*status, rest.trim_start()))
        } else {
            None
        }
    })
}
