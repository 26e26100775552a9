use once_cell::sync::Lazy;
use regex::Regex;

/// `[LEVEL][rank N][Scope][Label] payload`, anchored to the first four bracket groups.
static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\[\]\s]+)\]\[rank (-?[0-9]+)\]\[([^\]]*)\]\[([^\]]*)\](.*)$")
        .expect("header pattern is a valid regex")
});

/// The bracketed header of a log line and its unparsed payload text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineHeader<'a> {
    pub level: &'a str,
    pub rank: i64,
    pub scope: &'a str,
    pub label: &'a str,
    pub payload: &'a str,
}

/// Splits a raw line into its header fields.
///
/// Returns `None` for anything that is not a structured log line: blank
/// lines, commentary, missing bracket groups, or a rank that is not an
/// integer.
pub fn lex_line(line: &str) -> Option<LineHeader<'_>> {
    let caps = HEADER.captures(line)?;
    let rank = caps.get(2)?.as_str().parse::<i64>().ok()?;
    Some(LineHeader {
        level: caps.get(1)?.as_str(),
        rank,
        scope: caps.get(3)?.as_str(),
        label: caps.get(4)?.as_str(),
        payload: caps.get(5).map_or("", |m| m.as_str()),
    })
}

/// True when the line starts a new log record.
pub fn is_record_line(line: &str) -> bool {
    lex_line(line).is_some()
}
