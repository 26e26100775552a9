use crate::ir::{Payload, Value};
use crate::lexer::is_record_line;

/// Key suffix marking a value that continues on the following lines.
pub const DEFAULT_ARRAY_INDICATOR: &str = "(:)";

/// Decodes the `key = value, ...` text that follows a log line header.
///
/// Each comma-separated pair is split at its first `=` only, so values may
/// contain `=`. A key with no value decodes to an empty string. A key ending
/// in `array_indicator` takes its value from the raw lines after
/// `line_index`, one scalar per line, until a blank line, the next record
/// header, or the end of input.
///
/// # Arguments
///
/// * `payload` - The text after the header's closing bracket.
/// * `line_index` - Index of the line that carried `payload` within `lines`.
/// * `lines` - All raw lines of the log, used for array lookahead.
/// * `array_indicator` - Key suffix that introduces an array, usually [`DEFAULT_ARRAY_INDICATOR`].
pub fn parse_payload(
    payload: &str,
    line_index: usize,
    lines: &[&str],
    array_indicator: &str,
) -> Payload {
    let mut decoded = Payload::new();
    let payload = payload.trim();
    if payload.is_empty() {
        return decoded;
    }

    for pair in payload.split(',') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (pair.trim(), ""),
        };
        if key.is_empty() && value.is_empty() {
            continue;
        }

        let value = if !array_indicator.is_empty() && key.ends_with(array_indicator) {
            Value::Array(collect_array(line_index, lines))
        } else {
            Value::from_literal(value)
        };
        decoded.insert(key.to_string(), value);
    }
    decoded
}

fn collect_array(line_index: usize, lines: &[&str]) -> Vec<Value> {
    lines
        .iter()
        .skip(line_index + 1)
        .take_while(|line| !line.trim().is_empty() && !is_record_line(line))
        .map(|line| Value::from_literal(line))
        .collect()
}
