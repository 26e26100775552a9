use crate::ir::Value;
use crate::{LogParser, parse_line};

#[test]
fn test_parse_basic_line() {
    let line = "[INFO][rank 0][TestScope][test-label] key1 = value1, key2 = value2";
    let record = parse_line(line, 0, &[]).unwrap();
    assert_eq!(record.level, "INFO");
    assert_eq!(record.rank, 0);
    assert_eq!(record.scope, "TestScope");
    assert_eq!(record.label, "test-label");
    assert_eq!(record.payload.len(), 2);
    assert_eq!(record.payload["key1"], Value::String("value1".into()));
    assert_eq!(record.payload["key2"], Value::String("value2".into()));
}

#[test]
fn test_parse_typed_payload_in_order() {
    let line = "[DEBUG][rank 12][CVODE::cvStep][label] n = 3, t = 0.25, kind = newton";
    let record = parse_line(line, 0, &[]).unwrap();
    assert_eq!(record.rank, 12);
    let entries: Vec<(&str, &Value)> = record
        .payload
        .iter()
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    assert_eq!(
        entries,
        [
            ("n", &Value::Int(3)),
            ("t", &Value::Float(0.25)),
            ("kind", &Value::String("newton".into())),
        ]
    );
}

#[test]
fn test_parse_empty_payload() {
    let record = parse_line("[INFO][rank 0][TestScope][label]", 0, &[]).unwrap();
    assert!(record.payload.is_empty());

    let record = parse_line("[INFO][rank 0][TestScope][label]    ", 0, &[]).unwrap();
    assert!(record.payload.is_empty());
}

#[test]
fn test_parse_line_with_array() {
    let lines = [
        "[INFO][rank 0][TestScope][label] array(:) =",
        " 1.0",
        " 2.0",
        " 3.0",
        "[INFO][rank 0][TestScope][next-label]",
    ];
    let record = parse_line(lines[0], 0, &lines).unwrap();
    assert_eq!(
        record.payload["array(:)"],
        Value::Array(vec![Value::Float(1.0), Value::Float(2.0), Value::Float(3.0)])
    );
}

#[test]
fn test_array_excludes_lines_after_next_header() {
    let lines = [
        "[INFO][rank 0][S][label] array(:) =",
        " 1",
        " 2",
        " 3",
        "[INFO][rank 0][S][label] other = 1",
        " 4",
    ];
    let record = parse_line(lines[0], 0, &lines).unwrap();
    assert_eq!(record.payload["array(:)"].as_array().unwrap().len(), 3);
}

#[test]
fn test_spaces_in_scope_and_label() {
    let record = parse_line("[INFO][rank 0][Test Scope][test label here] key = val", 0, &[]).unwrap();
    assert_eq!(record.scope, "Test Scope");
    assert_eq!(record.label, "test label here");
}

#[test]
fn test_brackets_in_payload() {
    let record = parse_line("[INFO][rank 0][TestScope][TestLabel] data[i] = 42", 0, &[]).unwrap();
    assert_eq!(record.payload["data[i]"], Value::Int(42));
}

#[test]
fn test_no_match_is_none() {
    let bad_lines = [
        "",
        "  ",
        "Not a log line at all",
        "# This is a comment",
        "[INFO] missing rank",
        "[INFO][0] missing rank keyword",
        "[INFO][rank 0] missing scope and label",
        "[INFO][rank 0][Scope] missing label",
        "INFO][rank 0][Scope][Label] missing opening bracket",
        "[INFO DEBUG][rank 0][Scope][Label] bad log type",
        "[INFO][rank zero][Scope][Label] non-integer rank",
        " [INFO][rank 0][Scope][Label] indented",
    ];
    for line in bad_lines {
        assert!(parse_line(line, 0, &[]).is_none(), "Failed for line: {line:?}");
    }
}

#[test]
fn test_redecoding_displayed_values() {
    let line = "[INFO][rank 0][S][label] int key = 1, float_key = 0.123, sci = 1.23e+2, tiny = 1e-300, word = foo";
    let record = parse_line(line, 0, &[]).unwrap();
    let rewritten = record
        .payload
        .iter()
        .map(|(k, v)| format!("{k} = {v}"))
        .collect::<Vec<_>>()
        .join(", ");
    let again = parse_line(&format!("[INFO][rank 0][S][label] {rewritten}"), 0, &[]).unwrap();
    assert_eq!(record.payload, again.payload);
}

#[test]
fn test_custom_indicator_through_parser() {
    let lines = [
        "[INFO][rank 0][S][label] y[*] =",
        " 1",
        " 2",
    ];
    let record = LogParser::new()
        .array_indicator("[*]")
        .parse_line(lines[0], 0, &lines)
        .unwrap();
    assert_eq!(record.payload["y[*]"], Value::Array(vec![Value::Int(1), Value::Int(2)]));
}

#[test]
fn test_parse_empty_log() {
    let steps = LogParser::new().parse("").unwrap();
    assert!(steps.is_empty());
}

#[test]
fn test_parser_default() {
    let steps = LogParser::default().parse("just some text\nand more\n").unwrap();
    assert!(steps.is_empty());
}
