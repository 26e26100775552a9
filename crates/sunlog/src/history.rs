//! Time series extraction over parsed step records.
//!
//! Steps are visited depth-first in log order: each step is followed by the
//! fast steps nested in its `time-level-<N>` lists.

use serde::Serialize;

use crate::ir::{Dict, Node, Value};

const TIME_LEVEL_PREFIX: &str = "time-level-";

/// Which field to collect and which steps to keep.
#[derive(Debug, Clone)]
pub struct HistoryQuery<'a> {
    pub key: &'a str,
    /// Keep steps whose `status` contains this text.
    pub status: Option<&'a str>,
    /// Inclusive range on the step time.
    pub time_range: Option<(f64, f64)>,
    /// Inclusive range on the step number.
    pub step_range: Option<(i64, i64)>,
    /// Keep only steps of this time level.
    pub level: Option<i64>,
    pub step_key: &'a str,
    pub time_key: &'a str,
}

impl<'a> HistoryQuery<'a> {
    pub fn new(key: &'a str) -> Self {
        Self {
            key,
            status: None,
            time_range: None,
            step_range: None,
            level: None,
            step_key: "step",
            time_key: "tn",
        }
    }

    pub fn status(mut self, status: &'a str) -> Self {
        self.status = Some(status);
        self
    }

    pub fn time_range(mut self, start: f64, end: f64) -> Self {
        self.time_range = Some((start, end));
        self
    }

    pub fn step_range(mut self, first: i64, last: i64) -> Self {
        self.step_range = Some((first, last));
        self
    }

    pub fn level(mut self, level: i64) -> Self {
        self.level = Some(level);
        self
    }

    fn accepts(&self, step: &Dict) -> bool {
        if let Some(wanted) = self.status {
            match scalar(step, "status").and_then(Value::as_str) {
                Some(status) if status.contains(wanted) => {}
                _ => return false,
            }
        }
        if let Some((start, end)) = self.time_range {
            match scalar(step, self.time_key).and_then(Value::as_f64) {
                Some(t) if t >= start && t <= end => {}
                _ => return false,
            }
        }
        if let Some((first, last)) = self.step_range {
            match scalar(step, self.step_key).and_then(Value::as_i64) {
                Some(n) if n >= first && n <= last => {}
                _ => return false,
            }
        }
        if let Some(level) = self.level {
            if scalar(step, "level").and_then(Value::as_i64) != Some(level) {
                return false;
            }
        }
        true
    }
}

/// One sample of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub step: Option<i64>,
    pub time: Option<f64>,
    pub level: i64,
    pub value: Value,
}

/// Collects `query.key` from every matching step, nested fast steps included.
pub fn get_history(steps: &[Dict], query: &HistoryQuery<'_>) -> Vec<HistoryPoint> {
    let mut points = Vec::new();
    // Reversed so that popping yields log order.
    let mut pending: Vec<&Dict> = steps.iter().rev().collect();

    while let Some(step) = pending.pop() {
        if let Some(value) = scalar(step, query.key) {
            if query.accepts(step) {
                points.push(HistoryPoint {
                    step: scalar(step, query.step_key).and_then(Value::as_i64),
                    time: scalar(step, query.time_key).and_then(Value::as_f64),
                    level: scalar(step, "level").and_then(Value::as_i64).unwrap_or(0),
                    value: value.clone(),
                });
            }
        }

        let nested = step
            .iter()
            .filter(|(key, _)| key.starts_with(TIME_LEVEL_PREFIX))
            .filter_map(|(_, node)| node.as_list())
            .collect::<Vec<_>>();
        for list in nested.into_iter().rev() {
            pending.extend(list.iter().rev());
        }
    }
    points
}

fn scalar<'d>(step: &'d Dict, key: &str) -> Option<&'d Value> {
    step.get(key).and_then(Node::as_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogParser;

    const MULTIRATE: &str = "\
[INFO][rank 0][MRI][begin-step-attempt] step = 1, tn = 0, h = 0.1
[INFO][rank 0][MRI][begin-fast-steps]
[INFO][rank 0][ERK][begin-step-attempt] step = 1, tn = 0, h = 0.05
[INFO][rank 0][ERK][end-step-attempt] status = success
[INFO][rank 0][ERK][begin-step-attempt] step = 2, tn = 0.05, h = 0.05
[INFO][rank 0][ERK][end-step-attempt] status = success
[INFO][rank 0][MRI][end-fast-steps]
[INFO][rank 0][MRI][end-step-attempt] status = success
[INFO][rank 0][MRI][begin-step-attempt] step = 2, tn = 0.1, h = 0.2
[INFO][rank 0][MRI][end-step-attempt] status = failed error test
[INFO][rank 0][MRI][begin-step-attempt] step = 2, tn = 0.1, h = 0.1
[INFO][rank 0][MRI][end-step-attempt] status = success
";

    fn steps() -> Vec<Dict> {
        LogParser::new().parse(MULTIRATE).unwrap()
    }

    fn values(points: &[HistoryPoint]) -> Vec<f64> {
        points.iter().map(|p| p.value.as_f64().unwrap()).collect()
    }

    #[test]
    fn walks_nested_levels_in_log_order() {
        let points = get_history(&steps(), &HistoryQuery::new("h"));
        assert_eq!(values(&points), [0.1, 0.05, 0.05, 0.2, 0.1]);
        let levels: Vec<i64> = points.iter().map(|p| p.level).collect();
        assert_eq!(levels, [0, 1, 1, 0, 0]);
        assert_eq!(points[2].step, Some(2));
        assert_eq!(points[2].time, Some(0.05));
    }

    #[test]
    fn filters_by_status_and_level() {
        let steps = steps();
        let failed = get_history(&steps, &HistoryQuery::new("h").status("failed"));
        assert_eq!(values(&failed), [0.2]);

        let slow_ok = get_history(&steps, &HistoryQuery::new("h").status("success").level(0));
        assert_eq!(values(&slow_ok), [0.1, 0.1]);
    }

    #[test]
    fn filters_by_time_and_step() {
        let steps = steps();
        let late = get_history(&steps, &HistoryQuery::new("h").time_range(0.04, 1.0));
        assert_eq!(values(&late), [0.05, 0.2, 0.1]);

        let second = get_history(&steps, &HistoryQuery::new("h").step_range(2, 2).level(0));
        assert_eq!(values(&second), [0.2, 0.1]);
    }

    #[test]
    fn missing_key_yields_nothing() {
        assert!(get_history(&steps(), &HistoryQuery::new("no such key")).is_empty());
    }
}
