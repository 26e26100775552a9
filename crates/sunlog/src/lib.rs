//! # sunlog
//!
//! Parser for the structured logs written by time integrators and nonlinear
//! solvers, turning a flat sequence of tagged lines into a tree of steps.
//!
//! ## Log format
//!
//! Every structured line has four bracketed header groups followed by an
//! optional payload of comma-separated `key = value` pairs:
//!
//! ```text
//! [INFO][rank 0][ARKODE::arkStep][begin-step-attempt] step = 1, tn = 0, h = 1e-06
//! [DEBUG][rank 0][ARKODE::arkStep][label] stage = 0, tcur = 0
//! [DEBUG][rank 0][ARKODE::arkStep][label] z_0(:) =
//!    1.0
//!    2.5
//!
//! [INFO][rank 0][ARKODE::arkStep][end-step-attempt] status = success
//! ```
//!
//! Lines that do not match the header are commentary and are skipped. A key
//! ending in `(:)` starts an array whose elements are the following lines,
//! up to a blank line or the next header.
//!
//! ## Structure
//!
//! Labels open and close nested containers:
//!
//! - `begin-X` / `end-X`: a dict at key `X`; opening it again merges into it
//! - `begin-X-list` / `end-X-list`: a new dict appended to the list at key `X`
//! - `begin-step-attempt` / `end-step-attempt`: a step record, appended to the
//!   result at top level and to an `evolve` list when nested
//! - `begin-fast-steps` / `end-fast-steps`: steps inside go to a
//!   `time-level-<N>` list of the enclosing step
//!
//! Every step record carries a `level` field with its time level. Setting a
//! key twice in the same dict is an error.
//!
//! ## Example
//!
//! ```
//! use sunlog::{LogParser, Node, Value};
//!
//! let log = "\
//! [INFO][rank 0][Outer][begin-step-attempt] step = 1, h = 0.5
//! [INFO][rank 0][Outer][end-step-attempt] status = success
//! ";
//! let steps = LogParser::new().parse(log)?;
//! assert_eq!(steps.len(), 1);
//! assert_eq!(steps[0]["level"], Node::Value(Value::Int(0)));
//! assert_eq!(steps[0]["h"], Node::Value(Value::Float(0.5)));
//! # Ok::<(), sunlog::ParseError>(())
//! ```
//!
//! The IR types implement `serde::Serialize`, so a parsed log can be written
//! out as JSON with map keys in log order.

/// Structural and I/O errors.
pub mod error;
/// Time series queries over parsed steps.
pub mod history;
/// Decoded values and the step tree.
pub mod ir;
/// Header recognition for single lines.
pub mod lexer;
/// Step tree construction.
pub mod parser;
/// `key = value` payload decoding.
pub mod payload;

#[cfg(test)]
mod tests;

pub use error::{LoadError, ParseError};
pub use history::{HistoryPoint, HistoryQuery, get_history};
pub use ir::{Dict, LogDocument, LogRecord, Node, Payload, Value};
pub use parser::{LogParser, log_file_to_list, parse_line, parse_log};
pub use payload::{DEFAULT_ARRAY_INDICATOR, parse_payload};
