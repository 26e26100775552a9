use std::path::Path;

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::error::{LoadError, ParseError};
use crate::ir::{Dict, LogDocument, LogRecord, Node, Payload, Value};
use crate::lexer::lex_line;
use crate::payload::{DEFAULT_ARRAY_INDICATOR, parse_payload};

const STEP_ATTEMPT: &str = "step-attempt";
const FAST_STEPS: &str = "fast-steps";
const LIST_SUFFIX: &str = "-list";
const EVOLVE_KEY: &str = "evolve";
const LEVEL_KEY: &str = "level";
const ROOT_NAME: &str = "<root>";

/// Rebuilds the nested step structure of a solver log.
///
/// `LogParser` only holds options; every call to [`parse`](Self::parse) starts
/// from a fresh context, so one parser can be shared and reused.
#[derive(Debug, Clone)]
pub struct LogParser {
    array_indicator: String,
    require_closed: bool,
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser {
    /// Creates a parser with the `(:)` array indicator that tolerates sections
    /// left open at the end of the log.
    pub fn new() -> Self {
        Self {
            array_indicator: DEFAULT_ARRAY_INDICATOR.to_string(),
            require_closed: false,
        }
    }

    /// Sets the key suffix that marks a multi-line array value.
    pub fn array_indicator(mut self, indicator: impl Into<String>) -> Self {
        self.array_indicator = indicator.into();
        self
    }

    /// When set, sections still open at the end of input are an error instead
    /// of being kept as they are.
    pub fn require_closed(mut self, require: bool) -> Self {
        self.require_closed = require;
        self
    }

    /// Lexes and decodes one raw line. `line_index` locates the line within
    /// `lines` so that array values can be read from the lines after it.
    pub fn parse_line(&self, line: &str, line_index: usize, lines: &[&str]) -> Option<LogRecord> {
        let header = lex_line(line)?;
        Some(LogRecord {
            level: header.level.to_string(),
            rank: header.rank,
            scope: header.scope.to_string(),
            label: header.label.to_string(),
            payload: parse_payload(header.payload, line_index, lines, &self.array_indicator),
        })
    }

    /// Parses the whole log and returns the top-level step records.
    pub fn parse(&self, input: &str) -> Result<Vec<Dict>, ParseError> {
        Ok(self.parse_document(input)?.steps)
    }

    /// Parses pre-split lines and returns the top-level step records.
    pub fn parse_lines(&self, lines: &[&str]) -> Result<Vec<Dict>, ParseError> {
        Ok(self.parse_document_lines(lines)?.steps)
    }

    /// Parses the whole log, keeping fields logged outside of any step.
    pub fn parse_document(&self, input: &str) -> Result<LogDocument, ParseError> {
        let lines: Vec<&str> = input.lines().collect();
        self.parse_document_lines(&lines)
    }

    /// Parses pre-split lines, keeping fields logged outside of any step.
    pub fn parse_document_lines(&self, lines: &[&str]) -> Result<LogDocument, ParseError> {
        let mut ctx = ParseContext::new();
        for (index, line) in lines.iter().enumerate() {
            let Some(record) = self.parse_line(line, index, lines) else {
                trace!("line {}: not a log record, skipped", index + 1);
                continue;
            };
            ctx.apply(record, index + 1)?;
        }
        ctx.finish(self.require_closed)
    }

    /// Reads and parses a log file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Vec<Dict>, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.parse(&content)?)
    }
}

/// Lexes and decodes one raw line using the default array indicator.
pub fn parse_line(line: &str, line_index: usize, lines: &[&str]) -> Option<LogRecord> {
    LogParser::new().parse_line(line, line_index, lines)
}

/// Parses log lines into the list of top-level step records.
pub fn parse_log(lines: &[&str]) -> Result<Vec<Dict>, ParseError> {
    LogParser::new().parse_lines(lines)
}

/// Reads a log file and parses it into the list of top-level step records.
pub fn log_file_to_list(path: impl AsRef<Path>) -> Result<Vec<Dict>, LoadError> {
    LogParser::new().parse_file(path)
}

/// What a label asks the builder to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker<'a> {
    Annotation,
    BeginSection(&'a str),
    EndSection(&'a str),
    BeginList(&'a str),
    EndList(&'a str),
    BeginStep,
    EndStep,
    BeginFastSteps,
    EndFastSteps,
}

impl<'a> Marker<'a> {
    fn classify(label: &'a str) -> Self {
        let (begin, name) = if let Some(name) = label.strip_prefix("begin-") {
            (true, name)
        } else if let Some(name) = label.strip_prefix("end-") {
            (false, name)
        } else {
            return Marker::Annotation;
        };

        match (begin, name) {
            (_, "") => Marker::Annotation,
            (true, STEP_ATTEMPT) => Marker::BeginStep,
            (false, STEP_ATTEMPT) => Marker::EndStep,
            (true, FAST_STEPS) => Marker::BeginFastSteps,
            (false, FAST_STEPS) => Marker::EndFastSteps,
            _ => match name.strip_suffix(LIST_SUFFIX) {
                Some(list) if !list.is_empty() => {
                    if begin {
                        Marker::BeginList(list)
                    } else {
                        Marker::EndList(list)
                    }
                }
                _ => {
                    if begin {
                        Marker::BeginSection(name)
                    } else {
                        Marker::EndSection(name)
                    }
                }
            },
        }
    }
}

/// Arena index of a dict under construction.
type DictId = usize;

const ROOT: DictId = 0;

/// A dict entry while the tree is being built; containers are arena indices.
#[derive(Debug)]
enum Slot {
    Value(Value),
    Dict(DictId),
    List(Vec<DictId>),
}

type Entries = IndexMap<String, Slot>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Root,
    Section,
    ListEntry,
    Step,
}

#[derive(Debug)]
struct Frame {
    dict: DictId,
    kind: FrameKind,
    /// Label name without the `begin-`/`end-` prefix; an `end-` label must repeat it.
    name: String,
    depth: usize,
    line: usize,
}

/// State of one parse: the dict arena, the open frames and the fast-steps depth.
///
/// Children are always allocated after their parent, so every container id
/// is larger than the id of the dict holding it.
struct ParseContext {
    dicts: Vec<Entries>,
    steps: Vec<DictId>,
    stack: Vec<Frame>,
    fast_steps: usize,
}

impl ParseContext {
    fn new() -> Self {
        Self {
            dicts: vec![Entries::new()],
            steps: Vec::new(),
            stack: vec![Frame {
                dict: ROOT,
                kind: FrameKind::Root,
                name: ROOT_NAME.to_string(),
                depth: 0,
                line: 0,
            }],
            fast_steps: 0,
        }
    }

    fn apply(&mut self, record: LogRecord, line: usize) -> Result<(), ParseError> {
        let LogRecord { label, payload, .. } = record;
        match Marker::classify(&label) {
            Marker::Annotation => self.merge(payload, line),
            Marker::BeginSection(name) => {
                let dict = self.reopen_section(name, line)?;
                self.push(dict, FrameKind::Section, name, line);
                self.merge(payload, line)
            }
            Marker::BeginList(name) => {
                let parent = self.top().dict;
                let dict = self.append_entry(parent, name, line)?;
                self.push(dict, FrameKind::ListEntry, &format!("{name}{LIST_SUFFIX}"), line);
                self.merge(payload, line)
            }
            Marker::BeginStep => {
                let dict = self.begin_step(line)?;
                self.push(dict, FrameKind::Step, STEP_ATTEMPT, line);
                self.merge(payload, line)
            }
            Marker::EndSection(name) => self.close(FrameKind::Section, name, payload, line),
            Marker::EndList(name) => self.close(
                FrameKind::ListEntry,
                &format!("{name}{LIST_SUFFIX}"),
                payload,
                line,
            ),
            Marker::EndStep => self.close(FrameKind::Step, STEP_ATTEMPT, payload, line),
            Marker::BeginFastSteps => {
                self.merge(payload, line)?;
                self.fast_steps += 1;
                debug!("line {line}: fast steps, time level {}", self.fast_steps);
                Ok(())
            }
            Marker::EndFastSteps => {
                if self.fast_steps == 0 {
                    return Err(ParseError::UnbalancedFastSteps { line });
                }
                self.merge(payload, line)?;
                self.fast_steps -= 1;
                Ok(())
            }
        }
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped.
        &self.stack[self.stack.len() - 1]
    }

    fn alloc(&mut self) -> DictId {
        self.dicts.push(Entries::new());
        self.dicts.len() - 1
    }

    fn push(&mut self, dict: DictId, kind: FrameKind, name: &str, line: usize) {
        let depth = self.top().depth + 1;
        debug!("line {line}: open `{name}` at depth {depth}");
        self.stack.push(Frame {
            dict,
            kind,
            name: name.to_string(),
            depth,
            line,
        });
    }

    /// Sets each payload key in the innermost open dict; a key may be set once.
    fn merge(&mut self, payload: Payload, line: usize) -> Result<(), ParseError> {
        let dict = self.top().dict;
        for (key, value) in payload {
            if self.dicts[dict].contains_key(&key) {
                return Err(self.duplicate(key, line));
            }
            self.dicts[dict].insert(key, Slot::Value(value));
        }
        Ok(())
    }

    /// Returns the dict bound at `name` in the innermost open dict, creating it
    /// on first use.
    fn reopen_section(&mut self, name: &str, line: usize) -> Result<DictId, ParseError> {
        let parent = self.top().dict;
        let existing = self.dicts[parent].get(name).map(|slot| match slot {
            Slot::Dict(id) => Some(*id),
            _ => None,
        });
        match existing {
            Some(Some(id)) => Ok(id),
            Some(None) => Err(self.duplicate(name.to_string(), line)),
            None => {
                let id = self.alloc();
                self.dicts[parent].insert(name.to_string(), Slot::Dict(id));
                Ok(id)
            }
        }
    }

    /// Appends a fresh dict to the list bound at `key` in `parent`.
    fn append_entry(&mut self, parent: DictId, key: &str, line: usize) -> Result<DictId, ParseError> {
        if let Some(slot) = self.dicts[parent].get(key) {
            if !matches!(slot, Slot::List(_)) {
                return Err(self.duplicate(key.to_string(), line));
            }
        }
        let id = self.alloc();
        if let Slot::List(ids) = self.dicts[parent]
            .entry(key.to_string())
            .or_insert_with(|| Slot::List(Vec::new()))
        {
            ids.push(id);
        }
        Ok(id)
    }

    /// Starts a step record: top-level when the root is open, otherwise in the
    /// `evolve` list of the innermost open dict. Inside fast-steps regions the
    /// record goes to the `time-level-<N>` list of the innermost open step.
    fn begin_step(&mut self, line: usize) -> Result<DictId, ParseError> {
        let top = self.top();
        let id = if top.kind == FrameKind::Root {
            let id = self.alloc();
            self.steps.push(id);
            id
        } else if self.fast_steps == 0 {
            let parent = top.dict;
            self.append_entry(parent, EVOLVE_KEY, line)?
        } else {
            let parent = self
                .stack
                .iter()
                .rev()
                .find(|frame| frame.kind == FrameKind::Step)
                .map_or(top.dict, |frame| frame.dict);
            let key = format!("time-level-{}", self.fast_steps);
            self.append_entry(parent, &key, line)?
        };
        let level = Value::Int(self.fast_steps as i64);
        self.dicts[id].insert(LEVEL_KEY.to_string(), Slot::Value(level));
        Ok(id)
    }

    fn close(
        &mut self,
        kind: FrameKind,
        name: &str,
        payload: Payload,
        line: usize,
    ) -> Result<(), ParseError> {
        let top = self.top();
        if top.kind == FrameKind::Root {
            return Err(ParseError::UnexpectedEnd {
                line,
                found: name.to_string(),
            });
        }
        if top.kind != kind || top.name != name {
            return Err(ParseError::MismatchedEnd {
                line,
                found: name.to_string(),
                expected: top.name.clone(),
            });
        }
        self.merge(payload, line)?;
        if let Some(frame) = self.stack.pop() {
            debug!("line {line}: close `{}` at depth {}", frame.name, frame.depth);
        }
        Ok(())
    }

    fn duplicate(&self, key: String, line: usize) -> ParseError {
        ParseError::DuplicateKey {
            line,
            key,
            section: self.section_path(),
        }
    }

    /// Slash-separated names of the open frames, e.g. `step-attempt/nls`.
    fn section_path(&self) -> String {
        if self.stack.len() == 1 {
            return ROOT_NAME.to_string();
        }
        self.stack[1..]
            .iter()
            .map(|frame| frame.name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn finish(mut self, require_closed: bool) -> Result<LogDocument, ParseError> {
        if self.stack.len() > 1 {
            if require_closed {
                let frame = self.top();
                return Err(ParseError::UnclosedSection {
                    line: frame.line,
                    section: frame.name.clone(),
                });
            }
            for frame in self.stack[1..].iter().rev() {
                warn!(
                    "section `{}` opened on line {} is never closed",
                    frame.name, frame.line
                );
            }
        }
        if self.fast_steps > 0 {
            warn!("{} fast-steps region(s) never closed", self.fast_steps);
        }

        let mut built: Vec<Option<Dict>> = (0..self.dicts.len()).map(|_| None).collect();
        for id in (0..self.dicts.len()).rev() {
            let entries = std::mem::take(&mut self.dicts[id]);
            let mut dict = Dict::with_capacity(entries.len());
            for (key, slot) in entries {
                let node = match slot {
                    Slot::Value(value) => Node::Value(value),
                    Slot::Dict(child) => Node::Dict(built[child].take().unwrap_or_default()),
                    Slot::List(children) => Node::List(
                        children
                            .into_iter()
                            .map(|child| built[child].take().unwrap_or_default())
                            .collect(),
                    ),
                };
                dict.insert(key, node);
            }
            built[id] = Some(dict);
        }

        let steps = self
            .steps
            .iter()
            .map(|&id| built[id].take().unwrap_or_default())
            .collect();
        let globals = built[ROOT].take().unwrap_or_default();
        Ok(LogDocument { globals, steps })
    }
}
