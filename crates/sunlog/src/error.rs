use thiserror::Error;

/// A structural violation that aborts a parse. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: key `{key}` is already set in `{section}`")]
    DuplicateKey {
        line: usize,
        key: String,
        section: String,
    },
    #[error("line {line}: `end-{found}` does not close the open section `{expected}`")]
    MismatchedEnd {
        line: usize,
        found: String,
        expected: String,
    },
    #[error("line {line}: `end-{found}` with no open section")]
    UnexpectedEnd { line: usize, found: String },
    #[error("line {line}: `end-fast-steps` without a matching `begin-fast-steps`")]
    UnbalancedFastSteps { line: usize },
    #[error("section `{section}` opened on line {line} is never closed")]
    UnclosedSection { line: usize, section: String },
}

/// Failure to read or parse a log file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read log file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
