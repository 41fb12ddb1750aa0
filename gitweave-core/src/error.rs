/// Top-level gitweave error type.
///
/// All fallible operations in `gitweave-core` return [`Result<T, GitweaveError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum GitweaveError {
    /// A filter predicate could not be built or evaluated.
    #[error("Predicate error: {0}")]
    Predicate(#[from] PredicateError),

    /// The caller asked for something that does not exist (preset, helper, mode).
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error writing an edge list, node list, or TSV dump.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Commit records could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from building or evaluating filter predicates.
#[derive(thiserror::Error, Debug)]
pub enum PredicateError {
    /// A match value was not a valid regular expression.
    #[error("Invalid pattern {pattern:?}: {source}")]
    Pattern {
        /// The pattern as given by the caller.
        pattern: String,
        /// Compilation failure reported by the regex engine.
        source: regex::Error,
    },

    /// A value was not a git-formatted date such as `Mon Apr 18 00:59:02 2016 -0400`.
    #[error("Unrecognized date {0:?}: expected a git date such as 'Mon Apr 18 00:59:02 2016 -0400'")]
    Date(String),

    /// The predicate name is not one of the built-in predicates.
    #[error("Unknown predicate: {0}")]
    Unknown(String),
}

/// Errors caused by invalid caller input.
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    /// No network preset exists with this name.
    #[error("{0} is not a valid network preset")]
    UnknownPreset(String),

    /// No edge helper exists with this name.
    #[error("{0} is not a valid edge helper (use: simple, changes)")]
    UnknownHelper(String),

    /// No ignore mode exists with this name.
    #[error("{0} is not a valid ignore mode (use: match, no-match)")]
    UnknownIgnoreMode(String),

    /// A `TAG:FUN:VALUE` filter specification could not be split.
    #[error("Malformed filter {0:?}: expected TAG:FUN:VALUE")]
    MalformedFilter(String),

    /// A `TAG:OLD:NEW` replacement could not be split.
    #[error("Malformed replacement {0:?}: expected TAG:OLD:NEW")]
    MalformedReplace(String),

    /// Commit log JSON was neither an array of records nor an object keyed by hash.
    #[error("Commit log must be a JSON array or object, found {0}")]
    MalformedLog(String),
}

/// Errors in gitweave configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors while writing exported data.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// Filesystem or stream I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A CSV row could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience alias for `Result<T, GitweaveError>`.
pub type Result<T> = std::result::Result<T, GitweaveError>;
