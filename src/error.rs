use thiserror::Error;

/// Result type used across the interpreter.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a statement can raise.
///
/// Errors propagate unhandled up to the statement boundary, where the REPL
/// prints [`Error::code`], [`Error::kind`] and the message, then resumes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A programming-logic fault, e.g. an unknown `$` directive.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// A key-value command received a key without its value.
    #[error("you should provide a value for the key `{0}`")]
    KeyValueUnmatched(String),

    #[error("invalid key-argument: `{0}`")]
    InvalidKeyArgument(String),

    #[error("invalid value-argument: `{0}`")]
    InvalidValueArgument(String),

    #[error("too few arguments! expect {expected} argument(-groups) while only {actual} supplied.")]
    TooFewArguments { expected: usize, actual: usize },

    #[error("too many arguments! expect {expected} argument(-groups) while {actual} supplied.")]
    TooManyArguments { expected: usize, actual: usize },

    /// The same key was supplied twice in one statement.
    #[error("conflict argument: {0}")]
    ArgumentConflict(String),

    /// The schema source is malformed.
    #[error("invalid schema: {0}")]
    SchemaInvalid(String),

    /// A failed type conversion or a key-set mismatch.
    #[error("invalid entry: {0}")]
    EntryInvalid(String),

    #[error("duplicate entry: there is already an entry whose `{field}` equals to `{value}`")]
    DuplicateEntry { field: String, value: String },

    #[error("no any entries matching {field}={value} were found.")]
    EntryNotFound { field: String, value: String },
}

impl Error {
    /// The kind name shown to users in front of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Internal(_) => "InternalError",
            Self::CommandNotFound(_) => "CommandNotFound",
            Self::KeyValueUnmatched(_) => "CommandKeyValueUnmatched",
            Self::InvalidKeyArgument(_) => "CommandInvalidKeyArgument",
            Self::InvalidValueArgument(_) => "CommandInvalidValueArgument",
            Self::TooFewArguments { .. } => "CommandTooFewArguments",
            Self::TooManyArguments { .. } => "CommandTooManyArguments",
            Self::ArgumentConflict(_) => "CommandArgumentConflict",
            Self::SchemaInvalid(_) => "SchemaInvalid",
            Self::EntryInvalid(_) => "DataEntryInvalid",
            Self::DuplicateEntry { .. } => "DataDuplicateEntry",
            Self::EntryNotFound { .. } => "DataEntryNotFound",
        }
    }

    /// Stable hexadecimal error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Internal(_) => "0x100000",
            Self::CommandNotFound(_) => "0x101000",
            Self::KeyValueUnmatched(_) => "0x101001",
            Self::InvalidKeyArgument(_) => "0x101002",
            Self::InvalidValueArgument(_) => "0x101003",
            Self::TooFewArguments { .. } => "0x101004",
            Self::TooManyArguments { .. } => "0x101005",
            Self::ArgumentConflict(_) => "0x101006",
            Self::DuplicateEntry { .. } => "0x102001",
            Self::EntryNotFound { .. } => "0x102002",
            Self::EntryInvalid(_) => "0x102003",
            Self::SchemaInvalid(_) => "0x103001",
        }
    }
}
