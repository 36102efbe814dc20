use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },

    #[error("failed to scan config directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("unsupported config file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("failed to deserialize config value at '{path}': {source}")]
    DeserializeError {
        path: String,
        source: serde_json::Error,
    },

    /// Only the byte position is kept so secrets never reach the message.
    #[error("failed to parse .env file '{path}' at position {error_index}")]
    DotenvParse { path: PathBuf, error_index: usize },

    #[error("failed to read .env file '{path}': {kind}")]
    DotenvIo { path: PathBuf, kind: ErrorKind },

    #[error("failed to load .env file '{0}'")]
    DotenvUnknown(PathBuf),

    #[error("environment variable not set: {0}")]
    EnvVarNotFound(String),

    #[error("unclosed reference (missing '}}')")]
    UnclosedReference,

    #[error("key path must not be empty")]
    EmptyKeyPath,

    #[error("array index {index} is too far past the end (length {len})")]
    IndexOutOfRange { index: String, len: usize },

    #[error("start path must be an absolute path: {0}")]
    RelativeStartPath(PathBuf),

    #[error("no helper registered under '{0}'")]
    UnknownHelper(String),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
