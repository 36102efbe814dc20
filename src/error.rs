use crate::config::ConfigError;
use thiserror::Error;

/// Top-level error type for the dragon-config library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("application context requires a configuration or a glob to load")]
    MissingConfig,

    #[error("cannot find config provider with token [{0}]")]
    UnknownProvider(String),
}
