pub mod config;
pub mod context;
mod error;
pub mod inject;

pub use config::{Config, ConfigError, ConfigService, EnvOptions, KeyPath, RootPath};
pub use context::AppContext;
pub use error::Error;
pub use inject::{ConfigParam, Configurable};
