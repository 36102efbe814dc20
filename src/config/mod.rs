//! Namespaced configuration loading and key-path access.

mod builder;
mod env;
mod error;
mod file;
mod glob;
mod helpers;
mod key_path;
mod resolve;
mod root;
mod service;
mod store;

pub use builder::{Config, RenameFn};
pub use env::EnvOptions;
pub use error::ConfigError;
pub use file::{FileFormat, NAME_FIELD, PROVIDE_FIELD};
pub use helpers::Helper;
pub use key_path::KeyPath;
pub use root::RootPath;
pub use service::ConfigService;
pub use store::ConfigStore;
