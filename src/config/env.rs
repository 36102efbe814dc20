use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::ConfigError;

/// Where to read `.env` variables from before namespace files are parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvOptions {
    /// Skip `.env` loading entirely.
    Disabled,
    /// `<cwd>/.env`; a missing file is not an error.
    #[default]
    Default,
    /// An explicit file, which must exist.
    Path(PathBuf),
}

impl From<bool> for EnvOptions {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Default
        } else {
            Self::Disabled
        }
    }
}

impl From<PathBuf> for EnvOptions {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for EnvOptions {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Applies the `.env` file selected by `options` to the process environment.
///
/// Variables already present in the environment are left untouched. Loaded
/// variables persist for the rest of the process.
pub fn load_env(options: &EnvOptions, cwd: &Path) -> Result<(), ConfigError> {
    let (path, required) = match options {
        EnvOptions::Disabled => return Ok(()),
        EnvOptions::Default => (cwd.join(".env"), false),
        EnvOptions::Path(path) => (cwd.join(path), true),
    };

    // from_path never overrides variables that are already set
    match dotenvy::from_path(&path) {
        Ok(()) => {
            debug!(path = %path.display(), "loaded .env file");
            Ok(())
        }
        Err(e) if is_not_found(&e) && !required => {
            debug!(path = %path.display(), "no .env file found, skipping");
            Ok(())
        }
        // Keep only the position; the line may hold a secret
        Err(dotenvy::Error::LineParse(_, idx)) => Err(ConfigError::DotenvParse {
            path,
            error_index: idx,
        }),
        Err(dotenvy::Error::Io(io_err)) => {
            warn!(path = %path.display(), "failed to read .env file");
            Err(ConfigError::DotenvIo {
                path,
                kind: io_err.kind(),
            })
        }
        Err(_) => Err(ConfigError::DotenvUnknown(path)),
    }
}

fn is_not_found(err: &dotenvy::Error) -> bool {
    matches!(
        err,
        dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
    )
}
