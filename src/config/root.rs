//! Root directory used to resolve relative glob patterns.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::ConfigError;

/// The application root, resolved at most once.
///
/// Until [`resolve_root_path`](Self::resolve_root_path) succeeds, the root is
/// the working directory captured at construction.
#[derive(Debug)]
pub struct RootPath {
    cwd: PathBuf,
    resolved: OnceLock<PathBuf>,
}

impl RootPath {
    /// Uses the process working directory, falling back to `.` if it is unavailable.
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_cwd(cwd)
    }

    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            resolved: OnceLock::new(),
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The resolved root if any, else the working directory.
    pub fn base(&self) -> &Path {
        self.resolved.get().unwrap_or(&self.cwd)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Joins `dir` onto the root. Absolute `dir` values are returned unchanged.
    pub fn root(&self, dir: impl AsRef<Path>) -> PathBuf {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() {
            return self.base().to_path_buf();
        }
        self.base().join(dir)
    }

    #[deprecated(note = "use `root` instead")]
    pub fn src(&self, dir: impl AsRef<Path>) -> PathBuf {
        self.root(dir)
    }

    /// Walks up from `start` to the directory directly below the current root
    /// and caches it as the root.
    ///
    /// Once a root has been resolved, later calls leave it unchanged.
    pub fn resolve_root_path(&self, start: impl AsRef<Path>) -> Result<&Path, ConfigError> {
        let start = start.as_ref();
        if !start.is_absolute() {
            return Err(ConfigError::RelativeStartPath(start.to_path_buf()));
        }

        let resolved = self.resolved.get_or_init(|| {
            let root = self.cwd.as_path();
            let mut working = start;
            let mut parent = start.parent().unwrap_or(start);

            while working != root && parent != root && parent != working {
                working = parent;
                parent = working.parent().unwrap_or(working);
            }

            tracing::debug!(root = %working.display(), "resolved config root path");
            working.to_path_buf()
        });

        Ok(resolved.as_path())
    }

    #[deprecated(note = "use `resolve_root_path` instead")]
    pub fn resolve_src_path(&self, start: impl AsRef<Path>) -> Result<&Path, ConfigError> {
        self.resolve_root_path(start)
    }
}

impl Default for RootPath {
    fn default() -> Self {
        Self::new()
    }
}
