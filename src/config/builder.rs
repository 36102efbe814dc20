use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::env::{load_env, EnvOptions};
use super::file::{read_namespace_file, read_namespace_file_async, NamespaceFile};
use super::glob::{resolve_glob, resolve_glob_async};
use super::resolve::resolve_env_references;
use super::root::RootPath;
use super::store::ConfigStore;
use super::{ConfigError, ConfigService};

/// Transforms namespace names derived from file names.
pub type RenameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Builder for loading namespaced configuration from glob-matched files.
///
/// Every file matched by the registered patterns becomes one namespace,
/// named after the file (`database.yaml` -> `database`) unless the file
/// carries a `__provide` or `__name` field. When two files produce the same
/// namespace, the later one replaces the earlier one entirely.
///
/// ## Environment variables
///
/// Before any file is parsed, a `.env` file is applied to the process
/// environment (see [`EnvOptions`]). String values may then reference
/// variables with `${VAR}` or `${VAR:-fallback}`:
///
/// ```yaml
/// host: ${DB_HOST:-localhost}
/// port: ${DB_PORT}
/// ```
///
/// Use `$$` to escape a literal `$` (e.g., `$${VAR}` becomes `${VAR}`).
///
/// ## Example
///
/// ```no_run
/// use dragon_config::{Config, EnvOptions};
///
/// # async fn run() -> Result<(), dragon_config::ConfigError> {
/// let config = Config::builder()
///     .with_glob("config/**/*.{json,yaml,toml}")
///     .with_env(EnvOptions::Disabled)
///     .load()
///     .await?;
///
/// let port = config.get_or("app.port", 3000.into());
/// # Ok(())
/// # }
/// ```
#[must_use = "builders do nothing until .load() is called"]
pub struct Config {
    patterns: Vec<String>,
    loader: Loader,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self {
            patterns: Vec::new(),
            loader: Loader::default(),
        }
    }

    /// Adds a glob pattern. Relative patterns are resolved against the root path.
    ///
    /// Patterns are loaded in registration order, so namespaces from later
    /// patterns replace those of earlier ones.
    pub fn with_glob(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn with_env(mut self, options: impl Into<EnvOptions>) -> Self {
        self.loader.env = options.into();
        self
    }

    /// Shares a root path with other consumers, such as an [`AppContext`](crate::AppContext).
    pub fn with_root(mut self, root: impl Into<Arc<RootPath>>) -> Self {
        self.loader.root = root.into();
        self
    }

    /// Renames namespaces derived from file names. Explicit names are kept.
    pub fn rename_with<F>(mut self, rename: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.loader.rename = Some(Arc::new(rename));
        self
    }

    /// Toggles `${VAR}` interpolation of string values. Enabled by default.
    pub fn interpolate(mut self, enabled: bool) -> Self {
        self.loader.interpolate = enabled;
        self
    }

    pub async fn load(self) -> Result<ConfigService, ConfigError> {
        let store = self.loader.load(&self.patterns).await?;
        Ok(ConfigService::with_loader(store, self.loader))
    }

    pub fn load_sync(self) -> Result<ConfigService, ConfigError> {
        let store = self.loader.load_sync(&self.patterns)?;
        Ok(ConfigService::with_loader(store, self.loader))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("patterns", &self.patterns)
            .field("loader", &self.loader)
            .finish()
    }
}

/// The glob, env and parse pipeline shared by initial loads and merges.
#[derive(Clone)]
pub(crate) struct Loader {
    pub(crate) root: Arc<RootPath>,
    pub(crate) env: EnvOptions,
    pub(crate) rename: Option<RenameFn>,
    pub(crate) interpolate: bool,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            root: Arc::new(RootPath::new()),
            env: EnvOptions::Default,
            rename: None,
            interpolate: true,
        }
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("root", &self.root)
            .field("env", &self.env)
            .field("rename", &self.rename.is_some())
            .field("interpolate", &self.interpolate)
            .finish()
    }
}

impl Loader {
    pub(crate) fn with_env(&self, env: EnvOptions) -> Self {
        Self {
            env,
            ..self.clone()
        }
    }

    fn pattern_path(&self, pattern: &str) -> PathBuf {
        self.root.root(pattern)
    }

    pub(crate) fn load_sync(&self, patterns: &[String]) -> Result<ConfigStore, ConfigError> {
        let mut paths = Vec::new();
        for pattern in patterns {
            paths.extend(resolve_glob(&self.pattern_path(pattern))?);
        }

        load_env(&self.env, self.root.cwd())?;

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            files.push(read_namespace_file(path)?);
        }
        self.aggregate(files)
    }

    pub(crate) async fn load(&self, patterns: &[String]) -> Result<ConfigStore, ConfigError> {
        let mut paths = Vec::new();
        for pattern in patterns {
            paths.extend(resolve_glob_async(self.pattern_path(pattern)).await?);
        }

        load_env(&self.env, self.root.cwd())?;

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            files.push(read_namespace_file_async(path).await?);
        }
        self.aggregate(files)
    }

    fn aggregate(&self, files: Vec<NamespaceFile>) -> Result<ConfigStore, ConfigError> {
        let lookup = |name: &str| std::env::var(name).ok();
        let file_count = files.len();
        let mut store = ConfigStore::new();

        for mut file in files {
            if self.interpolate {
                resolve_env_references(&mut file.value, &lookup).inspect_err(|_| {
                    warn!(path = %file.path.display(), "failed to interpolate config file");
                })?;
            }

            let name = file.name(self.rename.as_deref());
            debug!(namespace = %name, path = %file.path.display(), "loaded config namespace");
            if store.insert_namespace(name.clone(), file.value).is_some() {
                warn!(namespace = %name, path = %file.path.display(), "namespace replaced by later file");
            }
        }

        info!(files = file_count, namespaces = store.len(), "configuration loaded");
        Ok(store)
    }
}
