//! Application context: the composition root that owns the configuration.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::config::{Config, ConfigService, EnvOptions, RootPath};
use crate::Error;

/// Prefix of the token under which each namespace is provided.
pub const TOKEN_PREFIX: &str = "__config_";

/// Token naming the provider of namespace `name`.
pub fn config_token(name: &str) -> String {
    format!("{TOKEN_PREFIX}{name}")
}

/// Central application context holding the shared configuration service.
///
/// Consumers receive clones of [`config()`](Self::config), which all observe
/// the same store. Individual namespaces are handed out as named providers.
///
/// ## Example
///
/// ```no_run
/// use dragon_config::{AppContext, EnvOptions};
///
/// # async fn run() -> Result<(), dragon_config::Error> {
/// let ctx = AppContext::builder()
///     .with_glob("config/*.yaml")
///     .with_env(EnvOptions::Default)
///     .build()
///     .await?;
///
/// let database = ctx.provider("database")?;
/// let port = ctx.config().get_or("app.port", 3000.into());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AppContext {
    config: ConfigService,
}

impl AppContext {
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    /// The shared configuration service.
    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    /// Tokens of every registered namespace provider.
    pub fn providers(&self) -> Vec<String> {
        self.config
            .namespaces()
            .iter()
            .map(|name| config_token(name))
            .collect()
    }

    pub fn provider_token(&self, name: &str) -> Result<String, Error> {
        if self.config.namespace(name).is_some() {
            Ok(config_token(name))
        } else {
            Err(Error::UnknownProvider(name.to_string()))
        }
    }

    /// The namespace registered under `name`.
    pub fn provider(&self, name: &str) -> Result<Value, Error> {
        self.config
            .namespace(name)
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))
    }

    /// The namespace behind a provider token such as `__config_database`.
    pub fn provider_by_token(&self, token: &str) -> Result<Value, Error> {
        let name = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| Error::UnknownProvider(token.to_string()))?;
        self.config
            .namespace(name)
            .ok_or_else(|| Error::UnknownProvider(token.to_string()))
    }
}

/// Builder for constructing an [`AppContext`].
///
/// Either attach a ready [`ConfigService`] with
/// [`with_config`](Self::with_config), or register glob patterns to load.
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder {
    config: Option<ConfigService>,
    patterns: Vec<String>,
    env: EnvOptions,
    root: Option<Arc<RootPath>>,
    start_path: Option<PathBuf>,
}

impl AppContextBuilder {
    /// Attaches a pre-built configuration service.
    pub fn with_config(mut self, config: ConfigService) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_glob(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn with_env(mut self, options: impl Into<EnvOptions>) -> Self {
        self.env = options.into();
        self
    }

    pub fn with_root(mut self, root: impl Into<Arc<RootPath>>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Resolves the root path from `start` before any pattern is loaded.
    ///
    /// The root of an attached [`ConfigService`] is resolved as well, so its
    /// later merges see the same root.
    pub fn with_start_path(mut self, start: impl Into<PathBuf>) -> Self {
        self.start_path = Some(start.into());
        self
    }

    fn prepare(self) -> Result<Prepared, Error> {
        let root = self
            .root
            .or_else(|| self.config.as_ref().map(ConfigService::root_handle))
            .unwrap_or_else(|| Arc::new(RootPath::new()));
        if let Some(start) = &self.start_path {
            root.resolve_root_path(start)?;
            // an attached service keeps merging against its own root
            if let Some(config) = &self.config {
                config.root().resolve_root_path(start)?;
            }
        }

        if self.patterns.is_empty() {
            return match self.config {
                Some(config) => Ok(Prepared::Ready(config)),
                None => Err(Error::MissingConfig),
            };
        }

        let loader = self
            .patterns
            .into_iter()
            .fold(Config::builder(), Config::with_glob)
            .with_env(self.env)
            .with_root(root);

        Ok(Prepared::Load {
            loader,
            base: self.config,
        })
    }

    pub async fn build(self) -> Result<AppContext, Error> {
        let config = match self.prepare()? {
            Prepared::Ready(config) => config,
            Prepared::Load { loader, base } => combine(base, loader.load().await?),
        };
        Ok(AppContext { config })
    }

    pub fn build_sync(self) -> Result<AppContext, Error> {
        let config = match self.prepare()? {
            Prepared::Ready(config) => config,
            Prepared::Load { loader, base } => combine(base, loader.load_sync()?),
        };
        Ok(AppContext { config })
    }
}

enum Prepared {
    Ready(ConfigService),
    Load {
        loader: Config,
        base: Option<ConfigService>,
    },
}

/// Overlays loaded namespaces onto an attached service, keeping its identity.
fn combine(base: Option<ConfigService>, loaded: ConfigService) -> ConfigService {
    match base {
        Some(base) => {
            base.extend_from(&loaded);
            base
        }
        None => loaded,
    }
}
