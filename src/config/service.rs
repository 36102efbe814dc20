use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::builder::Loader;
use super::env::EnvOptions;
use super::helpers::{member_key, shorthand_key, Helper, HelperRegistry};
use super::key_path::KeyPath;
use super::root::RootPath;
use super::store::ConfigStore;
use super::{Config, ConfigError};

/// Key-path access to a loaded configuration store.
///
/// Clones share the same store and helper registry: a `set` or `merge`
/// through one clone is visible through all of them.
#[derive(Clone)]
pub struct ConfigService {
    store: Arc<RwLock<ConfigStore>>,
    helpers: Arc<RwLock<HelperRegistry>>,
    loader: Loader,
}

impl ConfigService {
    pub fn new(store: ConfigStore) -> Self {
        Self::with_loader(store, Loader::default())
    }

    /// Builds a service from in-memory namespaces, without touching the filesystem.
    pub fn from_namespaces(namespaces: Map<String, Value>) -> Self {
        Self::new(ConfigStore::from_namespaces(namespaces))
    }

    pub(crate) fn with_loader(store: ConfigStore, loader: Loader) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            helpers: Arc::new(RwLock::new(HelperRegistry::new())),
            loader,
        }
    }

    /// Loads every file matching `pattern`.
    pub async fn load(
        pattern: impl Into<String>,
        env: impl Into<EnvOptions>,
    ) -> Result<Self, ConfigError> {
        Config::builder().with_glob(pattern).with_env(env).load().await
    }

    pub fn load_sync(
        pattern: impl Into<String>,
        env: impl Into<EnvOptions>,
    ) -> Result<Self, ConfigError> {
        Config::builder().with_glob(pattern).with_env(env).load_sync()
    }

    fn read(&self) -> RwLockReadGuard<'_, ConfigStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConfigStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value at `path`. A stored `null` is `Some(Value::Null)`.
    pub fn get(&self, path: impl Into<KeyPath>) -> Option<Value> {
        self.read().get(&path.into()).cloned()
    }

    /// Returns the value at `path`, or `default` when nothing is stored there.
    pub fn get_or(&self, path: impl Into<KeyPath>, default: Value) -> Value {
        self.get(path).unwrap_or(default)
    }

    /// Deserializes the value at `path`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        path: impl Into<KeyPath>,
    ) -> Result<Option<T>, ConfigError> {
        let path = path.into();
        match self.get(&path) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| ConfigError::DeserializeError {
                    path: path.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    pub fn has(&self, path: impl Into<KeyPath>) -> bool {
        self.read().contains(&path.into())
    }

    pub fn set(&self, path: impl Into<KeyPath>, value: Value) -> Result<&Self, ConfigError> {
        let path = path.into();
        self.write().set(&path, value)?;
        debug!(path = %path, "config value set");
        Ok(self)
    }

    pub fn namespace(&self, name: &str) -> Option<Value> {
        self.read().namespace(name).cloned()
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.read().names().map(str::to_string).collect()
    }

    /// A copy of the whole store as one object keyed by namespace.
    pub fn snapshot(&self) -> Value {
        self.read().to_value()
    }

    pub fn root(&self) -> &RootPath {
        &self.loader.root
    }

    pub(crate) fn root_handle(&self) -> Arc<RootPath> {
        Arc::clone(&self.loader.root)
    }

    /// Loads `pattern` and replaces the namespaces it yields; others are kept.
    pub async fn merge(
        &self,
        pattern: impl Into<String>,
        env: impl Into<EnvOptions>,
    ) -> Result<&Self, ConfigError> {
        let loaded = self
            .loader
            .with_env(env.into())
            .load(&[pattern.into()])
            .await?;
        self.write().extend(loaded);
        Ok(self)
    }

    pub fn merge_sync(
        &self,
        pattern: impl Into<String>,
        env: impl Into<EnvOptions>,
    ) -> Result<&Self, ConfigError> {
        let loaded = self.loader.with_env(env.into()).load_sync(&[pattern.into()])?;
        self.write().extend(loaded);
        Ok(self)
    }

    /// Copies every namespace of `other` over this store.
    pub(crate) fn extend_from(&self, other: &ConfigService) {
        let loaded = other.read().clone();
        self.write().extend(loaded);
    }

    /// Registers a callable under `name`, replacing any previous one.
    pub fn register_helper<F>(&self, name: impl Into<String>, helper: F) -> &Self
    where
        F: Fn(&ConfigService, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.insert_helper(name.into(), Arc::new(helper));
        self
    }

    /// Binds a callable as a member of `namespace`.
    ///
    /// It is reachable both as `namespace.member` through
    /// [`call_member`](Self::call_member) and as `_member` through
    /// [`call_helper`](Self::call_helper).
    pub fn bind_helper<F>(&self, namespace: &str, member: &str, helper: F) -> &Self
    where
        F: Fn(&ConfigService, &[Value]) -> Value + Send + Sync + 'static,
    {
        let helper: Helper = Arc::new(helper);
        self.insert_helper(member_key(namespace, member), helper.clone());
        self.insert_helper(shorthand_key(member), helper);
        self
    }

    fn insert_helper(&self, name: String, helper: Helper) {
        let mut helpers = self.helpers.write().unwrap_or_else(PoisonError::into_inner);
        helpers.register(name, helper);
    }

    fn helper(&self, name: &str) -> Option<Helper> {
        self.helpers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helper(name).is_some()
    }

    pub fn call_helper(&self, name: &str, args: &[Value]) -> Result<Value, ConfigError> {
        let helper = self
            .helper(name)
            .ok_or_else(|| ConfigError::UnknownHelper(name.to_string()))?;
        Ok(helper(self, args))
    }

    pub fn call_member(
        &self,
        namespace: &str,
        member: &str,
        args: &[Value],
    ) -> Result<Value, ConfigError> {
        self.call_helper(&member_key(namespace, member), args)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new(ConfigStore::new())
    }
}

impl fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigService")
            .field("namespaces", &self.namespaces())
            .field("helpers", &*self.helpers.read().unwrap_or_else(PoisonError::into_inner))
            .field("loader", &self.loader)
            .finish()
    }
}
