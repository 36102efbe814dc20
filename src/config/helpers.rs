use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::ConfigService;

/// A named callable that can read the configuration it is registered on.
pub type Helper = Arc<dyn Fn(&ConfigService, &[Value]) -> Value + Send + Sync>;

#[derive(Default, Clone)]
pub struct HelperRegistry {
    helpers: HashMap<String, Helper>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, helper: Helper) -> Option<Helper> {
        self.helpers.insert(name.into(), helper)
    }

    pub fn get(&self, name: &str) -> Option<Helper> {
        self.helpers.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("HelperRegistry").field("helpers", &names).finish()
    }
}

/// Registry key for a helper bound to a namespace member.
pub fn member_key(namespace: &str, member: &str) -> String {
    format!("{namespace}.{member}")
}

/// Top-level shorthand for a bound member: `isProductionPort` -> `_isProductionPort`.
pub fn shorthand_key(member: &str) -> String {
    format!("_{member}")
}
