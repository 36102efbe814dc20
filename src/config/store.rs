//! The in-memory namespace store.

use serde_json::{Map, Value};

use super::key_path::KeyPath;
use super::ConfigError;

/// Largest number of `null` slots `set` will pad an array with.
const MAX_INDEX_GAP: usize = 1024;

/// Mapping of namespace name to its value tree.
///
/// Namespaces are replaced wholesale on insert; nothing is deep-merged
/// across namespaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    namespaces: Map<String, Value>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_namespaces(namespaces: Map<String, Value>) -> Self {
        Self { namespaces }
    }

    /// Inserts a namespace, returning the one it replaced.
    pub fn insert_namespace(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.namespaces.insert(name.into(), value)
    }

    pub fn namespace(&self, name: &str) -> Option<&Value> {
        self.namespaces.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Overwrites every namespace present in `other`, leaving the rest alone.
    pub fn extend(&mut self, other: ConfigStore) {
        for (name, value) in other.namespaces {
            self.namespaces.insert(name, value);
        }
    }

    pub fn get(&self, path: &KeyPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.namespaces.get(first)?;
        for segment in rest {
            current = child(current, segment)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &KeyPath) -> bool {
        self.get(path).is_some()
    }

    /// Assigns `value` at `path`, creating intermediate containers as needed.
    pub fn set(&mut self, path: &KeyPath, value: Value) -> Result<(), ConfigError> {
        let (first, rest) = path
            .segments()
            .split_first()
            .ok_or(ConfigError::EmptyKeyPath)?;

        if rest.is_empty() {
            self.namespaces.insert(first.clone(), value);
            return Ok(());
        }

        let root = self
            .namespaces
            .entry(first.clone())
            .or_insert_with(|| container_for(&rest[0]));
        assign_at_path(root, rest, value)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.namespaces.clone())
    }

    pub fn into_namespaces(self) -> Map<String, Value> {
        self.namespaces
    }
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn array_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Empty container for the next segment. Only small indices start an array.
fn container_for(next_segment: &str) -> Value {
    match array_index(next_segment) {
        Some(index) if index <= MAX_INDEX_GAP => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

fn assign_at_path(node: &mut Value, path: &[String], value: Value) -> Result<(), ConfigError> {
    let (first, rest) = match path.split_first() {
        Some(split) => split,
        None => {
            *node = value;
            return Ok(());
        }
    };

    let fits = match node {
        Value::Object(_) => true,
        Value::Array(_) => array_index(first).is_some(),
        _ => false,
    };
    if !fits {
        *node = Value::Object(Map::new());
    }

    let slot = match node {
        Value::Array(items) => {
            let len = items.len();
            let index = array_index(first)
                .filter(|index| index.saturating_sub(len) <= MAX_INDEX_GAP)
                .ok_or_else(|| ConfigError::IndexOutOfRange {
                    index: first.clone(),
                    len,
                })?;
            if len <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        Value::Object(map) => map.entry(first.clone()).or_insert(Value::Null),
        _ => return Ok(()),
    };

    if rest.is_empty() {
        *slot = value;
        return Ok(());
    }
    if !matches!(slot, Value::Object(_) | Value::Array(_)) {
        *slot = container_for(&rest[0]);
    }
    assign_at_path(slot, rest, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_store(value: Value) -> ConfigStore {
        match value {
            Value::Object(map) => ConfigStore::from_namespaces(map),
            _ => panic!("store fixture must be an object"),
        }
    }

    #[test]
    fn test_get_preserves_null() {
        let store = make_store(json!({ "demo": { "value1": null, "value2": "OK" } }));

        assert_eq!(store.get(&"demo.value1".into()), Some(&Value::Null));
        assert_eq!(store.get(&"demo.value2".into()), Some(&json!("OK")));
        assert_eq!(store.get(&"demo.value3".into()), None);
    }

    #[test]
    fn test_get_through_arrays() {
        let store = make_store(json!({ "db": { "hosts": [{ "name": "a" }, { "name": "b" }] } }));

        assert_eq!(store.get(&"db.hosts[1].name".into()), Some(&json!("b")));
        assert_eq!(store.get(&"db.hosts.5.name".into()), None);
        assert_eq!(store.get(&"db.hosts.x".into()), None);
    }

    #[test]
    fn test_get_does_not_descend_into_scalars() {
        let store = make_store(json!({ "app": { "port": 80 } }));
        assert_eq!(store.get(&"app.port.value".into()), None);
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut store = ConfigStore::new();
        store.set(&"graphql.server.port".into(), json!(2000)).unwrap();

        assert_eq!(
            store.namespace("graphql"),
            Some(&json!({ "server": { "port": 2000 } }))
        );
    }

    #[test]
    fn test_set_creates_arrays_for_numeric_segments() {
        let mut store = ConfigStore::new();
        store.set(&"app.hosts[2]".into(), json!("c")).unwrap();

        assert_eq!(store.namespace("app"), Some(&json!({ "hosts": [null, null, "c"] })));
    }

    #[test]
    fn test_set_huge_index_on_new_path_uses_object_key() {
        let mut store = ConfigStore::new();
        store.set(&"app.hosts.18446744073709551615".into(), json!(1)).unwrap();
        store.set(&"app.ids.4000000000".into(), json!(2)).unwrap();

        assert_eq!(
            store.namespace("app"),
            Some(&json!({
                "hosts": { "18446744073709551615": 1 },
                "ids": { "4000000000": 2 }
            }))
        );
    }

    #[test]
    fn test_set_huge_index_into_existing_array_fails() {
        let mut store = make_store(json!({ "app": { "hosts": ["a", "b"] } }));

        for path in ["app.hosts.18446744073709551615", "app.hosts.4000000000"] {
            let result = store.set(&path.into(), json!("x"));
            assert!(matches!(result, Err(ConfigError::IndexOutOfRange { len: 2, .. })));
        }
        assert_eq!(store.get(&"app.hosts".into()), Some(&json!(["a", "b"])));

        store.set(&"app.hosts.3".into(), json!("d")).unwrap();
        assert_eq!(store.get(&"app.hosts".into()), Some(&json!(["a", "b", null, "d"])));
    }

    #[test]
    fn test_set_replaces_scalar_intermediates() {
        let mut store = make_store(json!({ "app": { "port": 80 } }));
        store.set(&"app.port.value".into(), json!(81)).unwrap();

        assert_eq!(store.get(&"app.port.value".into()), Some(&json!(81)));
    }

    #[test]
    fn test_set_empty_path() {
        let mut store = ConfigStore::new();
        let result = store.set(&"".into(), json!(1));
        assert!(matches!(result, Err(ConfigError::EmptyKeyPath)));
    }

    #[test]
    fn test_extend_replaces_whole_namespaces() {
        let mut store = make_store(json!({
            "app": { "name": "demo", "port": 80 },
            "db": { "host": "localhost" }
        }));
        store.extend(make_store(json!({ "app": { "port": 8080 } })));

        assert_eq!(store.namespace("app"), Some(&json!({ "port": 8080 })));
        assert_eq!(store.get(&"db.host".into()), Some(&json!("localhost")));
    }
}
