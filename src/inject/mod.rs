//! Config-driven argument injection for handlers.
//!
//! A [`Configurable`] carries explicit `(index, key, fallback)` bindings.
//! Before a handler runs, every placeholder argument (`None`) at a bound
//! index is replaced by the config value at `key`, or by `fallback` when
//! the key is absent.
//!
//! ```
//! use dragon_config::{ConfigService, Configurable};
//! use serde_json::{json, Value};
//!
//! let config = ConfigService::default();
//! config.set("app.development", json!(true)).unwrap();
//!
//! let index = Configurable::new(config)
//!     .param(0, "user.name", json!("test"))
//!     .param(1, "app.development", Value::Null)
//!     .wrap(|args| json!({ "username": args[0], "live": args[1] }));
//!
//! assert_eq!(index(vec![None, None]), json!({ "username": "test", "live": true }));
//! ```

use serde_json::Value;

use crate::config::{ConfigService, KeyPath};

/// One argument binding: the value at `key` is injected at `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigParam {
    pub index: usize,
    pub key: KeyPath,
    pub fallback: Value,
}

impl ConfigParam {
    pub fn new(index: usize, key: impl Into<KeyPath>, fallback: Value) -> Self {
        Self {
            index,
            key: key.into(),
            fallback,
        }
    }
}

#[derive(Debug, Clone)]
#[must_use]
pub struct Configurable {
    config: ConfigService,
    params: Vec<ConfigParam>,
}

impl Configurable {
    pub fn new(config: ConfigService) -> Self {
        Self {
            config,
            params: Vec::new(),
        }
    }

    /// Binds the argument at `index` to the config value at `key`.
    pub fn param(mut self, index: usize, key: impl Into<KeyPath>, fallback: Value) -> Self {
        self.params.push(ConfigParam::new(index, key, fallback));
        self
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = ConfigParam>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn params(&self) -> &[ConfigParam] {
        &self.params
    }

    /// Fills bound placeholders from config. Explicit arguments are kept and
    /// unbound placeholders become `null`.
    pub fn apply(&self, mut args: Vec<Option<Value>>) -> Vec<Value> {
        if let Some(max) = self.params.iter().map(|p| p.index).max() {
            if args.len() <= max {
                args.resize(max + 1, None);
            }
        }

        for param in &self.params {
            if args[param.index].is_none() {
                args[param.index] =
                    Some(self.config.get_or(&param.key, param.fallback.clone()));
            }
        }

        args.into_iter()
            .map(|arg| arg.unwrap_or(Value::Null))
            .collect()
    }

    /// Wraps `handler` so its arguments are filled in before every call.
    pub fn wrap<F, R>(self, handler: F) -> impl Fn(Vec<Option<Value>>) -> R
    where
        F: Fn(Vec<Value>) -> R,
    {
        move |args| handler(self.apply(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> ConfigService {
        let config = ConfigService::default();
        config.set("user.name", json!("alice")).unwrap();
        config.set("app.port", json!(8080)).unwrap();
        config
    }

    #[test]
    fn test_placeholders_are_filled() {
        let injector = Configurable::new(service())
            .param(0, "user.name", json!("test"))
            .param(1, "app.port", json!(3000));

        assert_eq!(injector.apply(vec![None, None]), vec![json!("alice"), json!(8080)]);
    }

    #[test]
    fn test_fallback_when_key_missing() {
        let injector = Configurable::new(service()).param(0, "app.missing", json!("fallback"));
        assert_eq!(injector.apply(vec![None]), vec![json!("fallback")]);
    }

    #[test]
    fn test_explicit_arguments_are_kept() {
        let injector = Configurable::new(service()).param(0, "user.name", json!("test"));
        assert_eq!(
            injector.apply(vec![Some(json!("bob")), None]),
            vec![json!("bob"), Value::Null]
        );
    }

    #[test]
    fn test_args_extended_to_bound_index() {
        let injector = Configurable::new(service()).param(2, "app.port", Value::Null);
        assert_eq!(
            injector.apply(Vec::new()),
            vec![Value::Null, Value::Null, json!(8080)]
        );
    }

    #[test]
    fn test_wrap_sees_later_config_changes() {
        let config = service();
        let handler = Configurable::new(config.clone())
            .with_params([ConfigParam::new(0, ["app", "port"], Value::Null)])
            .wrap(|args| args[0].clone());

        assert_eq!(handler(vec![None]), json!(8080));
        config.set("app.port", json!(9090)).unwrap();
        assert_eq!(handler(vec![None]), json!(9090));
    }
}
