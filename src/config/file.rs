//! Namespace files: parsing and naming.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::ConfigError;

/// Field that names the namespace explicitly, taking precedence over all else.
pub const PROVIDE_FIELD: &str = "__provide";
/// Field that names the namespace when [`PROVIDE_FIELD`] is absent.
pub const NAME_FIELD: &str = "__name";

/// Supported namespace file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A parsed namespace file, before it is placed in a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceFile {
    pub path: PathBuf,
    /// Name from `__provide` or `__name`, if the file carried one.
    pub explicit_name: Option<String>,
    pub value: Value,
}

impl NamespaceFile {
    /// Parses `contents` according to the format implied by `path`.
    pub fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let format =
            FileFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.into()))?;
        let parse_error = |message: String| ConfigError::ParseError {
            path: path.to_path_buf(),
            message,
        };

        let mut value = match format {
            FileFormat::Json => {
                serde_json::from_str(contents).map_err(|e| parse_error(e.to_string()))?
            }
            FileFormat::Yaml => {
                serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string()))?
            }
            FileFormat::Toml => {
                let table: toml::Table =
                    toml::from_str(contents).map_err(|e| parse_error(e.to_string()))?;
                toml_to_json(toml::Value::Table(table))
            }
        };

        let explicit_name = match &mut value {
            Value::Object(map) => take_explicit_name(map),
            _ => None,
        };

        Ok(Self {
            path: path.to_path_buf(),
            explicit_name,
            value,
        })
    }

    /// Namespace name: explicit override, else the (optionally renamed) file stem.
    pub fn name(&self, rename: Option<&(dyn Fn(&str) -> String + Send + Sync)>) -> String {
        if let Some(name) = &self.explicit_name {
            return name.clone();
        }
        let stem = file_stem_name(&self.path);
        match rename {
            Some(rename) => rename(&stem),
            None => stem,
        }
    }
}

/// Base name without the final extension: `config.stub.json` -> `config.stub`.
pub fn file_stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn take_explicit_name(map: &mut Map<String, Value>) -> Option<String> {
    let provide = map.remove(PROVIDE_FIELD);
    let name = map.remove(NAME_FIELD);
    [provide, name].into_iter().flatten().find_map(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Reads and parses a namespace file.
pub fn read_namespace_file(path: &Path) -> Result<NamespaceFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    NamespaceFile::parse(path, &contents)
}

pub async fn read_namespace_file_async(path: &Path) -> Result<NamespaceFile, ConfigError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
    NamespaceFile::parse(path, &contents)
}
