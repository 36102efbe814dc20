//! Environment variable interpolation for namespace values.
//!
//! Supports `${VAR}` and `${VAR:-fallback}` inside any string value.
//! Use `$${...}` to escape and produce a literal `${...}`.

use serde_json::{Number, Value};

use super::ConfigError;

/// Resolves every `${VAR}` reference in the tree using `lookup`.
///
/// A string consisting of exactly one reference is coerced to the most
/// specific scalar type, so `"${PORT}"` with `PORT=8080` becomes `8080`.
/// Leading zeros are lost this way: `"${ZIP}"` with `ZIP=007` becomes `7`.
pub fn resolve_env_references<F>(value: &mut Value, lookup: &F) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => {
            if let Some(reference) = whole_reference(s) {
                let resolved = resolve_reference(reference, lookup)?;
                *value = coerce_value(&resolved);
                return Ok(1);
            }
            resolve_string(s, lookup)
        }
        Value::Object(map) => {
            let mut count = 0;
            for item in map.values_mut() {
                count += resolve_env_references(item, lookup)?;
            }
            Ok(count)
        }
        Value::Array(items) => {
            let mut count = 0;
            for item in items.iter_mut() {
                count += resolve_env_references(item, lookup)?;
            }
            Ok(count)
        }
        _ => Ok(0),
    }
}

/// Returns the reference body when `s` is a single `${...}` and nothing else.
fn whole_reference(s: &str) -> Option<&str> {
    let body = s.strip_prefix("${")?.strip_suffix('}')?;
    if body.contains('}') || body.contains("${") {
        return None;
    }
    Some(body)
}

fn resolve_reference<F>(reference: &str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (name, fallback) = match reference.split_once(":-") {
        Some((name, fallback)) => (name.trim(), Some(fallback)),
        None => (reference.trim(), None),
    };

    // A set variable wins over the fallback, even when empty
    match (lookup(name), fallback) {
        (Some(value), _) => Ok(value),
        (None, Some(fallback)) => Ok(fallback.to_string()),
        (None, None) => Err(ConfigError::EnvVarNotFound(name.to_string())),
    }
}

/// Resolves all `${...}` references in a string.
/// Handles `$$` escape sequences.
fn resolve_string<F>(s: &mut String, lookup: &F) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !s.contains('$') {
        return Ok(0);
    }

    let mut result = String::with_capacity(s.len());
    let mut substitutions = 0;
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                // Escape sequence: $$ -> $
                chars.next();
                result.push('$');
            }
            Some('{') => {
                // Reference: ${VAR} or ${VAR:-fallback}
                chars.next(); // consume '{'
                let reference =
                    consume_until(&mut chars, '}').ok_or(ConfigError::UnclosedReference)?;
                result.push_str(&resolve_reference(&reference, lookup)?);
                substitutions += 1;
            }
            // Just a lone $
            _ => result.push('$'),
        }
    }

    *s = result;
    Ok(substitutions)
}

fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None // Delimiter not found
}

fn coerce_value(s: &str) -> Value {
    // Try boolean first (case-insensitive)
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    // Integer before float so "8080" stays an integer
    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Number(i.into());
        }
    }

    // Float only with a decimal point
    if s.contains('.') {
        if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }

    // Fallback to string
    Value::String(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
