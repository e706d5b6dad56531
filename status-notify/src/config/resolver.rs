//! Recursive `env:VAR_NAME` resolution over a JSON document.

use serde_json::{Map, Value};

use super::environment::Environment;
use crate::{Error, Result};

/// Prefix marking a string as an environment variable reference.
pub const ENV_PREFIX: &str = "env:";

/// Resolve every `env:` reference in `raw`.
///
/// Returns a new document; `raw` is left untouched. Fails on the first
/// reference whose variable is not present in `env`.
pub fn resolve(raw: &Value, env: &Environment) -> Result<Value> {
    let mut substituted = Vec::new();
    resolve_value(raw, env, &mut substituted)
}

/// Like [`resolve`], also returning every value substituted from the
/// environment so callers can redact them later.
pub fn resolve_tracked(raw: &Value, env: &Environment) -> Result<(Value, Vec<String>)> {
    let mut substituted = Vec::new();
    let resolved = resolve_value(raw, env, &mut substituted)?;
    Ok((resolved, substituted))
}

fn resolve_value(value: &Value, env: &Environment, substituted: &mut Vec<String>) -> Result<Value> {
    match value {
        Value::String(s) => resolve_string(s, env, substituted).map(Value::String),
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(item, env, substituted))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut resolved = Map::with_capacity(map.len());
            for (key, item) in map {
                resolved.insert(key.clone(), resolve_value(item, env, substituted)?);
            }
            Ok(Value::Object(resolved))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
    }
}

fn resolve_string(s: &str, env: &Environment, substituted: &mut Vec<String>) -> Result<String> {
    let Some(name) = s.strip_prefix(ENV_PREFIX) else {
        return Ok(s.to_string());
    };

    if name.is_empty() {
        return Err(Error::config(format!(
            "empty environment reference '{ENV_PREFIX}'"
        )));
    }

    let value = env.get(name).ok_or_else(|| Error::missing_env(name))?;
    if !value.is_empty() {
        substituted.push(value.to_string());
    }
    Ok(value.to_string())
}
