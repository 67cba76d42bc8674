//! Script settings files.
//!
//! A script declares its defaults as a serializable struct; [`load_or_create`]
//! writes them out on first run and on later runs overlays whatever the user
//! edited, casting each value to the type of its default.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use shellscript::settings::{load_or_create, SettingsFormat};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Settings {
//!     debug: bool,
//!     retries: u32,
//! }
//!
//! let settings = load_or_create(
//!     "backup.yaml",
//!     SettingsFormat::Yaml,
//!     &Settings { debug: false, retries: 3 },
//! )?;
//! println!("retries = {}", settings.retries);
//! # Ok::<(), shellscript::ShellError>(())
//! ```

use crate::error::{Result, ShellError};
use crate::fs::{read_text, write_text};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// On-disk format of a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Yaml,
    Json,
    Toml,
}

impl SettingsFormat {
    /// Format implied by the file extension (`yaml`/`yml`, `json`, `toml`).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Some(SettingsFormat::Yaml),
            "json" => Some(SettingsFormat::Json),
            "toml" => Some(SettingsFormat::Toml),
            _ => None,
        }
    }

    fn parse(&self, text: &str) -> Result<Value> {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value = match self {
            SettingsFormat::Yaml => serde_yaml::from_str::<Value>(text)?,
            SettingsFormat::Json => serde_json::from_str::<Value>(text)?,
            SettingsFormat::Toml => toml::from_str::<Value>(text)?,
        };
        Ok(value)
    }

    fn render<T: Serialize>(&self, data: &T) -> Result<String> {
        let text = match self {
            SettingsFormat::Yaml => serde_yaml::to_string(data)?,
            SettingsFormat::Json => serde_json::to_string_pretty(data)? + "\n",
            SettingsFormat::Toml => toml::to_string_pretty(data)?,
        };
        Ok(text)
    }
}

/// Load settings from `path`, creating the file from `defaults` if missing.
///
/// Keys the file does not mention keep their default; keys that are not in
/// `defaults` are ignored.
pub fn load_or_create<T>(path: impl AsRef<Path>, format: SettingsFormat, defaults: &T) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let path = path.as_ref();
    let default_values = serde_json::to_value(defaults)?;

    if !path.exists() {
        write_text(path, format.render(defaults)?)?;
        info!("Created default configuration file: {}", path.display());
        return Ok(serde_json::from_value(default_values)?);
    }

    let values = format.parse(&read_text(path)?)?;
    let merged = cast_values(&values, &default_values)?;
    debug!("Loaded settings from {}", path.display());
    Ok(serde_json::from_value(merged)?)
}

/// Cast `values` to the shape of `defaults`.
///
/// Every key of `defaults` is present in the result, converted to the
/// default's type where possible. An empty or null document counts as an
/// empty table.
pub fn cast_values(values: &Value, defaults: &Value) -> Result<Value> {
    cast_table("", values, defaults)
}

fn cast_table(prefix: &str, values: &Value, defaults: &Value) -> Result<Value> {
    let Value::Object(default_map) = defaults else {
        return cast_value(prefix, values, defaults);
    };
    let empty = Map::new();
    let value_map = match values {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(ShellError::invalid(
                field_name(prefix, "<root>"),
                format!("expected a table, found {}", type_name(other)),
            ))
        }
    };

    let mut result = Map::new();
    for (key, default) in default_map {
        let field = field_name(prefix, key);
        let value = match value_map.get(key) {
            Some(value) => cast_value(&field, value, default)?,
            None => default.clone(),
        };
        result.insert(key.clone(), value);
    }
    Ok(Value::Object(result))
}

fn cast_value(field: &str, value: &Value, default: &Value) -> Result<Value> {
    let mismatch = || {
        ShellError::invalid(
            field,
            format!(
                "cannot convert {} {} to {}",
                type_name(value),
                value,
                type_name(default)
            ),
        )
    };

    match default {
        Value::Bool(_) => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Number(n) => Ok(Value::Bool(n.as_f64().map_or(false, |f| f != 0.0))),
            Value::String(s) => parse_bool(s).map(Value::Bool).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        Value::Number(n) if n.is_f64() => match value {
            Value::Number(v) => v.as_f64().map(Value::from).ok_or_else(mismatch),
            Value::String(s) => s.trim().parse::<f64>().map(Value::from).map_err(|_| mismatch()),
            Value::Bool(b) => Ok(Value::from(if *b { 1.0 } else { 0.0 })),
            _ => Err(mismatch()),
        },
        Value::Number(_) => match value {
            Value::Number(v) if v.is_i64() || v.is_u64() => Ok(value.clone()),
            // Floats truncate toward zero
            Value::Number(v) => v
                .as_f64()
                .map(|f| Value::from(f.trunc() as i64))
                .ok_or_else(mismatch),
            Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| mismatch()),
            Value::Bool(b) => Ok(Value::from(i64::from(*b))),
            _ => Err(mismatch()),
        },
        Value::String(_) => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(mismatch()),
        },
        Value::Object(_) => match value {
            Value::Object(_) => cast_table(field, value, default),
            _ => Err(mismatch()),
        },
        Value::Null | Value::Array(_) => Ok(value.clone()),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" | "" => Some(false),
        _ => None,
    }
}

fn field_name(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

/// Read a YAML document.
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    Ok(serde_yaml::from_str(&read_text(path)?)?)
}

/// Write `data` as YAML. With `only_if_changed` an identical file is left
/// untouched. Returns whether the file was written.
pub fn save_yaml<T: Serialize>(
    path: impl AsRef<Path>,
    data: &T,
    only_if_changed: bool,
) -> Result<bool> {
    let path = path.as_ref();
    let text = serde_yaml::to_string(data)?;

    if only_if_changed && read_text(path).ok().as_deref() == Some(text.as_str()) {
        debug!("{} unchanged, not rewriting", path.display());
        return Ok(false);
    }
    write_text(path, &text)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Limits {
        max_files: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        debug: bool,
        retries: i64,
        ratio: f64,
        target: String,
        limits: Limits,
    }

    fn defaults() -> Settings {
        Settings {
            debug: false,
            retries: 3,
            ratio: 0.5,
            target: "/tmp/out".to_string(),
            limits: Limits { max_files: 10 },
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SettingsFormat::from_path("a.yml"), Some(SettingsFormat::Yaml));
        assert_eq!(SettingsFormat::from_path("a.YAML"), Some(SettingsFormat::Yaml));
        assert_eq!(SettingsFormat::from_path("a.json"), Some(SettingsFormat::Json));
        assert_eq!(SettingsFormat::from_path("a.toml"), Some(SettingsFormat::Toml));
        assert_eq!(SettingsFormat::from_path("a.ini"), None);
        assert_eq!(SettingsFormat::from_path("noext"), None);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        for (name, format) in [
            ("s.yaml", SettingsFormat::Yaml),
            ("s.json", SettingsFormat::Json),
            ("s.toml", SettingsFormat::Toml),
        ] {
            let path = temp_dir.path().join(name);
            let loaded = load_or_create(&path, format, &defaults()).unwrap();
            assert_eq!(loaded, defaults());
            assert!(path.exists());

            // Second load reads the file back
            let reloaded = load_or_create(&path, format, &defaults()).unwrap();
            assert_eq!(reloaded, defaults());
        }
    }

    #[test]
    fn test_load_or_create_overlays_and_casts() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.yaml");
        std::fs::write(
            &path,
            "debug: 'yes'\nretries: '7'\nratio: 2\nunknown: 1\nlimits:\n  max_files: 20\n",
        )
        .unwrap();

        let loaded = load_or_create(&path, SettingsFormat::Yaml, &defaults()).unwrap();
        assert_eq!(
            loaded,
            Settings {
                debug: true,
                retries: 7,
                ratio: 2.0,
                target: "/tmp/out".to_string(),
                limits: Limits { max_files: 20 },
            }
        );
    }

    #[test]
    fn test_load_or_create_empty_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.yaml");
        std::fs::write(&path, "").unwrap();
        let loaded = load_or_create(&path, SettingsFormat::Yaml, &defaults()).unwrap();
        assert_eq!(loaded, defaults());
    }

    #[test]
    fn test_cast_values_drops_unknown_keys() {
        let values = json!({"a": "12", "extra": true});
        let defaults = json!({"a": 0, "b": "x"});
        assert_eq!(
            cast_values(&values, &defaults).unwrap(),
            json!({"a": 12, "b": "x"})
        );
    }

    #[test]
    fn test_cast_values_conversions() {
        let defaults = json!({"flag": true, "count": 1, "level": 1.5, "name": "n"});
        let values = json!({"flag": 0, "count": 3.9, "level": "2.25", "name": 42});
        assert_eq!(
            cast_values(&values, &defaults).unwrap(),
            json!({"flag": false, "count": 3, "level": 2.25, "name": "42"})
        );
    }

    #[test]
    fn test_cast_values_rejects_uncastable() {
        let defaults = json!({"nested": {"count": 1}});
        let err = cast_values(&json!({"nested": {"count": "many"}}), &defaults).unwrap_err();
        match err {
            ShellError::InvalidArgument { field, .. } => assert_eq!(field, "nested.count"),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(cast_values(&json!({"nested": 5}), &defaults).is_err());
        assert!(cast_values(&json!([1, 2]), &defaults).is_err());
    }

    #[test]
    fn test_save_yaml_only_if_changed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.yaml");
        let mut data = BTreeMap::new();
        data.insert("key".to_string(), "value".to_string());

        assert!(save_yaml(&path, &data, true).unwrap());
        assert!(!save_yaml(&path, &data, true).unwrap());
        assert!(save_yaml(&path, &data, false).unwrap());

        let loaded: BTreeMap<String, String> = load_yaml(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_load_yaml_missing_file() {
        let result: Result<Value> = load_yaml("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ShellError::FileNotFound(_))));
    }
}
