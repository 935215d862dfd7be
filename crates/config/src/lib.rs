//! Configuration loading for GenAIBot.
//!
//! Loads `appsettings.json` (optional) and overlays the process environment.
//! The result is a flat, read-only map of string keys to string values:
//! nested JSON objects flatten into `:`-joined keys, and environment variable
//! names use `__` in place of `:`.

pub mod keys;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use genaibot_core::error::StartupError;
use serde_json::Value;

/// Default settings file name, resolved against the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// Key segment separator for nested settings.
const KEY_DELIMITER: &str = ":";

/// Separator accepted in environment variable names for nested keys.
const ENV_KEY_DELIMITER: &str = "__";

/// Merged, immutable configuration.
#[derive(Clone, Default)]
pub struct Configuration {
    values: BTreeMap<String, String>,
}

impl Configuration {
    /// Load `path` (if it exists) and overlay the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_sources(Some(path), std::env::vars())
    }

    /// Build from an optional settings file and an explicit set of
    /// environment variables. Environment entries win on conflict.
    pub fn from_sources<I, K, V>(file: Option<&Path>, env: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = BTreeMap::new();

        if let Some(path) = file {
            let file_values = load_settings_file(path)?;
            tracing::debug!(
                path = %path.display(),
                keys = file_values.len(),
                "Loaded settings file"
            );
            values.extend(file_values);
        }

        for (key, value) in env {
            values.insert(normalize_env_key(key.as_ref()), value.into());
        }

        Ok(Self { values })
    }

    /// Build directly from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a key. Unset keys are `None`, never an error.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a key, falling back to `default` when unset.
    ///
    /// A key that is set to the empty string is returned as-is.
    pub fn get_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Look up a key, treating the empty string as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Look up a key that the caller cannot do without.
    pub fn require(&self, key: &str) -> Result<&str, StartupError> {
        self.get_non_empty(key)
            .ok_or_else(|| StartupError::missing(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if is_secret_key(key) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

fn is_secret_key(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    ["KEY", "SECRET", "PASSWORD", "TOKEN"]
        .iter()
        .any(|marker| upper.contains(marker))
}

fn normalize_env_key(key: &str) -> String {
    key.replace(ENV_KEY_DELIMITER, KEY_DELIMITER)
}

/// Read and flatten a JSON settings file. A missing file yields no values.
fn load_settings_file(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    if !path.exists() {
        tracing::info!("No settings file found at {}, using environment only", path.display());
        return Ok(BTreeMap::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let root: Value = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !root.is_object() {
        return Err(ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: "top-level value must be a JSON object".into(),
        });
    }

    let mut out = BTreeMap::new();
    flatten_into(&mut out, None, &root);
    Ok(out)
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: Option<&str>, value: &Value) {
    let join = |segment: &str| match prefix {
        Some(p) => format!("{p}{KEY_DELIMITER}{segment}"),
        None => segment.to_string(),
    };

    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten_into(out, Some(&join(k)), v);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_into(out, Some(&join(&i.to_string())), v);
            }
        }
        scalar => {
            if let Some(key) = prefix {
                let text = match scalar {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                out.insert(key.to_string(), text);
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse settings file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },
}
