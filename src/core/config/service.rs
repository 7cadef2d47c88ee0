use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppSettings;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "bearer",
    "access_key",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "total_tokens", "tokens"];

/// Loads and persists `config.yml`, keeping sensitive values in `secrets.yaml`.
#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
    override_path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        let override_path = env::var("CHATIRIS_CONFIG_PATH").ok().map(PathBuf::from);
        Self {
            paths,
            override_path,
        }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.override_path {
            return path.clone();
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    fn config_write_path(&self) -> PathBuf {
        self.override_path
            .clone()
            .unwrap_or_else(|| self.paths.user_data_dir.join("config.yml"))
    }

    pub fn load_config(&self) -> Result<Value, ApiError> {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.paths.secrets_path);
        Ok(deep_merge(&public_config, &secrets_config))
    }

    /// Typed view of the merged config with environment overrides applied.
    pub fn settings(&self) -> Result<AppSettings, ApiError> {
        let config = self.load_config()?;
        validate_config(&config)?;
        Ok(AppSettings::from_config(&config).with_env_overrides())
    }

    pub fn update_config(&self, config_data: Value, merge: bool) -> Result<(), ApiError> {
        let current = self.load_config()?;
        let restored = restore_redacted_values(&config_data, &current);
        let to_save = if merge {
            deep_merge(&current, &restored)
        } else {
            restored
        };

        validate_config(&to_save)?;
        self.save_config_files(&to_save)?;
        tracing::info!("Configuration updated (merge: {})", merge);
        Ok(())
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }

    fn save_config_files(&self, config: &Value) -> Result<(), ApiError> {
        let (public_config, secrets_config) = split_config(config);
        write_yaml_file(&self.config_write_path(), &public_config)?;
        write_yaml_file(&self.paths.secrets_path, &secrets_config)?;
        Ok(())
    }
}

fn load_yaml_file(path: &Path) -> Value {
    let Ok(contents) = fs::read_to_string(path) else {
        return Value::Object(Map::new());
    };

    match serde_yaml::from_str::<Value>(&contents) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => Value::Object(Map::new()),
        Err(err) => {
            tracing::warn!("Ignoring unreadable config {}: {}", path.display(), err);
            Value::Object(Map::new())
        }
    }
}

fn write_yaml_file(path: &Path, value: &Value) -> Result<(), ApiError> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let yaml = serde_yaml::to_string(value).map_err(ApiError::internal)?;
    fs::write(path, yaml).map_err(ApiError::internal)
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn split_config(config: &Value) -> (Value, Value) {
    let Value::Object(map) = config else {
        return (config.clone(), Value::Object(Map::new()));
    };

    let mut public_map = Map::new();
    let mut secret_map = Map::new();

    for (key, value) in map {
        if value.is_object() {
            let (public_sub, secret_sub) = split_config(value);
            if !is_empty_object(&public_sub) {
                public_map.insert(key.clone(), public_sub);
            }
            if !is_empty_object(&secret_sub) {
                secret_map.insert(key.clone(), secret_sub);
            }
        } else if is_sensitive_key(key) && !value.is_null() {
            secret_map.insert(key.clone(), value.clone());
        } else {
            public_map.insert(key.clone(), value.clone());
        }
    }

    (Value::Object(public_map), Value::Object(secret_map))
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let redacted = if is_sensitive_key(key) && !val.is_null() {
                        Value::String(REDACT_PLACEHOLDER.to_string())
                    } else {
                        redact_sensitive_values(val)
                    };
                    (key.clone(), redacted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

/// Puts back values the client echoed as the redaction placeholder.
fn restore_redacted_values(new_value: &Value, original: &Value) -> Value {
    match new_value {
        Value::Object(map) => {
            let original_map = original.as_object();
            let mut restored = Map::new();

            for (key, value) in map {
                let orig_val = original_map.and_then(|m| m.get(key));
                if value.as_str() == Some(REDACT_PLACEHOLDER) {
                    if let Some(orig) = orig_val {
                        restored.insert(key.clone(), orig.clone());
                    }
                    continue;
                }
                restored.insert(
                    key.clone(),
                    restore_redacted_values(value, orig_val.unwrap_or(&Value::Null)),
                );
            }

            Value::Object(restored)
        }
        Value::Array(items) => {
            let original_items = original.as_array();
            let restored_items = items
                .iter()
                .enumerate()
                .filter_map(|(idx, item)| {
                    let orig_item = original_items.and_then(|orig| orig.get(idx));
                    if item.as_str() == Some(REDACT_PLACEHOLDER) {
                        return orig_item.cloned();
                    }
                    Some(restore_redacted_values(item, orig_item.unwrap_or(&Value::Null)))
                })
                .collect();
            Value::Array(restored_items)
        }
        _ => new_value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST.contains(&key_lower.as_str()) {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}
