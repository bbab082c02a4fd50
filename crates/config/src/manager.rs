//! 命名配置管理
//!
//! A `setting` is a key/value pair and a `configuration` is a named collection of settings:
//!
//! ```json
//! {
//!     "name": "production",
//!     "settings": { "bucket": "data-lake", "batch_size": 10, "notify": { "channel": "ops" } }
//! }
//! ```
//!
//! Every configuration must match the manager's [`Schema`]. Exactly one configuration can be
//! active at a time, and settings are read from the active one.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::ConfigError;

type Settings = Map<String, Value>;

/// Type structure that configurations must follow.
///
/// Leaves are type names: `"boolean"`, `"integer"`, `"number"`, `"string"`, `"object"`,
/// `"array"`, `"null"` or `"any"`. An object schema requires exactly its keys. An array schema
/// with a single element applies it to every item; longer array schemas are positional.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema(Value);

impl Schema {
    pub fn new(structure: Value) -> Self {
        Self(structure)
    }

    pub fn validate(&self, value: &Value) -> bool {
        conforms(&self.0, value)
    }
}

fn conforms(schema: &Value, value: &Value) -> bool {
    match (schema, value) {
        (Value::Object(expected), Value::Object(actual)) => {
            expected.len() == actual.len()
                && expected
                    .iter()
                    .all(|(key, inner)| actual.get(key).is_some_and(|v| conforms(inner, v)))
        }
        (Value::Array(expected), Value::Array(actual)) if expected.len() == 1 => {
            actual.iter().all(|item| conforms(&expected[0], item))
        }
        (Value::Array(expected), Value::Array(actual)) => {
            expected.len() == actual.len()
                && expected.iter().zip(actual).all(|(s, v)| conforms(s, v))
        }
        (Value::String(type_name), value) => match type_name.as_str() {
            "boolean" => value.is_boolean(),
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "string" => value.is_string(),
            "object" => value.is_object(),
            "array" => value.is_array(),
            "null" => value.is_null(),
            "any" => true,
            _ => false,
        },
        _ => false,
    }
}

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigurationManager {
    schema: Schema,
    configurations: BTreeMap<String, Settings>,
    active_configuration: Option<String>,
    settings: Settings,
}

impl ConfigurationManager {
    /// Create a manager, optionally seeded with `{"name": .., "settings": ..}` entries.
    pub fn new(
        schema: Schema,
        predefined_configurations: Vec<Value>,
        initial_configuration: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut manager = Self {
            schema,
            configurations: BTreeMap::new(),
            active_configuration: None,
            settings: Settings::new(),
        };

        for configuration in predefined_configurations {
            let (Some(name), Some(settings)) = (
                configuration.get("name").and_then(Value::as_str),
                configuration.get("settings"),
            ) else {
                return Err(ConfigError::InvalidConfiguration(
                    "'name' and 'settings' arguments must be contained in a configuration."
                        .to_string(),
                ));
            };
            manager.define_configuration(name, settings.clone(), false)?;
        }

        if let Some(name) = initial_configuration {
            manager.apply_configuration(name)?;
        }

        Ok(manager)
    }

    /// Load configurations (a JSON array) and the schema from files.
    pub fn from_json_file(
        configurations_path: impl AsRef<Path>,
        schema_path: impl AsRef<Path>,
        initial_configuration: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let configurations: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(configurations_path)?)?;
        let schema: Value = serde_json::from_str(&fs::read_to_string(schema_path)?)?;

        Self::new(Schema::new(schema), configurations, initial_configuration)
    }

    fn checked_settings(&self, settings: Value) -> Result<Settings, ConfigError> {
        if !self.schema.validate(&settings) {
            return Err(ConfigError::InvalidConfiguration(
                "The given configuration does not follow the predefined schema.".to_string(),
            ));
        }
        match settings {
            Value::Object(map) => Ok(map),
            _ => Err(ConfigError::InvalidConfiguration(
                "Settings must be a JSON object.".to_string(),
            )),
        }
    }

    /// Add a configuration. Redefining an existing name requires `override_existing`.
    pub fn define_configuration(
        &mut self,
        name: &str,
        settings: Value,
        override_existing: bool,
    ) -> Result<(), ConfigError> {
        if !override_existing && self.configurations.contains_key(name) {
            return Err(ConfigError::ConfigurationAlreadyDefined(name.to_string()));
        }

        let settings = self.checked_settings(settings)?;
        self.configurations.insert(name.to_string(), settings);
        debug!(configuration = name, "Configuration defined");

        if self.active_configuration.as_deref() == Some(name) {
            self.apply_configuration(name)?;
        }
        Ok(())
    }

    /// Merge top-level overrides into an existing configuration.
    pub fn edit_configuration(
        &mut self,
        name: &str,
        overrides: Map<String, Value>,
    ) -> Result<(), ConfigError> {
        let Some(current) = self.configurations.get(name) else {
            return Err(ConfigError::InvalidConfiguration(format!(
                "Configuration '{}' undefined. Use `define_configuration` to create it.",
                name
            )));
        };

        let mut merged = current.clone();
        merged.extend(overrides);
        let merged = self.checked_settings(Value::Object(merged))?;
        self.configurations.insert(name.to_string(), merged);

        if self.active_configuration.as_deref() == Some(name) {
            self.apply_configuration(name)?;
        }
        Ok(())
    }

    pub fn get_configuration(&self, name: &str) -> Result<&Map<String, Value>, ConfigError> {
        self.configurations
            .get(name)
            .ok_or_else(|| ConfigError::UndefinedConfiguration(name.to_string()))
    }

    /// Make `name` the active configuration, discarding local `set_setting` changes.
    pub fn apply_configuration(&mut self, name: &str) -> Result<(), ConfigError> {
        let settings = self.get_configuration(name)?.clone();
        self.settings = settings;
        self.active_configuration = Some(name.to_string());
        info!(configuration = name, "Configuration applied");
        Ok(())
    }

    pub fn active_configuration(&self) -> Option<&str> {
        self.active_configuration.as_deref()
    }

    pub fn active_settings(&self) -> Result<&Map<String, Value>, ConfigError> {
        match self.active_configuration {
            Some(_) => Ok(&self.settings),
            None => Err(ConfigError::NoActiveConfiguration),
        }
    }

    pub fn list_configurations(&self) -> Vec<&str> {
        self.configurations.keys().map(String::as_str).collect()
    }

    pub fn get_setting(&self, key: &str) -> Result<&Value, ConfigError> {
        self.active_settings()?
            .get(key)
            .ok_or_else(|| ConfigError::UndefinedSetting(key.to_string()))
    }

    /// Walk nested objects, e.g. `&["notify", "channel"]`.
    pub fn get_nested_setting(&self, path: &[&str]) -> Result<&Value, ConfigError> {
        let Some((first, rest)) = path.split_first() else {
            return Err(ConfigError::UndefinedSetting(String::new()));
        };

        let mut current = self.get_setting(first)?;
        for key in rest {
            current = current
                .get(*key)
                .ok_or_else(|| ConfigError::UndefinedSetting(path.join(".")))?;
        }
        Ok(current)
    }

    /// Change a setting of the active configuration only.
    pub fn set_setting(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        if self.active_configuration.is_none() {
            return Err(ConfigError::NoActiveConfiguration);
        }
        self.settings.insert(key.to_string(), value);
        Ok(())
    }

    pub fn list_settings(&self) -> Vec<(&str, &Value)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }
}
