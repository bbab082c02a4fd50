//! santoku-config - 配置加载库

mod manager;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

pub use manager::{ConfigurationManager, Schema};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Setting '{0}' undefined.")]
    UndefinedSetting(String),

    #[error("Configuration '{0}' undefined.")]
    UndefinedConfiguration(String),

    #[error("{0}")]
    InvalidConfiguration(String),

    #[error(
        "Configuration '{0}' already exists. You can set the override option to true to redefine it."
    )]
    ConfigurationAlreadyDefined(String),

    #[error("No configuration has been activated.")]
    NoActiveConfiguration,

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// AWS 配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsConfig {
    /// Region override; falls back to the SDK provider chain when unset.
    pub region: Option<String>,
    /// Custom endpoint, e.g. a LocalStack or MinIO instance.
    pub endpoint_url: Option<String>,
    /// Named profile from the shared credentials file.
    pub profile: Option<String>,
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// Salesforce 配置
#[derive(Debug, Clone, Deserialize)]
pub struct SalesforceConfig {
    /// Overrides the `auth_url` stored in credential secrets.
    pub auth_url: Option<String>,
    #[serde(default = "default_salesforce_api_version")]
    pub api_version: f64,
}

fn default_salesforce_api_version() -> f64 {
    47.0
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            auth_url: None,
            api_version: default_salesforce_api_version(),
        }
    }
}

/// Slack 配置
#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    #[serde(default = "default_slack_api_base_url")]
    pub api_base_url: String,
}

fn default_slack_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_slack_api_base_url(),
        }
    }
}

/// BigQuery 配置
#[derive(Debug, Clone, Deserialize)]
pub struct BigQueryConfig {
    #[serde(default = "default_bigquery_api_base_url")]
    pub api_base_url: String,
}

fn default_bigquery_api_base_url() -> String {
    "https://bigquery.googleapis.com/bigquery/v2".to_string()
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_bigquery_api_base_url(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct ToolkitConfig {
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub salesforce: SalesforceConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub bigquery: BigQueryConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            app_env: default_app_env(),
            telemetry: TelemetryConfig::default(),
            aws: AwsConfig::default(),
            salesforce: SalesforceConfig::default(),
            slack: SlackConfig::default(),
            bigquery: BigQueryConfig::default(),
        }
    }
}

impl ToolkitConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());
        Self::load_for_env(config_dir, &env)
    }

    /// Layers `default.toml`, `{env}.toml` and `SANTOKU_*` variables, in that order.
    pub fn load_for_env(config_dir: &str, env: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("SANTOKU_").split("__"));

        let mut config = Self::from_figment(figment)?;
        if std::env::var("SANTOKU_APP_ENV").is_err() {
            config.app_env = env.to_string();
        }

        tracing::debug!(app_env = %config.app_env, config_dir, "Configuration loaded");
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
