//! 运行时初始化

use santoku_config::ToolkitConfig;
use santoku_telemetry::{init_tracing, init_tracing_json};
use tracing::info;

/// 运行时配置
pub struct RuntimeConfig {
    pub config_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_dir: "config".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load the layered configuration from `config_dir`.
    pub fn load(&self) -> Result<ToolkitConfig, santoku_config::ConfigError> {
        ToolkitConfig::load(&self.config_dir)
    }
}

/// 初始化运行时
pub fn init_runtime(config: &ToolkitConfig) {
    // JSON 日志用于生产环境
    if config.is_production() || config.telemetry.json {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    info!(app_env = %config.app_env, "Runtime initialized");
}
