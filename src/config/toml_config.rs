use crate::config::{
    DEFAULT_ACTUATION_TIMEOUT_MS, DEFAULT_ENCODER_SERVER, DEFAULT_HOST, DEFAULT_LX200_PORT, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_RECONNECT_DELAY_MS, DEFAULT_RECONNECT_MAX_DELAY_MS, DEFAULT_SAVE_INTERVAL_MS,
    DEFAULT_STATUS_PORT, DEFAULT_STELLARIUM_PORT, MIN_SAVE_INTERVAL_MS,
};
use crate::core::feedback::ReconnectPolicy;
use crate::domain::model::{AxisIds, StoreFormat};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BridgeError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub axes: AxesConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub lx200_port: Option<u16>,
    pub stellarium_port: Option<u16>,
    pub status_port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AxesConfig {
    pub encoder_server: Option<String>,
    pub ra: Option<String>,
    pub dec: Option<String>,
    pub queue_capacity: Option<usize>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: Option<String>,
    pub format: Option<StoreFormat>,
    pub save_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackConfig {
    pub reconnect_delay_ms: Option<u64>,
    pub reconnect_max_delay_ms: Option<u64>,
    pub backoff: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BridgeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BridgeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ENCODER_SERVER})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| BridgeError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("axes.encoder_server", self.encoder_server())?;

        let axes = self.axes();
        validation::validate_non_empty_string("axes.ra", &axes.ra)?;
        validation::validate_non_empty_string("axes.dec", &axes.dec)?;
        validation::validate_distinct("axes.dec", &axes.ra, &axes.dec)?;

        validation::validate_non_empty_string("server.host", self.host())?;
        for (field, port) in [
            ("server.lx200_port", self.lx200_port()),
            ("server.stellarium_port", self.stellarium_port()),
            ("server.status_port", self.status_port()),
        ] {
            validation::validate_range(field, port, 1, u16::MAX)?;
        }

        if let Some(path) = &self.store.path {
            validation::validate_path("store.path", path)?;
        }

        if let Some(delay) = self.feedback.reconnect_delay_ms {
            validation::validate_positive_number("feedback.reconnect_delay_ms", delay as usize, 1)?;
        }
        validation::validate_positive_number("axes.queue_capacity", self.queue_capacity(), 1)?;
        if let Some(timeout) = self.axes.timeout_ms {
            validation::validate_positive_number("axes.timeout_ms", timeout as usize, 1)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn encoder_server(&self) -> &str {
        self.axes
            .encoder_server
            .as_deref()
            .unwrap_or(DEFAULT_ENCODER_SERVER)
    }

    fn axes(&self) -> AxisIds {
        let defaults = AxisIds::default();
        AxisIds::new(
            self.axes.ra.clone().unwrap_or(defaults.ra),
            self.axes.dec.clone().unwrap_or(defaults.dec),
        )
    }

    fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    fn lx200_port(&self) -> u16 {
        self.server.lx200_port.unwrap_or(DEFAULT_LX200_PORT)
    }

    fn stellarium_port(&self) -> u16 {
        self.server.stellarium_port.unwrap_or(DEFAULT_STELLARIUM_PORT)
    }

    fn status_port(&self) -> u16 {
        self.server.status_port.unwrap_or(DEFAULT_STATUS_PORT)
    }

    fn store_path(&self) -> Option<&str> {
        self.store.path.as_deref().filter(|path| !path.is_empty())
    }

    fn store_format(&self) -> StoreFormat {
        self.store.format.unwrap_or_default()
    }

    fn save_interval(&self) -> Duration {
        let interval = self.store.save_interval_ms.unwrap_or(DEFAULT_SAVE_INTERVAL_MS);
        Duration::from_millis(interval.max(MIN_SAVE_INTERVAL_MS))
    }

    fn reconnect_policy(&self) -> ReconnectPolicy {
        let base = Duration::from_millis(
            self.feedback
                .reconnect_delay_ms
                .unwrap_or(DEFAULT_RECONNECT_DELAY_MS),
        );
        let max = Duration::from_millis(
            self.feedback
                .reconnect_max_delay_ms
                .unwrap_or(DEFAULT_RECONNECT_MAX_DELAY_MS),
        );

        if self.feedback.backoff.unwrap_or(true) {
            ReconnectPolicy::exponential(base, max)
        } else {
            ReconnectPolicy::fixed(base)
        }
    }

    fn queue_capacity(&self) -> usize {
        self.axes.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    fn actuation_timeout(&self) -> Duration {
        Duration::from_millis(self.axes.timeout_ms.unwrap_or(DEFAULT_ACTUATION_TIMEOUT_MS))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[server]
host = "0.0.0.0"
lx200_port = 4030
stellarium_port = 10002
status_port = 9000

[axes]
encoder_server = "http://mount.local:5000"
ra = "AZ"
dec = "ALT"
queue_capacity = 8
timeout_ms = 1500

[store]
path = "./scope.yaml"
format = "yaml"
save_interval_ms = 5000

[feedback]
reconnect_delay_ms = 500
backoff = false
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.lx200_port(), 4030);
        assert_eq!(config.stellarium_port(), 10002);
        assert_eq!(config.status_port(), 9000);
        assert_eq!(config.encoder_server(), "http://mount.local:5000");
        assert_eq!(config.axes(), AxisIds::new("AZ", "ALT"));
        assert_eq!(config.queue_capacity(), 8);
        assert_eq!(config.actuation_timeout(), Duration::from_millis(1500));
        assert_eq!(config.store_path(), Some("./scope.yaml"));
        assert_eq!(config.store_format(), StoreFormat::Yaml);
        assert_eq!(config.save_interval(), Duration::from_secs(5));
        assert_eq!(
            config.reconnect_policy(),
            ReconnectPolicy::fixed(Duration::from_millis(500))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.encoder_server(), "http://localhost:5000");
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.lx200_port(), 7634);
        assert_eq!(config.store_path(), None);
        assert_eq!(config.reconnect_policy(), ReconnectPolicy::default());
        assert_eq!(config.actuation_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LX200_BRIDGE_TEST_SERVER", "http://10.0.0.2:5000");

        let toml_content = r#"
[axes]
encoder_server = "${LX200_BRIDGE_TEST_SERVER}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.encoder_server(), "http://10.0.0.2:5000");

        std::env::remove_var("LX200_BRIDGE_TEST_SERVER");
    }

    #[test]
    fn test_undefined_env_var_is_left_in_place() {
        let toml_content = r#"
[store]
path = "${LX200_BRIDGE_UNSET_VARIABLE}/state.json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.store_path(),
            Some("${LX200_BRIDGE_UNSET_VARIABLE}/state.json")
        );
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[axes]
encoder_server = "invalid-url"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let same_axes = TomlConfig::from_toml_str("[axes]\nra = \"A\"\ndec = \"A\"\n").unwrap();
        assert!(same_axes.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("[server\nhost = ");
        assert!(matches!(result, Err(BridgeError::ConfigError { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[server]
lx200_port = 7000
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.lx200_port(), 7000);
    }
}
