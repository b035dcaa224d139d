use crate::config::{
    DEFAULT_ACTUATION_TIMEOUT_MS, DEFAULT_ENCODER_SERVER, DEFAULT_HOST, DEFAULT_LX200_PORT, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_RECONNECT_DELAY_MS, DEFAULT_RECONNECT_MAX_DELAY_MS, DEFAULT_SAVE_INTERVAL_MS,
    DEFAULT_STATUS_PORT, DEFAULT_STELLARIUM_PORT, MIN_SAVE_INTERVAL_MS,
};
use crate::core::feedback::ReconnectPolicy;
use crate::domain::model::{AxisIds, StoreFormat};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "lx200-bridge")]
#[command(about = "Bridge LX200 and Stellarium telescope clients to an axis server")]
pub struct CliConfig {
    /// Axis server base URL
    #[arg(long, default_value = DEFAULT_ENCODER_SERVER)]
    pub encoder_server: String,

    /// Axis id mapped to Right Ascension
    #[arg(long, default_value = "RA")]
    pub ra_axis_id: String,

    /// Axis id mapped to Declination
    #[arg(long, default_value = "DEC")]
    pub dec_axis_id: String,

    /// Host for all the servers
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// TCP port for the LX200 server
    #[arg(long, default_value_t = DEFAULT_LX200_PORT)]
    pub port: u16,

    #[arg(long, default_value_t = DEFAULT_STELLARIUM_PORT)]
    pub stellarium_port: u16,

    /// TCP port for the status server
    #[arg(long, default_value_t = DEFAULT_STATUS_PORT)]
    pub web_port: u16,

    /// Path to load and save the mount state (disabled when empty)
    #[arg(long, default_value = "")]
    pub store_path: String,

    #[arg(long, value_enum, default_value_t = StoreFormat::Json)]
    pub store_format: StoreFormat,

    /// Milliseconds between state saves
    #[arg(long, default_value_t = DEFAULT_SAVE_INTERVAL_MS)]
    pub state_save_interval: u64,

    /// First delay between feedback reconnect attempts, in milliseconds
    #[arg(long, default_value_t = DEFAULT_RECONNECT_DELAY_MS)]
    pub reconnect_delay_ms: u64,

    #[arg(long, default_value_t = DEFAULT_RECONNECT_MAX_DELAY_MS)]
    pub reconnect_max_delay_ms: u64,

    /// Retry at a constant delay instead of backing off
    #[arg(long)]
    pub fixed_reconnect: bool,

    /// Pending axis calls kept before new ones are dropped
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Milliseconds before an axis server call is abandoned
    #[arg(long, default_value_t = DEFAULT_ACTUATION_TIMEOUT_MS)]
    pub actuation_timeout_ms: u64,

    /// Load settings from a TOML file instead of the flags above
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn encoder_server(&self) -> &str {
        &self.encoder_server
    }

    fn axes(&self) -> AxisIds {
        AxisIds::new(self.ra_axis_id.clone(), self.dec_axis_id.clone())
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn lx200_port(&self) -> u16 {
        self.port
    }

    fn stellarium_port(&self) -> u16 {
        self.stellarium_port
    }

    fn status_port(&self) -> u16 {
        self.web_port
    }

    fn store_path(&self) -> Option<&str> {
        Some(self.store_path.as_str()).filter(|path| !path.is_empty())
    }

    fn store_format(&self) -> StoreFormat {
        self.store_format
    }

    fn save_interval(&self) -> Duration {
        Duration::from_millis(self.state_save_interval.max(MIN_SAVE_INTERVAL_MS))
    }

    fn reconnect_policy(&self) -> ReconnectPolicy {
        let base = Duration::from_millis(self.reconnect_delay_ms);
        if self.fixed_reconnect {
            ReconnectPolicy::fixed(base)
        } else {
            ReconnectPolicy::exponential(base, Duration::from_millis(self.reconnect_max_delay_ms))
        }
    }

    fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    fn actuation_timeout(&self) -> Duration {
        Duration::from_millis(self.actuation_timeout_ms)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("encoder_server", &self.encoder_server)?;
        validation::validate_non_empty_string("ra_axis_id", &self.ra_axis_id)?;
        validation::validate_non_empty_string("dec_axis_id", &self.dec_axis_id)?;
        validation::validate_distinct("dec_axis_id", &self.ra_axis_id, &self.dec_axis_id)?;
        validation::validate_non_empty_string("host", &self.host)?;
        validation::validate_range("port", self.port, 1, u16::MAX)?;
        validation::validate_range("stellarium_port", self.stellarium_port, 1, u16::MAX)?;
        validation::validate_range("web_port", self.web_port, 1, u16::MAX)?;
        validation::validate_path("store_path", &self.store_path)?;
        validation::validate_positive_number("reconnect_delay_ms", self.reconnect_delay_ms as usize, 1)?;
        validation::validate_positive_number("queue_capacity", self.queue_capacity, 1)?;
        validation::validate_positive_number(
            "actuation_timeout_ms",
            self.actuation_timeout_ms as usize,
            1,
        )?;
        Ok(())
    }
}
