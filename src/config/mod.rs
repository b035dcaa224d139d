pub mod cli;
pub mod toml_config;

pub use cli::CliConfig;
pub use toml_config::TomlConfig;

pub const DEFAULT_ENCODER_SERVER: &str = "http://localhost:5000";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_LX200_PORT: u16 = 7634;
pub const DEFAULT_STELLARIUM_PORT: u16 = 10001;
pub const DEFAULT_STATUS_PORT: u16 = 8081;
pub const DEFAULT_SAVE_INTERVAL_MS: u64 = 1000;
pub const MIN_SAVE_INTERVAL_MS: u64 = 250;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;
pub const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_ACTUATION_TIMEOUT_MS: u64 = 5000;
