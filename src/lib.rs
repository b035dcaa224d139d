pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod lx200;
pub mod utils;

pub use adapters::{LocalStorage, StateFile};
pub use config::{CliConfig, TomlConfig};
pub use crate::core::{BridgeEngine, MountStore};
pub use utils::error::{BridgeError, Result};
