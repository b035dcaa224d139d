use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Handshake failed: {message}")]
    HandshakeError { message: String },

    #[error("Actuation call {action} on axis {axis_id} rejected with status {status}")]
    ActuationRejected {
        axis_id: String,
        action: String,
        status: u16,
    },
}

impl BridgeError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    pub fn handshake(message: impl Into<String>) -> Self {
        Self::HandshakeError {
            message: message.into(),
        }
    }

    /// 給 CLI 使用者的修正建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::HttpError(_) | Self::ActuationRejected { .. } => {
                "Check that the axis server is running and reachable"
            }
            Self::IoError(_) => "Check file permissions and that the ports are not already in use",
            Self::SerializationError(_) | Self::YamlError(_) => {
                "The state file looks corrupted; move it aside to start from a clean state"
            }
            Self::UrlError(_) => "Use a full URL such as http://localhost:5000",
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Review the command-line flags or the TOML config"
            }
            Self::ProtocolError { .. } | Self::HandshakeError { .. } => {
                "Check that the axis server speaks Socket.IO (Engine.IO v4)"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
