use crate::core::actuation::AxisCall;
use crate::core::feedback::ReconnectPolicy;
use crate::domain::model::{AxisIds, StoreFormat};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn encoder_server(&self) -> &str;
    fn axes(&self) -> AxisIds;
    fn host(&self) -> &str;
    fn lx200_port(&self) -> u16;
    fn stellarium_port(&self) -> u16;
    fn status_port(&self) -> u16;
    fn store_path(&self) -> Option<&str>;
    fn store_format(&self) -> StoreFormat;
    fn save_interval(&self) -> Duration;
    fn reconnect_policy(&self) -> ReconnectPolicy;
    fn queue_capacity(&self) -> usize;
    fn actuation_timeout(&self) -> Duration;
}

/// Executes one outbound call against the axis server.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn execute(&self, call: &AxisCall) -> Result<()>;
}

/// Event pushed by the axis server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEvent {
    pub name: String,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait EventStream: Send {
    /// `Ok(None)` once the server closes the session.
    async fn next_event(&mut self) -> Result<Option<ServerEvent>>;
}

#[async_trait]
pub trait EventConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn EventStream>>;
}
