pub mod actuation;
pub mod bridge;
pub mod codec;
pub mod feedback;
pub mod store;

pub use crate::domain::ports::{Actuator, ConfigProvider, EventConnector, EventStream, Storage};
pub use crate::utils::error::Result;
pub use actuation::{AxisCall, Intent};
pub use bridge::{BridgeEngine, RunningBridge};
pub use feedback::{FeedbackChannel, ReconnectPolicy};
pub use store::MountStore;
