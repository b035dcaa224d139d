// Adapters layer: concrete implementations for external systems (axis server http, event stream, status, storage).

pub mod http;
pub mod socketio;
pub mod status;
pub mod storage;

pub use http::{spawn_actuation_worker, ActuationClient, ActuationQueue};
pub use socketio::SocketIoConnector;
pub use storage::{LocalStorage, StateFile};
