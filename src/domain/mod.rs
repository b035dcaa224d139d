// Domain layer: position types and the ports (interfaces) the adapters implement.

pub mod model;
pub mod ports;
