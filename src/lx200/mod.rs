//! Meade LX200 text protocol: command taxonomy, incremental parser and
//! response builder.

pub mod commands;
pub mod parser;
pub mod responses;

pub use commands::Command;
pub use parser::Parser;
pub use responses::Response;
