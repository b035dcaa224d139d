// Application layer: per-connection protocol sessions and the listeners that spawn them.

pub mod server;
pub mod sessions;

pub use server::{bind, serve_lx200, serve_stellarium, SessionContext};
pub use sessions::{Lx200Session, StellariumSession};
