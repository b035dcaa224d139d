pub mod lx200;
pub mod stellarium;

pub use lx200::Lx200Session;
pub use stellarium::StellariumSession;
