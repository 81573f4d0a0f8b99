mod config;
mod coordinator;
mod directory;
mod signaling;

pub use config::*;
pub use coordinator::*;
pub use directory::*;
pub use signaling::*;
