mod config;
mod error;
mod media;
mod mesh;
mod negotiation;
mod signaling;
mod transport;

pub use config::*;
pub use error::*;
pub use media::*;
pub use mesh::*;
pub use negotiation::*;
pub use signaling::*;
pub use transport::*;
