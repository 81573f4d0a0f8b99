mod local_policy;
mod mesh_client;
mod mesh_command;
mod mesh_event;
mod peer_table;
mod reconciler;

pub use local_policy::*;
pub use mesh_client::*;
pub use mesh_command::*;
pub use mesh_event::*;
pub use peer_table::*;
pub use reconciler::*;
