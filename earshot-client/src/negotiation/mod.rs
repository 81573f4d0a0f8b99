mod candidate_buffer;
mod peer_task;

pub use candidate_buffer::*;
pub use peer_task::*;
