mod signaling_sink;
mod ws_signaling;

pub use signaling_sink::*;
pub use ws_signaling::*;
