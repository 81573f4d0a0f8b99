mod coordinator;
mod coordinator_command;
mod coordinator_error;
mod report_sink;

pub use coordinator::*;
pub use coordinator_command::*;
pub use coordinator_error::*;
pub use report_sink::*;
