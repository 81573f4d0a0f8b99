pub mod mock_transport;
pub mod ws_server;

pub use mock_audio::*;
pub use mock_capture::*;
pub use mock_transport::*;
pub use scripted_coordinator::*;
pub use test_hub::*;
pub use test_participant::*;
pub use ws_server::*;
