mod audio_output;
mod capture;

pub use audio_output::*;
pub use capture::*;
