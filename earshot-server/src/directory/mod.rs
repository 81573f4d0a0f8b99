mod proximity_directory;

pub use proximity_directory::*;
