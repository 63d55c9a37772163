//! NWB file container and persistence

pub mod container;
pub mod io;

pub use container::{NwbFile, ProcessingModule, SoundSeries};
pub use io::{NwbIo, FORMAT_NAME, FORMAT_VERSION};
