//! ndx-sound - NWB extension for acoustic stimuli and responses
//!
//! Provides the `ndx-sound` namespace: typed waveform series for sound
//! played to and recorded from a subject, the speakers, microphones and
//! audio interfaces involved, and tables describing where each sat.
//!
//! # Architecture
//!
//! - `spec`: declares the types in the NWB schema language and exports YAML
//! - `catalog`: locates and loads namespace files into an explicit registry
//! - `model`: validated Rust types for each declared type
//! - `file`: an in-memory file container and its JSON persistence
//! - `mock`: deterministic mock objects
//! - `widgets`: waveform, spectrogram and playback computation

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod file;
pub mod mock;
pub mod model;
pub mod spec;
pub mod widgets;

pub use catalog::{initialize, NamespaceCatalog, SoundTypes};
pub use error::{Result, SoundError};
pub use file::{NwbFile, NwbIo};
pub use model::{
    AcousticDevice, AcousticLabMetaData, AcousticRecordingSeries, AcousticStimulusSeries,
    AcousticWaveformSeries, MicrophoneTable, SampleArray, SpeakerTable, TableRegion,
};
pub use spec::DEFAULT_UNIT;
