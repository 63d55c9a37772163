//! Data model
//!
//! One Rust type per declared schema type, each validated on construction.

pub mod data;
pub mod device;
pub mod lab_meta;
pub mod series;
pub mod table;

pub use data::{DataShape, Sample, SampleArray, SampleDtype, SampleValues};
pub use device::{AcousticDevice, DeviceKind, FrequencyRange};
pub use lab_meta::AcousticLabMetaData;
pub use series::{
    AcousticRecordingSeries, AcousticStimulusSeries, AcousticWaveformSeries,
    AcousticWaveformSeriesBuilder, SeriesWarning, TransducerLink,
};
pub use table::{DeviceTable, DeviceTableRow, MicrophoneTable, SpeakerTable, TableRegion, TableRole};
