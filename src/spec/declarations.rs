//! Type declarations for the ndx-sound namespace
//!
//! The data model in [`crate::model`] reads its defaults and names from the
//! constants here, so the exported schema and the Rust types cannot drift.

use serde_yaml::Value;

use super::types::{
    AttributeSpec, DatasetSpec, DimsSpec, DtypeSpec, GroupSpec, LinkSpec, Quantity, ShapeSpec,
};

// ============================================================================
// Names
// ============================================================================

pub const ACOUSTIC_WAVEFORM_SERIES: &str = "AcousticWaveformSeries";
pub const ACOUSTIC_STIMULUS_SERIES: &str = "AcousticStimulusSeries";
pub const ACOUSTIC_RECORDING_SERIES: &str = "AcousticRecordingSeries";
pub const SPEAKER: &str = "Speaker";
pub const MICROPHONE: &str = "Microphone";
pub const AUDIO_INTERFACE: &str = "AudioInterface";
pub const MICROPHONE_TABLE: &str = "MicrophoneTable";
pub const SPEAKER_TABLE: &str = "SpeakerTable";
pub const ACOUSTIC_LAB_META_DATA: &str = "AcousticLabMetaData";

/// Core types the extension builds on.
pub const CORE_NAMESPACE: &str = "core";
pub const CORE_INCLUDES: [&str; 6] = [
    "TimeSeries",
    "Device",
    "DynamicTable",
    "DynamicTableRegion",
    "VectorData",
    "LabMetaData",
];

/// Default `unit` of a waveform series' `data`.
pub const DEFAULT_UNIT: &str = "n.a.";

pub const MICROPHONE_TABLE_NAME: &str = "microphone_table";
pub const SPEAKER_TABLE_NAME: &str = "speaker_table";
pub const MICROPHONE_TABLE_REGION_NAME: &str = "microphone_table_region";
pub const SPEAKER_TABLE_REGION_NAME: &str = "speaker_table_region";
pub const ACOUSTIC_LAB_META_DATA_NAME: &str = "acoustic_lab_meta_data";

// ============================================================================
// Waveform series
// ============================================================================

/// Allowed `data` shapes: `(time,)`, `(time, 1)`, `(time, 2)`.
pub fn waveform_shape() -> ShapeSpec {
    ShapeSpec::Alternatives(vec![vec![None], vec![None, Some(1)], vec![None, Some(2)]])
}

fn waveform_dims() -> DimsSpec {
    DimsSpec::Alternatives(vec![
        vec!["time".to_string()],
        vec!["time".to_string(), "channel".to_string()],
        vec!["time".to_string(), "channels".to_string()],
    ])
}

pub fn acoustic_waveform_series() -> GroupSpec {
    GroupSpec::define(
        ACOUSTIC_WAVEFORM_SERIES,
        "TimeSeries",
        "single or multi-channel acoustic series",
    )
    .with_dataset(
        DatasetSpec::named("data", "acoustic waveform")
            .with_dtype(DtypeSpec::numeric())
            .with_shape(waveform_dims(), waveform_shape())
            .with_attribute(
                AttributeSpec::new("unit", DtypeSpec::text(), "SI unit of data")
                    .with_default(DEFAULT_UNIT),
            ),
    )
}

pub fn acoustic_stimulus_series() -> GroupSpec {
    GroupSpec::define(
        ACOUSTIC_STIMULUS_SERIES,
        ACOUSTIC_WAVEFORM_SERIES,
        "acoustic stimulus played through a speaker",
    )
    .with_dataset(
        DatasetSpec::named(
            SPEAKER_TABLE_REGION_NAME,
            "references the rows of the SpeakerTable that produced this stimulus",
        )
        .of_type("DynamicTableRegion")
        .with_quantity(Quantity::ZeroOrOne),
    )
    .with_link(
        LinkSpec::new("speaker", SPEAKER, "the speaker that produced this stimulus")
            .with_quantity(Quantity::ZeroOrOne),
    )
}

pub fn acoustic_recording_series() -> GroupSpec {
    GroupSpec::define(
        ACOUSTIC_RECORDING_SERIES,
        ACOUSTIC_WAVEFORM_SERIES,
        "acoustic response captured by a microphone",
    )
    .with_dataset(
        DatasetSpec::named(
            MICROPHONE_TABLE_REGION_NAME,
            "references the rows of the MicrophoneTable that captured this recording",
        )
        .of_type("DynamicTableRegion")
        .with_quantity(Quantity::ZeroOrOne),
    )
    .with_link(
        LinkSpec::new("microphone", MICROPHONE, "the microphone that captured this recording")
            .with_quantity(Quantity::ZeroOrOne),
    )
}

// ============================================================================
// Devices
// ============================================================================

fn transducer(type_def: &str, doc: &str) -> GroupSpec {
    GroupSpec::define(type_def, "Device", doc)
        .with_attribute(
            AttributeSpec::new(
                "frequency_range",
                DtypeSpec::float64(),
                "lower and upper bound of the usable frequency range, in Hz",
            )
            .with_shape(
                DimsSpec::Single(vec!["low, high".to_string()]),
                ShapeSpec::Single(vec![Some(2)]),
            )
            .optional(),
        )
        .with_attribute(
            AttributeSpec::new("sensitivity", DtypeSpec::float64(), "sensitivity, in dB").optional(),
        )
        .with_attribute(
            AttributeSpec::new("location", DtypeSpec::text(), "where the device is placed").optional(),
        )
}

pub fn speaker() -> GroupSpec {
    transducer(SPEAKER, "a speaker used to present acoustic stimuli")
}

pub fn microphone() -> GroupSpec {
    transducer(MICROPHONE, "a microphone used to record acoustic responses")
}

pub fn audio_interface() -> GroupSpec {
    transducer(
        AUDIO_INTERFACE,
        "an audio interface converting between analog and digital signals",
    )
}

// ============================================================================
// Tables
// ============================================================================

fn device_table(type_def: &str, default_name: &str, device_column: &str, device_type: &str) -> GroupSpec {
    GroupSpec::define(
        type_def,
        "DynamicTable",
        &format!("table of {} devices used in the session", device_column),
    )
    .with_default_name(default_name)
    .with_dataset(
        DatasetSpec::named("location", "location of the device for each row")
            .of_type("VectorData")
            .with_dtype(DtypeSpec::text()),
    )
    .with_dataset(
        DatasetSpec::named(device_column, &format!("the {} of each row", device_column))
            .of_type("VectorData")
            .with_dtype(DtypeSpec::object_ref(device_type)),
    )
    .with_dataset(
        DatasetSpec::named("audio_interface", "the audio interface of each row")
            .of_type("VectorData")
            .with_dtype(DtypeSpec::object_ref(AUDIO_INTERFACE))
            .with_quantity(Quantity::ZeroOrOne),
    )
}

pub fn microphone_table() -> GroupSpec {
    device_table(MICROPHONE_TABLE, MICROPHONE_TABLE_NAME, "microphone", MICROPHONE)
}

pub fn speaker_table() -> GroupSpec {
    device_table(SPEAKER_TABLE, SPEAKER_TABLE_NAME, "speaker", SPEAKER)
}

// ============================================================================
// Lab metadata
// ============================================================================

pub fn acoustic_lab_meta_data() -> GroupSpec {
    GroupSpec::define(
        ACOUSTIC_LAB_META_DATA,
        "LabMetaData",
        "acoustic device tables for this file",
    )
    .with_default_name(ACOUSTIC_LAB_META_DATA_NAME)
    .with_group(
        GroupSpec::include(MICROPHONE_TABLE, "the microphones used in this session")
            .with_name(MICROPHONE_TABLE_NAME)
            .with_quantity(Quantity::ZeroOrOne),
    )
    .with_group(
        GroupSpec::include(SPEAKER_TABLE, "the speakers used in this session")
            .with_name(SPEAKER_TABLE_NAME)
            .with_quantity(Quantity::ZeroOrOne),
    )
}

/// Every type the namespace declares, parents before children.
pub fn all_declarations() -> Vec<GroupSpec> {
    vec![
        acoustic_waveform_series(),
        speaker(),
        microphone(),
        audio_interface(),
        microphone_table(),
        speaker_table(),
        acoustic_stimulus_series(),
        acoustic_recording_series(),
        acoustic_lab_meta_data(),
    ]
}

/// Default `unit` as a schema value.
pub fn default_unit_value() -> Value {
    Value::String(DEFAULT_UNIT.to_string())
}
