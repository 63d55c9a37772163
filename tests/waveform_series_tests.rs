//! Waveform Series Tests
//!
//! Construction, defaults and validation of acoustic series and their
//! device links.

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use test_case::test_case;

use ndx_sound::model::{
    AcousticDevice, AcousticRecordingSeries, AcousticStimulusSeries, AcousticWaveformSeries,
    MicrophoneTable, SampleArray, SampleValues, SeriesWarning, SpeakerTable, TransducerLink,
};
use ndx_sound::DEFAULT_UNIT;

fn counting(frames: usize, channels: usize) -> SampleArray {
    let values: Vec<i32> = (0..(frames * channels.max(1)) as i32).collect();
    SampleArray::new(SampleValues::Int32(values), &match channels {
        0 => vec![frames],
        c => vec![frames, c],
    })
    .unwrap()
}

#[test_case(0 ; "time only")]
#[test_case(1 ; "one channel")]
#[test_case(2 ; "two channels")]
fn test_constructor_accepts_valid_shapes(channels: usize) {
    let data = counting(100, channels);
    let series = AcousticWaveformSeries::builder(
        "acoustic_stimulus",
        data.clone(),
        42000.0,
        "acoustic_stimulus",
    )
    .build()
    .unwrap();

    assert_eq!(series.name(), "acoustic_stimulus");
    assert_eq!(series.description(), "acoustic_stimulus");
    assert_eq!(series.data(), &data);
    assert_eq!(series.rate(), 42000.0);
    assert_eq!(series.unit(), "n.a.");
    assert_eq!(series.unit(), DEFAULT_UNIT);
}

#[test]
fn test_explicit_unit_kept() {
    let series = AcousticWaveformSeries::builder("s", counting(10, 0), 1000.0, "d")
        .unit("mV")
        .build()
        .unwrap();
    assert_eq!(series.unit(), "mV");
}

#[test_case(vec![10, 10, 10] ; "rank three")]
#[test_case(vec![10, 3] ; "three channels")]
#[test_case(vec![] ; "scalar")]
fn test_invalid_shapes_rejected(dims: Vec<usize>) {
    let count = dims.iter().product::<usize>().max(1);
    let err = SampleArray::new(SampleValues::Int16(vec![0; count]), &dims).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_SHAPE");
}

#[test]
fn test_negative_rate_rejected() {
    let err = AcousticWaveformSeries::builder("s", counting(100, 0), -42000.0, "d")
        .build()
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_RATE");
    assert!(err.is_validation_error());
}

#[test_case(f64::NAN ; "nan")]
#[test_case(f64::INFINITY ; "infinite")]
fn test_non_finite_rate_rejected(rate: f64) {
    let err = AcousticWaveformSeries::builder("s", counting(100, 0), rate, "d")
        .build()
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_RATE");
}

#[test]
fn test_zero_rate_accepted_with_warning() {
    let series = AcousticWaveformSeries::builder("s", counting(100, 0), 0.0, "d")
        .build()
        .unwrap();
    assert_eq!(series.rate(), 0.0);
    assert_eq!(series.warnings(), vec![SeriesWarning::ZeroRate]);
}

#[test]
fn test_negative_starting_time_kept() {
    let series = AcousticWaveformSeries::builder("s", counting(100, 0), 42000.0, "d")
        .starting_time(-10.0)
        .build()
        .unwrap();
    assert_eq!(series.starting_time(), -10.0);
}

#[test]
fn test_invalid_names_rejected() {
    for name in ["", "a/b"] {
        let err = AcousticWaveformSeries::builder(name, counting(1, 0), 1.0, "d")
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NAME");
    }
}

#[test]
fn test_time_axis() {
    let series = AcousticWaveformSeries::builder("s", counting(100, 0), 50.0, "d")
        .starting_time(1.0)
        .build()
        .unwrap();
    assert_relative_eq!(series.duration(), 2.0);
    assert_relative_eq!(series.end_time(), 3.0);
    assert_eq!(series.time_to_index(1.5).unwrap(), 25);
    assert_eq!(series.time_to_index(3.0).unwrap(), 100);
    assert!(series.time_to_index(0.5).is_err());
}

// === Device tables and regions ===

fn microphone_table(rows: usize) -> (MicrophoneTable, Vec<AcousticDevice>) {
    let mut table = MicrophoneTable::new("microphones in the booth");
    let mut devices = Vec::new();
    for i in 0..rows {
        let mic = AcousticDevice::microphone(format!("mic_{}", i)).unwrap();
        table.add_row(&mic, format!("spot_{}", i), None).unwrap();
        devices.push(mic);
    }
    (table, devices)
}

#[test]
fn test_region_selects_rows() {
    let (table, _) = microphone_table(5);
    let region = table
        .create_microphone_table_region(vec![0, 2, 4], "every other microphone")
        .unwrap();

    assert_eq!(region.len(), 3);
    assert_eq!(region.description(), "every other microphone");
    assert_eq!(region.name(), "microphone_table_region");
    assert_eq!(table.name(), "microphone_table");

    let rows = region.resolve(table.table()).unwrap();
    let locations: Vec<&str> = rows.iter().map(|r| r.location.as_str()).collect();
    assert_eq!(locations, vec!["spot_0", "spot_2", "spot_4"]);
}

#[test]
fn test_region_out_of_bounds() {
    let (table, _) = microphone_table(2);
    let err = table
        .create_microphone_table_region(vec![0, 2], "d")
        .unwrap_err();
    assert_eq!(err.error_code(), "REGION_OUT_OF_BOUNDS");
}

#[test]
fn test_region_links_require_matching_table() {
    let (mics, _) = microphone_table(1);
    let mic_region = mics.create_microphone_table_region(vec![0], "d").unwrap();

    let series = AcousticWaveformSeries::builder("stim", counting(10, 0), 10.0, "d")
        .build()
        .unwrap();
    let err = AcousticStimulusSeries::new(series.clone(), Some(TransducerLink::Region(mic_region.clone())))
        .unwrap_err();
    assert_eq!(err.error_code(), "TABLE_MISMATCH");

    let recording =
        AcousticRecordingSeries::new(series, Some(TransducerLink::Region(mic_region))).unwrap();
    assert_eq!(recording.rate(), 10.0);
}

#[test]
fn test_speaker_table_rejects_microphones() {
    let mut table = SpeakerTable::new("speakers");
    let mic = AcousticDevice::microphone("mic").unwrap();
    let err = table.add_row(&mic, "left", None).unwrap_err();
    assert_eq!(err.error_code(), "DEVICE_KIND_MISMATCH");
}
