//! File Round-Trip Tests
//!
//! Writes files with acoustic series to disk and reads them back.

use chrono::Utc;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use ndx_sound::file::{NwbFile, NwbIo, SoundSeries};
use ndx_sound::mock::{mock_acoustic_waveform_series, mock_nwb_file, MockSeriesOptions};
use ndx_sound::model::{
    AcousticDevice, AcousticRecordingSeries, AcousticWaveformSeries, SampleArray, SampleDtype,
    TransducerLink,
};

fn mock_file() -> NwbFile {
    NwbFile::new("mock session", "mock-id", Utc::now())
}

fn mock_series(name: &str) -> AcousticWaveformSeries {
    mock_acoustic_waveform_series(MockSeriesOptions {
        name: name.to_string(),
        ..MockSeriesOptions::default()
    })
    .unwrap()
}

fn round_trip(file: &NwbFile) -> NwbFile {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.nwb.json");
    let io = NwbIo::default();
    io.write(&path, file).unwrap();
    io.read(&path).unwrap()
}

fn assert_same_series(read: &SoundSeries, written: &AcousticWaveformSeries) {
    let read = read.waveform();
    assert_eq!(read.name(), written.name());
    assert_eq!(read.description(), written.description());
    assert_eq!(read.rate(), written.rate());
    assert_eq!(read.unit(), written.unit());
    assert!(read.data().bitwise_eq(written.data()));
}

#[test]
fn test_add_to_acquisition() {
    let mut file = mock_file();
    let series = mock_series("AcousticWaveformSeries");
    file.add_acquisition(series.clone()).unwrap();

    let read = round_trip(&file);
    assert_same_series(read.acquisition(series.name()).unwrap(), &series);
    assert_eq!(read, file);
}

#[test]
fn test_add_to_acquisition_with_float() {
    let mut rng = StdRng::seed_from_u64(0);
    let data: Vec<f32> = (0..100).map(|_| rng.gen::<f32>()).collect();
    let series = mock_acoustic_waveform_series(MockSeriesOptions {
        data: Some(SampleArray::from_vec(data)),
        ..MockSeriesOptions::default()
    })
    .unwrap();

    let mut file = mock_file();
    file.add_acquisition(series.clone()).unwrap();

    let read = round_trip(&file);
    let read_series = read.acquisition(series.name()).unwrap();
    assert_eq!(read_series.waveform().data().dtype(), SampleDtype::Float32);
    assert_same_series(read_series, &series);
}

#[test]
fn test_nans_survive() {
    let series = mock_acoustic_waveform_series(MockSeriesOptions {
        add_random_nans: true,
        ..MockSeriesOptions::default()
    })
    .unwrap();
    let mut file = mock_file();
    file.add_acquisition(series.clone()).unwrap();

    let read = round_trip(&file);
    assert_same_series(read.acquisition(series.name()).unwrap(), &series);
}

#[test]
fn test_add_to_stimulus() {
    let mut file = mock_file();
    let series = mock_series("AcousticWaveformSeries");
    file.add_stimulus(series.clone()).unwrap();

    let read = round_trip(&file);
    assert_same_series(read.stimulus(series.name()).unwrap(), &series);
}

#[test]
fn test_add_to_processing_module() {
    let mut file = mock_file();
    let series = mock_series("AcousticWaveformSeries");
    file.create_processing_module("test_module", "Test module")
        .unwrap()
        .add(series.clone())
        .unwrap();

    let read = round_trip(&file);
    let module = read.processing_module("test_module").unwrap();
    assert_eq!(module.description(), "Test module");
    assert_same_series(module.get(series.name()).unwrap(), &series);
}

#[test]
fn test_multiple_acoustic_waveform_series() {
    let mut file = mock_file();
    let aws1 = mock_series("aws1");
    let aws2 = mock_series("aws2");
    let aws3 = mock_series("aws3");
    file.add_acquisition(aws1.clone()).unwrap();
    file.add_stimulus(aws2.clone()).unwrap();
    file.create_processing_module("test_module", "Test module")
        .unwrap()
        .add(aws3.clone())
        .unwrap();

    let read = round_trip(&file);
    assert_same_series(read.acquisition("aws1").unwrap(), &aws1);
    assert_same_series(read.stimulus("aws2").unwrap(), &aws2);
    assert_same_series(
        read.processing_module("test_module").unwrap().get("aws3").unwrap(),
        &aws3,
    );
    assert_eq!(read.all_series().len(), 3);
}

#[test]
fn test_linked_file_round_trip() {
    let file = mock_nwb_file().unwrap();
    let read = round_trip(&file);
    assert_eq!(read, file);
    read.validate_links().unwrap();

    let meta = read.lab_meta_data().unwrap();
    assert_eq!(meta.microphone_table().unwrap().len(), 2);
    assert_eq!(meta.speaker_table().unwrap().len(), 1);
}

#[test]
fn test_dangling_link_not_written() {
    let mut file = mock_file();
    let recording = AcousticRecordingSeries::new(
        mock_series("rec"),
        Some(TransducerLink::Device("missing_mic".to_string())),
    )
    .unwrap();
    file.add_acquisition(recording).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dangling.nwb.json");
    let err = NwbIo::default().write(&path, &file).unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_DEVICE");
    assert!(!path.exists());

    file.add_device(AcousticDevice::microphone("missing_mic").unwrap())
        .unwrap();
    NwbIo::default().write(&path, &file).unwrap();
}

#[test]
fn test_read_returns_cached_namespaces() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ns.nwb.json");
    let io = NwbIo::default();
    io.write(&path, &mock_nwb_file().unwrap()).unwrap();

    let (_, catalog) = io.read_with_namespaces(&path).unwrap();
    assert_eq!(catalog.namespace_names(), vec!["ndx-sound"]);
    assert_eq!(catalog.type_count(), 9);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = NwbIo::default()
        .read(&dir.path().join("absent.json"))
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_READ_ERROR");
}
