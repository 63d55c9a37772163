//! Mock objects for tests and demos
//!
//! Deterministic for a given seed: the same options always produce the same
//! samples and the same NaN positions.

use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::file::NwbFile;
use crate::model::{
    AcousticDevice, AcousticLabMetaData, AcousticRecordingSeries, AcousticStimulusSeries,
    AcousticWaveformSeries, DataShape, FrequencyRange, MicrophoneTable, SampleArray, SampleValues,
    SpeakerTable, TransducerLink,
};

/// Probability that a cell becomes NaN when `add_random_nans` is set.
pub const NAN_PROBABILITY: f64 = 0.1;

/// Exclusive upper bound of generated samples; the lower bound is 0.
pub const MOCK_SAMPLE_MAX: i16 = 1000;

/// Options for [`mock_acoustic_waveform_series`].
#[derive(Debug, Clone)]
pub struct MockSeriesOptions {
    pub name: String,
    /// Ignored when `data` is given.
    pub data_shape: DataShape,
    pub rate: f64,
    pub description: String,
    pub seed: u64,
    pub data: Option<SampleArray>,
    pub add_random_nans: bool,
    // Passed to the builder when set.
    pub unit: Option<String>,
    pub starting_time: Option<f64>,
    pub comments: Option<String>,
    pub conversion: Option<f64>,
    pub offset: Option<f64>,
    pub resolution: Option<f64>,
}

impl Default for MockSeriesOptions {
    fn default() -> Self {
        Self {
            name: "AcousticWaveformSeries".to_string(),
            data_shape: DataShape::Time(100),
            rate: 42000.0,
            description: "acoustic stimulus description".to_string(),
            seed: 0,
            data: None,
            add_random_nans: false,
            unit: None,
            starting_time: None,
            comments: None,
            conversion: None,
            offset: None,
            resolution: None,
        }
    }
}

fn random_samples(shape: DataShape, seed: u64) -> Result<SampleArray> {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples: Vec<i16> = (0..shape.num_values())
        .map(|_| rng.gen_range(0..MOCK_SAMPLE_MAX))
        .collect();
    SampleArray::with_shape(SampleValues::Int16(samples), shape)
}

fn sprinkle_nans(data: &SampleArray, seed: u64) -> SampleArray {
    let mut data = data.to_float32();
    let mut rng = StdRng::seed_from_u64(seed);
    if let Some(values) = data.as_float32_mut() {
        for value in values.iter_mut() {
            if rng.gen_bool(NAN_PROBABILITY) {
                *value = f32::NAN;
            }
        }
    }
    data
}

/// Build a waveform series from options, generating data when none is given.
///
/// # Errors
/// Any error from [`AcousticWaveformSeries::builder`], e.g. `InvalidRate`.
pub fn mock_acoustic_waveform_series(options: MockSeriesOptions) -> Result<AcousticWaveformSeries> {
    let data = match options.data {
        Some(data) => data,
        None => random_samples(options.data_shape, options.seed)?,
    };
    let data = if options.add_random_nans {
        sprinkle_nans(&data, options.seed)
    } else {
        data
    };

    let mut builder =
        AcousticWaveformSeries::builder(options.name, data, options.rate, options.description);
    if let Some(unit) = options.unit {
        builder = builder.unit(unit);
    }
    if let Some(starting_time) = options.starting_time {
        builder = builder.starting_time(starting_time);
    }
    if let Some(comments) = options.comments {
        builder = builder.comments(comments);
    }
    if let Some(conversion) = options.conversion {
        builder = builder.conversion(conversion);
    }
    if let Some(offset) = options.offset {
        builder = builder.offset(offset);
    }
    if let Some(resolution) = options.resolution {
        builder = builder.resolution(resolution);
    }
    builder.build()
}

pub fn mock_speaker(name: &str) -> Result<AcousticDevice> {
    Ok(AcousticDevice::speaker(name)?
        .with_description("mock speaker")
        .with_manufacturer("Acme Audio")
        .with_frequency_range(FrequencyRange::new(50.0, 20_000.0)?)
        .with_sensitivity(89.0))
}

pub fn mock_microphone(name: &str) -> Result<AcousticDevice> {
    Ok(AcousticDevice::microphone(name)?
        .with_description("mock microphone")
        .with_manufacturer("Acme Audio")
        .with_frequency_range(FrequencyRange::new(20.0, 40_000.0)?)
        .with_sensitivity(-38.0))
}

pub fn mock_audio_interface(name: &str) -> Result<AcousticDevice> {
    Ok(AcousticDevice::audio_interface(name)?.with_description("mock audio interface"))
}

/// A microphone table with one row per device, located `position_<i>`.
pub fn mock_microphone_table(
    microphones: &[AcousticDevice],
    audio_interface: Option<&AcousticDevice>,
) -> Result<MicrophoneTable> {
    let mut table = MicrophoneTable::new("mock microphones");
    for (i, microphone) in microphones.iter().enumerate() {
        table.add_row(microphone, format!("position_{}", i), audio_interface)?;
    }
    Ok(table)
}

/// A speaker table with one row per device, located `position_<i>`.
pub fn mock_speaker_table(
    speakers: &[AcousticDevice],
    audio_interface: Option<&AcousticDevice>,
) -> Result<SpeakerTable> {
    let mut table = SpeakerTable::new("mock speakers");
    for (i, speaker) in speakers.iter().enumerate() {
        table.add_row(speaker, format!("position_{}", i), audio_interface)?;
    }
    Ok(table)
}

/// A complete file: devices, lab metadata with both tables, a stimulus
/// linked to the speaker table and a stereo recording linked to the
/// microphone table.
pub fn mock_nwb_file() -> Result<NwbFile> {
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).single().unwrap_or_else(Utc::now);
    let mut file = NwbFile::new("mock acoustic session", "mock-ndx-sound", start);

    let interface = mock_audio_interface("audio_interface")?;
    let speaker = mock_speaker("speaker")?;
    let microphones = vec![mock_microphone("microphone_left")?, mock_microphone("microphone_right")?];

    let speaker_table = mock_speaker_table(std::slice::from_ref(&speaker), Some(&interface))?;
    let microphone_table = mock_microphone_table(&microphones, Some(&interface))?;
    let speaker_region = speaker_table.create_speaker_table_region(vec![0], "stimulus speaker")?;
    let microphone_region =
        microphone_table.create_microphone_table_region(vec![0, 1], "recording microphones")?;

    let stimulus = mock_acoustic_waveform_series(MockSeriesOptions {
        name: "acoustic_stimulus".to_string(),
        data_shape: DataShape::Time(4200),
        ..MockSeriesOptions::default()
    })?;
    let recording = mock_acoustic_waveform_series(MockSeriesOptions {
        name: "acoustic_recording".to_string(),
        data_shape: DataShape::TimeChannels(4200, 2),
        description: "acoustic response description".to_string(),
        seed: 1,
        unit: Some("mV".to_string()),
        ..MockSeriesOptions::default()
    })?;

    file.add_device(interface)?;
    file.add_device(speaker)?;
    for microphone in microphones {
        file.add_device(microphone)?;
    }
    file.add_lab_meta_data(
        AcousticLabMetaData::new()
            .with_speaker_table(speaker_table)
            .with_microphone_table(microphone_table),
    )?;
    file.add_stimulus(AcousticStimulusSeries::new(
        stimulus,
        Some(TransducerLink::Region(speaker_region)),
    )?)?;
    file.add_acquisition(AcousticRecordingSeries::new(
        recording,
        Some(TransducerLink::Region(microphone_region)),
    )?)?;

    file.validate_links()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SampleDtype;

    #[test]
    fn test_defaults() {
        let series = mock_acoustic_waveform_series(MockSeriesOptions::default()).unwrap();
        assert_eq!(series.name(), "AcousticWaveformSeries");
        assert_eq!(series.data().dims(), vec![100]);
        assert_eq!(series.data().dtype(), SampleDtype::Int16);
        assert_eq!(series.rate(), 42000.0);
        assert_eq!(series.unit(), "n.a.");
    }

    #[test]
    fn test_samples_in_range() {
        let series = mock_acoustic_waveform_series(MockSeriesOptions {
            data_shape: DataShape::TimeChannels(500, 2),
            ..MockSeriesOptions::default()
        })
        .unwrap();
        let values = series.data().values().to_f64_vec();
        assert_eq!(values.len(), 1000);
        assert!(values.iter().all(|&v| (0.0..1000.0).contains(&v)));
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = mock_acoustic_waveform_series(MockSeriesOptions::default()).unwrap();
        let b = mock_acoustic_waveform_series(MockSeriesOptions::default()).unwrap();
        assert_eq!(a.data(), b.data());

        let c = mock_acoustic_waveform_series(MockSeriesOptions {
            seed: 7,
            ..MockSeriesOptions::default()
        })
        .unwrap();
        assert_ne!(a.data(), c.data());
    }

    #[test]
    fn test_random_nans() {
        let options = MockSeriesOptions {
            data_shape: DataShape::Time(2000),
            add_random_nans: true,
            ..MockSeriesOptions::default()
        };
        let a = mock_acoustic_waveform_series(options.clone()).unwrap();
        let b = mock_acoustic_waveform_series(options).unwrap();
        assert_eq!(a.data().dtype(), SampleDtype::Float32);
        assert!(a.data().bitwise_eq(b.data()));

        let nans = a.data().values().to_f64_vec().iter().filter(|v| v.is_nan()).count();
        assert!(nans > 100 && nans < 300, "nan count {}", nans);
    }

    #[test]
    fn test_builder_parameters_pass_through() {
        let series = mock_acoustic_waveform_series(MockSeriesOptions {
            unit: Some("pascal".to_string()),
            starting_time: Some(1.5),
            comments: Some("calibrated".to_string()),
            conversion: Some(0.25),
            offset: Some(-2.0),
            resolution: Some(0.01),
            ..MockSeriesOptions::default()
        })
        .unwrap();
        assert_eq!(series.unit(), "pascal");
        assert_eq!(series.starting_time(), 1.5);
        assert_eq!(series.comments(), "calibrated");
        assert_eq!(series.conversion(), 0.25);
        assert_eq!(series.offset(), -2.0);
        assert_eq!(series.resolution(), 0.01);
    }

    #[test]
    fn test_supplied_data_wins() {
        let data = SampleArray::from_frames(vec![[1.0f64, 2.0], [3.0, 4.0]]).unwrap();
        let series = mock_acoustic_waveform_series(MockSeriesOptions {
            data: Some(data.clone()),
            ..MockSeriesOptions::default()
        })
        .unwrap();
        assert_eq!(series.data(), &data);
    }

    #[test]
    fn test_mock_file_links_resolve() {
        let file = mock_nwb_file().unwrap();
        assert_eq!(file.devices().count(), 4);
        assert!(file.stimulus("acoustic_stimulus").is_some());
        assert_eq!(
            file.acquisition("acoustic_recording").unwrap().waveform().data().num_channels(),
            2
        );
    }
}
