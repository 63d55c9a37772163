//! Widget Tests
//!
//! Spectrogram, playback and view behaviour on synthetic tones.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use hound::WavReader;
use tempfile::TempDir;

use ndx_sound::mock::{mock_acoustic_waveform_series, MockSeriesOptions};
use ndx_sound::model::{AcousticWaveformSeries, SampleArray};
use ndx_sound::widgets::{
    play_sound, plot_sound, plot_spectrogram, AcousticWaveformView, SpectrogramOptions, TimeWindow,
};

/// Stereo tone: `frequency` on the left, silence on the right.
fn stereo_tone(frequency: f64, rate: f64, seconds: f64) -> AcousticWaveformSeries {
    let frames = (rate * seconds) as usize;
    let samples: Vec<[f32; 2]> = (0..frames)
        .map(|i| {
            let t = i as f64 / rate;
            [(2.0 * PI * frequency * t).sin() as f32, 0.0]
        })
        .collect();
    AcousticWaveformSeries::builder("tone", SampleArray::from_frames(samples).unwrap(), rate, "tone")
        .build()
        .unwrap()
}

#[test]
fn test_spectrogram_peaks_at_tone() {
    let series = stereo_tone(2000.0, 16000.0, 1.0);
    let spec = plot_spectrogram(&series, None, &SpectrogramOptions::default()).unwrap();
    let bin_hz = 16000.0 / 1024.0;
    let peak = spec.peak_bin().unwrap();
    assert_relative_eq!(spec.frequencies[peak], 2000.0, epsilon = bin_hz);
}

#[test]
fn test_spectrogram_custom_fft() {
    let series = stereo_tone(1000.0, 8000.0, 0.5);
    let options = SpectrogramOptions {
        n_fft: 256,
        hop_length: Some(128),
        top_db: None,
    };
    let spec = plot_spectrogram(&series, None, &options).unwrap();
    assert_eq!(spec.num_bins(), 129);
    assert_eq!(spec.num_frames(), 1 + 4000 / 128);
    assert_relative_eq!(spec.times[2], 256.0 / 8000.0);
}

#[test]
fn test_wav_file_has_series_rate_and_channels() {
    let series = stereo_tone(440.0, 22050.0, 0.25);
    let clip = play_sound(&series, None).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.wav");
    clip.write_wav(&path).unwrap();

    let reader = WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 22050);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.duration() as usize, series.num_frames());
}

#[test]
fn test_clip_window() {
    let series = stereo_tone(440.0, 1000.0, 2.0);
    let clip = play_sound(&series, Some(TimeWindow::new(0.5, 1.0).unwrap())).unwrap();
    assert_eq!(clip.num_frames(), 500);
    assert_relative_eq!(clip.duration_secs(), 0.5);
    let peak = clip.samples().iter().fold(0.0f32, |p, s| p.max(s.abs()));
    assert_relative_eq!(peak, 1.0);
}

#[test]
fn test_sound_figure_shares_time_axis() {
    let series = stereo_tone(500.0, 8000.0, 1.0);
    let window = TimeWindow::new(0.25, 0.75).unwrap();
    let figure = plot_sound(&series, Some(window), &SpectrogramOptions::default()).unwrap();
    assert_relative_eq!(figure.waveform.timestamps[0], 0.25);
    assert_relative_eq!(figure.spectrogram.times[0], 0.25);
    assert_eq!(figure.waveform.channels.len(), 2);
}

#[test]
fn test_view_rerenders_on_window_change() {
    let series = stereo_tone(300.0, 4000.0, 10.0);
    let mut view = AcousticWaveformView::new(&series, None).unwrap();
    assert_relative_eq!(view.controller().duration(), 5.0);
    let first = view.figure().unwrap().clone();

    view.set_time_window(6.0, 2.0).unwrap();
    let second = view.figure().unwrap();
    assert_ne!(&first, second);
    assert_relative_eq!(second.waveform.timestamps[0], 6.0);
    assert_eq!(view.clip().unwrap().num_frames(), 8000);
    assert_eq!(view.render_count(), 2);
}

#[test]
fn test_nan_series_cannot_be_played() {
    let series = mock_acoustic_waveform_series(MockSeriesOptions {
        add_random_nans: true,
        ..MockSeriesOptions::default()
    })
    .unwrap();
    let err = play_sound(&series, None).unwrap_err();
    assert_eq!(err.error_code(), "NON_FINITE_AUDIO");
    assert!(plot_spectrogram(&series, None, &SpectrogramOptions::default()).is_err());
}
