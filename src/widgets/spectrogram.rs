//! Spectrogram
//!
//! Short-time Fourier transform of the mono mix-down, converted to dB.
//! Frames are centred: the signal is zero-padded by `n_fft / 2` on both
//! sides, so frame `i` is centred on sample `i * hop`.

use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{Result, SoundError};
use crate::model::AcousticWaveformSeries;
use crate::widgets::{resolve_window, TimeWindow};

pub const DEFAULT_N_FFT: usize = 1024;
pub const DEFAULT_TOP_DB: f64 = 80.0;

/// Floor applied to magnitudes before taking the log.
pub const AMIN: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramOptions {
    pub n_fft: usize,
    /// Defaults to `n_fft / 4`.
    pub hop_length: Option<usize>,
    /// Dynamic range kept below the peak; `None` keeps everything.
    pub top_db: Option<f64>,
}

impl Default for SpectrogramOptions {
    fn default() -> Self {
        Self {
            n_fft: DEFAULT_N_FFT,
            hop_length: None,
            top_db: Some(DEFAULT_TOP_DB),
        }
    }
}

impl SpectrogramOptions {
    pub fn hop(&self) -> usize {
        self.hop_length.unwrap_or(self.n_fft / 4).max(1)
    }
}

/// dB magnitudes, one row per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    /// Frame centre times in seconds.
    pub times: Vec<f64>,
    /// Bin frequencies in Hz, `0..=rate/2`.
    pub frequencies: Vec<f64>,
    /// `db[frame][bin]`
    pub db: Vec<Vec<f64>>,
    /// The frequency axis is meant to be drawn logarithmically.
    pub log_frequency_axis: bool,
}

impl Spectrogram {
    pub fn num_frames(&self) -> usize {
        self.times.len()
    }

    pub fn num_bins(&self) -> usize {
        self.frequencies.len()
    }

    /// Bin with the highest mean level across frames.
    pub fn peak_bin(&self) -> Option<usize> {
        let frames = self.db.len() as f64;
        (0..self.num_bins())
            .map(|bin| (bin, self.db.iter().map(|row| row[bin]).sum::<f64>() / frames))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(bin, _)| bin)
    }
}

/// Periodic Hann window of length `n`.
fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Magnitude STFT, `n_fft / 2 + 1` bins per frame.
///
/// # Errors
/// * `InvalidData` - If `n_fft` is zero
/// * `NonFiniteAudio` - If any sample is NaN or infinite
pub fn stft(samples: &[f64], n_fft: usize, hop: usize) -> Result<Vec<Vec<f64>>> {
    if n_fft == 0 || hop == 0 {
        return Err(SoundError::InvalidData {
            reason: "n_fft and hop length must be positive".to_string(),
        });
    }
    if samples.iter().any(|s| !s.is_finite()) {
        return Err(SoundError::NonFiniteAudio);
    }

    let pad = n_fft / 2;
    let mut padded = vec![0.0; (samples.len() + 2 * pad).max(n_fft)];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let window = hann(n_fft);
    let num_frames = 1 + (padded.len() - n_fft) / hop;
    let bins = n_fft / 2 + 1;

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];

    let mut frames = Vec::with_capacity(num_frames);
    for frame in 0..num_frames {
        let offset = frame * hop;
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(padded[offset + i] * window[i], 0.0);
        }
        fft.process(&mut buffer);
        frames.push(buffer[..bins].iter().map(|c| c.norm()).collect());
    }
    Ok(frames)
}

/// Convert magnitudes to dB relative to 1, floored at `AMIN` and clipped to
/// `top_db` below the loudest cell.
pub fn amplitude_to_db(magnitudes: &[Vec<f64>], top_db: Option<f64>) -> Vec<Vec<f64>> {
    let mut db: Vec<Vec<f64>> = magnitudes
        .iter()
        .map(|row| row.iter().map(|&m| 20.0 * m.max(AMIN).log10()).collect())
        .collect();

    if let Some(top_db) = top_db {
        let peak = db
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let floor = peak - top_db;
        for value in db.iter_mut().flatten() {
            *value = value.max(floor);
        }
    }
    db
}

/// Spectrogram of `series` over `window`, or over the whole series.
///
/// # Errors
/// * `InvalidRate` - If the series rate is zero
/// * `TimeWindowOutOfRange` - If the window falls outside the series
/// * `NonFiniteAudio` - If the window holds NaN or infinite samples
pub fn plot_spectrogram(
    series: &AcousticWaveformSeries,
    window: Option<TimeWindow>,
    options: &SpectrogramOptions,
) -> Result<Spectrogram> {
    let rate = series.rate();
    if rate <= 0.0 {
        return Err(SoundError::InvalidRate {
            rate,
            reason: "a spectrogram needs a positive sampling rate".to_string(),
        });
    }

    let (start, stop, start_time) = resolve_window(series, window)?;
    let slice = series.data().frames(start, stop)?;
    let mono: Vec<f64> = slice
        .mix_to_mono()
        .into_iter()
        .map(|v| v * series.conversion() + series.offset())
        .collect();

    let hop = options.hop();
    let magnitudes = stft(&mono, options.n_fft, hop)?;
    let db = amplitude_to_db(&magnitudes, options.top_db);

    let times = (0..db.len())
        .map(|i| i as f64 * hop as f64 / rate + start_time)
        .collect();
    let frequencies = (0..=options.n_fft / 2)
        .map(|k| k as f64 * rate / options.n_fft as f64)
        .collect();

    Ok(Spectrogram {
        times,
        frequencies,
        db,
        log_frequency_axis: true,
    })
}
