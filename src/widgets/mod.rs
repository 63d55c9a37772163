//! Visualization and playback
//!
//! Computes what a viewer shows for an [`AcousticWaveformSeries`]: the
//! waveform trace, a log-frequency spectrogram and a playable WAV clip.
//! Rendering to a screen is left to the caller.

pub mod playback;
pub mod spectrogram;
pub mod view;
pub mod waveform;

use crate::error::{Result, SoundError};
use crate::model::AcousticWaveformSeries;

pub use playback::{play_sound, AudioClip};
pub use spectrogram::{amplitude_to_db, plot_spectrogram, stft, Spectrogram, SpectrogramOptions};
pub use view::{
    plot_sound, AcousticWaveformView, SharedController, SoundFigure, StartAndDurationController,
};
pub use waveform::{plot_waveform, WaveformTrace};

/// Longest window a view opens with, in seconds.
pub const DEFAULT_WINDOW_SECS: f64 = 5.0;

/// A time span `[start, stop)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: f64,
    stop: f64,
}

impl TimeWindow {
    /// # Errors
    /// * `InvalidData` - If either end is not finite or `start >= stop`
    pub fn new(start: f64, stop: f64) -> Result<Self> {
        if !start.is_finite() || !stop.is_finite() || start >= stop {
            return Err(SoundError::InvalidData {
                reason: format!("time window [{}, {}) is empty or not finite", start, stop),
            });
        }
        Ok(Self { start, stop })
    }

    pub fn from_start_duration(start: f64, duration: f64) -> Result<Self> {
        Self::new(start, start + duration)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }

    /// Frame range `[istart, istop)` the window selects in `series`.
    ///
    /// # Errors
    /// * `TimeWindowOutOfRange` - If either end falls outside the series
    pub fn indices(&self, series: &AcousticWaveformSeries) -> Result<(usize, usize)> {
        Ok((series.time_to_index(self.start)?, series.time_to_index(self.stop)?))
    }
}

/// Frame range and start time for an optional window.
pub(crate) fn resolve_window(
    series: &AcousticWaveformSeries,
    window: Option<TimeWindow>,
) -> Result<(usize, usize, f64)> {
    match window {
        Some(w) => {
            let (start, stop) = w.indices(series)?;
            Ok((start, stop, w.start()))
        }
        None => Ok((0, series.num_frames(), series.starting_time())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SampleArray;

    #[test]
    fn test_window_validation() {
        assert!(TimeWindow::new(1.0, 1.0).is_err());
        assert!(TimeWindow::new(2.0, 1.0).is_err());
        assert!(TimeWindow::new(0.0, f64::INFINITY).is_err());
        assert_eq!(TimeWindow::from_start_duration(1.0, 0.5).unwrap().stop(), 1.5);
    }

    #[test]
    fn test_window_indices() {
        let series = AcousticWaveformSeries::builder(
            "s",
            SampleArray::from_vec(vec![0i16; 100]),
            10.0,
            "d",
        )
        .starting_time(1.0)
        .build()
        .unwrap();
        let window = TimeWindow::new(2.0, 11.0).unwrap();
        assert_eq!(window.indices(&series).unwrap(), (10, 100));

        let late = TimeWindow::new(2.0, 12.0).unwrap();
        assert_eq!(
            late.indices(&series).unwrap_err().error_code(),
            "TIME_WINDOW_OUT_OF_RANGE"
        );
    }
}
