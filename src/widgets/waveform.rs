//! Waveform trace

use crate::error::Result;
use crate::model::AcousticWaveformSeries;
use crate::widgets::{resolve_window, TimeWindow};

/// Timestamps and per-channel values of a window, in the series' unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformTrace {
    pub timestamps: Vec<f64>,
    pub channels: Vec<Vec<f64>>,
    pub unit: String,
}

impl WaveformTrace {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Smallest and largest finite value across channels.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.channels
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |range, &v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Trace of `series` over `window`, or over the whole series.
///
/// # Errors
/// * `TimeWindowOutOfRange` - If the window falls outside the series
pub fn plot_waveform(
    series: &AcousticWaveformSeries,
    window: Option<TimeWindow>,
) -> Result<WaveformTrace> {
    let (start, stop, _) = resolve_window(series, window)?;
    let channels = (0..series.data().num_channels())
        .map(|c| series.data_in_units(start, stop, c))
        .collect::<Result<Vec<_>>>()?;
    Ok(WaveformTrace {
        timestamps: series.timestamps(start, stop),
        channels,
        unit: series.unit().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SampleArray;
    use approx::assert_relative_eq;

    #[test]
    fn test_stereo_window_in_units() {
        let frames: Vec<[i16; 2]> = (0..20).map(|i| [i, -i]).collect();
        let series = AcousticWaveformSeries::builder(
            "s",
            SampleArray::from_frames(frames).unwrap(),
            10.0,
            "d",
        )
        .conversion(0.5)
        .unit("Pa")
        .build()
        .unwrap();

        let trace = plot_waveform(&series, Some(TimeWindow::new(0.5, 1.0).unwrap())).unwrap();
        assert_eq!(trace.len(), 5);
        assert_eq!(trace.channels.len(), 2);
        assert_relative_eq!(trace.timestamps[0], 0.5);
        assert_relative_eq!(trace.channels[0][0], 2.5);
        assert_relative_eq!(trace.channels[1][4], -4.5);
        assert_eq!(trace.unit, "Pa");
        assert_eq!(trace.value_range(), Some((-4.5, 4.5)));
    }

    #[test]
    fn test_whole_series() {
        let series = AcousticWaveformSeries::builder(
            "s",
            SampleArray::from_vec(vec![1.0f32; 8]),
            4.0,
            "d",
        )
        .build()
        .unwrap();
        let trace = plot_waveform(&series, None).unwrap();
        assert_eq!(trace.len(), 8);
        assert_relative_eq!(trace.timestamps[7], 1.75);
    }
}
