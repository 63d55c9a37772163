//! Acoustic waveform series
//!
//! [`AcousticWaveformSeries`] extends the NWB `TimeSeries` with a one- or
//! two-channel waveform sampled at a fixed rate. The stimulus and recording
//! variants wrap it and add an optional link to the transducer involved.

use std::ops::Deref;

use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SoundError};
use crate::model::data::SampleArray;
use crate::model::table::{TableRegion, TableRole};
use crate::spec::declarations::DEFAULT_UNIT;

// ============================================================================
// TimeSeries defaults
// ============================================================================

pub const DEFAULT_STARTING_TIME: f64 = 0.0;
pub const DEFAULT_COMMENTS: &str = "no comments";
pub const DEFAULT_CONVERSION: f64 = 1.0;
pub const DEFAULT_OFFSET: f64 = 0.0;
pub const DEFAULT_RESOLUTION: f64 = -1.0;

const INDEX_TOLERANCE: f64 = 1e-6;

/// Validate an object name: non-empty and free of `/`.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SoundError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".to_string(),
        });
    }
    if name.contains('/') {
        return Err(SoundError::InvalidName {
            name: name.to_string(),
            reason: "name must not contain '/'".to_string(),
        });
    }
    Ok(())
}

/// Non-fatal findings about a constructed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesWarning {
    /// A rate of zero makes the time axis degenerate.
    ZeroRate,
    /// The waveform holds no samples.
    EmptyData,
}

// ============================================================================
// AcousticWaveformSeries
// ============================================================================

/// Single or multi-channel acoustic series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticWaveformSeries {
    name: String,
    description: String,
    data: SampleArray,
    /// Sampling rate in Hz.
    rate: f64,
    unit: String,
    starting_time: f64,
    comments: String,
    conversion: f64,
    offset: f64,
    resolution: f64,
    object_id: Uuid,
}

/// Builder for [`AcousticWaveformSeries`].
#[derive(Debug, Clone)]
pub struct AcousticWaveformSeriesBuilder {
    name: String,
    data: SampleArray,
    rate: f64,
    description: String,
    unit: Option<String>,
    starting_time: Option<f64>,
    comments: Option<String>,
    conversion: Option<f64>,
    offset: Option<f64>,
    resolution: Option<f64>,
}

impl AcousticWaveformSeriesBuilder {
    /// Unit of `data`; defaults to `"n.a."`.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Offset in seconds of the first sample; may be negative.
    pub fn starting_time(mut self, starting_time: f64) -> Self {
        self.starting_time = Some(starting_time);
        self
    }

    pub fn comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    pub fn conversion(mut self, conversion: f64) -> Self {
        self.conversion = Some(conversion);
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Validate and build the series.
    ///
    /// # Errors
    /// * `InvalidName` - If the name is empty or contains `/`
    /// * `InvalidRate` - If the rate is negative or not finite
    /// * `InvalidStartingTime` - If the starting time is not finite
    pub fn build(self) -> Result<AcousticWaveformSeries> {
        let series = AcousticWaveformSeries {
            name: self.name,
            description: self.description,
            data: self.data,
            rate: self.rate,
            unit: self.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            starting_time: self.starting_time.unwrap_or(DEFAULT_STARTING_TIME),
            comments: self.comments.unwrap_or_else(|| DEFAULT_COMMENTS.to_string()),
            conversion: self.conversion.unwrap_or(DEFAULT_CONVERSION),
            offset: self.offset.unwrap_or(DEFAULT_OFFSET),
            resolution: self.resolution.unwrap_or(DEFAULT_RESOLUTION),
            object_id: Uuid::new_v4(),
        };
        series.validate()?;

        if series.rate == 0.0 {
            warn!(
                "AcousticWaveformSeries '{}' has a sampling rate of 0 Hz",
                series.name
            );
        }

        Ok(series)
    }
}

impl AcousticWaveformSeries {
    /// Start building a series from its required fields.
    pub fn builder(
        name: impl Into<String>,
        data: SampleArray,
        rate: f64,
        description: impl Into<String>,
    ) -> AcousticWaveformSeriesBuilder {
        AcousticWaveformSeriesBuilder {
            name: name.into(),
            data,
            rate,
            description: description.into(),
            unit: None,
            starting_time: None,
            comments: None,
            conversion: None,
            offset: None,
            resolution: None,
        }
    }

    /// Check the invariants [`AcousticWaveformSeriesBuilder::build`] enforces.
    /// Deserialized series are run through this on read.
    ///
    /// # Errors
    /// * `InvalidName` - If the name is empty or contains `/`
    /// * `InvalidRate` - If the rate is negative or not finite
    /// * `InvalidStartingTime` - If the starting time is not finite
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if !self.rate.is_finite() {
            return Err(SoundError::InvalidRate {
                rate: self.rate,
                reason: "rate must be finite".to_string(),
            });
        }
        if self.rate < 0.0 {
            return Err(SoundError::InvalidRate {
                rate: self.rate,
                reason: "rate must be non-negative".to_string(),
            });
        }
        if !self.starting_time.is_finite() {
            return Err(SoundError::InvalidStartingTime {
                value: self.starting_time,
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data(&self) -> &SampleArray {
        &self.data
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn starting_time(&self) -> f64 {
        self.starting_time
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn conversion(&self) -> f64 {
        self.conversion
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn object_id(&self) -> Uuid {
        self.object_id
    }

    pub fn num_frames(&self) -> usize {
        self.data.num_frames()
    }

    /// Non-fatal problems with this series.
    pub fn warnings(&self) -> Vec<SeriesWarning> {
        let mut warnings = Vec::new();
        if self.rate == 0.0 {
            warnings.push(SeriesWarning::ZeroRate);
        }
        if self.data.is_empty() {
            warnings.push(SeriesWarning::EmptyData);
        }
        warnings
    }

    /// Duration in seconds; zero when the rate is zero.
    pub fn duration(&self) -> f64 {
        if self.rate > 0.0 {
            self.num_frames() as f64 / self.rate
        } else {
            0.0
        }
    }

    /// Time of the sample after the last one.
    pub fn end_time(&self) -> f64 {
        self.starting_time + self.duration()
    }

    /// Sample index for a time, `ceil((t - starting_time) * rate)`.
    ///
    /// # Errors
    /// * `TimeWindowOutOfRange` - If the index falls outside `[0, num_frames]`
    pub fn time_to_index(&self, time: f64) -> Result<usize> {
        let out_of_range = || SoundError::TimeWindowOutOfRange {
            time,
            min: self.starting_time,
            max: self.end_time(),
        };
        if !time.is_finite() {
            return Err(out_of_range());
        }
        let frames = self.num_frames() as f64;
        let position = (time - self.starting_time) * self.rate;
        let mut index = position.ceil();
        // Window ends computed as start + duration land a rounding error past the end.
        if index > frames && position - frames < INDEX_TOLERANCE {
            index = frames;
        }
        if index < 0.0 || index > frames {
            return Err(out_of_range());
        }
        Ok(index as usize)
    }

    /// Timestamps of frames `[start, stop)`.
    pub fn timestamps(&self, start: usize, stop: usize) -> Vec<f64> {
        let stop = stop.min(self.num_frames());
        if self.rate <= 0.0 {
            return vec![self.starting_time; stop.saturating_sub(start)];
        }
        (start..stop)
            .map(|i| self.starting_time + i as f64 / self.rate)
            .collect()
    }

    /// Frames `[start, stop)` of one channel scaled into `unit`
    /// (`value * conversion + offset`).
    pub fn data_in_units(&self, start: usize, stop: usize, channel: usize) -> Result<Vec<f64>> {
        let slice = self.data.frames(start, stop)?;
        Ok(slice
            .channel(channel)
            .into_iter()
            .map(|v| v * self.conversion + self.offset)
            .collect())
    }
}

// ============================================================================
// Stimulus and recording series
// ============================================================================

/// Which transducer produced or captured a waveform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransducerLink {
    /// A device registered in the file, by name.
    Device(String),
    /// Rows of a speaker or microphone table.
    Region(TableRegion),
}

fn check_link(link: &Option<TransducerLink>, expected: TableRole) -> Result<()> {
    match link {
        Some(TransducerLink::Device(name)) => validate_name(name),
        Some(TransducerLink::Region(region)) => {
            region.validate()?;
            if region.role() != expected {
                return Err(SoundError::TableMismatch {
                    table: region.table_name().to_string(),
                    expected: expected.type_name(),
                });
            }
            Ok(())
        }
        None => Ok(()),
    }
}

/// Acoustic stimulus played through a speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticStimulusSeries {
    #[serde(flatten)]
    series: AcousticWaveformSeries,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker: Option<TransducerLink>,
}

impl AcousticStimulusSeries {
    /// # Errors
    /// * `TableMismatch` - If a region link does not point into a speaker table
    /// * `InvalidName` - If a link names an invalid device or region
    pub fn new(series: AcousticWaveformSeries, speaker: Option<TransducerLink>) -> Result<Self> {
        let stimulus = Self { series, speaker };
        stimulus.validate()?;
        Ok(stimulus)
    }

    /// Validate the wrapped series and the speaker link.
    pub fn validate(&self) -> Result<()> {
        self.series.validate()?;
        check_link(&self.speaker, TableRole::Speaker)
    }

    pub fn speaker(&self) -> Option<&TransducerLink> {
        self.speaker.as_ref()
    }

    pub fn series(&self) -> &AcousticWaveformSeries {
        &self.series
    }
}

impl Deref for AcousticStimulusSeries {
    type Target = AcousticWaveformSeries;

    fn deref(&self) -> &Self::Target {
        &self.series
    }
}

/// Acoustic response captured by a microphone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticRecordingSeries {
    #[serde(flatten)]
    series: AcousticWaveformSeries,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    microphone: Option<TransducerLink>,
}

impl AcousticRecordingSeries {
    /// # Errors
    /// * `TableMismatch` - If a region link does not point into a microphone table
    /// * `InvalidName` - If a link names an invalid device or region
    pub fn new(series: AcousticWaveformSeries, microphone: Option<TransducerLink>) -> Result<Self> {
        let recording = Self { series, microphone };
        recording.validate()?;
        Ok(recording)
    }

    /// Validate the wrapped series and the microphone link.
    pub fn validate(&self) -> Result<()> {
        self.series.validate()?;
        check_link(&self.microphone, TableRole::Microphone)
    }

    pub fn microphone(&self) -> Option<&TransducerLink> {
        self.microphone.as_ref()
    }

    pub fn series(&self) -> &AcousticWaveformSeries {
        &self.series
    }
}

impl Deref for AcousticRecordingSeries {
    type Target = AcousticWaveformSeries;

    fn deref(&self) -> &Self::Target {
        &self.series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tone() -> SampleArray {
        SampleArray::from_vec((0..100).map(|i| i as i16).collect::<Vec<_>>())
    }

    #[test]
    fn test_defaults() {
        let series = AcousticWaveformSeries::builder("s", tone(), 42000.0, "d")
            .build()
            .unwrap();
        assert_eq!(series.unit(), "n.a.");
        assert_eq!(series.starting_time(), 0.0);
        assert_eq!(series.comments(), "no comments");
        assert_eq!(series.conversion(), 1.0);
        assert_eq!(series.resolution(), -1.0);
        assert!(series.warnings().is_empty());
    }

    #[test]
    fn test_invalid_names() {
        assert!(AcousticWaveformSeries::builder("", tone(), 1.0, "d").build().is_err());
        let err = AcousticWaveformSeries::builder("a/b", tone(), 1.0, "d")
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NAME");
    }

    #[test]
    fn test_non_finite_rate() {
        let err = AcousticWaveformSeries::builder("s", tone(), f64::NAN, "d")
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RATE");
    }

    #[test]
    fn test_time_to_index() {
        let series = AcousticWaveformSeries::builder("s", tone(), 10.0, "d")
            .starting_time(-1.0)
            .build()
            .unwrap();
        assert_eq!(series.time_to_index(-1.0).unwrap(), 0);
        assert_eq!(series.time_to_index(0.0).unwrap(), 10);
        assert_eq!(series.time_to_index(0.01).unwrap(), 11);
        assert_eq!(series.time_to_index(9.0).unwrap(), 100);
        assert!(series.time_to_index(-2.0).is_err());
        assert!(series.time_to_index(9.5).is_err());
        assert_relative_eq!(series.end_time(), 9.0);
    }

    #[test]
    fn test_data_in_units() {
        let series = AcousticWaveformSeries::builder("s", tone(), 10.0, "d")
            .conversion(0.5)
            .offset(1.0)
            .build()
            .unwrap();
        assert_eq!(series.data_in_units(2, 4, 0).unwrap(), vec![2.0, 2.5]);
        assert_eq!(series.timestamps(2, 4), vec![0.2, 0.3]);
    }
}
