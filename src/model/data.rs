//! Sample arrays
//!
//! Row-major sample storage for waveform data, shaped `(time,)` or
//! `(time, channels)` with one or two channels. The element dtype is kept as
//! given so integer recordings persist as integers.

use std::fmt;

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SoundError};

// ============================================================================
// Shape
// ============================================================================

/// Maximum number of channels a waveform may carry.
pub const MAX_CHANNELS: usize = 2;

/// Shape of a waveform array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataShape {
    /// `(time,)`
    Time(usize),
    /// `(time, channels)`
    TimeChannels(usize, usize),
}

impl DataShape {
    /// Validate a raw shape and convert it.
    ///
    /// # Errors
    /// * `InvalidShape` - For rank other than 1 or 2, or more than two channels
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        match *dims {
            [frames] => Ok(DataShape::Time(frames)),
            [frames, channels] if (1..=MAX_CHANNELS).contains(&channels) => {
                Ok(DataShape::TimeChannels(frames, channels))
            }
            [_, _] => Err(SoundError::InvalidShape {
                shape: dims.to_vec(),
                reason: format!("channel count must be 1 or {}", MAX_CHANNELS),
            }),
            _ => Err(SoundError::InvalidShape {
                shape: dims.to_vec(),
                reason: format!("expected (time,) or (time, channels), got rank {}", dims.len()),
            }),
        }
    }

    pub fn num_frames(&self) -> usize {
        match *self {
            DataShape::Time(n) | DataShape::TimeChannels(n, _) => n,
        }
    }

    pub fn num_channels(&self) -> usize {
        match *self {
            DataShape::Time(_) => 1,
            DataShape::TimeChannels(_, c) => c,
        }
    }

    pub fn num_values(&self) -> usize {
        self.num_frames() * self.num_channels()
    }

    /// Shape as a dimension list, e.g. `[100, 2]`.
    pub fn dims(&self) -> Vec<usize> {
        match *self {
            DataShape::Time(n) => vec![n],
            DataShape::TimeChannels(n, c) => vec![n, c],
        }
    }

    fn with_frames(&self, frames: usize) -> Self {
        match *self {
            DataShape::Time(_) => DataShape::Time(frames),
            DataShape::TimeChannels(_, c) => DataShape::TimeChannels(frames, c),
        }
    }
}

// ============================================================================
// Dtype and values
// ============================================================================

/// Element type of a sample array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleDtype {
    Uint8,
    Uint16,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl SampleDtype {
    pub fn is_float(&self) -> bool {
        matches!(self, SampleDtype::Float32 | SampleDtype::Float64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SampleDtype::Uint8 => "uint8",
            SampleDtype::Uint16 => "uint16",
            SampleDtype::Int16 => "int16",
            SampleDtype::Int32 => "int32",
            SampleDtype::Int64 => "int64",
            SampleDtype::Float32 => "float32",
            SampleDtype::Float64 => "float64",
        }
    }
}

impl fmt::Display for SampleDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValues {
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

macro_rules! dispatch {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            SampleValues::Uint8($v) => $body,
            SampleValues::Uint16($v) => $body,
            SampleValues::Int16($v) => $body,
            SampleValues::Int32($v) => $body,
            SampleValues::Int64($v) => $body,
            SampleValues::Float32($v) => $body,
            SampleValues::Float64($v) => $body,
        }
    };
}

macro_rules! map_values {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            SampleValues::Uint8($v) => SampleValues::Uint8($body),
            SampleValues::Uint16($v) => SampleValues::Uint16($body),
            SampleValues::Int16($v) => SampleValues::Int16($body),
            SampleValues::Int32($v) => SampleValues::Int32($body),
            SampleValues::Int64($v) => SampleValues::Int64($body),
            SampleValues::Float32($v) => SampleValues::Float32($body),
            SampleValues::Float64($v) => SampleValues::Float64($body),
        }
    };
}

impl SampleValues {
    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> SampleDtype {
        match self {
            SampleValues::Uint8(_) => SampleDtype::Uint8,
            SampleValues::Uint16(_) => SampleDtype::Uint16,
            SampleValues::Int16(_) => SampleDtype::Int16,
            SampleValues::Int32(_) => SampleDtype::Int32,
            SampleValues::Int64(_) => SampleDtype::Int64,
            SampleValues::Float32(_) => SampleDtype::Float32,
            SampleValues::Float64(_) => SampleDtype::Float64,
        }
    }

    /// Value at a flat index, widened to f64.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        dispatch!(self, v => v.get(index).and_then(|x| x.to_f64()))
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        dispatch!(self, v => v.iter().map(|x| x.to_f64().unwrap_or(f64::NAN)).collect())
    }
}

/// Element types accepted by [`SampleArray`] constructors.
pub trait Sample: Copy + ToPrimitive {
    fn wrap(values: Vec<Self>) -> SampleValues;
}

macro_rules! impl_sample {
    ($t:ty, $variant:ident) => {
        impl Sample for $t {
            fn wrap(values: Vec<Self>) -> SampleValues {
                SampleValues::$variant(values)
            }
        }
    };
}

impl_sample!(u8, Uint8);
impl_sample!(u16, Uint16);
impl_sample!(i16, Int16);
impl_sample!(i32, Int32);
impl_sample!(i64, Int64);
impl_sample!(f32, Float32);
impl_sample!(f64, Float64);

// ============================================================================
// Sample array
// ============================================================================

/// A shaped, typed waveform array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PersistedArray", into = "PersistedArray")]
pub struct SampleArray {
    shape: DataShape,
    values: SampleValues,
}

impl SampleArray {
    /// Build from flat row-major values and a raw shape.
    ///
    /// # Errors
    /// * `InvalidShape` - If the shape is not `(time,)` or `(time, 1|2)`
    /// * `InvalidData` - If the value count does not match the shape
    pub fn new(values: SampleValues, dims: &[usize]) -> Result<Self> {
        let shape = DataShape::from_dims(dims)?;
        Self::with_shape(values, shape)
    }

    pub fn with_shape(values: SampleValues, shape: DataShape) -> Result<Self> {
        if let DataShape::TimeChannels(_, c) = shape {
            if !(1..=MAX_CHANNELS).contains(&c) {
                return Err(SoundError::InvalidShape {
                    shape: shape.dims(),
                    reason: format!("channel count must be 1 or {}", MAX_CHANNELS),
                });
            }
        }
        if values.len() != shape.num_values() {
            return Err(SoundError::InvalidData {
                reason: format!(
                    "{} values do not fill shape {:?}",
                    values.len(),
                    shape.dims()
                ),
            });
        }
        Ok(Self { shape, values })
    }

    /// One-dimensional `(time,)` array.
    pub fn from_vec<T: Sample>(samples: Vec<T>) -> Self {
        let shape = DataShape::Time(samples.len());
        Self {
            shape,
            values: T::wrap(samples),
        }
    }

    /// `(time, channels)` array from interleaved frames.
    pub fn from_interleaved<T: Sample>(samples: Vec<T>, channels: usize) -> Result<Self> {
        if channels == 0 {
            return Err(SoundError::InvalidShape {
                shape: vec![samples.len(), 0],
                reason: "channel count must be 1 or 2".to_string(),
            });
        }
        let frames = samples.len() / channels;
        Self::new(T::wrap(samples), &[frames, channels])
    }

    /// `(time, channels)` array from one row per frame.
    pub fn from_frames<T: Sample, const C: usize>(frames: Vec<[T; C]>) -> Result<Self> {
        let flat: Vec<T> = frames.iter().flat_map(|f| f.iter().copied()).collect();
        Self::new(T::wrap(flat), &[frames.len(), C])
    }

    pub fn shape(&self) -> DataShape {
        self.shape
    }

    pub fn dims(&self) -> Vec<usize> {
        self.shape.dims()
    }

    pub fn dtype(&self) -> SampleDtype {
        self.values.dtype()
    }

    pub fn values(&self) -> &SampleValues {
        &self.values
    }

    pub fn num_frames(&self) -> usize {
        self.shape.num_frames()
    }

    pub fn num_channels(&self) -> usize {
        self.shape.num_channels()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sample at `(frame, channel)`, widened to f64.
    pub fn value_f64(&self, frame: usize, channel: usize) -> Option<f64> {
        if frame >= self.num_frames() || channel >= self.num_channels() {
            return None;
        }
        self.values.get_f64(frame * self.num_channels() + channel)
    }

    /// All samples of one channel, widened to f64.
    pub fn channel(&self, channel: usize) -> Vec<f64> {
        let channels = self.num_channels();
        if channel >= channels {
            return Vec::new();
        }
        self.values
            .to_f64_vec()
            .into_iter()
            .skip(channel)
            .step_by(channels)
            .collect()
    }

    /// Per-frame mean across channels.
    pub fn mix_to_mono(&self) -> Vec<f64> {
        let channels = self.num_channels();
        self.values
            .to_f64_vec()
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f64>() / channels as f64)
            .collect()
    }

    /// Frames `[start, stop)` as a new array of the same dtype.
    pub fn frames(&self, start: usize, stop: usize) -> Result<Self> {
        if start > stop || stop > self.num_frames() {
            return Err(SoundError::InvalidData {
                reason: format!(
                    "frame range {}..{} outside of {} frames",
                    start,
                    stop,
                    self.num_frames()
                ),
            });
        }
        let c = self.num_channels();
        let values = map_values!(&self.values, v => v[start * c..stop * c].to_vec());
        Ok(Self {
            shape: self.shape.with_frames(stop - start),
            values,
        })
    }

    /// Convert to float32. Lossy for wide integers and float64.
    pub fn to_float32(&self) -> Self {
        let values: Vec<f32> =
            dispatch!(&self.values, v => v.iter().map(|x| x.to_f32().unwrap_or(f32::NAN)).collect());
        Self {
            shape: self.shape,
            values: SampleValues::Float32(values),
        }
    }

    /// Mutable float32 samples, when that is the dtype.
    pub fn as_float32_mut(&mut self) -> Option<&mut [f32]> {
        match &mut self.values {
            SampleValues::Float32(v) => Some(v),
            _ => None,
        }
    }

    /// Whether every sample is finite.
    pub fn is_finite(&self) -> bool {
        match &self.values {
            SampleValues::Float32(v) => v.iter().all(|x| x.is_finite()),
            SampleValues::Float64(v) => v.iter().all(|x| x.is_finite()),
            _ => true,
        }
    }

    /// Element-wise equality that treats NaN as equal to NaN.
    pub fn bitwise_eq(&self, other: &SampleArray) -> bool {
        if self.shape != other.shape {
            return false;
        }
        match (&self.values, &other.values) {
            (SampleValues::Float32(a), SampleValues::Float32(b)) => {
                a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (SampleValues::Float64(a), SampleValues::Float64(b)) => {
                a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (a, b) => a == b,
        }
    }
}

// ============================================================================
// Persisted form
// ============================================================================

/// Floats are stored as IEEE-754 bit patterns so NaN survives JSON.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PersistedValues {
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<u32>),
    Float64(Vec<u64>),
}

#[derive(Serialize, Deserialize)]
struct PersistedArray {
    shape: Vec<usize>,
    data: PersistedValues,
}

impl From<SampleArray> for PersistedArray {
    fn from(array: SampleArray) -> Self {
        let values = match array.values {
            SampleValues::Uint8(v) => PersistedValues::Uint8(v),
            SampleValues::Uint16(v) => PersistedValues::Uint16(v),
            SampleValues::Int16(v) => PersistedValues::Int16(v),
            SampleValues::Int32(v) => PersistedValues::Int32(v),
            SampleValues::Int64(v) => PersistedValues::Int64(v),
            SampleValues::Float32(v) => PersistedValues::Float32(v.iter().map(|x| x.to_bits()).collect()),
            SampleValues::Float64(v) => PersistedValues::Float64(v.iter().map(|x| x.to_bits()).collect()),
        };
        PersistedArray {
            shape: array.shape.dims(),
            data: values,
        }
    }
}

impl TryFrom<PersistedArray> for SampleArray {
    type Error = SoundError;

    fn try_from(persisted: PersistedArray) -> Result<Self> {
        let values = match persisted.data {
            PersistedValues::Uint8(v) => SampleValues::Uint8(v),
            PersistedValues::Uint16(v) => SampleValues::Uint16(v),
            PersistedValues::Int16(v) => SampleValues::Int16(v),
            PersistedValues::Int32(v) => SampleValues::Int32(v),
            PersistedValues::Int64(v) => SampleValues::Int64(v),
            PersistedValues::Float32(v) => SampleValues::Float32(v.into_iter().map(f32::from_bits).collect()),
            PersistedValues::Float64(v) => SampleValues::Float64(v.into_iter().map(f64::from_bits).collect()),
        };
        SampleArray::new(values, &persisted.shape)
    }
}
