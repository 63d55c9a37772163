//! Speaker, microphone and audio-interface descriptors

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SoundError};
use crate::model::series::validate_name;
use crate::spec::declarations::{AUDIO_INTERFACE, MICROPHONE, SPEAKER};

/// Kind of acoustic device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Speaker,
    Microphone,
    AudioInterface,
}

impl DeviceKind {
    /// Schema type name, e.g. `Speaker`.
    pub fn type_name(&self) -> &'static str {
        match self {
            DeviceKind::Speaker => SPEAKER,
            DeviceKind::Microphone => MICROPHONE,
            DeviceKind::AudioInterface => AUDIO_INTERFACE,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Usable frequency band in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct FrequencyRange {
    low: f64,
    high: f64,
}

impl FrequencyRange {
    /// # Errors
    /// * `InvalidFrequencyRange` - Unless `0 <= low <= high` and both are finite
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite()) || low < 0.0 || low > high {
            return Err(SoundError::InvalidFrequencyRange { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn contains(&self, frequency: f64) -> bool {
        frequency >= self.low && frequency <= self.high
    }
}

impl TryFrom<[f64; 2]> for FrequencyRange {
    type Error = SoundError;

    fn try_from(bounds: [f64; 2]) -> Result<Self> {
        FrequencyRange::new(bounds[0], bounds[1])
    }
}

impl From<FrequencyRange> for [f64; 2] {
    fn from(range: FrequencyRange) -> Self {
        [range.low, range.high]
    }
}

/// A speaker, microphone or audio interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticDevice {
    kind: DeviceKind,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frequency_range: Option<FrequencyRange>,
    /// Sensitivity in dB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sensitivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    object_id: Uuid,
}

impl AcousticDevice {
    /// # Errors
    /// * `InvalidName` - If the name is empty or contains `/`
    pub fn new(kind: DeviceKind, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            kind,
            name,
            description: None,
            manufacturer: None,
            frequency_range: None,
            sensitivity: None,
            location: None,
            object_id: Uuid::new_v4(),
        })
    }

    pub fn speaker(name: impl Into<String>) -> Result<Self> {
        Self::new(DeviceKind::Speaker, name)
    }

    pub fn microphone(name: impl Into<String>) -> Result<Self> {
        Self::new(DeviceKind::Microphone, name)
    }

    pub fn audio_interface(name: impl Into<String>) -> Result<Self> {
        Self::new(DeviceKind::AudioInterface, name)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_frequency_range(mut self, range: FrequencyRange) -> Self {
        self.frequency_range = Some(range);
        self
    }

    pub fn with_sensitivity(mut self, sensitivity_db: f64) -> Self {
        self.sensitivity = Some(sensitivity_db);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    pub fn frequency_range(&self) -> Option<FrequencyRange> {
        self.frequency_range
    }

    pub fn sensitivity(&self) -> Option<f64> {
        self.sensitivity
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn object_id(&self) -> Uuid {
        self.object_id
    }

    /// # Errors
    /// * `InvalidName` - If the name is empty or contains `/`
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)
    }

    /// Fail unless this device is of `expected` kind.
    pub(crate) fn expect_kind(&self, expected: DeviceKind) -> Result<()> {
        if self.kind != expected {
            return Err(SoundError::DeviceKindMismatch {
                device: self.name.clone(),
                expected: expected.type_name(),
                actual: self.kind.type_name(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_range_bounds() {
        let range = FrequencyRange::new(20.0, 20000.0).unwrap();
        assert!(range.contains(440.0));
        assert!(!range.contains(30000.0));
        assert!(FrequencyRange::new(100.0, 10.0).is_err());
        assert!(FrequencyRange::new(-1.0, 10.0).is_err());
        assert!(FrequencyRange::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_frequency_range_json() {
        let range = FrequencyRange::new(1.0, 2.0).unwrap();
        assert_eq!(serde_json::to_string(&range).unwrap(), "[1.0,2.0]");
        assert!(serde_json::from_str::<FrequencyRange>("[5.0,2.0]").is_err());
    }

    #[test]
    fn test_device_builder() {
        let mic = AcousticDevice::microphone("mic0")
            .unwrap()
            .with_manufacturer("Brüel & Kjær")
            .with_sensitivity(-38.0)
            .with_location("above cage");
        assert_eq!(mic.kind(), DeviceKind::Microphone);
        assert_eq!(mic.sensitivity(), Some(-38.0));
        assert_eq!(mic.location(), Some("above cage"));
        assert!(mic.expect_kind(DeviceKind::Speaker).is_err());
    }
}
