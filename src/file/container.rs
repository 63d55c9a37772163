//! In-memory file container
//!
//! Owns every record by name inside its parent container: acquisition,
//! stimulus, processing modules, devices and lab metadata.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{Result, SoundError};
use crate::model::series::validate_name;
use crate::model::{
    AcousticDevice, AcousticLabMetaData, AcousticRecordingSeries, AcousticStimulusSeries,
    AcousticWaveformSeries, DeviceKind, TableRole, TransducerLink,
};
use crate::spec::declarations as decl;

// ============================================================================
// Series
// ============================================================================

/// Any acoustic series a container can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundSeries {
    Waveform(AcousticWaveformSeries),
    Stimulus(AcousticStimulusSeries),
    Recording(AcousticRecordingSeries),
}

impl SoundSeries {
    /// The underlying waveform series.
    pub fn waveform(&self) -> &AcousticWaveformSeries {
        match self {
            SoundSeries::Waveform(s) => s,
            SoundSeries::Stimulus(s) => s.series(),
            SoundSeries::Recording(s) => s.series(),
        }
    }

    pub fn name(&self) -> &str {
        self.waveform().name()
    }

    /// Schema type name of this series.
    pub fn neurodata_type(&self) -> &'static str {
        match self {
            SoundSeries::Waveform(_) => decl::ACOUSTIC_WAVEFORM_SERIES,
            SoundSeries::Stimulus(_) => decl::ACOUSTIC_STIMULUS_SERIES,
            SoundSeries::Recording(_) => decl::ACOUSTIC_RECORDING_SERIES,
        }
    }

    /// The transducer link and the table role it must point into.
    pub fn transducer(&self) -> Option<(&TransducerLink, TableRole)> {
        match self {
            SoundSeries::Waveform(_) => None,
            SoundSeries::Stimulus(s) => s.speaker().map(|l| (l, TableRole::Speaker)),
            SoundSeries::Recording(s) => s.microphone().map(|l| (l, TableRole::Microphone)),
        }
    }
}

impl From<AcousticWaveformSeries> for SoundSeries {
    fn from(series: AcousticWaveformSeries) -> Self {
        SoundSeries::Waveform(series)
    }
}

impl From<AcousticStimulusSeries> for SoundSeries {
    fn from(series: AcousticStimulusSeries) -> Self {
        SoundSeries::Stimulus(series)
    }
}

impl From<AcousticRecordingSeries> for SoundSeries {
    fn from(series: AcousticRecordingSeries) -> Self {
        SoundSeries::Recording(series)
    }
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    container: &str,
    name: &str,
    value: T,
) -> Result<()> {
    if map.contains_key(name) {
        return Err(SoundError::DuplicateName {
            container: container.to_string(),
            name: name.to_string(),
        });
    }
    map.insert(name.to_string(), value);
    Ok(())
}

// ============================================================================
// Processing module
// ============================================================================

/// A named group of processed series.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingModule {
    name: String,
    description: String,
    data_interfaces: BTreeMap<String, SoundSeries>,
}

impl ProcessingModule {
    pub(crate) fn new(name: &str, description: &str) -> Result<Self> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            data_interfaces: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// # Errors
    /// * `DuplicateName` - If the module already holds a series of that name
    pub fn add(&mut self, series: impl Into<SoundSeries>) -> Result<()> {
        let series = series.into();
        let name = series.name().to_string();
        let container = format!("processing/{}", self.name);
        insert_unique(&mut self.data_interfaces, &container, &name, series)
    }

    pub fn get(&self, name: &str) -> Option<&SoundSeries> {
        self.data_interfaces.get(name)
    }

    pub fn data_interfaces(&self) -> impl Iterator<Item = &SoundSeries> {
        self.data_interfaces.values()
    }
}

// ============================================================================
// File
// ============================================================================

/// A session file holding acoustic records.
#[derive(Debug, Clone, PartialEq)]
pub struct NwbFile {
    identifier: String,
    session_description: String,
    session_start_time: DateTime<Utc>,
    file_create_date: DateTime<Utc>,
    acquisition: BTreeMap<String, SoundSeries>,
    stimulus: BTreeMap<String, SoundSeries>,
    processing: BTreeMap<String, ProcessingModule>,
    devices: BTreeMap<String, AcousticDevice>,
    lab_meta_data: Option<AcousticLabMetaData>,
}

impl NwbFile {
    pub fn new(
        session_description: impl Into<String>,
        identifier: impl Into<String>,
        session_start_time: DateTime<Utc>,
    ) -> Self {
        Self::with_create_date(session_description, identifier, session_start_time, Utc::now())
    }

    pub(crate) fn with_create_date(
        session_description: impl Into<String>,
        identifier: impl Into<String>,
        session_start_time: DateTime<Utc>,
        file_create_date: DateTime<Utc>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            session_description: session_description.into(),
            session_start_time,
            file_create_date,
            acquisition: BTreeMap::new(),
            stimulus: BTreeMap::new(),
            processing: BTreeMap::new(),
            devices: BTreeMap::new(),
            lab_meta_data: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn session_description(&self) -> &str {
        &self.session_description
    }

    pub fn session_start_time(&self) -> DateTime<Utc> {
        self.session_start_time
    }

    pub fn file_create_date(&self) -> DateTime<Utc> {
        self.file_create_date
    }

    // ------------------------------------------------------------------
    // Acquisition / stimulus
    // ------------------------------------------------------------------

    /// # Errors
    /// * `DuplicateName` - If acquisition already holds that name
    pub fn add_acquisition(&mut self, series: impl Into<SoundSeries>) -> Result<()> {
        let series = series.into();
        let name = series.name().to_string();
        insert_unique(&mut self.acquisition, "acquisition", &name, series)
    }

    /// # Errors
    /// * `DuplicateName` - If stimulus already holds that name
    pub fn add_stimulus(&mut self, series: impl Into<SoundSeries>) -> Result<()> {
        let series = series.into();
        let name = series.name().to_string();
        insert_unique(&mut self.stimulus, "stimulus", &name, series)
    }

    pub fn acquisition(&self, name: &str) -> Option<&SoundSeries> {
        self.acquisition.get(name)
    }

    pub fn stimulus(&self, name: &str) -> Option<&SoundSeries> {
        self.stimulus.get(name)
    }

    pub fn acquisition_series(&self) -> impl Iterator<Item = &SoundSeries> {
        self.acquisition.values()
    }

    pub fn stimulus_series(&self) -> impl Iterator<Item = &SoundSeries> {
        self.stimulus.values()
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Create an empty processing module and return it for filling.
    ///
    /// # Errors
    /// * `DuplicateName` - If a module of that name exists
    pub fn create_processing_module(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<&mut ProcessingModule> {
        let module = ProcessingModule::new(name, description)?;
        match self.processing.entry(name.to_string()) {
            Entry::Occupied(_) => Err(SoundError::DuplicateName {
                container: "processing".to_string(),
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => Ok(slot.insert(module)),
        }
    }

    pub fn processing_module(&self, name: &str) -> Option<&ProcessingModule> {
        self.processing.get(name)
    }

    pub fn processing_module_mut(&mut self, name: &str) -> Option<&mut ProcessingModule> {
        self.processing.get_mut(name)
    }

    pub fn processing_modules(&self) -> impl Iterator<Item = &ProcessingModule> {
        self.processing.values()
    }

    pub(crate) fn insert_processing_module(&mut self, module: ProcessingModule) -> Result<()> {
        let name = module.name().to_string();
        insert_unique(&mut self.processing, "processing", &name, module)
    }

    // ------------------------------------------------------------------
    // Devices and lab metadata
    // ------------------------------------------------------------------

    /// # Errors
    /// * `DuplicateName` - If a device of that name exists
    pub fn add_device(&mut self, device: AcousticDevice) -> Result<()> {
        let name = device.name().to_string();
        insert_unique(&mut self.devices, "devices", &name, device)
    }

    pub fn device(&self, name: &str) -> Option<&AcousticDevice> {
        self.devices.get(name)
    }

    pub fn devices(&self) -> impl Iterator<Item = &AcousticDevice> {
        self.devices.values()
    }

    /// # Errors
    /// * `DuplicateName` - If lab metadata is already set
    pub fn add_lab_meta_data(&mut self, meta: AcousticLabMetaData) -> Result<()> {
        if let Some(existing) = &self.lab_meta_data {
            return Err(SoundError::DuplicateName {
                container: "general".to_string(),
                name: existing.name().to_string(),
            });
        }
        self.lab_meta_data = Some(meta);
        Ok(())
    }

    pub fn lab_meta_data(&self) -> Option<&AcousticLabMetaData> {
        self.lab_meta_data.as_ref()
    }

    /// Every series in the file, with its container path.
    pub fn all_series(&self) -> Vec<(String, &SoundSeries)> {
        let mut all: Vec<(String, &SoundSeries)> = Vec::new();
        all.extend(self.acquisition.values().map(|s| ("acquisition".to_string(), s)));
        all.extend(self.stimulus.values().map(|s| ("stimulus".to_string(), s)));
        for module in self.processing.values() {
            all.extend(
                module
                    .data_interfaces()
                    .map(|s| (format!("processing/{}", module.name()), s)),
            );
        }
        all
    }

    /// Check that every device link and table region resolves.
    ///
    /// # Errors
    /// * `UnknownDevice` - A link or table row names a missing device
    /// * `DeviceKindMismatch` - A linked device is of the wrong kind
    /// * `UnresolvedLink` - A region's table is absent or was replaced
    pub fn validate_links(&self) -> Result<()> {
        if let Some(meta) = &self.lab_meta_data {
            for role in [TableRole::Microphone, TableRole::Speaker] {
                let Some(table) = meta.table(role) else {
                    continue;
                };
                for row in table.rows() {
                    self.expect_device(&row.device, role.device_kind())?;
                    if let Some(interface) = &row.audio_interface {
                        self.expect_device(interface, DeviceKind::AudioInterface)?;
                    }
                }
            }
        }

        for (path, series) in self.all_series() {
            let Some((link, role)) = series.transducer() else {
                continue;
            };
            match link {
                TransducerLink::Device(name) => {
                    self.expect_device(name, role.device_kind())?;
                }
                TransducerLink::Region(region) => {
                    let from = format!("{}/{}", path, series.name());
                    let table = self
                        .lab_meta_data
                        .as_ref()
                        .and_then(|m| m.table(role))
                        .ok_or_else(|| SoundError::UnresolvedLink {
                            from: from.clone(),
                            reason: format!("no {} in lab metadata", role.type_name()),
                        })?;
                    region.resolve(table).map_err(|e| SoundError::UnresolvedLink {
                        from,
                        reason: e.to_string(),
                    })?;
                }
            }
        }
        Ok(())
    }

    fn expect_device(&self, name: &str, kind: DeviceKind) -> Result<()> {
        let device = self.device(name).ok_or_else(|| SoundError::UnknownDevice {
            name: name.to_string(),
        })?;
        device.expect_kind(kind)
    }
}
