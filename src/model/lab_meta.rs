//! Acoustic lab metadata

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::series::validate_name;
use crate::model::table::{DeviceTable, MicrophoneTable, SpeakerTable, TableRole};
use crate::spec::declarations::ACOUSTIC_LAB_META_DATA_NAME;

/// Holds at most one microphone table and one speaker table for a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticLabMetaData {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    microphone_table: Option<MicrophoneTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker_table: Option<SpeakerTable>,
}

impl Default for AcousticLabMetaData {
    fn default() -> Self {
        Self {
            name: ACOUSTIC_LAB_META_DATA_NAME.to_string(),
            microphone_table: None,
            speaker_table: None,
        }
    }
}

impl AcousticLabMetaData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        Ok(self)
    }

    pub fn with_microphone_table(mut self, table: MicrophoneTable) -> Self {
        self.microphone_table = Some(table);
        self
    }

    pub fn with_speaker_table(mut self, table: SpeakerTable) -> Self {
        self.speaker_table = Some(table);
        self
    }

    /// Validate the name and both tables.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if let Some(table) = &self.microphone_table {
            table.validate()?;
        }
        if let Some(table) = &self.speaker_table {
            table.validate()?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn microphone_table(&self) -> Option<&MicrophoneTable> {
        self.microphone_table.as_ref()
    }

    pub fn speaker_table(&self) -> Option<&SpeakerTable> {
        self.speaker_table.as_ref()
    }

    /// The table for a role, if present.
    pub fn table(&self, role: TableRole) -> Option<&DeviceTable> {
        match role {
            TableRole::Microphone => self.microphone_table.as_ref().map(|t| t.table()),
            TableRole::Speaker => self.speaker_table.as_ref().map(|t| t.table()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup_by_role() {
        let meta = AcousticLabMetaData::new().with_speaker_table(SpeakerTable::new("speakers"));
        assert_eq!(meta.name(), "acoustic_lab_meta_data");
        assert!(meta.table(TableRole::Speaker).is_some());
        assert!(meta.table(TableRole::Microphone).is_none());
    }
}
