//! Microphone and speaker tables
//!
//! One row per device-in-context. A [`TableRegion`] selects rows of a table
//! by index so a waveform series can reference the transducers involved.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SoundError};
use crate::model::device::{AcousticDevice, DeviceKind};
use crate::model::series::validate_name;
use crate::spec::declarations::{
    MICROPHONE_TABLE, MICROPHONE_TABLE_NAME, MICROPHONE_TABLE_REGION_NAME, SPEAKER_TABLE,
    SPEAKER_TABLE_NAME, SPEAKER_TABLE_REGION_NAME,
};

/// Which transducer a table lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableRole {
    Microphone,
    Speaker,
}

impl TableRole {
    pub fn type_name(&self) -> &'static str {
        match self {
            TableRole::Microphone => MICROPHONE_TABLE,
            TableRole::Speaker => SPEAKER_TABLE,
        }
    }

    pub fn default_table_name(&self) -> &'static str {
        match self {
            TableRole::Microphone => MICROPHONE_TABLE_NAME,
            TableRole::Speaker => SPEAKER_TABLE_NAME,
        }
    }

    pub fn region_name(&self) -> &'static str {
        match self {
            TableRole::Microphone => MICROPHONE_TABLE_REGION_NAME,
            TableRole::Speaker => SPEAKER_TABLE_REGION_NAME,
        }
    }

    /// Kind of device the table's device column links to.
    pub fn device_kind(&self) -> DeviceKind {
        match self {
            TableRole::Microphone => DeviceKind::Microphone,
            TableRole::Speaker => DeviceKind::Speaker,
        }
    }
}

/// One table row. Devices are linked by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTableRow {
    pub id: u64,
    pub location: String,
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_interface: Option<String>,
}

/// Columns shared by microphone and speaker tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTable {
    role: TableRole,
    name: String,
    description: String,
    rows: Vec<DeviceTableRow>,
    object_id: Uuid,
}

impl DeviceTable {
    fn new(role: TableRole, description: impl Into<String>) -> Self {
        Self {
            role,
            name: role.default_table_name().to_string(),
            description: description.into(),
            rows: Vec::new(),
            object_id: Uuid::new_v4(),
        }
    }

    pub fn role(&self) -> TableRole {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn object_id(&self) -> Uuid {
        self.object_id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check names and that every row links a named device.
    ///
    /// # Errors
    /// * `InvalidName` - If the table or a linked device name is invalid
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        for row in &self.rows {
            validate_name(&row.device)?;
            if let Some(interface) = &row.audio_interface {
                validate_name(interface)?;
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> &[DeviceTableRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DeviceTableRow> {
        self.rows.get(index)
    }

    /// Append a row and return its index.
    ///
    /// # Errors
    /// * `DeviceKindMismatch` - If `device` is not the table's transducer kind,
    ///   or `audio_interface` is not an audio interface
    pub fn add_row(
        &mut self,
        device: &AcousticDevice,
        location: impl Into<String>,
        audio_interface: Option<&AcousticDevice>,
    ) -> Result<usize> {
        device.expect_kind(self.role.device_kind())?;
        if let Some(interface) = audio_interface {
            interface.expect_kind(DeviceKind::AudioInterface)?;
        }

        let index = self.rows.len();
        self.rows.push(DeviceTableRow {
            id: index as u64,
            location: location.into(),
            device: device.name().to_string(),
            audio_interface: audio_interface.map(|i| i.name().to_string()),
        });
        Ok(index)
    }

    /// Select rows by index. Order is kept and duplicates are allowed.
    ///
    /// # Errors
    /// * `RegionOutOfBounds` - If any index is not a row of the table
    pub fn create_region(
        &self,
        name: &str,
        indices: Vec<usize>,
        description: impl Into<String>,
    ) -> Result<TableRegion> {
        validate_name(name)?;
        if let Some(&index) = indices.iter().find(|&&i| i >= self.rows.len()) {
            return Err(SoundError::RegionOutOfBounds {
                table: self.name.clone(),
                index,
                len: self.rows.len(),
            });
        }
        Ok(TableRegion {
            name: name.to_string(),
            description: description.into(),
            role: self.role,
            table_name: self.name.clone(),
            table_id: self.object_id,
            indices,
        })
    }
}

macro_rules! role_table {
    ($(#[$meta:meta])* $table:ident, $role:expr, $create_region:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $table(DeviceTable);

        impl TryFrom<DeviceTable> for $table {
            type Error = SoundError;

            fn try_from(table: DeviceTable) -> Result<Self> {
                let table = Self(table);
                table.validate()?;
                Ok(table)
            }
        }

        impl $table {
            pub fn new(description: impl Into<String>) -> Self {
                Self(DeviceTable::new($role, description))
            }

            /// Override the default table name.
            pub fn with_name(mut self, name: impl Into<String>) -> Result<Self> {
                let name = name.into();
                validate_name(&name)?;
                self.0.name = name;
                Ok(self)
            }

            /// Region over `region` rows, named after the table kind.
            pub fn $create_region(
                &self,
                region: Vec<usize>,
                description: impl Into<String>,
            ) -> Result<TableRegion> {
                self.0.create_region($role.region_name(), region, description)
            }

            pub fn table(&self) -> &DeviceTable {
                &self.0
            }

            /// Validate the table and check it holds the expected role.
            ///
            /// # Errors
            /// * `TableMismatch` - If the stored role is not this table's
            /// * `InvalidName` - If a name is invalid
            pub fn validate(&self) -> Result<()> {
                if self.0.role != $role {
                    return Err(SoundError::TableMismatch {
                        table: self.0.name.clone(),
                        expected: $role.type_name(),
                    });
                }
                self.0.validate()
            }
        }

        impl Deref for $table {
            type Target = DeviceTable;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl DerefMut for $table {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}

role_table!(
    /// Microphones used in a session.
    MicrophoneTable,
    TableRole::Microphone,
    create_microphone_table_region
);

role_table!(
    /// Speakers used in a session.
    SpeakerTable,
    TableRole::Speaker,
    create_speaker_table_region
);

/// A named selection of table rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRegion {
    name: String,
    description: String,
    role: TableRole,
    table_name: String,
    table_id: Uuid,
    indices: Vec<usize>,
}

impl TableRegion {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn role(&self) -> TableRole {
        self.role
    }

    /// # Errors
    /// * `InvalidName` - If the region or table name is invalid
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_name(&self.table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn table_id(&self) -> Uuid {
        self.table_id
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of selected rows, counting duplicates.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether this region points into `table`.
    pub fn refers_to(&self, table: &DeviceTable) -> bool {
        self.table_id == table.object_id() && self.role == table.role()
    }

    /// The selected rows of `table`, in region order.
    ///
    /// # Errors
    /// * `TableMismatch` - If the region was not created from `table`
    /// * `RegionOutOfBounds` - If an index no longer names a row
    pub fn resolve<'t>(&self, table: &'t DeviceTable) -> Result<Vec<&'t DeviceTableRow>> {
        if !self.refers_to(table) {
            return Err(SoundError::TableMismatch {
                table: table.name().to_string(),
                expected: self.role.type_name(),
            });
        }
        self.indices
            .iter()
            .map(|&i| {
                table.row(i).ok_or_else(|| SoundError::RegionOutOfBounds {
                    table: table.name().to_string(),
                    index: i,
                    len: table.len(),
                })
            })
            .collect()
    }
}
