//! File persistence
//!
//! Writes an [`NwbFile`] as one JSON document. Each record is stored as a
//! schema-tagged group (`neurodata_type` + `namespace`), and the namespace
//! specs are cached in the document so a reader can load them back. The
//! `file` member is covered by a SHA-256 checksum verified on read.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::catalog::{NamespaceCatalog, SourceDocuments};
use crate::config::NamespaceInfo;
use crate::error::{Result, SoundError};
use crate::file::container::{NwbFile, ProcessingModule, SoundSeries};
use crate::model::{
    AcousticDevice, AcousticLabMetaData, AcousticRecordingSeries, AcousticStimulusSeries,
    AcousticWaveformSeries, DeviceKind,
};
use crate::spec::declarations as decl;
use crate::spec::{all_declarations, namespace_builder, NamespaceDocument};

/// Format marker written at the top of every document.
pub const FORMAT_NAME: &str = "ndx-sound-json";
pub const FORMAT_VERSION: u32 = 1;

// ============================================================================
// Persisted layout
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NamespaceRef {
    name: String,
    version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedSpecs {
    namespace: NamespaceDocument,
    /// Keyed by the source file name the namespace lists.
    extensions: SourceDocuments,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedDocument {
    format: String,
    format_version: u32,
    namespaces: Vec<NamespaceRef>,
    specifications: CachedSpecs,
    checksum: String,
    file: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaggedGroup {
    neurodata_type: String,
    namespace: String,
    body: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedModule {
    name: String,
    description: String,
    data_interfaces: Vec<TaggedGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedFile {
    identifier: String,
    session_description: String,
    session_start_time: DateTime<Utc>,
    file_create_date: DateTime<Utc>,
    acquisition: Vec<TaggedGroup>,
    stimulus: Vec<TaggedGroup>,
    processing: Vec<PersistedModule>,
    devices: Vec<TaggedGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lab_meta_data: Option<TaggedGroup>,
}

fn checksum(file: &Value) -> Result<String> {
    let bytes = serde_json::to_vec(file)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Tagging
// ============================================================================

fn tag<T: Serialize>(neurodata_type: &str, namespace: &str, body: &T) -> Result<TaggedGroup> {
    Ok(TaggedGroup {
        neurodata_type: neurodata_type.to_string(),
        namespace: namespace.to_string(),
        body: serde_json::to_value(body)?,
    })
}

fn tag_series(series: &SoundSeries, namespace: &str) -> Result<TaggedGroup> {
    match series {
        SoundSeries::Waveform(s) => tag(series.neurodata_type(), namespace, s),
        SoundSeries::Stimulus(s) => tag(series.neurodata_type(), namespace, s),
        SoundSeries::Recording(s) => tag(series.neurodata_type(), namespace, s),
    }
}

/// Reads tagged groups back, checking each tag against loaded namespaces.
struct Untagger<'a> {
    catalog: &'a NamespaceCatalog,
}

impl<'a> Untagger<'a> {
    fn check(&self, group: &TaggedGroup) -> Result<()> {
        self.catalog
            .get_spec(&group.namespace, &group.neurodata_type)
            .map(|_| ())
    }

    fn body<T: DeserializeOwned>(&self, group: TaggedGroup) -> Result<T> {
        self.check(&group)?;
        Ok(serde_json::from_value(group.body)?)
    }

    /// Deserialized series pass the same checks as freshly built ones.
    fn series(&self, group: TaggedGroup) -> Result<SoundSeries> {
        let series = match group.neurodata_type.as_str() {
            decl::ACOUSTIC_WAVEFORM_SERIES => {
                let series: AcousticWaveformSeries = self.body(group)?;
                series.validate()?;
                SoundSeries::Waveform(series)
            }
            decl::ACOUSTIC_STIMULUS_SERIES => {
                let series: AcousticStimulusSeries = self.body(group)?;
                series.validate()?;
                SoundSeries::Stimulus(series)
            }
            decl::ACOUSTIC_RECORDING_SERIES => {
                let series: AcousticRecordingSeries = self.body(group)?;
                series.validate()?;
                SoundSeries::Recording(series)
            }
            _ => {
                return Err(SoundError::UnknownType {
                    type_name: group.neurodata_type,
                    namespace: group.namespace,
                })
            }
        };
        Ok(series)
    }

    fn device(&self, group: TaggedGroup) -> Result<AcousticDevice> {
        let expected = match group.neurodata_type.as_str() {
            decl::SPEAKER => DeviceKind::Speaker,
            decl::MICROPHONE => DeviceKind::Microphone,
            decl::AUDIO_INTERFACE => DeviceKind::AudioInterface,
            _ => {
                return Err(SoundError::UnknownType {
                    type_name: group.neurodata_type,
                    namespace: group.namespace,
                })
            }
        };
        let device: AcousticDevice = self.body(group)?;
        device.validate()?;
        device.expect_kind(expected)?;
        Ok(device)
    }

    fn lab_meta_data(&self, group: TaggedGroup) -> Result<AcousticLabMetaData> {
        if group.neurodata_type != decl::ACOUSTIC_LAB_META_DATA {
            return Err(SoundError::UnknownType {
                type_name: group.neurodata_type,
                namespace: group.namespace,
            });
        }
        let meta: AcousticLabMetaData = self.body(group)?;
        meta.validate()?;
        Ok(meta)
    }
}

// ============================================================================
// NwbIo
// ============================================================================

/// Reads and writes [`NwbFile`]s.
#[derive(Debug, Clone)]
pub struct NwbIo {
    info: NamespaceInfo,
}

impl Default for NwbIo {
    fn default() -> Self {
        Self::new(NamespaceInfo::default())
    }
}

impl NwbIo {
    pub fn new(info: NamespaceInfo) -> Self {
        Self { info }
    }

    /// Serialize a file to a JSON string.
    ///
    /// # Errors
    /// * Any link error from [`NwbFile::validate_links`]
    /// * `Json` - If serialization fails
    pub fn to_json(&self, file: &NwbFile) -> Result<String> {
        file.validate_links()?;

        let ns = &self.info.name;
        let mut processing = Vec::new();
        for module in file.processing_modules() {
            processing.push(PersistedModule {
                name: module.name().to_string(),
                description: module.description().to_string(),
                data_interfaces: module
                    .data_interfaces()
                    .map(|s| tag_series(s, ns))
                    .collect::<Result<_>>()?,
            });
        }

        let persisted = PersistedFile {
            identifier: file.identifier().to_string(),
            session_description: file.session_description().to_string(),
            session_start_time: file.session_start_time(),
            file_create_date: file.file_create_date(),
            acquisition: file
                .acquisition_series()
                .map(|s| tag_series(s, ns))
                .collect::<Result<_>>()?,
            stimulus: file
                .stimulus_series()
                .map(|s| tag_series(s, ns))
                .collect::<Result<_>>()?,
            processing,
            devices: file
                .devices()
                .map(|d| tag(d.kind().type_name(), ns, d))
                .collect::<Result<_>>()?,
            lab_meta_data: file
                .lab_meta_data()
                .map(|m| tag(decl::ACOUSTIC_LAB_META_DATA, ns, m))
                .transpose()?,
        };

        let (namespace, extensions) =
            namespace_builder(self.info.clone()).build(&all_declarations())?;
        let body = serde_json::to_value(&persisted)?;
        let document = PersistedDocument {
            format: FORMAT_NAME.to_string(),
            format_version: FORMAT_VERSION,
            namespaces: vec![NamespaceRef {
                name: self.info.name.clone(),
                version: self.info.version.clone(),
            }],
            specifications: CachedSpecs {
                namespace,
                extensions: SourceDocuments::from([(self.info.extensions_file_name(), extensions)]),
            },
            checksum: checksum(&body)?,
            file: body,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Parse a JSON string, returning the file and the namespaces cached in it.
    ///
    /// # Errors
    /// * `UnsupportedFormat` - If the document is not an ndx-sound file
    /// * `ChecksumMismatch` - If the `file` member was altered
    /// * `UnknownType` - If a group's tag is not in the cached namespaces
    /// * Any validation error a constructor would raise for the stored values
    /// * Any link error from [`NwbFile::validate_links`]
    pub fn from_json_with_namespaces(
        &self,
        content: &str,
        origin: &Path,
    ) -> Result<(NwbFile, NamespaceCatalog)> {
        let document: PersistedDocument = serde_json::from_str(content)?;
        if document.format != FORMAT_NAME || document.format_version > FORMAT_VERSION {
            return Err(SoundError::UnsupportedFormat {
                format: format!("{} v{}", document.format, document.format_version),
            });
        }
        if checksum(&document.file)? != document.checksum {
            return Err(SoundError::ChecksumMismatch {
                path: origin.to_path_buf(),
            });
        }

        let mut catalog = NamespaceCatalog::new();
        catalog.load_documents(
            &document.specifications.namespace,
            &document.specifications.extensions,
        )?;
        for ns in &document.namespaces {
            debug!("File declares namespace {} {}", ns.name, ns.version);
        }

        let persisted: PersistedFile = serde_json::from_value(document.file)?;
        let untagger = Untagger { catalog: &catalog };

        let mut file = NwbFile::with_create_date(
            persisted.session_description,
            persisted.identifier,
            persisted.session_start_time,
            persisted.file_create_date,
        );
        for group in persisted.devices {
            file.add_device(untagger.device(group)?)?;
        }
        if let Some(group) = persisted.lab_meta_data {
            file.add_lab_meta_data(untagger.lab_meta_data(group)?)?;
        }
        for group in persisted.acquisition {
            file.add_acquisition(untagger.series(group)?)?;
        }
        for group in persisted.stimulus {
            file.add_stimulus(untagger.series(group)?)?;
        }
        for persisted_module in persisted.processing {
            let mut module =
                ProcessingModule::new(&persisted_module.name, &persisted_module.description)?;
            for group in persisted_module.data_interfaces {
                module.add(untagger.series(group)?)?;
            }
            file.insert_processing_module(module)?;
        }
        file.validate_links()?;

        Ok((file, catalog))
    }

    /// Write `file` to `path`.
    pub fn write(&self, path: &Path, file: &NwbFile) -> Result<()> {
        let content = self.to_json(file)?;
        fs::write(path, &content).map_err(|e| SoundError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    /// Read a file and the namespaces cached in it.
    pub fn read_with_namespaces(&self, path: &Path) -> Result<(NwbFile, NamespaceCatalog)> {
        let content = fs::read_to_string(path).map_err(|e| SoundError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.from_json_with_namespaces(&content, path)
    }

    /// Read a file.
    pub fn read(&self, path: &Path) -> Result<NwbFile> {
        self.read_with_namespaces(path).map(|(file, _)| file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SampleArray;

    fn sample_file() -> NwbFile {
        let mut file = NwbFile::new("session", "id", Utc::now());
        let series = AcousticWaveformSeries::builder(
            "sound",
            SampleArray::from_vec(vec![1i16, 2, 3]),
            8000.0,
            "d",
        )
        .build()
        .unwrap();
        file.add_acquisition(series).unwrap();
        file
    }

    #[test]
    fn test_round_trip_in_memory() {
        let io = NwbIo::default();
        let file = sample_file();
        let text = io.to_json(&file).unwrap();
        let (back, catalog) = io.from_json_with_namespaces(&text, Path::new("mem")).unwrap();
        assert_eq!(back, file);
        assert_eq!(catalog.namespace_names(), vec!["ndx-sound"]);
    }

    #[test]
    fn test_tampered_file_rejected() {
        let io = NwbIo::default();
        let text = io.to_json(&sample_file()).unwrap();
        let tampered = text.replace("\"sound\"", "\"noise\"");
        let err = io
            .from_json_with_namespaces(&tampered, Path::new("mem"))
            .unwrap_err();
        assert_eq!(err.error_code(), "CHECKSUM_MISMATCH");
    }

    #[test]
    fn test_foreign_format_rejected() {
        let io = NwbIo::default();
        let text = io
            .to_json(&sample_file())
            .unwrap()
            .replace(FORMAT_NAME, "something-else");
        let err = io.from_json_with_namespaces(&text, Path::new("mem")).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    }

    /// Edit the stored `file` member and recompute its checksum.
    fn reseal(text: &str, edit: impl FnOnce(&mut Value)) -> String {
        let mut document: Value = serde_json::from_str(text).unwrap();
        edit(&mut document["file"]);
        document["checksum"] = Value::String(checksum(&document["file"]).unwrap());
        serde_json::to_string(&document).unwrap()
    }

    #[test]
    fn test_resealed_negative_rate_rejected() {
        let io = NwbIo::default();
        let text = io.to_json(&sample_file()).unwrap();
        let edited = reseal(&text, |file| {
            file["acquisition"][0]["body"]["rate"] = serde_json::json!(-5.0);
        });
        let err = io.from_json_with_namespaces(&edited, Path::new("mem")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RATE");
    }

    #[test]
    fn test_resealed_bad_name_rejected() {
        let io = NwbIo::default();
        let text = io.to_json(&sample_file()).unwrap();
        let edited = reseal(&text, |file| {
            file["acquisition"][0]["body"]["name"] = serde_json::json!("a/b");
        });
        let err = io.from_json_with_namespaces(&edited, Path::new("mem")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NAME");
    }

    #[test]
    fn test_resealed_table_role_rejected() {
        let io = NwbIo::default();
        let text = io.to_json(&crate::mock::mock_nwb_file().unwrap()).unwrap();
        let edited = reseal(&text, |file| {
            file["lab_meta_data"]["body"]["microphone_table"]["role"] =
                serde_json::json!("Speaker");
        });
        let err = io.from_json_with_namespaces(&edited, Path::new("mem")).unwrap_err();
        assert_eq!(err.error_code(), "TABLE_MISMATCH");
    }

    #[test]
    fn test_resealed_dangling_device_link_rejected() {
        let io = NwbIo::default();
        let text = io.to_json(&crate::mock::mock_nwb_file().unwrap()).unwrap();
        let edited = reseal(&text, |file| {
            let devices = file["devices"].as_array_mut().unwrap();
            devices.retain(|d| d["neurodata_type"] != "Microphone");
        });
        assert!(io.from_json_with_namespaces(&edited, Path::new("mem")).is_err());
    }
}
