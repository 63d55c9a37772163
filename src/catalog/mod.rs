//! Type loader
//!
//! Resolves the namespace file, loads it into a [`NamespaceCatalog`] and binds
//! each declared type to a [`TypeDescriptor`]. Callers own the catalog; there
//! is no process-wide registry.

pub mod locator;
pub mod registry;

use crate::config::{ExtensionConfig, NamespaceInfo};
use crate::error::Result;
use crate::spec::declarations as decl;
use crate::spec::{all_declarations, namespace_builder, GroupSpec};

pub use locator::SpecLocator;
pub use registry::{LoadOutcome, LoadedNamespace, NamespaceCatalog, RegisteredType, SourceDocuments};

/// A declared type bound from a loaded namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    pub namespace: String,
    /// Included (parent) type.
    pub parent: Option<String>,
    pub spec: GroupSpec,
}

impl TypeDescriptor {
    fn bind(catalog: &NamespaceCatalog, namespace: &str, type_name: &str) -> Result<Self> {
        let spec = catalog.get_spec(namespace, type_name)?;
        Ok(Self {
            name: type_name.to_string(),
            namespace: namespace.to_string(),
            parent: spec.type_inc().map(String::from),
            spec: spec.clone(),
        })
    }
}

/// Every ndx-sound type, bound from one namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundTypes {
    pub acoustic_waveform_series: TypeDescriptor,
    pub acoustic_stimulus_series: TypeDescriptor,
    pub acoustic_recording_series: TypeDescriptor,
    pub speaker: TypeDescriptor,
    pub microphone: TypeDescriptor,
    pub audio_interface: TypeDescriptor,
    pub microphone_table: TypeDescriptor,
    pub speaker_table: TypeDescriptor,
    pub acoustic_lab_meta_data: TypeDescriptor,
}

impl SoundTypes {
    /// Bind every declared type from `namespace` in `catalog`.
    pub fn bind(catalog: &NamespaceCatalog, namespace: &str) -> Result<Self> {
        let get = |name: &str| TypeDescriptor::bind(catalog, namespace, name);
        Ok(Self {
            acoustic_waveform_series: get(decl::ACOUSTIC_WAVEFORM_SERIES)?,
            acoustic_stimulus_series: get(decl::ACOUSTIC_STIMULUS_SERIES)?,
            acoustic_recording_series: get(decl::ACOUSTIC_RECORDING_SERIES)?,
            speaker: get(decl::SPEAKER)?,
            microphone: get(decl::MICROPHONE)?,
            audio_interface: get(decl::AUDIO_INTERFACE)?,
            microphone_table: get(decl::MICROPHONE_TABLE)?,
            speaker_table: get(decl::SPEAKER_TABLE)?,
            acoustic_lab_meta_data: get(decl::ACOUSTIC_LAB_META_DATA)?,
        })
    }

    /// Bind the in-crate declarations without reading any file.
    pub fn builtin() -> Result<Self> {
        let info = NamespaceInfo::default();
        let (namespace, extensions) = namespace_builder(info.clone()).build(&all_declarations())?;
        let mut catalog = NamespaceCatalog::new();
        let sources = SourceDocuments::from([(info.extensions_file_name(), extensions)]);
        catalog.load_documents(&namespace, &sources)?;
        Self::bind(&catalog, &info.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        [
            &self.acoustic_waveform_series,
            &self.speaker,
            &self.microphone,
            &self.audio_interface,
            &self.microphone_table,
            &self.speaker_table,
            &self.acoustic_stimulus_series,
            &self.acoustic_recording_series,
            &self.acoustic_lab_meta_data,
        ]
        .into_iter()
    }

    /// Default `unit` of the waveform series' data, as declared.
    pub fn default_unit(&self) -> Option<&str> {
        self.acoustic_waveform_series
            .spec
            .dataset("data")
            .and_then(|d| d.attribute("unit"))
            .and_then(|a| a.default_text())
    }
}

/// Locate, load and bind the ndx-sound namespace once.
///
/// Returns the catalog (so callers may load further namespaces into it) and
/// the bound types.
pub fn initialize(config: &ExtensionConfig) -> Result<(NamespaceCatalog, SoundTypes)> {
    let path = SpecLocator::from_config(config).resolve()?;
    let mut catalog = NamespaceCatalog::new();
    catalog.load_namespaces(&path)?;
    let types = SoundTypes::bind(&catalog, &config.namespace.name)?;
    Ok((catalog, types))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::generate;

    #[test]
    fn test_builtin_binds_every_type() {
        let types = SoundTypes::builtin().unwrap();
        assert_eq!(types.iter().count(), 9);
        assert_eq!(types.default_unit(), Some(decl::DEFAULT_UNIT));
        assert_eq!(
            types.acoustic_recording_series.parent.as_deref(),
            Some(decl::ACOUSTIC_WAVEFORM_SERIES)
        );
    }

    #[test]
    fn test_initialize_from_installed_dir() {
        let installed = tempfile::tempdir().unwrap();
        let config = ExtensionConfig {
            installed_spec_dir: installed.path().to_path_buf(),
            repository_spec_dir: installed.path().join("missing"),
            ..ExtensionConfig::default()
        };
        generate(config.namespace.clone(), installed.path()).unwrap();

        let (catalog, types) = initialize(&config).unwrap();
        assert_eq!(catalog.namespace_names(), vec!["ndx-sound"]);
        assert_eq!(types, SoundTypes::builtin().unwrap());
    }

    #[test]
    fn test_bind_unknown_namespace() {
        let catalog = NamespaceCatalog::new();
        let err = SoundTypes::bind(&catalog, "ndx-sound").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_TYPE");
    }
}
