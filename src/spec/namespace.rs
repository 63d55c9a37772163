//! Namespace documents and schema export
//!
//! A namespace is written as two YAML files: `<name>.namespace.yaml`, listing
//! the included core types and the source file, and `<name>.extensions.yaml`,
//! holding the group specs.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::NamespaceInfo;
use crate::error::{Result, SoundError};

use super::types::GroupSpec;

/// One entry of a namespace's `schema` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSource {
    /// Types pulled in from another namespace.
    Namespace {
        namespace: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        neurodata_types: Option<Vec<String>>,
    },
    /// A type-definition file relative to the namespace file.
    Source { source: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceEntry {
    pub author: Vec<String>,
    pub contact: Vec<String>,
    pub doc: String,
    pub name: String,
    pub schema: Vec<SchemaSource>,
    pub version: String,
}

impl NamespaceEntry {
    /// Source files this namespace reads its types from.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.schema.iter().filter_map(|s| match s {
            SchemaSource::Source { source } => Some(source.as_str()),
            SchemaSource::Namespace { .. } => None,
        })
    }
}

/// Contents of a `*.namespace.yaml` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDocument {
    pub namespaces: Vec<NamespaceEntry>,
}

/// Contents of a type-definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionsDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupSpec>,
}

/// Paths written by [`NamespaceBuilder::export`].
#[derive(Debug, Clone)]
pub struct ExportedSpec {
    pub namespace_path: PathBuf,
    pub extensions_path: PathBuf,
}

/// Collects namespace metadata and included types, then exports specs.
#[derive(Debug, Clone)]
pub struct NamespaceBuilder {
    info: NamespaceInfo,
    includes: Vec<(String, Vec<String>)>,
}

impl NamespaceBuilder {
    pub fn new(info: NamespaceInfo) -> Self {
        Self {
            info,
            includes: Vec::new(),
        }
    }

    pub fn info(&self) -> &NamespaceInfo {
        &self.info
    }

    /// Include a type from another namespace. Types from the same namespace
    /// are grouped into one schema entry, in first-seen order.
    pub fn include_type(&mut self, type_name: &str, namespace: &str) -> &mut Self {
        match self.includes.iter_mut().find(|(ns, _)| ns == namespace) {
            Some((_, types)) => {
                if !types.iter().any(|t| t == type_name) {
                    types.push(type_name.to_string());
                }
            }
            None => self
                .includes
                .push((namespace.to_string(), vec![type_name.to_string()])),
        }
        self
    }

    /// Build both documents in memory after validating every spec.
    pub fn build(&self, groups: &[GroupSpec]) -> Result<(NamespaceDocument, ExtensionsDocument)> {
        for group in groups {
            if group.type_def().is_none() {
                return Err(SoundError::InvalidSpec {
                    type_name: group.name.clone().unwrap_or_default(),
                    reason: "top-level specs must define a type".to_string(),
                });
            }
            group.validate()?;
        }

        let mut schema: Vec<SchemaSource> = self
            .includes
            .iter()
            .map(|(namespace, types)| SchemaSource::Namespace {
                namespace: namespace.clone(),
                neurodata_types: Some(types.clone()),
            })
            .collect();
        schema.push(SchemaSource::Source {
            source: self.info.extensions_file_name(),
        });

        let namespace = NamespaceDocument {
            namespaces: vec![NamespaceEntry {
                author: self.info.authors.clone(),
                contact: self.info.contacts.clone(),
                doc: self.info.doc.clone(),
                name: self.info.name.clone(),
                schema,
                version: self.info.version.clone(),
            }],
        };
        let extensions = ExtensionsDocument {
            groups: groups.to_vec(),
        };
        Ok((namespace, extensions))
    }

    /// Write the namespace and extensions files into `output_dir`.
    ///
    /// # Errors
    /// * `InvalidSpec` - If any spec is internally inconsistent
    /// * `FileWriteError` - If the directory or files cannot be written
    pub fn export(&self, output_dir: &Path, groups: &[GroupSpec]) -> Result<ExportedSpec> {
        let (namespace, extensions) = self.build(groups)?;

        fs::create_dir_all(output_dir).map_err(|e| SoundError::FileWriteError {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

        let namespace_path = output_dir.join(self.info.namespace_file_name());
        let extensions_path = output_dir.join(self.info.extensions_file_name());

        write_yaml(&namespace_path, &namespace)?;
        write_yaml(&extensions_path, &extensions)?;

        info!(
            "Exported namespace {} {} ({} types) to {}",
            self.info.name,
            self.info.version,
            groups.len(),
            output_dir.display()
        );

        Ok(ExportedSpec {
            namespace_path,
            extensions_path,
        })
    }
}

fn write_yaml<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let content = serde_yaml::to_string(document)?;
    debug!("Writing {} ({} bytes)", path.display(), content.len());
    fs::write(path, content).map_err(|e| SoundError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read and parse a YAML document.
pub(crate) fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| SoundError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_yaml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::declarations::all_declarations;
    use crate::spec::types::GroupSpec;

    fn builder() -> NamespaceBuilder {
        let mut builder = NamespaceBuilder::new(NamespaceInfo::default());
        builder.include_type("TimeSeries", "core");
        builder.include_type("Device", "core");
        builder.include_type("TimeSeries", "core");
        builder
    }

    #[test]
    fn test_includes_grouped_per_namespace() {
        let (namespace, _) = builder().build(&all_declarations()).unwrap();
        let entry = &namespace.namespaces[0];
        assert_eq!(entry.schema.len(), 2);
        assert_eq!(
            entry.schema[0],
            SchemaSource::Namespace {
                namespace: "core".to_string(),
                neurodata_types: Some(vec!["TimeSeries".to_string(), "Device".to_string()]),
            }
        );
        assert_eq!(entry.sources().collect::<Vec<_>>(), vec!["ndx-sound.extensions.yaml"]);
    }

    #[test]
    fn test_export_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let first = builder().export(dir.path(), &all_declarations()).unwrap();
        let a = fs::read_to_string(&first.extensions_path).unwrap();
        let second = builder().export(dir.path(), &all_declarations()).unwrap();
        let b = fs::read_to_string(&second.extensions_path).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_export_rejects_inconsistent_spec() {
        let dir = tempfile::tempdir().unwrap();
        let bad = GroupSpec::define("Broken", "TimeSeries", "");
        let err = builder().export(dir.path(), &[bad]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SPEC");
        assert!(!dir.path().join("ndx-sound.namespace.yaml").exists());
    }

    #[test]
    fn test_untyped_top_level_rejected() {
        let untyped = GroupSpec::include("TimeSeries", "no def");
        assert!(builder().build(&[untyped]).is_err());
    }
}
