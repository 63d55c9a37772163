//! Namespace registry
//!
//! Holds every loaded namespace and the types it registered. Loading is
//! idempotent: a namespace already present under the same version is skipped.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SoundError};
use crate::spec::namespace::read_yaml;
use crate::spec::{ExtensionsDocument, GroupSpec, NamespaceDocument, NamespaceEntry};

/// Type-definition documents keyed by the source file name a namespace
/// entry lists in its `schema`.
pub type SourceDocuments = BTreeMap<String, ExtensionsDocument>;

/// A namespace as it was loaded.
#[derive(Debug, Clone)]
pub struct LoadedNamespace {
    pub entry: NamespaceEntry,
    /// Namespace file, when loaded from disk.
    pub path: Option<PathBuf>,
    /// Types this namespace registered, in declaration order.
    pub types: Vec<String>,
}

/// A type registered in the catalog.
#[derive(Debug, Clone)]
pub struct RegisteredType {
    pub namespace: String,
    pub spec: GroupSpec,
}

/// Result of loading one namespace entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { namespace: String, types: usize },
    AlreadyLoaded { namespace: String },
    /// Another version was loaded first and is kept.
    VersionIgnored {
        namespace: String,
        loaded: String,
        requested: String,
    },
}

/// Registry of loaded namespaces and their types.
#[derive(Debug, Clone, Default)]
pub struct NamespaceCatalog {
    namespaces: HashMap<String, LoadedNamespace>,
    types: HashMap<String, RegisteredType>,
}

impl NamespaceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `*.namespace.yaml` file and the type files it names.
    pub fn load_namespaces(&mut self, path: &Path) -> Result<Vec<LoadOutcome>> {
        let document: NamespaceDocument = read_yaml(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut outcomes = Vec::with_capacity(document.namespaces.len());
        for entry in &document.namespaces {
            if let Some(outcome) = self.check_loaded(entry) {
                outcomes.push(outcome);
                continue;
            }
            let mut sources = Vec::new();
            for source in entry.sources() {
                let extensions: ExtensionsDocument = read_yaml(&base.join(source))?;
                sources.push(extensions);
            }
            outcomes.push(self.register(entry, &sources, Some(path.to_path_buf()))?);
        }
        Ok(outcomes)
    }

    /// Load every namespace file found under `dir`.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<LoadOutcome>> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.ends_with(".namespace.yaml"))
            })
            .collect();
        files.sort();

        let mut outcomes = Vec::new();
        for file in files {
            outcomes.extend(self.load_namespaces(&file)?);
        }
        Ok(outcomes)
    }

    /// Register in-memory documents, e.g. specs cached inside a file. Each
    /// entry registers only the documents its own `schema` names.
    ///
    /// # Errors
    /// * `MissingSchemaSource` - If an entry names a source not in `sources`
    /// * `NamespaceConflict` - If a type is already registered or defined twice
    pub fn load_documents(
        &mut self,
        namespace: &NamespaceDocument,
        sources: &SourceDocuments,
    ) -> Result<Vec<LoadOutcome>> {
        let mut outcomes = Vec::with_capacity(namespace.namespaces.len());
        for entry in &namespace.namespaces {
            if let Some(outcome) = self.check_loaded(entry) {
                outcomes.push(outcome);
                continue;
            }
            let documents = entry
                .sources()
                .map(|source| {
                    sources
                        .get(source)
                        .cloned()
                        .ok_or_else(|| SoundError::MissingSchemaSource {
                            namespace: entry.name.clone(),
                            file: source.to_string(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            outcomes.push(self.register(entry, &documents, None)?);
        }
        Ok(outcomes)
    }

    fn check_loaded(&self, entry: &NamespaceEntry) -> Option<LoadOutcome> {
        let loaded = self.namespaces.get(&entry.name)?;
        if loaded.entry.version == entry.version {
            debug!("Namespace {} already loaded", entry.name);
            Some(LoadOutcome::AlreadyLoaded {
                namespace: entry.name.clone(),
            })
        } else {
            warn!(
                "Ignoring namespace {} version {}; version {} is already loaded",
                entry.name, entry.version, loaded.entry.version
            );
            Some(LoadOutcome::VersionIgnored {
                namespace: entry.name.clone(),
                loaded: loaded.entry.version.clone(),
                requested: entry.version.clone(),
            })
        }
    }

    fn register(
        &mut self,
        entry: &NamespaceEntry,
        sources: &[ExtensionsDocument],
        path: Option<PathBuf>,
    ) -> Result<LoadOutcome> {
        let specs: Vec<&GroupSpec> = sources.iter().flat_map(|s| s.groups.iter()).collect();

        // Check every type before touching the registry.
        let mut seen = HashSet::new();
        for spec in &specs {
            let Some(type_name) = spec.type_def() else {
                continue;
            };
            if let Some(existing) = self.types.get(type_name) {
                return Err(SoundError::NamespaceConflict {
                    type_name: type_name.to_string(),
                    namespace: existing.namespace.clone(),
                });
            }
            if !seen.insert(type_name) {
                return Err(SoundError::NamespaceConflict {
                    type_name: type_name.to_string(),
                    namespace: entry.name.clone(),
                });
            }
        }

        let mut type_names = Vec::with_capacity(specs.len());
        for spec in specs {
            let Some(type_name) = spec.type_def() else {
                continue;
            };
            type_names.push(type_name.to_string());
            self.types.insert(
                type_name.to_string(),
                RegisteredType {
                    namespace: entry.name.clone(),
                    spec: spec.clone(),
                },
            );
        }

        debug!(
            "Registered {} types from namespace {} {}",
            type_names.len(),
            entry.name,
            entry.version
        );
        let count = type_names.len();
        self.namespaces.insert(
            entry.name.clone(),
            LoadedNamespace {
                entry: entry.clone(),
                path,
                types: type_names,
            },
        );
        Ok(LoadOutcome::Loaded {
            namespace: entry.name.clone(),
            types: count,
        })
    }

    pub fn namespace(&self, name: &str) -> Option<&LoadedNamespace> {
        self.namespaces.get(name)
    }

    pub fn namespace_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.namespaces.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Look up a type's spec within a namespace.
    pub fn get_spec(&self, namespace: &str, type_name: &str) -> Result<&GroupSpec> {
        self.types
            .get(type_name)
            .filter(|t| t.namespace == namespace)
            .map(|t| &t.spec)
            .ok_or_else(|| SoundError::UnknownType {
                type_name: type_name.to_string(),
                namespace: namespace.to_string(),
            })
    }

    /// The type followed by its registered ancestors, then the first
    /// unregistered (external) base type.
    pub fn ancestry(&self, type_name: &str) -> Vec<String> {
        let mut chain = vec![type_name.to_string()];
        let mut current = type_name;
        while let Some(registered) = self.types.get(current) {
            match registered.spec.type_inc() {
                Some(parent) if !chain.iter().any(|c| c == parent) => {
                    chain.push(parent.to_string());
                    current = parent;
                }
                _ => break,
            }
        }
        chain
    }
}
