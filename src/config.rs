//! Extension configuration
//!
//! Namespace metadata written into the generated schema, and the directories
//! the generator writes to and the loader searches.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SoundError};

/// Name of the namespace declared by this crate.
pub const NAMESPACE_NAME: &str = "ndx-sound";

/// Version of the declared namespace.
pub const NAMESPACE_VERSION: &str = "0.2.0";

/// Environment variable overriding the installed spec directory.
pub const SPEC_DIR_ENV: &str = "NDX_SOUND_SPEC_DIR";

/// Directory name holding the schema files, both installed and in the repository.
pub const SPEC_DIR_NAME: &str = "spec";

/// Namespace metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub name: String,
    pub version: String,
    pub doc: String,
    pub authors: Vec<String>,
    pub contacts: Vec<String>,
}

impl Default for NamespaceInfo {
    fn default() -> Self {
        Self {
            name: NAMESPACE_NAME.to_string(),
            version: NAMESPACE_VERSION.to_string(),
            doc: "Represent acoustic stimuli and responses".to_string(),
            authors: vec!["Ben Dichter".to_string()],
            contacts: vec!["ben.dichter@catalystneuro.com".to_string()],
        }
    }
}

impl NamespaceInfo {
    /// File name of the namespace document, e.g. `ndx-sound.namespace.yaml`.
    pub fn namespace_file_name(&self) -> String {
        format!("{}.namespace.yaml", self.name)
    }

    /// File name of the type-definition document.
    pub fn extensions_file_name(&self) -> String {
        format!("{}.extensions.yaml", self.name)
    }
}

/// Configuration for schema generation and loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    #[serde(default)]
    pub namespace: NamespaceInfo,

    /// Where the generator writes and where an installed copy lives.
    #[serde(default = "default_installed_dir")]
    pub installed_spec_dir: PathBuf,

    /// Repository-relative fallback used before the extension is installed.
    #[serde(default = "default_repository_dir")]
    pub repository_spec_dir: PathBuf,
}

fn default_installed_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(SPEC_DIR_ENV) {
        return PathBuf::from(dir);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join(SPEC_DIR_NAME)))
        .unwrap_or_else(|| PathBuf::from(SPEC_DIR_NAME))
}

fn default_repository_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(SPEC_DIR_NAME)
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            namespace: NamespaceInfo::default(),
            installed_spec_dir: default_installed_dir(),
            repository_spec_dir: default_repository_dir(),
        }
    }
}

impl ExtensionConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SoundError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: ExtensionConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Directory the `generate` command writes into.
    pub fn output_dir(&self) -> &Path {
        &self.repository_spec_dir
    }
}
