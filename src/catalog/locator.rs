//! Locating the namespace file on disk

use std::path::{Path, PathBuf};

use log::debug;

use crate::config::ExtensionConfig;
use crate::error::{Result, SoundError};

/// Searches the installed spec directory, then the repository copy.
#[derive(Debug, Clone)]
pub struct SpecLocator {
    candidates: Vec<PathBuf>,
}

impl SpecLocator {
    pub fn new(installed_dir: &Path, repository_dir: &Path, file_name: &str) -> Self {
        Self {
            candidates: vec![installed_dir.join(file_name), repository_dir.join(file_name)],
        }
    }

    pub fn from_config(config: &ExtensionConfig) -> Self {
        Self::new(
            &config.installed_spec_dir,
            &config.repository_spec_dir,
            &config.namespace.namespace_file_name(),
        )
    }

    /// Paths searched, in order.
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists.
    pub fn resolve(&self) -> Result<PathBuf> {
        for candidate in &self.candidates {
            if candidate.is_file() {
                debug!("Resolved namespace file {}", candidate.display());
                return Ok(candidate.clone());
            }
            debug!("No namespace file at {}", candidate.display());
        }
        Err(SoundError::NamespaceNotFound {
            searched: self.candidates.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_prefers_installed() {
        let installed = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        fs::write(installed.path().join("ns.yaml"), "x").unwrap();
        fs::write(repo.path().join("ns.yaml"), "x").unwrap();

        let locator = SpecLocator::new(installed.path(), repo.path(), "ns.yaml");
        assert_eq!(locator.resolve().unwrap(), installed.path().join("ns.yaml"));
    }

    #[test]
    fn test_falls_back_to_repository() {
        let installed = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("ns.yaml"), "x").unwrap();

        let locator = SpecLocator::new(installed.path(), repo.path(), "ns.yaml");
        assert_eq!(locator.resolve().unwrap(), repo.path().join("ns.yaml"));
    }

    #[test]
    fn test_not_found_lists_candidates() {
        let locator = SpecLocator::new(Path::new("/nope/a"), Path::new("/nope/b"), "ns.yaml");
        match locator.resolve().unwrap_err() {
            SoundError::NamespaceNotFound { searched } => assert_eq!(searched.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
