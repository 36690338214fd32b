//! Expanding command-line inputs into a batch file list.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::types::InputFile;

/// Turns user-given paths into [`InputFile`]s.
///
/// Explicit file paths are kept as given, whatever their extension, so the
/// pipeline can report them as skipped. Directories are walked recursively and
/// only contribute files the pipeline would route: convertible inputs and
/// files already in the target format.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Expand a single path.
    pub fn discover(&self, path: &Path) -> Vec<InputFile> {
        if !path.is_dir() {
            return vec![InputFile::new(path)];
        }

        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry under {:?}: {}", path, err);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.is_routable(entry.path()))
            .map(|entry| entry.into_path())
            .collect();

        // Deterministic batch order
        files.sort();
        tracing::debug!("Found {} file(s) under {:?}", files.len(), path);
        files.into_iter().map(InputFile::new).collect()
    }

    /// Expand every path, preserving argument order.
    pub fn discover_all<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<InputFile> {
        paths
            .iter()
            .flat_map(|p| self.discover(p.as_ref()))
            .collect()
    }

    fn is_routable(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.config.is_supported(ext) || self.config.is_target(ext))
            .unwrap_or(false)
    }
}
