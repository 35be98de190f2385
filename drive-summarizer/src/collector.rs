use crate::processors::ProcessorRegistry;
use crate::types::{Artifact, ArtifactPayload, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// A file that produced no artifact, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub identifier: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct CollectedFolder {
    pub artifacts: Vec<Artifact>,
    pub skipped: Vec<SkippedFile>,
}

/// Turns a downloaded directory tree into ordered artifacts.
pub struct FolderCollector {
    root: PathBuf,
    processors: ProcessorRegistry,
}

impl FolderCollector {
    pub fn new(root: impl Into<PathBuf>, processors: ProcessorRegistry) -> Self {
        Self {
            root: root.into(),
            processors,
        }
    }

    pub fn collect(&self) -> Result<CollectedFolder> {
        if !self.root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            )
            .into());
        }

        let mut folder = CollectedFolder::default();
        let entries = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let identifier = self.identifier_for(entry.path());
            match self.extract(entry.path(), &identifier) {
                Ok(artifact) => folder.artifacts.push(artifact),
                Err(reason) => {
                    warn!("Skipping {}: {}", identifier, reason);
                    folder.skipped.push(SkippedFile { identifier, reason });
                }
            }
        }

        info!(
            "Collected {} artifact(s) from {} ({} skipped)",
            folder.artifacts.len(),
            self.root.display(),
            folder.skipped.len()
        );
        Ok(folder)
    }

    fn extract(&self, path: &Path, identifier: &str) -> std::result::Result<Artifact, String> {
        let processor = self
            .processors
            .for_path(path)
            .ok_or_else(|| "no processor registered for this file type".to_string())?;

        let payload = processor.extract(path).map_err(|e| e.to_string())?;
        if let ArtifactPayload::Text(text) = &payload {
            if text.trim().is_empty() {
                return Err("file contains no text".to_string());
            }
        }
        Ok(Artifact {
            identifier: identifier.to_string(),
            payload,
        })
    }

    fn identifier_for(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}
