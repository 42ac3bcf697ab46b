use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_ARTIFACT: &str = "data_dump.sql";

/// What happens to the dump file once the import has succeeded.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    #[default]
    Keep,
    Remove,
}

/// The dump file written by the export stage and read by the import stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferArtifact {
    pub path: PathBuf,
}

impl TransferArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TransferArtifact { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes, or `None` if the file is missing.
    pub fn size(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }

    pub fn remove(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl Default for TransferArtifact {
    fn default() -> Self {
        TransferArtifact::new(DEFAULT_ARTIFACT)
    }
}

impl fmt::Display for TransferArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
