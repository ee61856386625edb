//! The description artifact: a UTF-8 text file handed from the describer to
//! the speaker.
//!
//! Writes truncate any previous content.  There is no locking; whichever run
//! writes last wins.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default artifact location, relative to the working directory.
pub const DEFAULT_ARTIFACT_PATH: &str = "description.txt";

/// Errors reading or writing the artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("description file '{}' not found; run plsdescribe first", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    /// Process exit code for this failure: 3 when the file is missing.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound(_) => 3,
            Self::Read { .. } => 1,
            Self::Write { .. } => 6,
        }
    }
}

/// Write `text` to `path`, replacing whatever was there.
pub fn write_description(path: impl AsRef<Path>, text: &str) -> Result<(), ArtifactError> {
    let path = path.as_ref();
    std::fs::write(path, text).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("description saved to {}", path.display());
    Ok(())
}

/// Read the whole artifact at `path`.
pub fn read_description(path: impl AsRef<Path>) -> Result<String, ArtifactError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ArtifactError::NotFound(path.to_path_buf()),
        _ => ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        },
    })
}
