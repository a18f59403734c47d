use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{} is not a file path", .0.display())]
    NotAFile(PathBuf),
    #[error("cannot prepare folder {}: {source}", path.display())]
    Folder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot replace {}: {source}", path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Rewrites one file whole. The new content is staged in a sibling temp file
/// and renamed over the target, so the file on disk is always either the old
/// version or the new one.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    target: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(target: PathBuf) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Folder holding the target; a bare file name lives in the working
    /// directory.
    fn folder(&self) -> &Path {
        match self.target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn write(&self, content: &[u8]) -> Result<(), PersistError> {
        if self.target.file_name().is_none() || self.target.is_dir() {
            return Err(PersistError::NotAFile(self.target.clone()));
        }
        let folder = self.folder();
        fs::create_dir_all(folder).map_err(|source| PersistError::Folder {
            path: folder.to_path_buf(),
            source,
        })?;

        let replace = |source: io::Error| PersistError::Replace {
            path: self.target.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(folder).map_err(replace)?;
        staged.write_all(content).map_err(replace)?;
        staged.as_file().sync_all().map_err(replace)?;
        staged
            .persist(&self.target)
            .map_err(|err| replace(err.error))?;
        Ok(())
    }
}
