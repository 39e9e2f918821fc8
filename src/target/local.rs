// src/target/local.rs

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{Target, TargetError, TargetWriter};

/// Filesystem-backed target keyed by a path.
///
/// Writes go to a temporary file next to the final path and are renamed
/// into place on commit, so a reader never sees a half-written artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTarget {
    path: PathBuf,
}

impl LocalTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the artifact if present.
    pub fn remove(&self) -> Result<(), TargetError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TargetError::io(self.location(), e)),
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Target for LocalTarget {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, TargetError> {
        if !self.exists() {
            return Err(TargetError::NotFound(self.location()));
        }
        let file = fs::File::open(&self.path).map_err(|e| TargetError::io(self.location(), e))?;
        Ok(Box::new(file))
    }

    fn open_write(&self) -> Result<Box<dyn TargetWriter>, TargetError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|e| TargetError::io(dir.display().to_string(), e))?;

        let file = tempfile::Builder::new()
            .prefix(".dagbuild-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| TargetError::io(self.location(), e))?;

        debug!(target_path = %self.path.display(), temp = %file.path().display(), "opened atomic writer");

        Ok(Box::new(LocalWriter {
            file,
            path: self.path.clone(),
        }))
    }
}

struct LocalWriter {
    file: NamedTempFile,
    path: PathBuf,
}

impl Write for LocalWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl TargetWriter for LocalWriter {
    fn commit(self: Box<Self>) -> Result<(), TargetError> {
        let LocalWriter { mut file, path } = *self;
        let location = path.display().to_string();

        file.flush().map_err(|e| TargetError::io(location.clone(), e))?;
        file.persist(&path)
            .map_err(|e| TargetError::io(location, e.error))?;
        Ok(())
    }
}
