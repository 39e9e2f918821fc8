// src/target/mod.rs

//! Output targets: durable artifacts that prove a task has completed.
//!
//! The engine only ever asks a target whether it exists. Tasks use the
//! scoped accessors to read their inputs and write their own output.
//!
//! - [`local`] holds the filesystem-backed [`LocalTarget`].
//! - [`memory`] holds [`MemoryTarget`], an in-memory implementation used by
//!   tests and small embeddings.

use std::fmt::Debug;
use std::io::{Read, Write};
use std::sync::Arc;

use thiserror::Error;

pub mod local;
pub mod memory;

pub use local::LocalTarget;
pub use memory::{MemoryStore, MemoryTarget};

#[derive(Error, Debug)]
pub enum TargetError {
    #[error("target not found: {0}")]
    NotFound(String),

    #[error("I/O error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl TargetError {
    pub fn io(location: impl Into<String>, source: std::io::Error) -> Self {
        TargetError::Io {
            location: location.into(),
            source,
        }
    }
}

/// Shared handle to a target.
pub type TargetRef = Arc<dyn Target>;

/// Scoped write handle returned by [`Target::open_write`].
///
/// Bytes written are invisible to readers until [`TargetWriter::commit`]
/// succeeds. Dropping the writer without committing discards them and
/// leaves the target as it was.
pub trait TargetWriter: Write + Send {
    fn commit(self: Box<Self>) -> Result<(), TargetError>;
}

/// A handle to a durable artifact.
pub trait Target: Send + Sync + Debug {
    /// Human-readable location (a path for local targets).
    fn location(&self) -> String;

    /// Whether the artifact is present. No content validation.
    fn exists(&self) -> bool;

    /// Open the artifact for reading. Fails with [`TargetError::NotFound`]
    /// when it does not exist.
    fn open_read(&self) -> Result<Box<dyn Read + Send>, TargetError>;

    /// Open a scoped writer, creating parent storage if needed.
    fn open_write(&self) -> Result<Box<dyn TargetWriter>, TargetError>;

    fn read_to_string(&self) -> Result<String, TargetError> {
        let mut reader = self.open_read()?;
        let mut contents = String::new();
        reader
            .read_to_string(&mut contents)
            .map_err(|e| TargetError::io(self.location(), e))?;
        Ok(contents)
    }

    /// Write `contents` as the complete artifact and commit it.
    fn write_bytes(&self, contents: &[u8]) -> Result<(), TargetError> {
        let mut writer = self.open_write()?;
        writer
            .write_all(contents)
            .map_err(|e| TargetError::io(self.location(), e))?;
        writer.commit()
    }
}
