// src/target/memory.rs

use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Target, TargetError, TargetWriter};

#[derive(Debug, Default)]
struct StoreState {
    artifacts: HashMap<String, Vec<u8>>,
    read_only: HashSet<String>,
}

/// Shared in-memory artifact store backing any number of [`MemoryTarget`]s.
///
/// Cloning the store shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target handle for `key` in this store.
    pub fn target(&self, key: impl Into<String>) -> MemoryTarget {
        MemoryTarget {
            key: key.into(),
            store: self.clone(),
        }
    }

    /// Seed an artifact directly, bypassing the writer.
    pub fn insert(&self, key: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.lock().artifacts.insert(key.into(), contents.into());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().artifacts.get(key).cloned()
    }

    /// Make every `open_write` on `key` fail with `PermissionDenied`.
    pub fn deny_writes(&self, key: impl Into<String>) {
        self.lock().read_only.insert(key.into());
    }

    pub fn len(&self) -> usize {
        self.lock().artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().artifacts.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory target keyed by a string inside a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryTarget {
    key: String,
    store: MemoryStore,
}

impl Target for MemoryTarget {
    fn location(&self) -> String {
        format!("memory://{}", self.key)
    }

    fn exists(&self) -> bool {
        self.store.lock().artifacts.contains_key(&self.key)
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, TargetError> {
        match self.store.get(&self.key) {
            Some(contents) => Ok(Box::new(Cursor::new(contents))),
            None => Err(TargetError::NotFound(self.location())),
        }
    }

    fn open_write(&self) -> Result<Box<dyn TargetWriter>, TargetError> {
        if self.store.lock().read_only.contains(&self.key) {
            return Err(TargetError::io(
                self.location(),
                io::Error::new(io::ErrorKind::PermissionDenied, "target is read-only"),
            ));
        }

        Ok(Box::new(MemoryWriter {
            key: self.key.clone(),
            store: self.store.clone(),
            buf: Vec::new(),
        }))
    }
}

struct MemoryWriter {
    key: String,
    store: MemoryStore,
    buf: Vec<u8>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TargetWriter for MemoryWriter {
    fn commit(self: Box<Self>) -> Result<(), TargetError> {
        let MemoryWriter { key, store, buf } = *self;
        store.insert(key, buf);
        Ok(())
    }
}
