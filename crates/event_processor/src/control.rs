//! ControlSurface implementations
//!
//! `SysfsNode` writes to a real kernel node. `MemoryNode` records writes in
//! memory for tests and simulation.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::ControlSurface;

/// Kernel control node backed by a file path
///
/// Opened, written and closed on every write. The write runs on the calling
/// sub-HAL thread, so a slow node delays that sub-HAL's batch.
#[derive(Debug, Clone)]
pub struct SysfsNode {
    path: PathBuf,
}

impl SysfsNode {
    /// Create a node for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Node path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ControlSurface for SysfsNode {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn write_value(&self, value: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(value.as_bytes())
    }
}

/// In-memory control node
///
/// Clones share the same write log.
#[derive(Debug, Clone, Default)]
pub struct MemoryNode {
    writes: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MemoryNode {
    /// Create an empty node
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node whose writes always fail, as an unopenable path would
    pub fn failing() -> Self {
        Self {
            writes: Arc::default(),
            fail: true,
        }
    }

    /// All values written so far
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last value written
    pub fn last(&self) -> Option<String> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl ControlSurface for MemoryNode {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn write_value(&self, value: &str) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::NotFound, "node unavailable"));
        }
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value.to_string());
        Ok(())
    }
}
