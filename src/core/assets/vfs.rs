//=========================================================================
// Virtual Filesystem
//=========================================================================
//
// Where the loader reads asset bytes from. `DirectoryFs` resolves names
// against a root directory; `MemoryFs` serves bytes registered in code
// and backs most tests.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use parking_lot::Mutex;

//=== FileSystem Trait ====================================================

/// Read-only source of asset files.
pub trait FileSystem: Send + Sync {
    /// Reads the whole file. A missing file must report
    /// [`io::ErrorKind::NotFound`].
    fn open(&self, name: &str) -> io::Result<Vec<u8>>;
}

//=== DirectoryFs =========================================================

/// Files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryFs {
    root: PathBuf,
}

impl DirectoryFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl FileSystem for DirectoryFs {
    fn open(&self, name: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(name))
    }
}

//=== MemoryFs ============================================================

/// In-memory files keyed by name.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryFs::insert`].
    pub fn with(self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.lock().insert(name.into(), bytes.into());
    }

    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().remove(name)
    }
}

impl FileSystem for MemoryFs {
    fn open(&self, name: &str) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
