//! File collaborator
//!
//! The transfer reads its source through a `FileStore`: stat for the byte
//! length, open for a bounded reader. Closing is dropping the reader.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

// ----------------------------------------------------------------------------
// File Store Trait
// ----------------------------------------------------------------------------

/// Source of files for transfer
pub trait FileStore: Send + Sync {
    /// Byte length of the file at `path`
    fn file_size(&self, path: &str) -> io::Result<u64>;

    /// Open the file at `path` for reading
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>>;
}

impl<T: FileStore + ?Sized> FileStore for Arc<T> {
    fn file_size(&self, path: &str) -> io::Result<u64> {
        (**self).file_size(path)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        (**self).open(path)
    }
}

// ----------------------------------------------------------------------------
// Filesystem Store
// ----------------------------------------------------------------------------

/// Files on the local filesystem, optionally below a root directory
#[derive(Debug, Clone, Default)]
pub struct FsFileStore {
    root: Option<PathBuf>,
}

impl FsFileStore {
    /// Resolve paths as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve paths relative to `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

impl FileStore for FsFileStore {
    fn file_size(&self, path: &str) -> io::Result<u64> {
        let metadata = fs::metadata(self.resolve(path))?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path),
            ));
        }
        Ok(metadata.len())
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let file = fs::File::open(self.resolve(path))?;
        Ok(Box::new(file))
    }
}

// ----------------------------------------------------------------------------
// In-Memory Store
// ----------------------------------------------------------------------------

/// Named byte buffers held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    files: Arc<RwLock<HashMap<String, Arc<[u8]>>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        let contents: Vec<u8> = contents.into();
        self.files.write().insert(path.into(), contents.into());
    }

    /// Remove a file, returning whether it existed
    pub fn remove(&self, path: &str) -> bool {
        self.files.write().remove(path).is_some()
    }

    fn get(&self, path: &str) -> io::Result<Arc<[u8]>> {
        self.files.read().get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path))
        })
    }
}

impl FileStore for MemoryFileStore {
    fn file_size(&self, path: &str) -> io::Result<u64> {
        Ok(self.get(path)?.len() as u64)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.get(path)?)))
    }
}

/// Read until `buf` is full or the source is exhausted
///
/// Returns the number of bytes read; fewer than `buf.len()` only at end of file.
pub fn read_full(source: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Reader that hands out at most 3 bytes per call
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(3).min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_full_fills_across_short_reads() {
        let mut source = Trickle(b"hello world");
        let mut buf = [0u8; 8];
        assert_eq!(read_full(&mut source, &mut buf).unwrap(), 8);
        assert_eq!(&buf, b"hello wo");
        assert_eq!(read_full(&mut source, &mut buf).unwrap(), 3);
        assert_eq!(read_full(&mut source, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryFileStore::new();
        store.insert("/docs/a.txt", b"abc".to_vec());
        assert_eq!(store.file_size("/docs/a.txt").unwrap(), 3);

        let mut contents = Vec::new();
        store
            .open("/docs/a.txt")
            .unwrap()
            .read_to_end(&mut contents)
            .unwrap();
        assert_eq!(contents, b"abc");

        assert!(store.remove("/docs/a.txt"));
        assert_eq!(
            store.file_size("/docs/a.txt").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_fs_store_with_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("doc.txt")).unwrap();
        file.write_all(b"0123456789").unwrap();

        let store = FsFileStore::with_root(dir.path());
        assert_eq!(store.file_size("/doc.txt").unwrap(), 10);
        assert!(store.file_size("missing.txt").is_err());
        assert!(store.file_size("/").is_err());
    }
}
