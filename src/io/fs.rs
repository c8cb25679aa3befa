//! File system provider
//!
//! The pipeline never touches the process working directory. Sources are
//! read and artifacts written through a [`FileSystem`] handle passed in by
//! the caller.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Named-source reader and named-artifact writer
pub trait FileSystem {
    /// Read a named source as text
    fn read(&self, name: &str) -> Result<String>;

    /// Write a named artifact
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Files under a root directory on the local disk
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFileSystem { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl FileSystem for LocalFileSystem {
    fn read(&self, name: &str) -> Result<String> {
        let path = self.resolve(name);
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => Error::NotFound {
                name: name.to_string(),
            },
            ErrorKind::InvalidData => {
                Error::InvalidInput(format!("'{}' is not valid UTF-8", name))
            }
            _ => {
                log::warn!("failed to read {}: {}", path.display(), err);
                Error::ReadFailed {
                    name: name.to_string(),
                    reason: err.to_string(),
                }
            }
        })
    }

    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(name);
        let write_failed = |err: std::io::Error| Error::WriteFailed {
            name: name.to_string(),
            reason: err.to_string(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        fs::write(&path, bytes).map_err(write_failed)?;
        log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// In-memory named files
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        MemoryFileSystem::default()
    }

    /// Add or overwrite a file
    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), contents.into());
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, name: &str) -> Result<String> {
        let bytes = self.files.get(name).ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })?;
        String::from_utf8(bytes.clone())
            .map_err(|_| Error::InvalidInput(format!("'{}' is not valid UTF-8", name)))
    }

    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_round_trip() {
        let mut fs = MemoryFileSystem::new();
        fs.write("out.txt", b"hello").unwrap();
        assert_eq!(fs.read("out.txt").unwrap(), "hello");
        assert_eq!(fs.names().collect::<Vec<_>>(), vec!["out.txt"]);
    }

    #[test]
    fn test_memory_not_found() {
        let fs = MemoryFileSystem::new();
        assert!(matches!(fs.read("missing.csv"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_local_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = LocalFileSystem::new(dir.path());
        fs.write("nested/data.csv", b"x\n1\n").unwrap();
        assert_eq!(fs.read("nested/data.csv").unwrap(), "x\n1\n");
        assert!(matches!(fs.read("absent.csv"), Err(Error::NotFound { name }) if name == "absent.csv"));
    }

    #[test]
    fn test_local_read_failures_keep_cause() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = LocalFileSystem::new(dir.path());
        fs.write("bad.csv", &[0xff, 0xfe]).unwrap();
        assert!(matches!(fs.read("bad.csv"), Err(Error::InvalidInput(_))));

        fs.write("folder/inner.csv", b"x\n").unwrap();
        assert!(matches!(
            fs.read("folder"),
            Err(Error::ReadFailed { name, .. }) if name == "folder"
        ));
    }
}
