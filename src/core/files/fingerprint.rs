//! Content fingerprints for duplicate detection
//!
//! Files are compared by size, then by a SHA-256 hash of their first MiB,
//! then by a hash of the whole file. Only the full hash decides that two
//! files are identical; the cheaper checks only rule it out.

use crate::domain::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Bytes hashed by the prefix pre-check
pub const PREFIX_LEN: u64 = 1024 * 1024;

const BUFFER_LEN: usize = 64 * 1024;

/// Hex SHA-256 of at most `limit` leading bytes of a file.
pub fn hash_file_prefix(path: &Path, limit: u64) -> Result<String> {
    let file = File::open(path)?;
    hash_reader(file.take(limit))
}

/// Hex SHA-256 of a whole file.
pub fn hash_file(path: &Path) -> Result<String> {
    hash_reader(File::open(path)?)
}

fn hash_reader(mut reader: impl Read) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_LEN];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Run-scoped cache of full-content hashes, keyed by path.
///
/// Destination files are never overwritten during a run, so a cached hash
/// stays valid until the run ends.
#[derive(Debug, Default)]
pub struct ContentIndex {
    full: HashMap<PathBuf, String>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full-content hash of `path`, computed once per run.
    pub fn full_hash(&mut self, path: &Path) -> Result<String> {
        if let Some(hash) = self.full.get(path) {
            return Ok(hash.clone());
        }
        let hash = hash_file(path)?;
        self.full.insert(path.to_path_buf(), hash.clone());
        Ok(hash)
    }

    /// True when both files hold exactly the same bytes.
    pub fn same_content(&mut self, a: &Path, b: &Path) -> Result<bool> {
        if a == b {
            return Ok(true);
        }
        let size = std::fs::metadata(a)?.len();
        if size != std::fs::metadata(b)?.len() {
            return Ok(false);
        }
        if size > PREFIX_LEN
            && hash_file_prefix(a, PREFIX_LEN)? != hash_file_prefix(b, PREFIX_LEN)?
        {
            return Ok(false);
        }
        Ok(self.full_hash(a)? == self.full_hash(b)?)
    }

    /// Number of files hashed in full so far
    pub fn len(&self) -> usize {
        self.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.pdf", b"Hello, World!");
        let hash = hash_file(&path).unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_prefix_hash_ignores_tail() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.pdf", b"same-start-AAAA");
        let b = write(&dir, "b.pdf", b"same-start-BBBB");
        assert_eq!(
            hash_file_prefix(&a, 10).unwrap(),
            hash_file_prefix(&b, 10).unwrap()
        );
        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_same_content() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.pdf", b"%PDF-1.4 body");
        let b = write(&dir, "b.pdf", b"%PDF-1.4 body");
        let c = write(&dir, "c.pdf", b"%PDF-1.4 b0dy");
        let d = write(&dir, "d.pdf", b"%PDF-1.4");

        let mut index = ContentIndex::new();
        assert!(index.same_content(&a, &b).unwrap());
        assert!(!index.same_content(&a, &c).unwrap());
        assert!(!index.same_content(&a, &d).unwrap());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_large_files_differing_early_skip_full_hash() {
        let dir = TempDir::new().unwrap();
        let mut first = vec![7u8; PREFIX_LEN as usize + 10];
        let a = write(&dir, "a.pdf", &first);
        first[0] = 8;
        let b = write(&dir, "b.pdf", &first);

        let mut index = ContentIndex::new();
        assert!(!index.same_content(&a, &b).unwrap());
        assert!(index.is_empty());
    }
}
