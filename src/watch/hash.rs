// src/watch/hash.rs

use std::collections::HashMap;
use std::path::Path;
use std::io::Read;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the blake3 hash of a single file, streaming its contents.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut reader = fs.open_read(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("reading {:?} for hashing", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Combine per-file hashes into one digest.
///
/// `entries` are `(relative path, file hash)` pairs sorted by path. The path
/// takes part in the digest, so renaming a watched file counts as a change.
pub fn compute_aggregate_hash(entries: &[(String, String)]) -> String {
    let mut hasher = Hasher::new();
    for (path, hash) in entries {
        hasher.update(path.as_bytes());
        hasher.update(&[0]);
        hasher.update(hash.as_bytes());
    }
    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, files = entries.len(), "computed aggregate hash");
    hash
}

/// Storage for the last seen aggregate hash of each watch subscription.
pub trait HashStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, hash: &str);
}

/// Keeps hashes for the lifetime of the watch session.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn save(&mut self, key: &str, hash: &str) {
        self.map.insert(key.to_string(), hash.to_string());
        debug!(key = %key, hash = %hash, "stored watch hash");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn aggregate_hash_depends_on_paths_and_contents() {
        let a = compute_aggregate_hash(&[("a.html".into(), "1".into())]);
        let renamed = compute_aggregate_hash(&[("b.html".into(), "1".into())]);
        let edited = compute_aggregate_hash(&[("a.html".into(), "2".into())]);
        assert_ne!(a, renamed);
        assert_ne!(a, edited);
        assert_eq!(a, compute_aggregate_hash(&[("a.html".into(), "1".into())]));
    }

    #[test]
    fn file_hash_matches_blake3_of_contents() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/a.txt", "hello");
        let hash = compute_file_hash(&fs, Path::new("/proj/a.txt")).unwrap();
        assert_eq!(hash, blake3::hash(b"hello").to_hex().to_string());
    }
}
