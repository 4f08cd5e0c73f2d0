use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Key/value persistence for the record lists
pub trait RecordsStore {
    /// Value stored under `key`, or `default` when absent.
    fn read_string(&self, key: &str, default: &str) -> String;
    fn write_string(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// Store backed by a flat `key=value` lines file
#[derive(Debug, Clone)]
pub struct FileRecordsStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileRecordsStore {
    /// Open the store at `path`. A missing or unreadable file yields an
    /// empty store; it is created on the first write.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut entries = BTreeMap::new();

        if let Ok(raw) = fs::read_to_string(&path) {
            for line in raw.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    entries.insert(key.trim().to_string(), value.trim().to_string());
                }
            }
        }

        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        fs::write(&self.path, out)
    }
}

impl RecordsStore for FileRecordsStore {
    fn read_string(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn write_string(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// In-memory store for unit tests
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordsStore {
    entries: BTreeMap<String, String>,
}

impl MemoryRecordsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a key, bypassing the trait (for malformed-data tests).
    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

impl RecordsStore for MemoryRecordsStore {
    fn read_string(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn write_string(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileRecordsStore::open(dir.path().join("records.txt"));

        assert_eq!(store.read_string("top_scores", "0,0,0"), "0,0,0");
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.txt");

        let mut store = FileRecordsStore::open(&path);
        store.write_string("top_scores", "10,5,3").unwrap();
        store.write_string("top_times", "500,9999,9999").unwrap();

        let reopened = FileRecordsStore::open(&path);
        assert_eq!(reopened.read_string("top_scores", "0,0,0"), "10,5,3");
        assert_eq!(
            reopened.read_string("top_times", "9999,9999,9999"),
            "500,9999,9999"
        );
    }

    #[test]
    fn write_overwrites_prior_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.txt");

        let mut store = FileRecordsStore::open(&path);
        store.write_string("top_scores", "1,0,0").unwrap();
        store.write_string("top_scores", "2,1,0").unwrap();

        let reopened = FileRecordsStore::open(&path);
        assert_eq!(reopened.read_string("top_scores", "0,0,0"), "2,1,0");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("records.txt");

        let mut store = FileRecordsStore::open(&path);
        store.write_string("top_scores", "1,0,0").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn lines_without_separator_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.txt");
        std::fs::write(&path, "garbage line\ntop_scores=3,2,1\n").unwrap();

        let store = FileRecordsStore::open(&path);
        assert_eq!(store.read_string("top_scores", "0,0,0"), "3,2,1");
        assert_eq!(store.read_string("garbage line", "fallback"), "fallback");
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryRecordsStore::new();
        assert_eq!(store.read_string("key", "default"), "default");

        store.write_string("key", "value").unwrap();
        assert_eq!(store.read_string("key", "default"), "value");
    }
}
