//! Key-value slots backing the persisted chat history.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A named-slot blob store. Each key holds one opaque byte blob.
pub trait SlotStorage {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// One file per slot under a data directory.
pub struct FileSlotStorage {
    base_path: PathBuf,
}

impl FileSlotStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Platform data directory for the app, falling back to `./data`.
    pub fn default_location() -> Self {
        let base_path = directories::ProjectDirs::from("com.local", "Notch Chat", "NotchChat")
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./data"));
        Self::new(base_path)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl SlotStorage for FileSlotStorage {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.slot_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.base_path)?;
        // Write-then-rename so a crash never leaves a half-written blob
        let path = self.slot_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(tmp, path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.slot_path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// In-memory slots, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemorySlotStorage {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStorage for MemorySlotStorage {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.slots.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.slots.lock().remove(key);
        Ok(())
    }
}

impl<S: SlotStorage + ?Sized> SlotStorage for std::sync::Arc<S> {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        (**self).write(key, bytes)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_slot_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = FileSlotStorage::new(dir.path().join("nested"));

        assert_eq!(storage.read("history").unwrap(), None);
        storage.write("history", b"[1,2,3]").unwrap();
        assert_eq!(storage.read("history").unwrap(), Some(b"[1,2,3]".to_vec()));
        assert!(dir.path().join("nested/history.json").exists());
    }

    #[test]
    fn test_file_slot_remove_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let storage = FileSlotStorage::new(dir.path());

        storage.remove("nothing").unwrap();
        storage.write("slot", b"x").unwrap();
        storage.remove("slot").unwrap();
        assert_eq!(storage.read("slot").unwrap(), None);
    }

    #[test]
    fn test_memory_slots_are_independent() {
        let storage = MemorySlotStorage::new();
        storage.write("a", b"1").unwrap();
        storage.write("b", b"2").unwrap();
        storage.remove("a").unwrap();

        assert_eq!(storage.read("a").unwrap(), None);
        assert_eq!(storage.read("b").unwrap(), Some(b"2".to_vec()));
    }
}
