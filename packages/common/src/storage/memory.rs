use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StorageError;
use super::traits::{BlobBackend, RawBlobBackend, TextBlobBackend};

/// Per-operation call counters kept by the in-memory backends.
#[derive(Debug, Default)]
pub struct CallCounts {
    puts: AtomicUsize,
    gets: AtomicUsize,
    removes: AtomicUsize,
}

impl CallCounts {
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::Relaxed)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::Relaxed)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::Relaxed)
    }
}

/// In-memory raw byte backend. Used by tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryBlobBackend {
    blobs: DashMap<String, Vec<u8>>,
    calls: CallCounts,
}

impl MemoryBlobBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.calls.removes.fetch_add(1, Ordering::Relaxed);
        self.blobs.remove(key);
        Ok(())
    }
}

#[async_trait]
impl RawBlobBackend for MemoryBlobBackend {
    async fn put_raw(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.calls.puts.fetch_add(1, Ordering::Relaxed);
        self.blobs.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.calls.gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.blobs.get(key).map(|entry| entry.value().clone()))
    }
}

/// In-memory text-only backend, the local stand-in for key/value stores
/// that cannot hold binary payloads.
#[derive(Debug, Default)]
pub struct MemoryTextBackend {
    values: DashMap<String, String>,
    calls: CallCounts,
}

impl MemoryTextBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// The text stored under `key`, exactly as the adapter wrote it.
    pub fn stored_text(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|entry| entry.value().clone())
    }

    /// Overwrite a stored value, bypassing the adapter.
    pub fn insert_text(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl BlobBackend for MemoryTextBackend {
    fn name(&self) -> &'static str {
        "memory-text"
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.calls.removes.fetch_add(1, Ordering::Relaxed);
        self.values.remove(key);
        Ok(())
    }
}

#[async_trait]
impl TextBlobBackend for MemoryTextBackend {
    async fn put_text(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.calls.puts.fetch_add(1, Ordering::Relaxed);
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_text(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.calls.gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.values.get(key).map(|entry| entry.value().clone()))
    }
}
