use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{DocumentHandle, DocumentStore, Fingerprint, StoreError};

/// [`DocumentStore`] backed by a shared in-memory map.
///
/// Clones share the same map, so one clone can play "another writer" against
/// a session that holds the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    fail_next_write: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct MemoryFileHandle {
    name: String,
    baseline: Option<Fingerprint>,
}

impl DocumentHandle for MemoryFileHandle {
    fn name(&self) -> &str {
        &self.name
    }
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `name`, bypassing any handle.
    pub async fn insert(&self, name: &str, bytes: Vec<u8>) {
        self.files.lock().await.insert(name.to_string(), bytes);
    }

    pub async fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().await.remove(name)
    }

    pub async fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(name).cloned()
    }

    /// Make the next [`DocumentStore::write`] fail with an I/O error.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }
}

impl DocumentStore for MemoryFileStore {
    type Handle = MemoryFileHandle;

    async fn open_for_read(&self, location: &str) -> Result<(Vec<u8>, Self::Handle), StoreError> {
        let files = self.files.lock().await;
        let bytes = files.get(location).cloned().ok_or_else(|| StoreError::NotFound {
            location: location.to_string(),
        })?;
        let handle = MemoryFileHandle {
            name: location.to_string(),
            baseline: Some(Fingerprint::of(&bytes)),
        };
        Ok((bytes, handle))
    }

    async fn open_for_write(&self, suggested_name: &str) -> Result<Self::Handle, StoreError> {
        let files = self.files.lock().await;
        Ok(MemoryFileHandle {
            name: suggested_name.to_string(),
            baseline: files.get(suggested_name).map(|bytes| Fingerprint::of(bytes)),
        })
    }

    async fn write(&self, handle: &mut Self::Handle, bytes: &[u8]) -> Result<(), StoreError> {
        let mut files = self.files.lock().await;
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Io {
                location: handle.name.clone(),
                source: io::Error::other("simulated write failure"),
            });
        }
        let current = files.get(&handle.name).map(|existing| Fingerprint::of(existing));
        if current != handle.baseline {
            return Err(StoreError::Conflict {
                location: handle.name.clone(),
            });
        }
        files.insert(handle.name.clone(), bytes.to_vec());
        handle.baseline = Some(Fingerprint::of(bytes));
        Ok(())
    }
}
