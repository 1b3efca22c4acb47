use std::io;
use std::path::{Path, PathBuf};

use crate::{replace_file_contents, DocumentHandle, DocumentStore, Fingerprint, StoreError};

/// [`DocumentStore`] over a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

#[derive(Debug)]
pub struct LocalFileHandle {
    path: PathBuf,
    name: String,
    /// `None` when the file did not exist at open time.
    baseline: Option<Fingerprint>,
}

impl LocalFileHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentHandle for LocalFileHandle {
    fn name(&self) -> &str {
        &self.name
    }
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, location: &str) -> PathBuf {
        self.root.join(location)
    }

    fn handle_for(&self, location: &str, baseline: Option<Fingerprint>) -> LocalFileHandle {
        let path = self.resolve(location);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.to_string());
        LocalFileHandle {
            path,
            name,
            baseline,
        }
    }
}

async fn current_fingerprint(path: &Path) -> io::Result<Option<Fingerprint>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(Fingerprint::of(&bytes))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        location: path.display().to_string(),
        source,
    }
}

impl DocumentStore for LocalFileStore {
    type Handle = LocalFileHandle;

    async fn open_for_read(&self, location: &str) -> Result<(Vec<u8>, Self::Handle), StoreError> {
        let path = self.resolve(location);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    location: location.to_string(),
                })
            }
            Err(err) => return Err(io_error(&path, err)),
        };
        let baseline = Fingerprint::of(&bytes);
        log::debug!(
            "opened {} ({} bytes, {})",
            path.display(),
            baseline.len(),
            baseline.short_hex()
        );
        Ok((bytes, self.handle_for(location, Some(baseline))))
    }

    async fn open_for_write(&self, suggested_name: &str) -> Result<Self::Handle, StoreError> {
        let path = self.resolve(suggested_name);
        let baseline = current_fingerprint(&path)
            .await
            .map_err(|err| io_error(&path, err))?;
        Ok(self.handle_for(suggested_name, baseline))
    }

    async fn write(&self, handle: &mut Self::Handle, bytes: &[u8]) -> Result<(), StoreError> {
        let current = current_fingerprint(&handle.path)
            .await
            .map_err(|err| io_error(&handle.path, err))?;
        if current != handle.baseline {
            log::warn!(
                "refusing to overwrite {}: contents changed since it was opened",
                handle.path.display()
            );
            return Err(StoreError::Conflict {
                location: handle.path.display().to_string(),
            });
        }

        let path = handle.path.clone();
        let owned = bytes.to_vec();
        tokio::task::spawn_blocking(move || replace_file_contents(&path, &owned))
            .await
            .map_err(|err| io_error(&handle.path, io::Error::other(err)))?
            .map_err(|err| io_error(&handle.path, err))?;

        handle.baseline = Some(Fingerprint::of(bytes));
        log::info!("saved {} ({} bytes)", handle.path.display(), bytes.len());
        Ok(())
    }
}
