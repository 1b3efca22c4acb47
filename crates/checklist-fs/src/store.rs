use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document `{location}` not found")]
    NotFound { location: String },
    /// The destination no longer holds the bytes this handle last saw.
    #[error("document `{location}` was modified since it was opened")]
    Conflict { location: String },
    #[error("i/o error on `{location}`: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// An exclusively owned reference to one stored document.
pub trait DocumentHandle: Send {
    /// Display name of the document (file name, key, ...).
    fn name(&self) -> &str;
}

/// The read/write capability the engine needs from the outside world.
///
/// Location selection (file pickers and the like) happens outside; the store only
/// moves bytes. Every write checks that the destination still holds what the
/// handle last read or wrote and reports [`StoreError::Conflict`] otherwise.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    type Handle: DocumentHandle;

    async fn open_for_read(&self, location: &str) -> Result<(Vec<u8>, Self::Handle), StoreError>;

    /// Prepare a handle for a (possibly new) location. Existing content at the
    /// location becomes the baseline for conflict detection.
    async fn open_for_write(&self, suggested_name: &str) -> Result<Self::Handle, StoreError>;

    async fn write(&self, handle: &mut Self::Handle, bytes: &[u8]) -> Result<(), StoreError>;
}
