//! Filesystem plumbing for checklist workbooks.
//!
//! This crate owns the boundary between the engine and wherever workbook bytes
//! actually live:
//! - [`replace_file_contents`]: temp-file + rename writes so a failed save
//!   never truncates the destination
//! - [`Fingerprint`]: a content digest used to notice when a file changed
//!   underneath an open document
//! - [`DocumentStore`]: the async read/write capability the engine drives, with
//!   a filesystem ([`LocalFileStore`]) and an in-memory ([`MemoryFileStore`])
//!   implementation

mod atomic;
mod fingerprint;
mod local;
mod memory;
mod store;

pub use atomic::replace_file_contents;
pub use fingerprint::Fingerprint;
pub use local::{LocalFileHandle, LocalFileStore};
pub use memory::{MemoryFileHandle, MemoryFileStore};
pub use store::{DocumentHandle, DocumentStore, StoreError};
