//! Blob store collaborator interface.

use crate::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;

/// Object storage for submitted images.
///
/// The contract is idempotent-by-key overwrite: `put` with the same key
/// replaces the blob and returns a publicly resolvable URL which callers
/// embed verbatim into the ticket's image list. Keys are namespaced as
/// `{ticket_id}/{original_filename}`.
///
/// Failure is a single opaque [`StorageError`]; no partial-range retry is
/// expected of implementations.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store a blob under `key` and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the upload fails for any reason.
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<String, StorageError>;
}
