//! Adapter traits for the two backing stores
//!
//! The object store is a flat key space with no folders and no rename. The
//! metadata catalog holds rows describing media hosted elsewhere. Both are
//! consumed through these traits so the engines can be tested without a
//! network and the concrete adapters live in their own crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entry::{CatalogAsset, NewAsset};
use crate::error::Result;
use crate::path::FolderPath;

/// One result of an object store `list` call
///
/// The store reports folders with no identifier; `id == None` is the only
/// folder/file discriminator the listing engine relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreObject {
    /// Name relative to the listed folder
    pub name: String,

    /// Store-native identifier, absent for folders
    pub id: Option<String>,

    /// Size in bytes, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,
}

impl StoreObject {
    /// A file entry with a store identifier
    pub fn file(name: impl Into<String>, id: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
            size: Some(size),
            last_modified: None,
        }
    }

    /// A folder (common prefix) entry
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            size: None,
            last_modified: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }
}

/// Sort order requested from the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Name,
    LastModified,
}

/// Options for list operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Maximum number of entries returned by one call
    pub limit: usize,

    /// Entries to skip before the first one returned
    pub offset: usize,

    /// Requested order
    pub sort_by: SortBy,
}

impl ListOptions {
    /// First page of `limit` entries, sorted by name
    pub fn page(limit: usize) -> Self {
        Self {
            limit,
            offset: 0,
            sort_by: SortBy::Name,
        }
    }
}

/// Options for upload operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Replace an existing object; when false an existing key is a conflict
    pub upsert: bool,

    /// Content type stored with the object
    pub content_type: Option<String>,
}

impl UploadOptions {
    /// Upload that never overwrites
    pub fn create_only(content_type: Option<String>) -> Self {
        Self {
            upsert: false,
            content_type,
        }
    }
}

/// Trait for flat, key-addressed object storage
///
/// Implemented by the S3 adapter and mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of the direct children of `folder`
    async fn list(&self, folder: &FolderPath, options: ListOptions) -> Result<Vec<StoreObject>>;

    /// Store `data` under `key`
    ///
    /// With `upsert == false` an existing key must fail with `Error::Conflict`.
    async fn upload(&self, key: &str, data: Vec<u8>, options: UploadOptions) -> Result<()>;

    /// Fetch the full contents of `key`
    async fn download(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove every key in `keys` in one request
    async fn remove(&self, keys: &[String]) -> Result<()>;

    /// Issue a time-limited read URL for `key`
    async fn create_signed_url(&self, key: &str, ttl_seconds: u64) -> Result<String>;

    /// Longest expiry, in seconds, a signed URL from this store can carry
    fn max_signed_url_ttl(&self) -> Option<u64> {
        None
    }
}

/// Trait for the media metadata catalog
///
/// Rows are addressed by `(folder, id)`; the media they point at is never
/// touched through this trait.
#[async_trait]
pub trait MetadataCatalog: Send + Sync {
    /// Rows whose folder equals `folder` exactly
    async fn list_folder(&self, owner_id: &str, folder: &FolderPath) -> Result<Vec<CatalogAsset>>;

    /// Rows in `folder` or any folder beneath it
    async fn list_subtree(&self, owner_id: &str, folder: &FolderPath)
    -> Result<Vec<CatalogAsset>>;

    /// Insert a row; the catalog assigns the id and creation time
    async fn insert(&self, asset: NewAsset) -> Result<CatalogAsset>;

    /// Change the display name of a row
    async fn rename(&self, id: &str, name: &str) -> Result<()>;

    /// Point a row at another folder
    async fn relocate(&self, id: &str, folder: &FolderPath) -> Result<()>;

    /// Delete a row
    async fn delete(&self, id: &str) -> Result<()>;
}
