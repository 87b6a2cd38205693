//! Folder emulation through placeholder objects
//!
//! The object store only knows keys. A folder exists while at least one key
//! shares its prefix, so an empty folder is kept visible by a zero-byte
//! marker object stored directly inside it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ValidationError};
use crate::listing::{Listing, subtree_keys};
use crate::path::{self, FolderPath};
use crate::traits::{ListOptions, ObjectStore, UploadOptions};

/// Default marker file name
pub const DEFAULT_MARKER_NAME: &str = ".emptyFolderPlaceholder";

/// Whether markers are shown as ordinary files in a folder view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerVisibility {
    /// Markers are filtered out of listings
    #[default]
    Hidden,
    /// Markers are listed like any other file
    Visible,
}

/// The zero-byte object that keeps an empty folder visible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryMarker {
    name: String,
}

impl DirectoryMarker {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object key of the marker inside `folder`
    pub fn key_for(&self, folder: &FolderPath) -> String {
        path::object_key(folder, &self.name)
    }

    /// Whether a listed file name is this marker
    pub fn is_marker(&self, name: &str) -> bool {
        name == self.name
    }
}

impl Default for DirectoryMarker {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_NAME)
    }
}

/// Outcome of removing a folder's objects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovedFolder {
    /// Keys removed by the bulk remove, markers of subfolders included
    pub removed: Vec<String>,
    /// Whether the folder's own marker was found and removed
    pub marker_removed: bool,
    /// Some directory filled its listing page; objects beyond it remain
    pub truncated: bool,
}

/// Creates and removes placeholder markers
pub struct PlaceholderManager {
    store: Arc<dyn ObjectStore>,
    marker: DirectoryMarker,
    page_limit: usize,
}

impl PlaceholderManager {
    pub fn new(store: Arc<dyn ObjectStore>, marker: DirectoryMarker, page_limit: usize) -> Self {
        Self {
            store,
            marker,
            page_limit,
        }
    }

    pub fn marker(&self) -> &DirectoryMarker {
        &self.marker
    }

    /// Make `folder` exist by uploading its marker
    ///
    /// Any object already under the prefix, or a marker upload refused by
    /// the store, is reported as `Error::Conflict`.
    pub async fn ensure_folder(&self, folder: &FolderPath) -> Result<()> {
        if folder.is_root() {
            return Err(Error::InvalidPath("The root folder always exists".into()));
        }

        let existing = self.store.list(folder, ListOptions::page(1)).await?;
        if !existing.is_empty() {
            return Err(Error::Conflict(format!("Folder '{folder}' already exists")));
        }

        let key = self.marker.key_for(folder);
        tracing::debug!(%key, "uploading folder marker");
        self.store
            .upload(&key, Vec::new(), UploadOptions::create_only(None))
            .await
    }

    /// Create a folder named `name` inside the folder shown by `parent`
    pub async fn create_folder(&self, parent: &Listing, name: &str) -> Result<FolderPath> {
        let name = name.trim();
        path::validate_name(name)?;
        if parent.find(name, None).is_some() {
            return Err(ValidationError::Duplicate(name.to_string()).into());
        }

        let folder = parent.folder.child(name)?;
        self.ensure_folder(&folder).await?;
        tracing::info!(%folder, "created folder");
        Ok(folder)
    }

    /// Remove every object under `folder`, then its marker
    ///
    /// Listing or bulk-remove failures return before the marker is touched,
    /// so a partly emptied folder stays visible. A missing marker is fine.
    pub async fn remove_folder(&self, folder: &FolderPath) -> Result<RemovedFolder> {
        if folder.is_root() {
            return Err(Error::InvalidPath("The root folder cannot be removed".into()));
        }

        let marker_key = self.marker.key_for(folder);
        let subtree = subtree_keys(self.store.as_ref(), folder, self.page_limit).await?;
        let (markers, contents): (Vec<String>, Vec<String>) =
            subtree.keys.into_iter().partition(|k| *k == marker_key);

        if !contents.is_empty() {
            tracing::debug!(%folder, count = contents.len(), "bulk removing folder contents");
            self.store.remove(&contents).await?;
        }

        let marker_removed = !markers.is_empty();
        if marker_removed {
            self.store.remove(&markers).await?;
        }

        Ok(RemovedFolder {
            removed: contents,
            marker_removed,
            truncated: subtree.truncated,
        })
    }
}
