//! Preview handles for the folder currently on screen
//!
//! The cache belongs to one folder view. Switching folders releases every
//! handle of the previous folder before the new one is admitted, so at most
//! one folder's previews are held at a time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entry::{ListingEntry, MediaType};
use crate::error::{Error, Result};
use crate::listing::Listing;
use crate::path::FolderPath;
use crate::traits::ObjectStore;

/// Where a preview's pixels come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSource {
    /// Bytes downloaded from the object store
    Bytes(Vec<u8>),
    /// Media hosted elsewhere, shown straight from its URL
    RemoteUrl(String),
}

/// A loaded preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub name: String,
    pub source: PreviewSource,
}

impl Preview {
    /// Bytes held in memory
    pub fn size(&self) -> usize {
        match &self.source {
            PreviewSource::Bytes(data) => data.len(),
            PreviewSource::RemoteUrl(_) => 0,
        }
    }
}

/// Lazily loaded previews of one folder's images
pub struct ThumbnailCache {
    store: Arc<dyn ObjectStore>,
    folder: Option<FolderPath>,
    images: HashMap<String, ListingEntry>,
    handles: HashMap<String, Arc<Preview>>,
    bytes: usize,
    max_bytes: Option<usize>,
}

impl ThumbnailCache {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            folder: None,
            images: HashMap::new(),
            handles: HashMap::new(),
            bytes: 0,
            max_bytes: None,
        }
    }

    /// Refuse previews that would take the cache past `max_bytes`
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Folder the cache currently serves
    pub fn folder(&self) -> Option<&FolderPath> {
        self.folder.as_ref()
    }

    /// Number of loaded previews
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn bytes_held(&self) -> usize {
        self.bytes
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// Switch to a new folder snapshot
    pub fn refresh(&mut self, listing: &Listing) {
        self.release_all();
        self.images = listing
            .entries
            .iter()
            .filter(|e| e.media_type() == Some(MediaType::Image))
            .map(|e| (e.name().to_string(), e.clone()))
            .collect();
        self.folder = Some(listing.folder.clone());
        tracing::debug!(folder = %listing.folder, images = self.images.len(), "thumbnail cache refreshed");
    }

    /// Preview handle for an image of the current folder
    ///
    /// Stored images are downloaded on first request. Catalog images are
    /// never downloaded; their handle carries the remote URL.
    pub async fn preview(&mut self, entry: &ListingEntry) -> Result<Arc<Preview>> {
        let name = entry.name();
        if let Some(handle) = self.handles.get(name) {
            return Ok(handle.clone());
        }
        if self.images.get(name) != Some(entry) {
            return Err(Error::General(format!(
                "'{name}' is not an image of the current folder"
            )));
        }

        let source = match entry {
            ListingEntry::ObjectFile(file) => {
                if let Some(size) = file.size_hint {
                    self.check_budget(name, size as usize)?;
                }
                tracing::debug!(key = %file.path, "downloading preview");
                let data = self.store.download(&file.path).await?;
                self.check_budget(name, data.len())?;
                PreviewSource::Bytes(data)
            }
            ListingEntry::CatalogAsset(asset) => PreviewSource::RemoteUrl(asset.url.clone()),
            ListingEntry::Folder(_) => {
                return Err(Error::General(format!("'{name}' is a folder")));
            }
        };

        let preview = Arc::new(Preview {
            name: name.to_string(),
            source,
        });
        self.bytes += preview.size();
        self.handles.insert(name.to_string(), preview.clone());
        Ok(preview)
    }

    /// Drop every handle held by the cache
    pub fn release_all(&mut self) {
        if !self.handles.is_empty() {
            tracing::debug!(count = self.handles.len(), bytes = self.bytes, "releasing previews");
        }
        self.handles.clear();
        self.images.clear();
        self.folder = None;
        self.bytes = 0;
    }

    fn check_budget(&self, name: &str, size: usize) -> Result<()> {
        match self.max_bytes {
            Some(max) if self.bytes + size > max => Err(Error::General(format!(
                "Preview of '{name}' would exceed the {max} byte preview budget"
            ))),
            _ => Ok(()),
        }
    }
}

impl Drop for ThumbnailCache {
    fn drop(&mut self) {
        self.release_all();
    }
}
