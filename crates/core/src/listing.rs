//! Unified folder listing
//!
//! Merges one page of object store entries with the catalog rows filed under
//! the same folder into a single ordered view. Every call takes a fresh
//! snapshot; nothing is cached between calls.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;

use crate::config::EngineSettings;
use crate::entry::{ListingEntry, StorageEntry};
use crate::error::Result;
use crate::path::{self, FolderPath};
use crate::placeholder::MarkerVisibility;
use crate::traits::{ListOptions, MetadataCatalog, ObjectStore};

/// A snapshot of one folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Listing {
    /// The listed folder
    pub folder: FolderPath,

    /// Folders first, then files and catalog assets, each sorted by name
    /// ignoring case
    pub entries: Vec<ListingEntry>,

    /// Raw number of store entries returned, markers included
    pub store_count: usize,

    /// Number of catalog rows returned
    pub catalog_count: usize,

    /// The store returned a full page, so entries beyond it were not seen
    pub truncated: bool,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether either backing store reported anything for this folder
    ///
    /// A folder holding only a hidden marker has no entries but still exists.
    pub fn has_backing(&self) -> bool {
        self.store_count > 0 || self.catalog_count > 0
    }

    /// Case-insensitive lookup, skipping the entry named exactly `except`
    pub fn find(&self, name: &str, except: Option<&str>) -> Option<&ListingEntry> {
        self.entries
            .iter()
            .filter(|e| except != Some(e.name()))
            .find(|e| e.same_name(name))
    }

    /// Exact lookup by name
    pub fn get(&self, name: &str) -> Option<&ListingEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn folders(&self) -> impl Iterator<Item = &ListingEntry> {
        self.entries.iter().filter(|e| e.is_folder())
    }

    pub fn files(&self) -> impl Iterator<Item = &ListingEntry> {
        self.entries.iter().filter(|e| !e.is_folder())
    }
}

/// Result of resolving which folder a view should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedView {
    /// Folder the caller asked for
    pub requested: FolderPath,

    /// Listing to render; its folder is the parent when `navigated_up`
    pub listing: Listing,

    /// The requested folder was gone and its parent was listed instead
    pub navigated_up: bool,
}

/// Builds merged folder views from the two backing stores
pub struct ListingEngine {
    store: Arc<dyn ObjectStore>,
    catalog: Arc<dyn MetadataCatalog>,
    settings: EngineSettings,
}

impl ListingEngine {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        catalog: Arc<dyn MetadataCatalog>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            catalog,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// List `folder` from both stores and merge the results
    pub async fn list(&self, folder: &FolderPath) -> Result<Listing> {
        let page_limit = self.settings.page_limit;
        let objects = self
            .store
            .list(folder, ListOptions::page(page_limit))
            .await?;
        let assets = self
            .catalog
            .list_folder(&self.settings.owner_id, folder)
            .await?;

        let store_count = objects.len();
        let catalog_count = assets.len();
        let show_markers = self.settings.marker_visibility == MarkerVisibility::Visible;

        let mut folders = Vec::new();
        let mut files = Vec::new();
        for object in objects {
            if object.is_folder() {
                folders.push(ListingEntry::Folder(StorageEntry::folder(
                    folder,
                    object.name,
                )));
                continue;
            }
            if !show_markers && self.settings.marker.is_marker(&object.name) {
                continue;
            }
            let mut entry = StorageEntry::file(folder, object.name, object.size);
            entry.last_modified = object.last_modified;
            files.push(ListingEntry::ObjectFile(entry));
        }
        files.extend(assets.into_iter().map(ListingEntry::CatalogAsset));

        sort_entries(&mut folders);
        sort_entries(&mut files);
        folders.append(&mut files);

        tracing::debug!(
            %folder,
            entries = folders.len(),
            store_count,
            catalog_count,
            "listed folder"
        );

        Ok(Listing {
            folder: folder.clone(),
            entries: folders,
            store_count,
            catalog_count,
            truncated: store_count >= page_limit,
        })
    }

    /// List `folder`, falling back to its parent when it no longer exists
    ///
    /// A non-root folder for which neither store returns anything is taken
    /// to have been deleted elsewhere. The parent is listed once; there is
    /// no second hop even if the parent is empty too.
    pub async fn resolve(&self, folder: &FolderPath) -> Result<ResolvedView> {
        let listing = self.list(folder).await?;
        if folder.is_root() || listing.has_backing() {
            return Ok(ResolvedView {
                requested: folder.clone(),
                listing,
                navigated_up: false,
            });
        }

        let parent = folder.parent();
        tracing::info!(%folder, %parent, "folder is empty, showing parent instead");
        let listing = self.list(&parent).await?;
        Ok(ResolvedView {
            requested: folder.clone(),
            listing,
            navigated_up: true,
        })
    }
}

fn sort_entries(entries: &mut [ListingEntry]) {
    entries.sort_by(|a, b| {
        a.sort_key()
            .cmp(&b.sort_key())
            .then_with(|| a.name().cmp(b.name()))
    });
}

/// Keys of every object under a folder, as found by [`subtree_keys`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subtree {
    pub keys: Vec<String>,
    /// At least one directory filled its page, so keys beyond it were missed
    pub truncated: bool,
}

/// Keys of every object under `folder`
///
/// Each directory is listed with a single page of `page_limit` entries;
/// anything beyond that page is not seen.
pub async fn subtree_keys(
    store: &dyn ObjectStore,
    folder: &FolderPath,
    page_limit: usize,
) -> Result<Subtree> {
    let mut subtree = Subtree::default();
    let mut pending = VecDeque::from([folder.clone()]);

    while let Some(dir) = pending.pop_front() {
        let objects = store.list(&dir, ListOptions::page(page_limit)).await?;
        if objects.len() >= page_limit {
            tracing::warn!(folder = %dir, page_limit, "folder listing truncated");
            subtree.truncated = true;
        }
        for object in objects {
            if object.is_folder() {
                pending.push_back(dir.child(&object.name)?);
            } else {
                subtree.keys.push(path::object_key(&dir, &object.name));
            }
        }
    }

    Ok(subtree)
}

#[cfg(test)]
impl Listing {
    /// Store-only snapshot taken through a default engine
    pub(crate) async fn for_test(
        folder: FolderPath,
        store: &Arc<crate::testing::MemoryStore>,
    ) -> Self {
        let engine = ListingEngine::new(
            store.clone(),
            Arc::new(crate::testing::MemoryCatalog::new()),
            EngineSettings::for_test(),
        );
        engine.list(&folder).await.unwrap()
    }
}
