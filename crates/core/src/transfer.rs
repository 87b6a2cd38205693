//! Rename, move, delete and upload operations
//!
//! The object store has no rename. Every rename or move of a stored file is
//! a copy-then-delete sequence: download, upload under the new key, then
//! remove the original. Folders are moved object by object followed by one
//! bulk remove. There is no rollback; a sequence that stops half way is
//! reported as [`Error::PartiallyCompleted`].
//!
//! All name and location checks run against the caller's [`Listing`] before
//! any adapter call, so a rejected request never touches either store.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::EngineSettings;
use crate::entry::{CatalogAsset, ListingEntry, NewAsset};
use crate::error::{Error, PartialFailure, Result, ValidationError};
use crate::listing::{Listing, ListingEngine, subtree_keys};
use crate::path::{self, FolderPath};
use crate::placeholder::{PlaceholderManager, RemovedFolder};
use crate::traits::{MetadataCatalog, ObjectStore, UploadOptions};

/// A local file waiting to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub name: String,
    pub data: Vec<u8>,
}

impl PendingUpload {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// A file of a batch that could not be uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpload {
    pub name: String,
    pub error: String,
}

/// Per-file outcome of [`TransferEngine::upload_batch`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Keys written
    pub uploaded: Vec<String>,
    /// Names skipped because the folder already had them
    pub skipped: Vec<String>,
    pub failed: Vec<FailedUpload>,
}

impl BatchReport {
    /// Every file was uploaded
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Outcome of a folder rename or move
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderTransfer {
    pub from: FolderPath,
    pub to: FolderPath,
    /// Keys written under the new prefix
    pub copied: Vec<String>,
    /// Catalog rows re-pointed into the new subtree
    pub relocated_assets: usize,
    /// Some directory filled its listing page; objects beyond it stayed put
    pub truncated: bool,
}

/// Outcome of deleting a folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderDeletion {
    pub removed: Vec<String>,
    pub marker_removed: bool,
    pub deleted_assets: usize,
    /// Some directory filled its listing page; objects beyond it remain
    pub truncated: bool,
}

/// Runs mutating operations against both backing stores
pub struct TransferEngine {
    store: Arc<dyn ObjectStore>,
    catalog: Arc<dyn MetadataCatalog>,
    listings: ListingEngine,
    placeholders: PlaceholderManager,
    settings: EngineSettings,
}

impl TransferEngine {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        catalog: Arc<dyn MetadataCatalog>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            listings: ListingEngine::new(store.clone(), catalog.clone(), settings.clone()),
            placeholders: PlaceholderManager::new(
                store.clone(),
                settings.marker.clone(),
                settings.page_limit,
            ),
            store,
            catalog,
            settings,
        }
    }

    pub fn placeholders(&self) -> &PlaceholderManager {
        &self.placeholders
    }

    pub fn listings(&self) -> &ListingEngine {
        &self.listings
    }

    /// Rename the stored file `old` inside the listed folder
    ///
    /// Returns the new object key.
    pub async fn rename_file(&self, listing: &Listing, old: &str, new: &str) -> Result<String> {
        let new = new.trim();
        check_rename(listing, old, new, true)?;
        require_file(listing, old)?;

        let from = path::object_key(&listing.folder, old);
        let to = path::object_key(&listing.folder, new);
        self.copy_then_delete(&from, &to, "rename").await?;
        tracing::info!(%from, %to, "renamed file");
        Ok(to)
    }

    /// Move the stored file `name` from the listed folder into `destination`
    ///
    /// The destination is listed once to check for a name collision.
    pub async fn move_file(
        &self,
        listing: &Listing,
        name: &str,
        destination: &FolderPath,
    ) -> Result<String> {
        if destination == &listing.folder {
            return Err(ValidationError::AlreadyInFolder(name.to_string()).into());
        }
        require_file(listing, name)?;
        self.check_destination(name, destination).await?;

        let from = path::object_key(&listing.folder, name);
        let to = path::object_key(destination, name);
        self.copy_then_delete(&from, &to, "move").await?;
        tracing::info!(%from, %to, "moved file");
        Ok(to)
    }

    /// Rename the subfolder `old` of the listed folder
    pub async fn rename_folder(
        &self,
        listing: &Listing,
        old: &str,
        new: &str,
    ) -> Result<FolderTransfer> {
        let new = new.trim();
        check_rename(listing, old, new, false)?;
        require_folder(listing, old)?;

        let from = listing.folder.child(old)?;
        let to = listing.folder.child(new)?;
        self.transfer_subtree(&from, &to, "rename folder").await
    }

    /// Move the subfolder `name` of the listed folder into `destination`
    pub async fn move_folder(
        &self,
        listing: &Listing,
        name: &str,
        destination: &FolderPath,
    ) -> Result<FolderTransfer> {
        let from = listing.folder.child(name)?;
        if path::is_descendant_or_self(destination, &from) {
            return Err(ValidationError::IntoItself {
                item: from.to_string(),
                target: destination.to_string(),
            }
            .into());
        }
        if destination == &listing.folder {
            return Err(ValidationError::AlreadyInFolder(name.to_string()).into());
        }
        require_folder(listing, name)?;
        self.check_destination(name, destination).await?;

        let to = destination.child(name)?;
        self.transfer_subtree(&from, &to, "move folder").await
    }

    /// Remove one stored file
    pub async fn delete_file(&self, key: &str) -> Result<()> {
        tracing::debug!(%key, "removing file");
        self.store.remove(&[key.to_string()]).await
    }

    /// Remove a folder, everything beneath it, and the catalog rows filed there
    pub async fn delete_folder(&self, folder: &FolderPath) -> Result<FolderDeletion> {
        let RemovedFolder {
            removed,
            marker_removed,
            truncated,
        } = self.placeholders.remove_folder(folder).await?;

        let assets = match self
            .catalog
            .list_subtree(&self.settings.owner_id, folder)
            .await
        {
            Ok(assets) => assets,
            Err(e) => return Err(catalog_left_behind("delete folder", &removed, Vec::new(), e)),
        };

        let mut deleted_assets = 0;
        for (i, asset) in assets.iter().enumerate() {
            if let Err(e) = self.catalog.delete(&asset.id).await {
                let pending = assets[i..].iter().map(|a| a.id.clone()).collect();
                return Err(catalog_left_behind("delete folder", &removed, pending, e));
            }
            deleted_assets += 1;
        }

        tracing::info!(%folder, objects = removed.len(), deleted_assets, "deleted folder");
        Ok(FolderDeletion {
            removed,
            marker_removed,
            deleted_assets,
            truncated,
        })
    }

    /// Give a catalog row a new display name
    pub async fn rename_asset(&self, listing: &Listing, asset: &CatalogAsset, new: &str) -> Result<()> {
        let new = new.trim();
        check_rename(listing, &asset.name, new, true)?;
        self.catalog.rename(&asset.id, new).await?;
        tracing::info!(id = %asset.id, from = %asset.name, to = %new, "renamed asset");
        Ok(())
    }

    /// File a catalog row under another folder
    pub async fn move_asset(
        &self,
        listing: &Listing,
        asset: &CatalogAsset,
        destination: &FolderPath,
    ) -> Result<()> {
        if destination == &listing.folder {
            return Err(ValidationError::AlreadyInFolder(asset.name.clone()).into());
        }
        self.check_destination(&asset.name, destination).await?;
        self.catalog.relocate(&asset.id, destination).await?;
        tracing::info!(id = %asset.id, %destination, "moved asset");
        Ok(())
    }

    /// Delete a catalog row; the media it points at is left alone
    pub async fn delete_asset(&self, asset: &CatalogAsset) -> Result<()> {
        self.catalog.delete(&asset.id).await
    }

    /// Rename any entry of the listed folder
    pub async fn rename(&self, listing: &Listing, name: &str, new: &str) -> Result<()> {
        match lookup(listing, name)? {
            ListingEntry::Folder(_) => self.rename_folder(listing, name, new).await.map(|_| ()),
            ListingEntry::ObjectFile(_) => self.rename_file(listing, name, new).await.map(|_| ()),
            ListingEntry::CatalogAsset(asset) => self.rename_asset(listing, asset, new).await,
        }
    }

    /// Move any entry of the listed folder into `destination`
    pub async fn move_entry(
        &self,
        listing: &Listing,
        name: &str,
        destination: &FolderPath,
    ) -> Result<()> {
        match lookup(listing, name)? {
            ListingEntry::Folder(_) => self
                .move_folder(listing, name, destination)
                .await
                .map(|_| ()),
            ListingEntry::ObjectFile(_) => {
                self.move_file(listing, name, destination).await.map(|_| ())
            }
            ListingEntry::CatalogAsset(asset) => {
                self.move_asset(listing, asset, destination).await
            }
        }
    }

    /// Delete any entry of the listed folder
    pub async fn delete(&self, listing: &Listing, name: &str) -> Result<()> {
        match lookup(listing, name)? {
            ListingEntry::Folder(_) => {
                let folder = listing.folder.child(name)?;
                self.delete_folder(&folder).await.map(|_| ())
            }
            ListingEntry::ObjectFile(entry) => self.delete_file(&entry.path).await,
            ListingEntry::CatalogAsset(asset) => self.delete_asset(asset).await,
        }
    }

    /// Upload local files into the listed folder one after another
    ///
    /// Names already present in the snapshot, or uploaded earlier in the
    /// same batch, are skipped without contacting the store. A failed file
    /// does not stop the batch.
    pub async fn upload_batch(&self, listing: &Listing, files: Vec<PendingUpload>) -> Result<BatchReport> {
        let mut taken: HashSet<String> = listing
            .entries
            .iter()
            .map(|e| e.name().to_lowercase())
            .collect();
        let mut report = BatchReport::default();

        for file in files {
            let name = file.name.trim().to_string();
            if let Err(e) = path::validate_name(&name) {
                report.failed.push(FailedUpload {
                    name,
                    error: e.to_string(),
                });
                continue;
            }
            if !taken.insert(name.to_lowercase()) {
                tracing::warn!(%name, folder = %listing.folder, "skipping duplicate upload");
                report.skipped.push(name);
                continue;
            }

            let key = path::object_key(&listing.folder, &name);
            tracing::debug!(%key, bytes = file.data.len(), "uploading");
            let options = UploadOptions::create_only(content_type(&key));
            match self.store.upload(&key, file.data, options).await {
                Ok(()) => report.uploaded.push(key),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "upload failed");
                    taken.remove(&name.to_lowercase());
                    report.failed.push(FailedUpload {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            folder = %listing.folder,
            uploaded = report.uploaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "batch upload finished"
        );
        Ok(report)
    }

    /// Add a catalog row pointing at externally hosted media
    pub async fn register_asset(&self, listing: &Listing, name: &str, url: &str) -> Result<CatalogAsset> {
        let name = name.trim();
        path::validate_name(name)?;
        if listing.find(name, None).is_some() {
            return Err(ValidationError::Duplicate(name.to_string()).into());
        }
        let url = url::Url::parse(url)?;

        let asset = NewAsset::new(
            self.settings.owner_id.clone(),
            listing.folder.clone(),
            name,
            url.as_str(),
        );
        let asset = self.catalog.insert(asset).await?;
        tracing::info!(id = %asset.id, folder = %asset.folder, "registered asset");
        Ok(asset)
    }

    async fn check_destination(&self, name: &str, destination: &FolderPath) -> Result<()> {
        let target = self.listings.list(destination).await?;
        if target.find(name, None).is_some() {
            return Err(ValidationError::Duplicate(name.to_string()).into());
        }
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        tracing::debug!(%from, %to, "copying object");
        let data = self.store.download(from).await?;
        self.store
            .upload(to, data, UploadOptions::create_only(content_type(to)))
            .await
    }

    async fn copy_then_delete(&self, from: &str, to: &str, operation: &str) -> Result<()> {
        self.copy(from, to).await?;
        if let Err(e) = self.store.remove(&[from.to_string()]).await {
            tracing::warn!(%from, %to, error = %e, "copied but could not remove original");
            return Err(Error::partial(PartialFailure {
                operation: operation.to_string(),
                completed: vec![to.to_string()],
                pending: Vec::new(),
                cause: format!("removing '{from}' failed: {e}"),
            }));
        }
        Ok(())
    }

    async fn transfer_subtree(
        &self,
        from: &FolderPath,
        to: &FolderPath,
        operation: &str,
    ) -> Result<FolderTransfer> {
        let subtree = subtree_keys(self.store.as_ref(), from, self.settings.page_limit).await?;
        let keys = subtree.keys;
        let old_prefix = from.as_prefix();
        let new_prefix = to.as_prefix();

        let mut copied = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let rest = key.strip_prefix(&old_prefix).unwrap_or(key);
            let new_key = format!("{new_prefix}{rest}");
            if let Err(e) = self.copy(key, &new_key).await {
                if copied.is_empty() {
                    return Err(e);
                }
                tracing::warn!(%from, %to, copied = copied.len(), error = %e, "folder copy aborted");
                return Err(Error::partial(PartialFailure {
                    operation: operation.to_string(),
                    completed: copied,
                    pending: keys[i..].to_vec(),
                    cause: e.to_string(),
                }));
            }
            copied.push(new_key);
        }

        if !keys.is_empty() {
            tracing::debug!(%from, count = keys.len(), "bulk removing originals");
            if let Err(e) = self.store.remove(&keys).await {
                tracing::warn!(%from, %to, error = %e, "originals left in place");
                return Err(Error::partial(PartialFailure {
                    operation: operation.to_string(),
                    completed: copied,
                    pending: Vec::new(),
                    cause: format!("removing the originals failed: {e}"),
                }));
            }
        }

        let relocated_assets = self.relocate_assets(from, to, operation, &copied).await?;
        tracing::info!(%from, %to, objects = copied.len(), relocated_assets, "transferred folder");
        Ok(FolderTransfer {
            from: from.clone(),
            to: to.clone(),
            copied,
            relocated_assets,
            truncated: subtree.truncated,
        })
    }

    async fn relocate_assets(
        &self,
        from: &FolderPath,
        to: &FolderPath,
        operation: &str,
        copied: &[String],
    ) -> Result<usize> {
        let assets = self
            .catalog
            .list_subtree(&self.settings.owner_id, from)
            .await
            .map_err(|e| catalog_left_behind(operation, copied, Vec::new(), e))?;

        for (i, asset) in assets.iter().enumerate() {
            let Some(folder) = asset.folder.rebase(from, to) else {
                continue;
            };
            if let Err(e) = self.catalog.relocate(&asset.id, &folder).await {
                let pending = assets[i..].iter().map(|a| a.id.clone()).collect();
                return Err(catalog_left_behind(operation, copied, pending, e));
            }
        }
        Ok(assets.len())
    }
}

fn lookup<'a>(listing: &'a Listing, name: &str) -> Result<&'a ListingEntry> {
    listing
        .get(name)
        .ok_or_else(|| Error::NotFound(format!("'{name}' in {}", listing.folder)))
}

fn require_file(listing: &Listing, name: &str) -> Result<()> {
    match lookup(listing, name)? {
        ListingEntry::ObjectFile(_) => Ok(()),
        _ => Err(Error::InvalidPath(format!("'{name}' is not a stored file"))),
    }
}

fn require_folder(listing: &Listing, name: &str) -> Result<()> {
    match lookup(listing, name)? {
        ListingEntry::Folder(_) => Ok(()),
        _ => Err(Error::InvalidPath(format!("'{name}' is not a folder"))),
    }
}

/// Name checks shared by every rename
fn check_rename(listing: &Listing, old: &str, new: &str, keep_extension: bool) -> Result<()> {
    path::validate_name(new)?;
    if new == old {
        return Err(ValidationError::Unchanged(old.to_string()).into());
    }
    if keep_extension {
        let from = path::extension(old);
        let to = path::extension(new);
        if from != to {
            return Err(ValidationError::ExtensionChanged {
                from: from.unwrap_or_default(),
                to: to.unwrap_or_default(),
            }
            .into());
        }
    }
    if listing.find(new, Some(old)).is_some() {
        return Err(ValidationError::Duplicate(new.to_string()).into());
    }
    Ok(())
}

fn content_type(key: &str) -> Option<String> {
    mime_guess::from_path(key)
        .first_raw()
        .map(str::to_string)
}

fn catalog_left_behind(
    operation: &str,
    completed: &[String],
    pending: Vec<String>,
    cause: Error,
) -> Error {
    tracing::warn!(operation, error = %cause, "store updated but catalog rows were not");
    Error::partial(PartialFailure {
        operation: operation.to_string(),
        completed: completed.to_vec(),
        pending,
        cause: format!("catalog update failed: {cause}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MemoryCatalog, MemoryStore};
    use crate::traits::MockObjectStore;

    fn folder(s: &str) -> FolderPath {
        FolderPath::normalize(s).unwrap()
    }

    fn engine(store: Arc<MemoryStore>, catalog: Arc<MemoryCatalog>) -> TransferEngine {
        TransferEngine::new(store, catalog, EngineSettings::for_test())
    }

    fn store_only(store: &Arc<MemoryStore>) -> TransferEngine {
        engine(store.clone(), Arc::new(MemoryCatalog::new()))
    }

    /// Engine over a mock with no expectations; any store call panics
    fn untouchable() -> TransferEngine {
        TransferEngine::new(
            Arc::new(MockObjectStore::new()),
            Arc::new(MemoryCatalog::new()),
            EngineSettings::for_test(),
        )
    }

    async fn snapshot(store: &Arc<MemoryStore>, at: &str) -> Listing {
        let listing = Listing::for_test(folder(at), store).await;
        store.clear_calls();
        listing
    }

    async fn snapshot_with(
        store: &Arc<MemoryStore>,
        catalog: &Arc<MemoryCatalog>,
        at: &str,
    ) -> Listing {
        let listing = ListingEngine::new(store.clone(), catalog.clone(), EngineSettings::for_test())
            .list(&folder(at))
            .await
            .unwrap();
        store.clear_calls();
        listing
    }

    fn validation(result: Result<impl std::fmt::Debug>) -> ValidationError {
        match result {
            Err(Error::Validation(v)) => v,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    fn partial(result: Result<impl std::fmt::Debug>) -> PartialFailure {
        match result {
            Err(Error::PartiallyCompleted(p)) => *p,
            other => panic!("expected a partial failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rename_file_copies_then_removes() {
        let store = Arc::new(MemoryStore::with_objects(&[("docs/a.txt", b"hello")]));
        let listing = snapshot(&store, "docs").await;

        let key = store_only(&store)
            .rename_file(&listing, "a.txt", "b.txt")
            .await
            .unwrap();

        assert_eq!(key, "docs/b.txt");
        assert_eq!(store.get("docs/b.txt"), Some(b"hello".to_vec()));
        assert_eq!(store.get("docs/a.txt"), None);
        assert_eq!(
            store.calls(),
            vec![
                Call::Download("docs/a.txt".into()),
                Call::Upload("docs/b.txt".into()),
                Call::Remove(vec!["docs/a.txt".into()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_rename_file_rejections_make_no_calls() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("a.txt", b"a"),
            ("B.TXT", b"b"),
        ]));
        let listing = snapshot(&store, "").await;
        let engine = untouchable();

        assert_eq!(
            validation(engine.rename_file(&listing, "a.txt", "  ").await),
            ValidationError::EmptyName
        );
        assert_eq!(
            validation(engine.rename_file(&listing, "a.txt", "x/y.txt").await),
            ValidationError::InvalidName("x/y.txt".into())
        );
        assert_eq!(
            validation(engine.rename_file(&listing, "a.txt", "a.txt").await),
            ValidationError::Unchanged("a.txt".into())
        );
        assert_eq!(
            validation(engine.rename_file(&listing, "a.txt", "a.md").await),
            ValidationError::ExtensionChanged {
                from: "txt".into(),
                to: "md".into()
            }
        );
        assert_eq!(
            validation(engine.rename_file(&listing, "a.txt", "b.txt").await),
            ValidationError::Duplicate("b.txt".into())
        );
    }

    #[tokio::test]
    async fn test_rename_file_extension_compare_ignores_case() {
        let store = Arc::new(MemoryStore::with_objects(&[("cat.PNG", b"c")]));
        let listing = snapshot(&store, "").await;

        store_only(&store)
            .rename_file(&listing, "cat.PNG", "kitten.png")
            .await
            .unwrap();
        assert!(store.get("kitten.png").is_some());
    }

    #[tokio::test]
    async fn test_rename_file_case_only_change_is_allowed() {
        let store = Arc::new(MemoryStore::with_objects(&[("report.txt", b"r")]));
        let listing = snapshot(&store, "").await;

        store_only(&store)
            .rename_file(&listing, "report.txt", "Report.txt")
            .await
            .unwrap();
        assert_eq!(store.keys(), vec!["Report.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_rename_file_download_failure_changes_nothing() {
        let store = Arc::new(MemoryStore::with_objects(&[("a.txt", b"a")]));
        let listing = snapshot(&store, "").await;
        store.fail_download_of("a.txt");

        let result = store_only(&store).rename_file(&listing, "a.txt", "b.txt").await;
        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(store.upload_calls(), 0);
        assert_eq!(store.keys(), vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_rename_file_upload_failure_keeps_original() {
        let store = Arc::new(MemoryStore::with_objects(&[("a.txt", b"a")]));
        let listing = snapshot(&store, "").await;
        store.fail_upload_number(1);

        let result = store_only(&store).rename_file(&listing, "a.txt", "b.txt").await;
        assert!(matches!(result, Err(Error::Network(_))));
        assert!(store.remove_calls().is_empty());
        assert_eq!(store.keys(), vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_rename_file_remove_failure_is_partial() {
        let store = Arc::new(MemoryStore::with_objects(&[("a.txt", b"a")]));
        let listing = snapshot(&store, "").await;
        store.fail_removes();

        let failure = partial(store_only(&store).rename_file(&listing, "a.txt", "b.txt").await);
        assert_eq!(failure.completed, vec!["b.txt".to_string()]);
        assert!(failure.pending.is_empty());
        assert_eq!(store.keys(), vec!["a.txt".to_string(), "b.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_rename_of_unknown_entry_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let listing = snapshot(&store, "").await;

        let result = untouchable().rename_file(&listing, "ghost.txt", "spirit.txt").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_move_into_current_folder_makes_no_calls() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("a/f.txt", b"f"),
            ("a/sub/x", b"x"),
        ]));
        let listing = snapshot(&store, "a").await;
        let engine = untouchable();

        assert_eq!(
            validation(engine.move_file(&listing, "f.txt", &folder("a")).await),
            ValidationError::AlreadyInFolder("f.txt".into())
        );
        assert!(matches!(
            validation(engine.move_folder(&listing, "sub", &folder("a")).await),
            ValidationError::AlreadyInFolder(_)
        ));
    }

    #[tokio::test]
    async fn test_move_file_to_other_folder() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("a/f.txt", b"f"),
            ("b/.emptyFolderPlaceholder", b""),
        ]));
        let listing = snapshot(&store, "a").await;

        let key = store_only(&store)
            .move_file(&listing, "f.txt", &folder("b"))
            .await
            .unwrap();

        assert_eq!(key, "b/f.txt");
        assert_eq!(store.get("b/f.txt"), Some(b"f".to_vec()));
        assert!(store.keys_under("a/").is_empty());
        assert_eq!(store.calls()[0], Call::List("b".into()));
    }

    #[tokio::test]
    async fn test_move_file_collision_in_destination() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("a/f.txt", b"new"),
            ("b/F.TXT", b"old"),
        ]));
        let listing = snapshot(&store, "a").await;

        let result = store_only(&store).move_file(&listing, "f.txt", &folder("b")).await;
        assert_eq!(validation(result), ValidationError::Duplicate("f.txt".into()));
        assert_eq!(store.calls(), vec![Call::List("b".into())]);
        assert_eq!(store.get("b/F.TXT"), Some(b"old".to_vec()));
    }

    #[tokio::test]
    async fn test_rename_folder_moves_whole_subtree() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("f/a.txt", b"a"),
            ("f/.emptyFolderPlaceholder", b""),
            ("f/deep/b.txt", b"b"),
            ("f/deep/deeper/c.txt", b"c"),
            ("fx/keep.txt", b"k"),
        ]));
        let listing = snapshot(&store, "").await;

        let transfer = store_only(&store)
            .rename_folder(&listing, "f", "g")
            .await
            .unwrap();

        assert_eq!(transfer.to, folder("g"));
        assert!(store.keys_under("f/").is_empty());
        assert_eq!(
            store.keys_under("g/"),
            vec![
                "g/.emptyFolderPlaceholder".to_string(),
                "g/a.txt".to_string(),
                "g/deep/b.txt".to_string(),
                "g/deep/deeper/c.txt".to_string(),
            ]
        );
        assert_eq!(store.get("g/deep/deeper/c.txt"), Some(b"c".to_vec()));
        assert_eq!(store.get("fx/keep.txt"), Some(b"k".to_vec()));
        assert_eq!(store.remove_calls().len(), 1);
        assert!(!transfer.truncated);
    }

    #[tokio::test]
    async fn test_rename_folder_reports_truncated_subtree() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("f/1", b"1"),
            ("f/2", b"2"),
            ("f/3", b"3"),
        ]));
        let listing = snapshot(&store, "").await;
        let mut settings = EngineSettings::for_test();
        settings.page_limit = 2;
        let engine = TransferEngine::new(store.clone(), Arc::new(MemoryCatalog::new()), settings);

        let transfer = engine.rename_folder(&listing, "f", "g").await.unwrap();

        assert!(transfer.truncated);
        assert_eq!(transfer.copied, vec!["g/1".to_string(), "g/2".to_string()]);
        assert_eq!(store.keys_under("f/"), vec!["f/3".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_folder_reports_truncated_subtree() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("f/1", b"1"),
            ("f/2", b"2"),
            ("f/3", b"3"),
        ]));
        let mut settings = EngineSettings::for_test();
        settings.page_limit = 2;
        let engine = TransferEngine::new(store.clone(), Arc::new(MemoryCatalog::new()), settings);

        let deletion = engine.delete_folder(&folder("f")).await.unwrap();

        assert!(deletion.truncated);
        assert_eq!(store.keys_under("f/"), vec!["f/3".to_string()]);
    }

    #[tokio::test]
    async fn test_folder_copy_failure_stops_without_removing() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("f/1", b"1"),
            ("f/2", b"2"),
            ("f/3", b"3"),
        ]));
        let listing = snapshot(&store, "").await;
        store.fail_upload_number(2);

        let failure = partial(store_only(&store).rename_folder(&listing, "f", "g").await);

        assert_eq!(failure.completed, vec!["g/1".to_string()]);
        assert_eq!(failure.pending, vec!["f/2".to_string(), "f/3".to_string()]);
        assert_eq!(store.keys_under("g/"), vec!["g/1".to_string()]);
        assert_eq!(store.keys_under("f/").len(), 3);
        assert!(store.remove_calls().is_empty());
    }

    #[tokio::test]
    async fn test_folder_first_copy_failure_is_plain_error() {
        let store = Arc::new(MemoryStore::with_objects(&[("f/1", b"1")]));
        let listing = snapshot(&store, "").await;
        store.fail_download_of("f/1");

        let result = store_only(&store).rename_folder(&listing, "f", "g").await;
        assert!(matches!(result, Err(Error::Network(_))));
        assert!(store.keys_under("g/").is_empty());
    }

    #[tokio::test]
    async fn test_folder_bulk_remove_failure_duplicates_everything() {
        let store = Arc::new(MemoryStore::with_objects(&[("f/1", b"1"), ("f/2", b"2")]));
        let listing = snapshot(&store, "").await;
        store.fail_removes();

        let failure = partial(store_only(&store).rename_folder(&listing, "f", "g").await);
        assert_eq!(failure.completed.len(), 2);
        assert_eq!(store.keys_under("f/").len(), 2);
        assert_eq!(store.keys_under("g/").len(), 2);
    }

    #[tokio::test]
    async fn test_move_folder_into_itself_makes_no_calls() {
        let store = Arc::new(MemoryStore::with_objects(&[("p/f/a", b"a")]));
        let listing = snapshot(&store, "p").await;
        let engine = untouchable();

        assert!(matches!(
            validation(engine.move_folder(&listing, "f", &folder("p/f")).await),
            ValidationError::IntoItself { .. }
        ));
        assert!(matches!(
            validation(engine.move_folder(&listing, "f", &folder("p/f/inner")).await),
            ValidationError::IntoItself { .. }
        ));
    }

    #[tokio::test]
    async fn test_move_folder_to_sibling_with_similar_prefix() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("photos/a.png", b"a"),
            ("photos2/.emptyFolderPlaceholder", b""),
        ]));
        let listing = snapshot(&store, "").await;

        let transfer = store_only(&store)
            .move_folder(&listing, "photos", &folder("photos2"))
            .await
            .unwrap();
        assert_eq!(transfer.to, folder("photos2/photos"));
        assert!(store.get("photos2/photos/a.png").is_some());
        assert!(store.keys_under("photos/").is_empty());
    }

    #[tokio::test]
    async fn test_rename_folder_relocates_catalog_rows() {
        let store = Arc::new(MemoryStore::with_objects(&[("f/a.txt", b"a")]));
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.add("owner", "f", "top.mp4");
        catalog.add("owner", "f/deep", "nested.png");
        catalog.add("owner", "fx", "untouched.png");
        let listing = snapshot_with(&store, &catalog, "").await;

        let transfer = engine(store.clone(), catalog.clone())
            .rename_folder(&listing, "f", "g")
            .await
            .unwrap();

        assert_eq!(transfer.relocated_assets, 2);
        let folders: Vec<(String, String)> = catalog
            .rows()
            .into_iter()
            .map(|a| (a.name, a.folder.as_str().to_string()))
            .collect();
        assert_eq!(
            folders,
            vec![
                ("top.mp4".to_string(), "g".to_string()),
                ("nested.png".to_string(), "g/deep".to_string()),
                ("untouched.png".to_string(), "fx".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_folder_removes_contents_marker_and_rows() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("f/a", b"a"),
            ("f/b", b"b"),
            ("f/.emptyFolderPlaceholder", b""),
            ("keep.txt", b"k"),
        ]));
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.add("owner", "f", "clip.mp4");
        catalog.add("owner", "", "root.png");
        let engine = engine(store.clone(), catalog.clone());

        let deletion = engine.delete_folder(&folder("f")).await.unwrap();

        assert_eq!(deletion.removed, vec!["f/a".to_string(), "f/b".to_string()]);
        assert!(deletion.marker_removed);
        assert_eq!(deletion.deleted_assets, 1);
        assert!(!deletion.truncated);
        assert_eq!(
            store.remove_calls(),
            vec![
                vec!["f/a".to_string(), "f/b".to_string()],
                vec!["f/.emptyFolderPlaceholder".to_string()],
            ]
        );

        let listings = ListingEngine::new(store.clone(), catalog.clone(), EngineSettings::for_test());
        assert!(!listings.list(&folder("f")).await.unwrap().has_backing());
        let root = listings.list(&FolderPath::root()).await.unwrap();
        assert!(root.get("f").is_none());
        assert_eq!(catalog.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_folder_catalog_failure_is_partial() {
        let store = Arc::new(MemoryStore::with_objects(&[("f/a", b"a")]));
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.fail_all();

        let failure = partial(engine(store.clone(), catalog).delete_folder(&folder("f")).await);
        assert_eq!(failure.completed, vec!["f/a".to_string()]);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_delete_file_is_single_remove() {
        let store = Arc::new(MemoryStore::with_objects(&[("a/x.txt", b"x")]));
        store_only(&store).delete_file("a/x.txt").await.unwrap();
        assert_eq!(store.calls(), vec![Call::Remove(vec!["a/x.txt".into()])]);
    }

    #[tokio::test]
    async fn test_asset_operations_never_touch_the_store() {
        let catalog = Arc::new(MemoryCatalog::new());
        let asset = catalog.add("owner", "", "clip.mp4");
        let listing = Listing {
            folder: FolderPath::root(),
            entries: vec![ListingEntry::CatalogAsset(asset.clone())],
            catalog_count: 1,
            ..Listing::default()
        };
        let engine = TransferEngine::new(
            Arc::new(MockObjectStore::new()),
            catalog.clone(),
            EngineSettings::for_test(),
        );

        engine.rename_asset(&listing, &asset, "movie.mp4").await.unwrap();
        assert_eq!(catalog.rows()[0].name, "movie.mp4");

        assert!(matches!(
            validation(engine.rename_asset(&listing, &asset, "movie.mov").await),
            ValidationError::ExtensionChanged { .. }
        ));

        engine.delete_asset(&asset).await.unwrap();
        assert!(catalog.rows().is_empty());
    }

    #[tokio::test]
    async fn test_move_asset_checks_destination() {
        let store = Arc::new(MemoryStore::with_objects(&[("dest/other.png", b"o")]));
        let catalog = Arc::new(MemoryCatalog::new());
        let asset = catalog.add("owner", "", "clip.mp4");
        let listing = snapshot_with(&store, &catalog, "").await;
        let engine = engine(store.clone(), catalog.clone());

        engine.move_asset(&listing, &asset, &folder("dest")).await.unwrap();
        assert_eq!(catalog.rows()[0].folder, folder("dest"));
        assert_eq!(store.upload_calls(), 0);
        assert!(store.remove_calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatching_by_entry_kind() {
        let store = Arc::new(MemoryStore::with_objects(&[
            ("docs/a.txt", b"a"),
            ("pics/x.png", b"x"),
        ]));
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.add("owner", "", "clip.mp4");
        let listing = snapshot_with(&store, &catalog, "").await;
        let engine = engine(store.clone(), catalog.clone());

        engine.rename(&listing, "docs", "papers").await.unwrap();
        engine.move_entry(&listing, "clip.mp4", &folder("pics")).await.unwrap();
        engine.delete(&listing, "pics").await.unwrap();

        assert_eq!(store.keys(), vec!["papers/a.txt".to_string()]);
        assert!(catalog.rows().is_empty());
    }

    #[tokio::test]
    async fn test_upload_batch_skips_duplicates_and_continues() {
        let store = Arc::new(MemoryStore::with_objects(&[("up/Cat.png", b"old")]));
        let listing = snapshot(&store, "up").await;
        store.fail_upload_number(2);

        let report = store_only(&store)
            .upload_batch(
                &listing,
                vec![
                    PendingUpload::new("cat.PNG", b"new".to_vec()),
                    PendingUpload::new("a.txt", b"a".to_vec()),
                    PendingUpload::new("b.txt", b"b".to_vec()),
                    PendingUpload::new("c.txt", b"c".to_vec()),
                    PendingUpload::new("A.TXT", b"again".to_vec()),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.uploaded, vec!["up/a.txt".to_string(), "up/c.txt".to_string()]);
        assert_eq!(report.skipped, vec!["cat.PNG".to_string(), "A.TXT".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "b.txt");
        assert!(!report.is_clean());

        assert!(!store.calls().contains(&Call::Upload("up/cat.PNG".into())));
        assert_eq!(store.upload_calls(), 3);
        assert_eq!(store.get("up/Cat.png"), Some(b"old".to_vec()));
    }

    #[tokio::test]
    async fn test_upload_batch_sets_content_type() {
        let mut mock = MockObjectStore::new();
        mock.expect_upload()
            .times(1)
            .returning(|key, data, options| {
                assert_eq!(key, "photo.png");
                assert_eq!(data, b"png".to_vec());
                assert!(!options.upsert);
                assert_eq!(options.content_type.as_deref(), Some("image/png"));
                Ok(())
            });
        let engine = TransferEngine::new(
            Arc::new(mock),
            Arc::new(MemoryCatalog::new()),
            EngineSettings::for_test(),
        );

        let report = engine
            .upload_batch(
                &Listing::default(),
                vec![PendingUpload::new("photo.png", b"png".to_vec())],
            )
            .await
            .unwrap();
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_register_asset() {
        let store = Arc::new(MemoryStore::with_objects(&[("media/song.mp3", b"s")]));
        let catalog = Arc::new(MemoryCatalog::new());
        let listing = snapshot_with(&store, &catalog, "media").await;
        let engine = engine(store.clone(), catalog.clone());

        let asset = engine
            .register_asset(&listing, "trailer.mp4", "https://cdn.test/trailer.mp4")
            .await
            .unwrap();
        assert_eq!(asset.folder, folder("media"));
        assert_eq!(asset.owner_id, "owner");
        assert_eq!(asset.media_type, crate::entry::MediaType::Video);

        assert_eq!(
            validation(engine.register_asset(&listing, "SONG.mp3", "https://cdn.test/s").await),
            ValidationError::Duplicate("SONG.mp3".into())
        );
        assert!(matches!(
            engine.register_asset(&listing, "x.png", "not a url").await,
            Err(Error::InvalidUrl(_))
        ));
        assert_eq!(catalog.rows().len(), 1);
        assert!(store.calls().is_empty());
    }
}
