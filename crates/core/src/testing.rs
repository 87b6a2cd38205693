//! In-memory store and catalog used by the engine tests
//!
//! Both fakes record every call and can be told to fail specific steps.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::entry::{CatalogAsset, NewAsset};
use crate::error::{Error, Result};
use crate::path::{FolderPath, is_descendant_or_self};
use crate::traits::{ListOptions, MetadataCatalog, ObjectStore, StoreObject, UploadOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Upload(String),
    Download(String),
    Remove(Vec<String>),
    Sign(String, u64),
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    calls: Mutex<Vec<Call>>,
    uploads_seen: Mutex<usize>,
    fail_upload_number: Mutex<Option<usize>>,
    fail_download: Mutex<BTreeSet<String>>,
    fail_remove: Mutex<bool>,
    fail_list: Mutex<bool>,
    max_sign_ttl: Mutex<Option<u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(keys: &[(&str, &[u8])]) -> Self {
        let store = Self::new();
        for (key, data) in keys {
            store.put(key, data);
        }
        store
    }

    pub fn put(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn keys_under(&self, prefix: &str) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn upload_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Upload(_)))
            .count()
    }

    pub fn remove_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(keys) => Some(keys),
                _ => None,
            })
            .collect()
    }

    /// Make the n-th upload (1-based, counted from now) fail
    pub fn fail_upload_number(&self, n: usize) {
        *self.uploads_seen.lock().unwrap() = 0;
        *self.fail_upload_number.lock().unwrap() = Some(n);
    }

    pub fn fail_download_of(&self, key: &str) {
        self.fail_download.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_removes(&self) {
        *self.fail_remove.lock().unwrap() = true;
    }

    pub fn fail_lists(&self) {
        *self.fail_list.lock().unwrap() = true;
    }

    pub fn cap_signed_urls(&self, seconds: u64) {
        *self.max_sign_ttl.lock().unwrap() = Some(seconds);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, folder: &FolderPath, options: ListOptions) -> Result<Vec<StoreObject>> {
        self.record(Call::List(folder.as_str().to_string()));
        if *self.fail_list.lock().unwrap() {
            return Err(Error::Network("list failed".into()));
        }

        let prefix = folder.as_prefix();
        let mut folders = BTreeSet::new();
        let mut files = Vec::new();
        for (key, data) in self.objects.lock().unwrap().iter() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    folders.insert(dir.to_string());
                }
                None => files.push(StoreObject::file(
                    rest,
                    format!("id-{key}"),
                    data.len() as u64,
                )),
            }
        }

        let mut entries: Vec<StoreObject> =
            folders.into_iter().map(StoreObject::folder).collect();
        entries.extend(files);
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect())
    }

    async fn upload(&self, key: &str, data: Vec<u8>, options: UploadOptions) -> Result<()> {
        self.record(Call::Upload(key.to_string()));

        let mut seen = self.uploads_seen.lock().unwrap();
        *seen += 1;
        if *self.fail_upload_number.lock().unwrap() == Some(*seen) {
            return Err(Error::Network(format!("upload of {key} failed")));
        }
        drop(seen);

        let mut objects = self.objects.lock().unwrap();
        if !options.upsert && objects.contains_key(key) {
            return Err(Error::Conflict(format!("{key} already exists")));
        }
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        self.record(Call::Download(key.to_string()));
        if self.fail_download.lock().unwrap().contains(key) {
            return Err(Error::Network(format!("download of {key} failed")));
        }
        self.get(key).ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        self.record(Call::Remove(keys.to_vec()));
        if *self.fail_remove.lock().unwrap() {
            return Err(Error::Network("remove failed".into()));
        }
        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    async fn create_signed_url(&self, key: &str, ttl_seconds: u64) -> Result<String> {
        self.record(Call::Sign(key.to_string(), ttl_seconds));
        Ok(format!(
            "https://store.test/object/sign/{key}?token=t0k&expires={ttl_seconds}"
        ))
    }

    fn max_signed_url_ttl(&self) -> Option<u64> {
        *self.max_sign_ttl.lock().unwrap()
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    rows: Mutex<Vec<CatalogAsset>>,
    next_id: Mutex<u32>,
    fail: Mutex<bool>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, owner: &str, folder: &str, name: &str) -> CatalogAsset {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let asset = NewAsset::new(
            owner,
            FolderPath::normalize(folder).unwrap(),
            name,
            format!("https://media.test/{name}"),
        );
        let row = CatalogAsset {
            id: format!("asset-{}", *next),
            owner_id: asset.owner_id,
            name: asset.name,
            url: asset.url,
            folder: asset.folder,
            media_type: asset.media_type,
            created_at: jiff::Timestamp::UNIX_EPOCH,
        };
        self.rows.lock().unwrap().push(row.clone());
        row
    }

    pub fn rows(&self) -> Vec<CatalogAsset> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }

    fn check(&self) -> Result<()> {
        if *self.fail.lock().unwrap() {
            Err(Error::Catalog("catalog unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MetadataCatalog for MemoryCatalog {
    async fn list_folder(&self, owner_id: &str, folder: &FolderPath) -> Result<Vec<CatalogAsset>> {
        self.check()?;
        Ok(self
            .rows()
            .into_iter()
            .filter(|a| a.owner_id == owner_id && &a.folder == folder)
            .collect())
    }

    async fn list_subtree(
        &self,
        owner_id: &str,
        folder: &FolderPath,
    ) -> Result<Vec<CatalogAsset>> {
        self.check()?;
        Ok(self
            .rows()
            .into_iter()
            .filter(|a| a.owner_id == owner_id && is_descendant_or_self(&a.folder, folder))
            .collect())
    }

    async fn insert(&self, asset: NewAsset) -> Result<CatalogAsset> {
        self.check()?;
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let row = CatalogAsset {
            id: format!("asset-{}", *next),
            owner_id: asset.owner_id,
            name: asset.name,
            url: asset.url,
            folder: asset.folder,
            media_type: asset.media_type,
            created_at: jiff::Timestamp::UNIX_EPOCH,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<()> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        row.name = name.to_string();
        Ok(())
    }

    async fn relocate(&self, id: &str, folder: &FolderPath) -> Result<()> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        row.folder = folder.clone();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check()?;
        self.rows.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }
}
