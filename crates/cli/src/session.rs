//! Engines wired to one profile's store and catalog
//!
//! A session is built once per invocation from the loaded configuration.
//! Changing a profile means building a new session; nothing is cached
//! across them.

use std::sync::Arc;

use shelf_core::config::Defaults;
use shelf_core::{
    Config, EngineSettings, Error, FolderPath, Listing, ListingEngine, MetadataCatalog,
    ObjectStore, PlaceholderManager, Profile, Result, ShareLinkIssuer, ThumbnailCache,
    TransferEngine,
};
use shelf_catalog::SqliteCatalog;
use shelf_s3::S3Store;

pub struct Session {
    profile: Profile,
    defaults: Defaults,
    store: Arc<dyn ObjectStore>,
    transfers: TransferEngine,
}

impl Session {
    /// Connect to the store and catalog of profile `name`
    pub async fn open(config: &Config, name: &str) -> Result<Self> {
        let profile = config
            .profiles
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))?;

        let store: Arc<dyn ObjectStore> = Arc::new(S3Store::new(&profile).await?);
        let catalog: Arc<dyn MetadataCatalog> =
            Arc::new(SqliteCatalog::connect(&profile.catalog_url).await?);

        Ok(Self::with_backends(config, profile, store, catalog))
    }

    fn with_backends(
        config: &Config,
        profile: Profile,
        store: Arc<dyn ObjectStore>,
        catalog: Arc<dyn MetadataCatalog>,
    ) -> Self {
        let settings = EngineSettings::new(&config.defaults, profile.owner_id.clone());
        tracing::debug!(
            profile = %profile.name,
            owner = %settings.owner_id,
            marker = settings.marker.name(),
            "session opened"
        );

        Self {
            transfers: TransferEngine::new(store.clone(), catalog, settings),
            defaults: config.defaults.clone(),
            profile,
            store,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn listings(&self) -> &ListingEngine {
        self.transfers.listings()
    }

    pub fn transfers(&self) -> &TransferEngine {
        &self.transfers
    }

    pub fn placeholders(&self) -> &PlaceholderManager {
        self.transfers.placeholders()
    }

    pub fn share_issuer(&self) -> Result<ShareLinkIssuer> {
        ShareLinkIssuer::new(self.store.clone(), &self.defaults.share_origin)
    }

    pub fn thumbnails(&self) -> ThumbnailCache {
        ThumbnailCache::new(self.store.clone())
    }

    /// List the folder holding `path` and return it with the last segment
    pub async fn parent_of(&self, path: &FolderPath) -> Result<(Listing, String)> {
        let name = path
            .name()
            .ok_or_else(|| Error::InvalidPath("The bucket root has no name".to_string()))?
            .to_string();
        let listing = self.listings().list(&path.parent()).await?;
        Ok((listing, name))
    }
}
