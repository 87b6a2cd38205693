//! shelf-core: Core library for the shelf media browser
//!
//! This crate provides a folder-shaped view over a flat object store merged
//! with a media metadata catalog, including:
//! - Configuration and profile management
//! - Path parsing and resolution
//! - Folder emulation with placeholder objects
//! - Unified listings, transfers, share links, previews and drag and drop
//!
//! The engines only talk to the [`ObjectStore`] and [`MetadataCatalog`]
//! traits; concrete adapters live in the `shelf-s3` and `shelf-catalog`
//! crates.

pub mod config;
pub mod dragdrop;
pub mod entry;
pub mod error;
pub mod listing;
pub mod path;
pub mod placeholder;
pub mod profile;
pub mod share;
pub mod thumbnail;
pub mod traits;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigManager, EngineSettings};
pub use dragdrop::{DragDropReconciler, DragState, DropIntent, DropOutcome, HoverTarget};
pub use entry::{CatalogAsset, ListingEntry, MediaType, NewAsset, StorageEntry};
pub use error::{Error, PartialFailure, Result, ValidationError};
pub use listing::{Listing, ListingEngine, ResolvedView};
pub use path::{FolderPath, Location};
pub use placeholder::{DirectoryMarker, MarkerVisibility, PlaceholderManager};
pub use profile::{Profile, ProfileManager};
pub use share::{ShareKind, ShareLink, ShareLinkIssuer, ShareTtl};
pub use thumbnail::{Preview, PreviewSource, ThumbnailCache};
pub use traits::{ListOptions, MetadataCatalog, ObjectStore, StoreObject, UploadOptions};
pub use transfer::{BatchReport, PendingUpload, TransferEngine};
