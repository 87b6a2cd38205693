//! Entries of the unified directory view
//!
//! A folder view merges two unrelated sources: objects and implicit folders
//! from the object store, and rows from the media catalog. Each entry carries
//! its origin in the `kind` discriminant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::{self, FolderPath};

/// Broad media category, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl MediaType {
    /// Classify a file name by its extension
    pub fn from_name(name: &str) -> Self {
        if path::extension(name).is_none() {
            return MediaType::Other;
        }
        use mime_guess::mime;

        let Some(guess) = mime_guess::from_path(name).first() else {
            return MediaType::Other;
        };
        let top = guess.type_();
        if top == mime::IMAGE {
            MediaType::Image
        } else if top == mime::VIDEO {
            MediaType::Video
        } else if top == mime::AUDIO {
            MediaType::Audio
        } else if top == mime::TEXT || top == mime::APPLICATION {
            MediaType::Document
        } else {
            MediaType::Other
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Document => "document",
            MediaType::Other => "other",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            "audio" => Ok(MediaType::Audio),
            "document" => Ok(MediaType::Document),
            "other" => Ok(MediaType::Other),
            _ => Err(Error::General(format!("Unknown media type '{s}'"))),
        }
    }
}

/// A file or implicit folder in the object store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Name inside its folder
    pub name: String,

    /// Whether this is an implicit folder (a shared key prefix)
    pub is_folder: bool,

    /// Object key for files, folder path for folders
    pub path: String,

    /// Size in bytes, when the store reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<u64>,

    /// Lower-cased extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,
}

impl StorageEntry {
    /// File entry named `name` in `folder`
    pub fn file(folder: &FolderPath, name: impl Into<String>, size_hint: Option<u64>) -> Self {
        let name = name.into();
        Self {
            path: path::object_key(folder, &name),
            extension: path::extension(&name),
            name,
            is_folder: false,
            size_hint,
            last_modified: None,
        }
    }

    /// Folder entry named `name` in `folder`
    pub fn folder(folder: &FolderPath, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: path::object_key(folder, &name),
            extension: None,
            name,
            is_folder: true,
            size_hint: None,
            last_modified: None,
        }
    }

    /// Folder path of a folder entry
    pub fn folder_path(&self) -> Result<FolderPath> {
        FolderPath::normalize(&self.path)
    }
}

/// A catalog row describing externally hosted media
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAsset {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub url: String,
    pub folder: FolderPath,
    pub media_type: MediaType,
    pub created_at: jiff::Timestamp,
}

/// A catalog row before insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub owner_id: String,
    pub name: String,
    pub url: String,
    pub folder: FolderPath,
    pub media_type: MediaType,
}

impl NewAsset {
    pub fn new(
        owner_id: impl Into<String>,
        folder: FolderPath,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            owner_id: owner_id.into(),
            media_type: MediaType::from_name(&name),
            name,
            url: url.into(),
            folder,
        }
    }
}

/// One entry of a merged folder view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListingEntry {
    Folder(StorageEntry),
    ObjectFile(StorageEntry),
    CatalogAsset(CatalogAsset),
}

impl ListingEntry {
    pub fn name(&self) -> &str {
        match self {
            ListingEntry::Folder(e) | ListingEntry::ObjectFile(e) => &e.name,
            ListingEntry::CatalogAsset(a) => &a.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, ListingEntry::Folder(_))
    }

    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            ListingEntry::Folder(_) => None,
            ListingEntry::ObjectFile(e) => Some(MediaType::from_name(&e.name)),
            ListingEntry::CatalogAsset(a) => Some(a.media_type),
        }
    }

    /// Whether `name` matches this entry ignoring case
    pub fn same_name(&self, name: &str) -> bool {
        self.name().to_lowercase() == name.to_lowercase()
    }

    pub(crate) fn sort_key(&self) -> String {
        self.name().to_lowercase()
    }
}
