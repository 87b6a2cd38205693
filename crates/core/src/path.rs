//! Path parsing and resolution
//!
//! Folder paths are slash-separated keys inside one bucket, stored without
//! leading or trailing slashes. The root folder is the empty string. Store
//! prefixes use the trailing-slash form returned by [`FolderPath::as_prefix`].
//!
//! CLI locations have the format: profile[/folder/...]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A normalized folder path
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderPath(String);

impl FolderPath {
    /// The root folder
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalize a user or store supplied path
    ///
    /// Duplicate, leading and trailing slashes are dropped. `.` and `..`
    /// segments are rejected rather than resolved.
    pub fn normalize(path: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(Error::InvalidPath(format!(
                    "'{path}' contains a relative segment"
                )));
            }
            segments.push(segment);
        }
        Ok(Self(segments.join("/")))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical form, without trailing slash
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store prefix form: `a/b/` for `a/b`, empty for root
    pub fn as_prefix(&self) -> String {
        if self.0.is_empty() {
            String::new()
        } else {
            format!("{}/", self.0)
        }
    }

    /// Last segment, `None` for root
    pub fn name(&self) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// Parent folder; the root is its own parent
    pub fn parent(&self) -> Self {
        match self.0.rfind('/') {
            Some(pos) => Self(self.0[..pos].to_string()),
            None => Self::root(),
        }
    }

    /// Child folder with the given name
    ///
    /// The name is normalized too, so `child("a/b")` descends two levels.
    pub fn child(&self, name: &str) -> Result<Self> {
        let name = Self::normalize(name)?;
        if name.is_root() {
            return Ok(self.clone());
        }
        if self.is_root() {
            Ok(name)
        } else {
            Ok(Self(format!("{}/{}", self.0, name.0)))
        }
    }

    /// Segments of this path
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Re-root this path from `from` to `to`
    ///
    /// Returns `None` when `self` is not inside `from`.
    pub fn rebase(&self, from: &FolderPath, to: &FolderPath) -> Option<Self> {
        if !is_descendant_or_self(self, from) {
            return None;
        }
        let rest = self.0[from.0.len()..].trim_start_matches('/');
        if rest.is_empty() {
            Some(to.clone())
        } else if to.is_root() {
            Some(Self(rest.to_string()))
        } else {
            Some(Self(format!("{}/{rest}", to.0)))
        }
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Whether `candidate` is `ancestor` or lies anywhere beneath it
///
/// Compared on whole segments, so `photos2` is not inside `photos`.
pub fn is_descendant_or_self(candidate: &FolderPath, ancestor: &FolderPath) -> bool {
    if ancestor.is_root() || candidate == ancestor {
        return true;
    }
    candidate
        .0
        .strip_prefix(ancestor.0.as_str())
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Object key of a file named `name` inside `folder`
pub fn object_key(folder: &FolderPath, name: &str) -> String {
    format!("{}{name}", folder.as_prefix())
}

/// Split an object key into its folder and file name
pub fn split_key(key: &str) -> Result<(FolderPath, String)> {
    let key = key.trim_matches('/');
    if key.is_empty() {
        return Err(Error::InvalidPath("Object key cannot be empty".into()));
    }
    match key.rsplit_once('/') {
        Some((folder, name)) => Ok((FolderPath::normalize(folder)?, name.to_string())),
        None => Ok((FolderPath::root(), key.to_string())),
    }
}

/// Lower-cased extension after the last dot
///
/// Dotfiles such as `.env` and names ending in a dot have no extension.
pub fn extension(name: &str) -> Option<String> {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}

/// Validate a single entry name (file or folder)
pub fn validate_name(name: &str) -> Result<()> {
    use crate::error::ValidationError;

    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    if name.contains('/') || name == "." || name == ".." {
        return Err(ValidationError::InvalidName(name.to_string()).into());
    }
    Ok(())
}

/// A parsed CLI location pointing into a profile's bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Profile name
    pub profile: String,
    /// Path inside the profile's bucket (folder or object key)
    pub path: FolderPath,
}

impl Location {
    /// Parse `profile[/path]`
    pub fn parse(location: &str) -> Result<Self> {
        if location.is_empty() {
            return Err(Error::InvalidPath("Path cannot be empty".into()));
        }

        let (profile, rest) = location.split_once('/').unwrap_or((location, ""));
        if !is_valid_profile_name(profile) {
            return Err(Error::InvalidPath(format!(
                "'{location}' does not start with a profile name. Use format: profile[/path]"
            )));
        }

        Ok(Self {
            profile: profile.to_string(),
            path: FolderPath::normalize(rest)?,
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "{}/", self.profile)
        } else {
            write!(f, "{}/{}", self.profile, self.path.as_str())
        }
    }
}

/// Check if a string is a valid profile name
pub fn is_valid_profile_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
