//! Share links for stored files
//!
//! A share link is always backed by a signed URL from the object store.
//! Videos are shared as the raw signed URL so players can stream them
//! directly. Everything else goes through the preview page, which receives
//! the signed URL as its `url` query parameter.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::entry::MediaType;
use crate::error::{Error, Result};
use crate::traits::ObjectStore;

/// How long a share link stays valid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareTtl {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
    /// Ten years; stores may shorten it
    Lifetime,
}

impl ShareTtl {
    pub const ALL: [ShareTtl; 6] = [
        ShareTtl::Hour,
        ShareTtl::Day,
        ShareTtl::Week,
        ShareTtl::Month,
        ShareTtl::Year,
        ShareTtl::Lifetime,
    ];

    pub const fn seconds(self) -> u64 {
        const DAY: u64 = 24 * 60 * 60;
        match self {
            ShareTtl::Hour => 60 * 60,
            ShareTtl::Day => DAY,
            ShareTtl::Week => 7 * DAY,
            ShareTtl::Month => 30 * DAY,
            ShareTtl::Year => 365 * DAY,
            ShareTtl::Lifetime => 3650 * DAY,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ShareTtl::Hour => "1h",
            ShareTtl::Day => "1d",
            ShareTtl::Week => "7d",
            ShareTtl::Month => "30d",
            ShareTtl::Year => "1y",
            ShareTtl::Lifetime => "lifetime",
        }
    }
}

impl fmt::Display for ShareTtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareTtl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ShareTtl::ALL
            .into_iter()
            .find(|ttl| ttl.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::General(format!(
                    "Unknown expiry '{s}'. Use one of: 1h, 1d, 7d, 30d, 1y, lifetime"
                ))
            })
    }
}

/// Whether a link opens the file directly or through the preview page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    Direct,
    Preview,
}

/// An issued share link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLink {
    pub url: String,
    pub kind: ShareKind,
    /// Expiry the caller asked for
    pub ttl: ShareTtl,
    /// Seconds the link actually stays valid
    pub expires_in: u64,
    /// The preview page was asked to show its password prompt
    pub password_gate: bool,
}

impl ShareLink {
    /// The store could not honour the requested expiry
    pub fn is_shortened(&self) -> bool {
        self.expires_in < self.ttl.seconds()
    }
}

/// Issues share links through the object store's signed URLs
pub struct ShareLinkIssuer {
    store: Arc<dyn ObjectStore>,
    preview: Url,
}

impl ShareLinkIssuer {
    /// `origin` is where the preview page is served from
    pub fn new(store: Arc<dyn ObjectStore>, origin: &str) -> Result<Self> {
        let mut preview = Url::parse(origin)?;
        if preview.cannot_be_a_base() {
            return Err(Error::Config(format!("'{origin}' cannot serve a preview page")));
        }
        let path = format!("{}/preview", preview.path().trim_end_matches('/'));
        preview.set_path(&path);
        preview.set_query(None);
        Ok(Self { store, preview })
    }

    /// Issue a link for the object at `key`
    ///
    /// `password_gate` only adds `pw=1` to preview links. It is a display
    /// hint for the preview page; no secret is involved and the signed URL
    /// stays usable without it.
    pub async fn issue(&self, key: &str, ttl: ShareTtl, password_gate: bool) -> Result<ShareLink> {
        let requested = ttl.seconds();
        let expires_in = match self.store.max_signed_url_ttl() {
            Some(max) if max < requested => {
                tracing::warn!(%key, requested, max, "share link expiry shortened by the store");
                max
            }
            _ => requested,
        };
        tracing::debug!(%key, expires_in, "requesting signed url");
        let signed = self.store.create_signed_url(key, expires_in).await?;

        if MediaType::from_name(key) == MediaType::Video {
            return Ok(ShareLink {
                url: signed,
                kind: ShareKind::Direct,
                ttl,
                expires_in,
                password_gate: false,
            });
        }

        let mut url = self.preview.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("url", &signed);
            if password_gate {
                query.append_pair("pw", "1");
            }
        }

        Ok(ShareLink {
            url: url.into(),
            kind: ShareKind::Preview,
            ttl,
            expires_in,
            password_gate,
        })
    }
}
