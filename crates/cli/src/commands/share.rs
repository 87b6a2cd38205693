//! share command - Issue a share link
//!
//! Videos get the signed URL itself. Everything else gets a link to the
//! preview page with the signed URL in its query string.

use clap::Args;
use serde::Serialize;

use shelf_core::{Config, ListingEntry, ShareLink, ShareTtl};

use super::{open_session, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Issue a time-limited share link for a file
#[derive(Args, Debug)]
pub struct ShareArgs {
    /// File to share (profile/path/to/file)
    pub path: String,

    /// How long the link stays valid: 1h, 1d, 7d, 30d, 1y or lifetime
    #[arg(long, default_value = "1d")]
    pub expires: ShareTtl,

    /// Ask the preview page to show its password prompt
    #[arg(long)]
    pub password_gate: bool,
}

#[derive(Debug, Serialize)]
struct ShareOutput {
    path: String,
    #[serde(flatten)]
    link: ShareLink,
}

/// Execute the share command
pub async fn execute(args: ShareArgs, config: &Config, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let location = match parse_location(&args.path, &formatter) {
        Ok(location) => location,
        Err(code) => return code,
    };
    let session = match open_session(&location, config, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let (listing, name) = match session.parent_of(&location.path).await {
        Ok(found) => found,
        Err(e) => return report(&formatter, "Failed to list folder", &e),
    };

    let key = match listing.get(&name) {
        Some(ListingEntry::ObjectFile(file)) => file.path.clone(),
        Some(ListingEntry::CatalogAsset(asset)) => {
            formatter.error(&format!(
                "'{name}' is hosted elsewhere and has no signed link; its address is {}",
                asset.url
            ));
            return ExitCode::UsageError;
        }
        Some(ListingEntry::Folder(_)) => {
            formatter.error(&format!("'{name}' is a folder; only files can be shared"));
            return ExitCode::UsageError;
        }
        None => {
            formatter.error(&format!("'{}' not found", location.path));
            return ExitCode::NotFound;
        }
    };

    let issuer = match session.share_issuer() {
        Ok(issuer) => issuer,
        Err(e) => return report(&formatter, "Invalid share origin", &e),
    };

    match issuer.issue(&key, args.expires, args.password_gate).await {
        Ok(link) => {
            if formatter.is_json() {
                formatter.json(&ShareOutput { path: key, link });
            } else {
                if link.is_shortened() {
                    formatter.warning(&format!(
                        "The store caps signed URLs at {}; '{}' was not honoured",
                        validity(link.expires_in),
                        link.ttl
                    ));
                }
                formatter.println(&link.url);
                formatter.success(&format!(
                    "Share link for '{key}' valid for {}",
                    validity(link.expires_in)
                ));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, "Failed to issue share link", &e),
    }
}

/// Human form of an expiry in seconds
fn validity(seconds: u64) -> String {
    const HOUR: u64 = 60 * 60;
    const DAY: u64 = 24 * HOUR;
    match seconds {
        s if s % DAY == 0 => format!("{}d", s / DAY),
        s if s % HOUR == 0 => format!("{}h", s / HOUR),
        s => format!("{s}s"),
    }
}
