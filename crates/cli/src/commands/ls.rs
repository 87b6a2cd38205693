//! ls command - List a folder
//!
//! Shows bucket files, emulated folders and catalog media of one folder in
//! a single view. A folder that no longer exists falls back to its parent.

use clap::Args;
use serde::Serialize;

use shelf_core::{Config, ListingEntry, MediaType, PreviewSource, ResolvedView, ThumbnailCache};

use super::{open_session, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

const BLANK_DATE: &str = "                   ";

/// List a folder
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Folder to list (profile[/path])
    pub path: String,

    /// Load previews of the folder's images
    #[arg(long)]
    pub previews: bool,

    /// Show totals after the listing
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    #[serde(flatten)]
    view: ResolvedView,
    #[serde(skip_serializing_if = "Option::is_none")]
    previews: Option<Vec<PreviewInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct PreviewInfo {
    name: String,
    size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct Summary {
    folders: usize,
    files: usize,
    catalog_entries: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn of(entries: &[ListingEntry]) -> Self {
        let mut summary = Summary::default();
        for entry in entries {
            match entry {
                ListingEntry::Folder(_) => summary.folders += 1,
                ListingEntry::ObjectFile(file) => {
                    summary.files += 1;
                    summary.total_size_bytes += file.size_hint.unwrap_or(0);
                }
                ListingEntry::CatalogAsset(_) => summary.catalog_entries += 1,
            }
        }
        summary.total_size_human =
            humansize::format_size(summary.total_size_bytes, humansize::BINARY);
        summary
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, config: &Config, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let location = match parse_location(&args.path, &formatter) {
        Ok(location) => location,
        Err(code) => return code,
    };
    let session = match open_session(&location, config, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let view = match session.listings().resolve(&location.path).await {
        Ok(view) => view,
        Err(e) => return report(&formatter, "Failed to list folder", &e),
    };

    if view.navigated_up {
        formatter.warning(&format!(
            "'{}' no longer exists, showing '{}' instead",
            view.requested, view.listing.folder
        ));
    }
    if view.listing.truncated {
        formatter.warning(&format!(
            "'{}' holds more entries than one page; only the first page is shown",
            view.listing.folder
        ));
    }

    let previews = if args.previews {
        let mut cache = session.thumbnails();
        cache.refresh(&view.listing);
        Some(load_previews(&mut cache, &view.listing.entries).await)
    } else {
        None
    };
    let summary = args.summarize.then(|| Summary::of(&view.listing.entries));

    if formatter.is_json() {
        formatter.json(&LsOutput {
            view,
            previews,
            summary,
        });
        return ExitCode::Success;
    }

    for entry in &view.listing.entries {
        formatter.println(&format_entry(entry, &formatter));
    }

    if let Some(previews) = previews {
        for preview in &previews {
            let line = match (&preview.error, &preview.remote_url) {
                (Some(error), _) => format!("preview {}: {error}", preview.name),
                (None, Some(url)) => format!("preview {}: {url}", preview.name),
                (None, None) => format!(
                    "preview {}: {}",
                    preview.name,
                    humansize::format_size(preview.size_bytes, humansize::BINARY)
                ),
            };
            formatter.println(&formatter.dim(&line));
        }
    }

    if let Some(summary) = summary {
        formatter.println(&format!(
            "\nTotal: {} folders, {} files ({}), {} catalog entries",
            summary.folders, summary.files, summary.total_size_human, summary.catalog_entries
        ));
    }

    ExitCode::Success
}

/// Load every image preview of the cached folder
///
/// A preview that fails to load is reported in place; the rest still load.
async fn load_previews(cache: &mut ThumbnailCache, entries: &[ListingEntry]) -> Vec<PreviewInfo> {
    let mut previews = Vec::new();
    for entry in entries {
        if entry.media_type() != Some(MediaType::Image) {
            continue;
        }
        let info = match cache.preview(entry).await {
            Ok(preview) => PreviewInfo {
                name: preview.name.clone(),
                size_bytes: preview.size(),
                remote_url: match &preview.source {
                    PreviewSource::RemoteUrl(url) => Some(url.clone()),
                    PreviewSource::Bytes(_) => None,
                },
                error: None,
            },
            Err(e) => PreviewInfo {
                name: entry.name().to_string(),
                size_bytes: 0,
                remote_url: None,
                error: Some(e.to_string()),
            },
        };
        previews.push(info);
    }
    tracing::debug!(
        loaded = cache.len(),
        bytes = cache.bytes_held(),
        "previews loaded"
    );
    previews
}

fn format_entry(entry: &ListingEntry, formatter: &Formatter) -> String {
    match entry {
        ListingEntry::Folder(folder) => {
            format!("[{BLANK_DATE}] {:>9} {}/", "-", folder.name)
        }
        ListingEntry::ObjectFile(file) => {
            let size = humansize::format_size(file.size_hint.unwrap_or(0), humansize::BINARY);
            format!("[{}] {size:>9} {}", format_date(file.last_modified), file.name)
        }
        ListingEntry::CatalogAsset(asset) => format!(
            "[{}] {:>9} {} {}",
            format_date(Some(asset.created_at)),
            "link",
            asset.name,
            formatter.dim(&format!("-> {}", asset.url))
        ),
    }
}

fn format_date(time: Option<jiff::Timestamp>) -> String {
    time.map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| BLANK_DATE.to_string())
}
