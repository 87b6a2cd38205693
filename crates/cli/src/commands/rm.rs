//! rm command - Remove an entry
//!
//! Removing a folder deletes every object under it, then its marker, then
//! the catalog rows filed under it. Folders need `--recursive`.

use clap::Args;

use shelf_core::{Config, ListingEntry};

use super::{OperationOutput, open_session, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove a file, folder or catalog entry
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Entry to remove (profile/path/to/entry)
    pub path: String,

    /// Allow removing a folder and everything under it
    #[arg(short, long)]
    pub recursive: bool,

    /// Only show what would be removed
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, config: &Config, output_config: OutputConfig) -> ExitCode {
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

    let Some(entry) = listing.get(&name) else {
        formatter.error(&format!("'{}' not found", location.path));
        return ExitCode::NotFound;
    };

    if entry.is_folder() && !args.recursive {
        formatter.error(&format!(
            "'{}' is a folder; use --recursive to remove it and its contents",
            location.path
        ));
        return ExitCode::UsageError;
    }

    if args.dry_run {
        formatter.println(&format!("Would remove: {}", describe(entry)));
        return ExitCode::Success;
    }

    match session.transfers().delete(&listing, &name).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&OperationOutput::new(location.path.as_str(), None));
            } else {
                formatter.success(&format!("Removed {}", describe(entry)));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, "Failed to remove", &e),
    }
}

fn describe(entry: &ListingEntry) -> String {
    match entry {
        ListingEntry::Folder(folder) => format!("folder '{}'", folder.path),
        ListingEntry::ObjectFile(file) => format!("'{}'", file.path),
        ListingEntry::CatalogAsset(asset) => {
            format!("catalog entry '{}' ({})", asset.name, asset.url)
        }
    }
}
