//! link command - Record externally hosted media
//!
//! Adds a catalog row so media served from another host shows up in a
//! folder next to the bucket's own files. Nothing is uploaded.

use clap::Args;
use serde::Serialize;

use shelf_core::{CatalogAsset, Config};

use super::{open_session, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Record externally hosted media in a folder
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Entry to create (profile/path/to/name.ext)
    pub path: String,

    /// Where the media is hosted
    pub url: String,
}

#[derive(Debug, Serialize)]
struct LinkOutput {
    success: bool,
    asset: CatalogAsset,
}

/// Execute the link command
pub async fn execute(args: LinkArgs, config: &Config, output_config: OutputConfig) -> ExitCode {
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

    match session
        .transfers()
        .register_asset(&listing, &name, &args.url)
        .await
    {
        Ok(asset) => {
            if formatter.is_json() {
                formatter.json(&LinkOutput {
                    success: true,
                    asset,
                });
            } else {
                formatter.success(&format!(
                    "Linked '{}' in '{}' ({})",
                    asset.name,
                    asset.folder,
                    asset.media_type.as_str()
                ));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, "Failed to link media", &e),
    }
}
