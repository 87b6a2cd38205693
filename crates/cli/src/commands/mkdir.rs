//! mkdir command - Create a folder
//!
//! Folders only exist while something is stored under them, so a new
//! folder is materialized with an empty marker object.

use clap::Args;

use shelf_core::Config;

use super::{OperationOutput, open_session, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a folder
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Folder to create (profile/path/to/folder)
    pub path: String,
}

/// Execute the mkdir command
pub async fn execute(args: MkdirArgs, config: &Config, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let location = match parse_location(&args.path, &formatter) {
        Ok(location) => location,
        Err(code) => return code,
    };
    let session = match open_session(&location, config, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let (parent, name) = match session.parent_of(&location.path).await {
        Ok(found) => found,
        Err(e) => return report(&formatter, "Failed to list parent folder", &e),
    };

    match session.placeholders().create_folder(&parent, &name).await {
        Ok(folder) => {
            if formatter.is_json() {
                formatter.json(&OperationOutput::new(folder.as_str(), None));
            } else {
                formatter.success(&format!("Created folder '{folder}'"));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, "Failed to create folder", &e),
    }
}
