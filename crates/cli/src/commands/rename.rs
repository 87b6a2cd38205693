//! rename command - Rename an entry in place
//!
//! Files keep their extension. Folders are renamed by copying every object
//! under them, so a large folder takes as long as moving it.

use clap::Args;

use shelf_core::Config;

use super::{OperationOutput, open_session, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Rename a file, folder or catalog entry
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Entry to rename (profile/path/to/entry)
    pub path: String,

    /// New name, without any folder part
    pub new_name: String,
}

/// Execute the rename command
pub async fn execute(args: RenameArgs, config: &Config, output_config: OutputConfig) -> ExitCode {
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

    match session.transfers().rename(&listing, &name, &args.new_name).await {
        Ok(()) => {
            let new_name = args.new_name.trim();
            if formatter.is_json() {
                formatter.json(&OperationOutput::new(
                    location.path.as_str(),
                    Some(new_name.to_string()),
                ));
            } else {
                formatter.success(&format!("Renamed '{name}' to '{new_name}'"));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, "Failed to rename", &e),
    }
}
