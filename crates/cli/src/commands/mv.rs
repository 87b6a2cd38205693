//! mv command - Move an entry into another folder
//!
//! Goes through the same checks as dragging an entry onto a folder: a
//! folder cannot be moved into itself or below itself, and the destination
//! must not already hold the name.

use clap::Args;

use shelf_core::dragdrop::dispatch;
use shelf_core::{Config, DragDropReconciler, DropOutcome, HoverTarget};

use super::{OperationOutput, open_session, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Move a file, folder or catalog entry into another folder
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Entry to move (profile/path/to/entry)
    pub source: String,

    /// Destination folder in the same profile (profile[/path])
    pub destination: String,
}

/// Execute the mv command
pub async fn execute(args: MvArgs, config: &Config, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let source = match parse_location(&args.source, &formatter) {
        Ok(location) => location,
        Err(code) => return code,
    };
    let destination = match parse_location(&args.destination, &formatter) {
        Ok(location) => location,
        Err(code) => return code,
    };
    if source.profile != destination.profile {
        formatter.error("Source and destination must use the same profile");
        return ExitCode::UsageError;
    }

    let session = match open_session(&source, config, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let (listing, name) = match session.parent_of(&source.path).await {
        Ok(found) => found,
        Err(e) => return report(&formatter, "Failed to list folder", &e),
    };

    let mut drag = DragDropReconciler::new(listing.folder.clone());
    if let Err(e) = drag.start_internal(&listing, &name) {
        return report(&formatter, "Cannot move", &e);
    }
    drag.hover(HoverTarget::Folder(destination.path.clone()));
    let intent = match drag.drop() {
        Ok(intent) => intent,
        Err(e) => return report(&formatter, "Cannot move", &e),
    };

    match dispatch(intent, session.transfers(), &listing).await {
        Ok(DropOutcome::Moved { name, destination }) => {
            if formatter.is_json() {
                formatter.json(&OperationOutput::new(
                    source.path.as_str(),
                    Some(destination.to_string()),
                ));
            } else {
                formatter.success(&format!("Moved '{name}' to '{destination}'"));
            }
            ExitCode::Success
        }
        Ok(DropOutcome::Uploaded(_)) => {
            formatter.error("Move was handled as an upload");
            ExitCode::GeneralError
        }
        Err(e) => report(&formatter, "Failed to move", &e),
    }
}
