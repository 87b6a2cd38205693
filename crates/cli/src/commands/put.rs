//! put command - Upload local files into a folder
//!
//! Runs the same path as files dropped onto a folder view: the batch is
//! checked against the folder's current entries, duplicates are skipped and
//! a failed file does not stop the others.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use shelf_core::dragdrop::dispatch;
use shelf_core::{
    BatchReport, Config, DragDropReconciler, DropOutcome, HoverTarget, PendingUpload,
};

use super::{open_session, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Upload local files into a folder
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local files to upload
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Destination folder (profile[/path])
    pub destination: String,
}

/// Execute the put command
pub async fn execute(args: PutArgs, config: &Config, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let location = match parse_location(&args.destination, &formatter) {
        Ok(location) => location,
        Err(code) => return code,
    };

    let files = match read_files(&args.files, &output_config).await {
        Ok(files) => files,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::GeneralError;
        }
    };

    let session = match open_session(&location, config, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let listing = match session.listings().list(&location.path).await {
        Ok(listing) => listing,
        Err(e) => return report(&formatter, "Failed to list destination", &e),
    };

    let mut drag = DragDropReconciler::new(listing.folder.clone());
    drag.start_external(files);
    drag.hover(HoverTarget::Grid);
    let intent = match drag.drop() {
        Ok(intent) => intent,
        Err(e) => return report(&formatter, "Nothing to upload", &e),
    };

    let spinner = ProgressBar::spinner(
        &output_config,
        &format!("Uploading {} file(s) to '{}'", args.files.len(), location),
    );
    let outcome = dispatch(intent, session.transfers(), &listing).await;
    spinner.finish_and_clear();

    let batch = match outcome {
        Ok(DropOutcome::Uploaded(batch)) => batch,
        Ok(DropOutcome::Moved { name, .. }) => {
            formatter.error(&format!("'{name}' was moved instead of uploaded"));
            return ExitCode::GeneralError;
        }
        Err(e) => return report(&formatter, "Upload failed", &e),
    };

    if formatter.is_json() {
        formatter.json(&batch);
    } else {
        for key in &batch.uploaded {
            formatter.success(&format!("Uploaded '{key}'"));
        }
        for name in &batch.skipped {
            formatter.warning(&format!("Skipped '{name}': the folder already has that name"));
        }
        for failed in &batch.failed {
            formatter.error(&format!("Failed '{}': {}", failed.name, failed.error));
        }
    }

    batch_exit_code(&batch)
}

/// Read every local file before anything is uploaded
async fn read_files(
    paths: &[PathBuf],
    output_config: &OutputConfig,
) -> anyhow::Result<Vec<PendingUpload>> {
    let mut total = 0;
    for path in paths {
        total += tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Cannot access '{}'", path.display()))?
            .len();
    }

    let progress = ProgressBar::new(output_config, total);
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("'{}' has no usable file name", path.display()))?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        progress.inc(data.len() as u64);
        files.push(PendingUpload::new(name, data));
    }
    progress.finish_and_clear();

    Ok(files)
}

fn batch_exit_code(batch: &BatchReport) -> ExitCode {
    if !batch.failed.is_empty() {
        if batch.uploaded.is_empty() {
            ExitCode::GeneralError
        } else {
            ExitCode::PartiallyCompleted
        }
    } else if batch.uploaded.is_empty() && !batch.skipped.is_empty() {
        ExitCode::Conflict
    } else {
        ExitCode::Success
    }
}
