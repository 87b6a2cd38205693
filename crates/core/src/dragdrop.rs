//! Drag and drop into the folder view
//!
//! Hovering only updates state. Nothing touches a store until a drop has
//! been turned into a [`DropIntent`] and handed to [`dispatch`].

use serde::Serialize;

use crate::entry::ListingEntry;
use crate::error::{Error, Result, ValidationError};
use crate::listing::Listing;
use crate::path::{self, FolderPath};
use crate::transfer::{BatchReport, PendingUpload, TransferEngine};

/// What the pointer is over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverTarget {
    /// A folder tile
    Folder(FolderPath),
    /// Empty space of the current folder
    Grid,
    /// The "go up" control
    GoUp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    /// An entry of the current folder is being dragged
    DraggingInternal {
        item: ListingEntry,
        hover: Option<HoverTarget>,
    },
    /// Files from outside the application are being dragged
    DraggingExternal {
        files: Vec<PendingUpload>,
        hover: Option<HoverTarget>,
    },
}

/// A completed drop, ready to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropIntent {
    Move {
        item: ListingEntry,
        destination: FolderPath,
    },
    Upload {
        files: Vec<PendingUpload>,
        destination: FolderPath,
    },
}

/// Result of running a [`DropIntent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropOutcome {
    Moved { name: String, destination: FolderPath },
    Uploaded(BatchReport),
}

/// Tracks one drag gesture over a folder view
#[derive(Debug, Clone)]
pub struct DragDropReconciler {
    folder: FolderPath,
    state: DragState,
}

impl DragDropReconciler {
    /// Reconciler for the view showing `folder`
    pub fn new(folder: FolderPath) -> Self {
        Self {
            folder,
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Start dragging the entry `name` of the current listing
    pub fn start_internal(&mut self, listing: &Listing, name: &str) -> Result<()> {
        let item = listing
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("'{name}' in {}", listing.folder)))?;
        self.folder = listing.folder.clone();
        self.state = DragState::DraggingInternal { item, hover: None };
        Ok(())
    }

    /// Start dragging files from outside
    pub fn start_external(&mut self, files: Vec<PendingUpload>) {
        self.state = DragState::DraggingExternal { files, hover: None };
    }

    /// Move the pointer over `target`
    pub fn hover(&mut self, target: HoverTarget) {
        match &mut self.state {
            DragState::DraggingInternal { hover, .. } | DragState::DraggingExternal { hover, .. } => {
                *hover = Some(target);
            }
            DragState::Idle => {}
        }
    }

    /// Move the pointer off every target
    pub fn leave(&mut self) {
        match &mut self.state {
            DragState::DraggingInternal { hover, .. } | DragState::DraggingExternal { hover, .. } => {
                *hover = None;
            }
            DragState::Idle => {}
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Release the drag and work out what it means
    ///
    /// The reconciler is idle again afterwards, whatever the outcome.
    pub fn drop(&mut self) -> Result<DropIntent> {
        match std::mem::take(&mut self.state) {
            DragState::Idle => Err(ValidationError::NoDropTarget.into()),
            DragState::DraggingInternal { item, hover } => {
                let destination = self.destination(hover)?;
                if item.is_folder() {
                    let source = self.folder.child(item.name())?;
                    if path::is_descendant_or_self(&destination, &source) {
                        return Err(ValidationError::IntoItself {
                            item: source.to_string(),
                            target: destination.to_string(),
                        }
                        .into());
                    }
                }
                Ok(DropIntent::Move { item, destination })
            }
            DragState::DraggingExternal { files, hover } => {
                let destination = self.destination(hover)?;
                Ok(DropIntent::Upload { files, destination })
            }
        }
    }

    fn destination(&self, hover: Option<HoverTarget>) -> Result<FolderPath> {
        match hover {
            Some(HoverTarget::Folder(folder)) => Ok(folder),
            Some(HoverTarget::Grid) => Ok(self.folder.clone()),
            Some(HoverTarget::GoUp) => Ok(self.folder.parent()),
            None => Err(ValidationError::NoDropTarget.into()),
        }
    }
}

/// Execute a drop against the folder shown by `listing`
///
/// Uploads into another folder list that folder first so duplicates are
/// checked against what is actually there.
pub async fn dispatch(
    intent: DropIntent,
    engine: &TransferEngine,
    listing: &Listing,
) -> Result<DropOutcome> {
    match intent {
        DropIntent::Move { item, destination } => {
            let name = item.name();
            match &item {
                ListingEntry::ObjectFile(_) => {
                    engine.move_file(listing, name, &destination).await?;
                }
                ListingEntry::Folder(_) => {
                    engine.move_folder(listing, name, &destination).await?;
                }
                ListingEntry::CatalogAsset(asset) => {
                    engine.move_asset(listing, asset, &destination).await?;
                }
            }
            Ok(DropOutcome::Moved {
                name: name.to_string(),
                destination,
            })
        }
        DropIntent::Upload { files, destination } => {
            let report = if destination == listing.folder {
                engine.upload_batch(listing, files).await?
            } else {
                let target = engine.listings().list(&destination).await?;
                engine.upload_batch(&target, files).await?
            };
            Ok(DropOutcome::Uploaded(report))
        }
    }
}
