//! Snapshot Builder (§4.3): extraction of the interactive element set from
//! the accessibility tree, with a DOM-query fallback for pages that expose
//! no usable accessibility tree, plus the flat `SnapshotData` model and its
//! compact-line serialization.

mod capture;
mod classification;
mod element;
mod error;

pub use capture::take_snapshot;
pub use element::{INTERACTIVE_ROLES, PageInfo, SnapshotData, SnapshotElement, Viewport};
pub use error::{SnapshotError, SnapshotResult};
