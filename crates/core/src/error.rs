use photogrid_protocol::GroupId;
use thiserror::Error;

use crate::api::ApiError;
use crate::layout::LayoutError;

/// Errors returned by timeline operations.
///
/// Apart from `Api`, these report a broken expectation about the timeline's
/// own structures (an index that does not exist, a section that is not
/// loaded yet). They are logged where they happen and leave the state as it
/// was before the call.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("section index {index} out of range ({len} sections)")]
    SectionOutOfRange { index: usize, len: usize },
    #[error("item index {index} out of range ({len} items)")]
    ItemOutOfRange { index: usize, len: usize },
    #[error("section {0} has not been loaded")]
    SectionNotLoaded(usize),
    #[error("no laid-out section contains item {0}")]
    OrphanItem(usize),
    #[error("item {0} is a title and cannot be selected")]
    NotSelectable(usize),
    #[error("item {0} is a thumbnail; only titles can be measured")]
    NotATitle(usize),
    #[error("invalid item height {0}")]
    InvalidHeight(f64),
    #[error("no segment for item {0}")]
    SegmentNotFound(usize),
    #[error("group {0} is not in a loaded section")]
    GroupNotFound(GroupId),
    #[error("no group is being created")]
    NotCreatingGroup,
    #[error("a group is already being created")]
    AlreadyCreatingGroup,
    #[error("draft group segment is missing")]
    DraftMissing,
    #[error("the draft group is being saved")]
    DraftSaving,
    #[error("viewport is not set; call initialize first")]
    NoViewport,
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
