use photogrid_protocol::{AssetId, CreatedGroup, GroupId, HideAction, SectionData, SectionId, SegmentData};
use thiserror::Error;

/// Failure reported by a collaborator.
///
/// `Clone` because one segment fetch is shared by every caller waiting on
/// the same section.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Data-fetch and mutation calls the timeline depends on.
///
/// Implementations are driven from a single-threaded executor, so the
/// returned futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait TimelineApi {
    /// The ordered section catalog, newest first.
    async fn fetch_sections(&self) -> Result<Vec<SectionData>, ApiError>;

    async fn fetch_segments(&self, section_id: &SectionId) -> Result<Vec<SegmentData>, ApiError>;

    async fn set_hidden(&self, asset_ids: &[AssetId], action: HideAction) -> Result<(), ApiError>;

    async fn create_group(&self, name: &str, asset_ids: &[AssetId]) -> Result<CreatedGroup, ApiError>;

    async fn add_to_group(&self, asset_ids: &[AssetId], group_id: &GroupId) -> Result<(), ApiError>;
}
