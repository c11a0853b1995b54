pub mod api;
pub mod grid;
pub mod shared_str;
pub mod types;

pub use api::{
    Asset, CreatedGroup, DateRangeData, HideAction, ItemData, SectionData, SegmentData,
    SeriesData, UserGroupData,
};
pub use grid::{GridItemKind, TimelineGridItem};
pub use shared_str::{AssetId, GroupId, SectionId, SeriesId, SharedStr};
pub use types::{ItemRange, Rect, Viewport};
