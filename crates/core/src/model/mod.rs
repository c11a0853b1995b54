pub mod item;
pub mod section;
pub mod segment;

pub use item::{AssetSeries, ItemId, PhotoStack, TimelineItem, items_from_data, split_series};
pub use section::Section;
pub use segment::{Segment, SegmentKind, date_bounds};
