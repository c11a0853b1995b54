pub mod api;
pub mod error;
pub mod host;
pub mod layout;
pub mod loader;
pub mod model;
pub mod options;
pub mod timeline;

pub use api::{ApiError, TimelineApi};
pub use error::TimelineError;
pub use host::{NoopHost, TimelineHost};
pub use layout::{LayoutError, LayoutParams, SectionLayout, layout_segments};
pub use loader::SegmentLoader;
pub use model::{ItemId, Section, Segment, SegmentKind, TimelineItem};
pub use options::{ConfigError, TimelineOptions};
pub use timeline::{Direction, ScrollOutcome, Timeline, TimelineMode};
