//! Pixel geometry for timeline sections.
//!
//! Everything here is pure: the same segments, width and options always
//! produce the same grid items.

pub mod estimate;
pub mod justified;
pub mod segments;

use thiserror::Error;

pub use estimate::estimate_height;
pub use justified::{JustifiedLayout, justify};
pub use segments::{LayoutParams, SectionLayout, layout_segments};

/// Broken layout invariants. These are checked on every pass instead of
/// asserted, so a bad input surfaces as an error rather than a panic.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("container width must be positive, got {0}")]
    InvalidWidth(f64),
    #[error("row is {width}px wide but the container is only {container_width}px")]
    RowOverflow { width: f64, container_width: f64 },
    #[error("duplicate grid item key `{0}`")]
    DuplicateKey(String),
    #[error("segment ranges cover {covered} of {total} items")]
    RangeMismatch { covered: usize, total: usize },
}
