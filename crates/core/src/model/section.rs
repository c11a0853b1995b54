use chrono::{DateTime, Utc};
use photogrid_protocol::{ItemRange, SectionData, SectionId};

use super::segment::Segment;

/// Coarse time bucket of the timeline. Sections are created once from the
/// catalog; their segments are fetched lazily and their grid items exist
/// only while they are laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub top: f64,
    /// Estimated until the section is laid out, measured afterwards.
    pub height: f64,
    pub avg_aspect_ratio: f64,
    pub num_assets: u64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub segments: Option<Vec<Segment>>,
    pub items: Option<ItemRange>,
}

impl Section {
    pub fn from_data(data: SectionData, top: f64, height: f64) -> Self {
        Section {
            id: data.id,
            top,
            height,
            avg_aspect_ratio: data.avg_aspect_ratio,
            num_assets: data.num_assets,
            start_date: data.start_date,
            end_date: data.end_date,
            segments: None,
            items: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.segments.is_some()
    }

    pub fn is_laid_out(&self) -> bool {
        self.items.is_some()
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Asset count derived from the loaded segments.
    pub fn count_assets(&self) -> Option<u64> {
        self.segments
            .as_ref()
            .map(|segments| segments.iter().map(|s| s.num_assets() as u64).sum())
    }

    /// Move the section's item range, and every segment range inside it, by
    /// `delta` positions.
    pub(crate) fn shift_items(&mut self, delta: isize) {
        if delta == 0 {
            return;
        }
        if let Some(range) = self.items.as_mut() {
            *range = range.shifted(delta);
        }
        for segment in self.segments.iter_mut().flatten() {
            if let Some(range) = segment.item_range.as_mut() {
                *range = range.shifted(delta);
            }
        }
    }

    /// Forget all grid ranges; the caller removes the items themselves.
    pub(crate) fn clear_layout(&mut self) {
        self.items = None;
        for segment in self.segments.iter_mut().flatten() {
            segment.item_range = None;
        }
    }

    /// Index of the segment whose range contains the grid index `idx`.
    pub fn segment_at_item(&self, idx: usize) -> Option<usize> {
        self.segments
            .as_ref()?
            .iter()
            .position(|s| s.item_range.is_some_and(|r| r.contains(idx)))
    }
}
