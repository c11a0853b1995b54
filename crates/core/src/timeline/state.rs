use photogrid_protocol::{GridItemKind, ItemRange, TimelineGridItem, Viewport};
use tracing::error;

use super::selection::Selection;
use super::{HostEvent, TimelineMode};
use crate::error::TimelineError;
use crate::layout::{LayoutParams, layout_segments};
use crate::model::Section;
use crate::options::TimelineOptions;

/// Copy of the timeline taken when a draft group is created, restored if
/// the draft is cancelled.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub sections: Vec<Section>,
    pub items: Vec<TimelineGridItem>,
    pub visible_sections: Option<(usize, usize)>,
    pub selection: Selection,
}

/// Everything the timeline mutates. `sections[i].items` and every segment's
/// `item_range` index into `items`; the helpers here keep them in step.
#[derive(Debug, Default)]
pub(crate) struct TimelineState {
    pub viewport: Viewport,
    pub sections: Vec<Section>,
    pub items: Vec<TimelineGridItem>,
    pub visible_items: ItemRange,
    /// First and last section of the last published visible run.
    pub visible_sections: Option<(usize, usize)>,
    pub timeline_height: f64,
    /// Smallest title height reported by the renderer so far.
    pub measured_title_height: Option<f64>,
    pub mode: TimelineMode,
    pub selection: Selection,
    pub snapshot: Option<Snapshot>,
    pub pending: Vec<HostEvent>,
}

impl TimelineState {
    pub fn title_height(&self, options: &TimelineOptions) -> f64 {
        self.measured_title_height.unwrap_or(options.header_height)
    }

    pub fn section_count_error(&self, index: usize) -> TimelineError {
        TimelineError::SectionOutOfRange {
            index,
            len: self.sections.len(),
        }
    }

    /// Global asset index of the first asset of section `index`.
    pub fn base_asset_index(&self, index: usize) -> usize {
        self.sections[..index.min(self.sections.len())]
            .iter()
            .map(|s| s.num_assets as usize)
            .sum()
    }

    pub fn total_num_assets(&self) -> u64 {
        self.sections.iter().map(|s| s.num_assets).sum()
    }

    /// Index of the laid-out section whose range contains grid item `idx`.
    pub fn section_of_item(&self, idx: usize) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.items.is_some_and(|r| r.contains(idx)))
    }

    /// Remove the grid items of section `index` and close the gap in the
    /// ranges of every later section. Heights are left alone.
    pub fn unlayout_section(&mut self, index: usize) {
        let Some(range) = self.sections.get(index).and_then(|s| s.items) else {
            return;
        };
        self.items.drain(range.as_range());
        self.sections[index].clear_layout();
        let removed = range.len() as isize;
        for section in &mut self.sections[index + 1..] {
            section.shift_items(-removed);
        }
    }

    /// Compute a fresh layout for section `index` and splice it into the
    /// grid, replacing any previous layout of that section.
    pub fn layout_section(
        &mut self,
        options: &TimelineOptions,
        index: usize,
        adjust_scroll: bool,
    ) -> Result<(), TimelineError> {
        let section = self
            .sections
            .get(index)
            .ok_or_else(|| self.section_count_error(index))?;
        let Some(segments) = section.segments.as_deref() else {
            error!(index, "cannot lay out a section that is not loaded");
            return Err(TimelineError::SectionNotLoaded(index));
        };

        let params = LayoutParams {
            prev_end_date: index.checked_sub(1).map(|i| self.sections[i].end_date),
            base_top: section.top,
            base_asset_index: self.base_asset_index(index),
            container_width: self.viewport.width,
            options,
            title_height: self.title_height(options),
        };
        let layout = layout_segments(segments, &params).inspect_err(|err| {
            error!(index, %err, "section layout failed");
        })?;

        self.unlayout_section(index);
        let insert_at = self.sections[..index]
            .iter()
            .rev()
            .find_map(|s| s.items)
            .map_or(0, |r| r.end_idx);
        let count = layout.items.len();
        self.items.splice(insert_at..insert_at, layout.items);

        let section = &mut self.sections[index];
        let delta = layout.total_height - section.height;
        section.height = layout.total_height;
        section.items = Some(ItemRange::new(insert_at, insert_at + count));
        for (segment, range) in section
            .segments
            .iter_mut()
            .flatten()
            .zip(&layout.segment_ranges)
        {
            segment.item_range = Some(range.shifted(insert_at as isize));
        }
        let section_top = section.top;

        self.shift_after(index, count as isize, delta);
        if adjust_scroll && delta != 0.0 {
            self.pending.push(HostEvent::AdjustScroll {
                delta,
                if_scroll_top_gt: section_top,
            });
        }
        Ok(())
    }

    /// Move every section after `index` by `item_delta` grid positions and
    /// `height_delta` pixels, together with their laid-out items.
    pub fn shift_after(&mut self, index: usize, item_delta: isize, height_delta: f64) {
        let Self {
            sections, items, ..
        } = self;
        for section in sections.iter_mut().skip(index + 1) {
            section.top += height_delta;
            section.shift_items(item_delta);
            if height_delta != 0.0
                && let Some(range) = section.items
            {
                for item in &mut items[range.as_range()] {
                    item.top += height_delta;
                }
            }
        }
    }

    /// Reassign global asset indices of all laid-out thumbnails from the
    /// current per-section asset counts.
    pub fn renumber_asset_indices(&mut self) {
        let Self {
            sections, items, ..
        } = self;
        let mut base = 0usize;
        for section in sections.iter() {
            if let Some(range) = section.items {
                let mut next = base;
                for item in &mut items[range.as_range()] {
                    match &mut item.kind {
                        GridItemKind::Asset { asset_index, .. } => {
                            *asset_index = next;
                            next += 1;
                        }
                        GridItemKind::PhotoStack {
                            first_asset_index,
                            piece_len,
                            ..
                        } => {
                            *first_asset_index = next;
                            next += *piece_len;
                        }
                        _ => {}
                    }
                }
            }
            base += section.num_assets as usize;
        }
    }

    /// Recompute the derived values published to the renderer.
    pub fn refresh_derived(&mut self) {
        self.timeline_height = self.sections.last().map_or(0.0, Section::bottom);
        self.visible_items = self
            .visible_sections
            .and_then(|(first, last)| {
                let run = self.sections.get(first..=last)?;
                let start = run.iter().find_map(|s| s.items)?.start_idx;
                let end = run.iter().rev().find_map(|s| s.items)?.end_idx;
                Some(ItemRange::new(start, end))
            })
            .unwrap_or_default();
    }

    /// Recount `num_assets` of a loaded section from its segments.
    pub fn recount_assets(&mut self, index: usize) {
        if let Some(section) = self.sections.get_mut(index)
            && let Some(count) = section.count_assets()
        {
            section.num_assets = count;
        }
    }
}
