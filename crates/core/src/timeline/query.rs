use photogrid_protocol::{Asset, GridItemKind, Rect, TimelineGridItem};
use tracing::error;

use super::Timeline;
use super::state::TimelineState;
use crate::api::TimelineApi;
use crate::error::TimelineError;
use crate::host::TimelineHost;

/// Keyboard navigation direction in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Section holding the global asset `index` and the offset inside it.
fn locate_asset(st: &TimelineState, index: usize) -> Result<(usize, usize), TimelineError> {
    let mut base = 0;
    for (section_index, section) in st.sections.iter().enumerate() {
        let count = section.num_assets as usize;
        if index < base + count {
            return Ok((section_index, index - base));
        }
        base += count;
    }
    error!(index, total = base, "asset index out of range");
    Err(TimelineError::ItemOutOfRange { index, len: base })
}

fn covers_asset(item: &TimelineGridItem, asset_index: usize) -> bool {
    match item.kind {
        GridItemKind::Asset {
            asset_index: idx, ..
        } => idx == asset_index,
        GridItemKind::PhotoStack {
            first_asset_index,
            piece_len,
            ..
        } => (first_asset_index..first_asset_index + piece_len).contains(&asset_index),
        _ => false,
    }
}

fn contains_point(rect: &Rect, x: f64, y: f64) -> bool {
    rect.x <= x && x < rect.right() && rect.y <= y && y < rect.bottom()
}

fn center_x(item: &TimelineGridItem) -> f64 {
    item.horizontal().map_or(0.0, |(left, width)| left + width / 2.0)
}

impl<A, H> Timeline<A, H>
where
    A: TimelineApi + 'static,
    H: TimelineHost,
{
    /// The asset at global asset index `index`, loading its section first
    /// if needed. Every asset of a photo series counts.
    pub async fn get_or_load_asset_at_index(&self, index: usize) -> Result<Asset, TimelineError> {
        let (section_index, _) = locate_asset(&self.state.borrow(), index)?;
        self.load_section(section_index).await?;

        // loading may have corrected the section's asset count
        let st = self.state.borrow();
        let (section_index, mut offset) = locate_asset(&st, index)?;
        let segments = st.sections[section_index]
            .segments
            .as_deref()
            .ok_or(TimelineError::SectionNotLoaded(section_index))?;
        for item in segments.iter().flat_map(|segment| segment.items.iter()) {
            let assets = item.assets();
            if let Some(asset) = assets.get(offset) {
                return Ok(asset.clone());
            }
            offset -= assets.len();
        }
        error!(index, section_index, "asset count does not match segments");
        Err(TimelineError::ItemOutOfRange {
            index,
            len: st.total_num_assets() as usize,
        })
    }

    /// Make sure the section holding global asset `asset_index` is loaded
    /// and laid out, and return the grid item showing that asset with its
    /// grid index. The scroll position is not adjusted.
    pub async fn move_view_to_asset(
        &self,
        asset_index: usize,
    ) -> Result<(usize, TimelineGridItem), TimelineError> {
        let (section_index, _) = locate_asset(&self.state.borrow(), asset_index)?;
        self.load_section(section_index).await?;

        self.update(|st| {
            let (section_index, _) = locate_asset(st, asset_index)?;
            if !st.sections[section_index].is_laid_out() {
                st.layout_section(&self.options, section_index, false)?;
            }
            let range = st.sections[section_index].items.unwrap_or_default();
            st.items[range.as_range()]
                .iter()
                .position(|item| covers_asset(item, asset_index))
                .map(|offset| (range.start_idx + offset, st.items[range.start_idx + offset].clone()))
                .ok_or_else(|| {
                    error!(asset_index, section_index, "laid-out section has no item for asset");
                    TimelineError::ItemOutOfRange {
                        index: asset_index,
                        len: st.total_num_assets() as usize,
                    }
                })
        })
    }

    /// Grid index of the laid-out item whose box contains the point.
    pub fn grid_item_at_position(&self, x: f64, y: f64) -> Option<usize> {
        let st = self.state.borrow();
        let width = st.viewport.width;
        let section = st.sections.iter().find(|s| s.top <= y && y < s.bottom())?;
        let range = section.items?;
        st.items[range.as_range()]
            .iter()
            .position(|item| contains_point(&item.bounds(width), x, y))
            .map(|offset| range.start_idx + offset)
    }

    /// Grid index of the thumbnail next to `index` in `direction`.
    ///
    /// Left and right follow grid order. Up and down move to the nearest
    /// row above or below and pick the thumbnail whose horizontal centre is
    /// closest.
    pub fn next_item_position(&self, index: usize, direction: Direction) -> Option<usize> {
        let st = self.state.borrow();
        let items = &st.items;
        let current = items.get(index).filter(|item| item.is_selectable())?;
        let thumbnails = |range: std::ops::Range<usize>| {
            range
                .filter(|&i| items[i].is_selectable())
                .collect::<Vec<_>>()
        };

        match direction {
            Direction::Left => thumbnails(0..index).last().copied(),
            Direction::Right => thumbnails(index + 1..items.len()).first().copied(),
            Direction::Up | Direction::Down => {
                let candidates = if direction == Direction::Up {
                    let above = thumbnails(0..index);
                    let row_top = above
                        .iter()
                        .rev()
                        .map(|&i| items[i].top)
                        .find(|&top| top < current.top)?;
                    above
                        .into_iter()
                        .filter(|&i| items[i].top == row_top)
                        .collect::<Vec<_>>()
                } else {
                    let below = thumbnails(index + 1..items.len());
                    let row_top = below
                        .iter()
                        .map(|&i| items[i].top)
                        .find(|&top| top > current.top)?;
                    below
                        .into_iter()
                        .filter(|&i| items[i].top == row_top)
                        .collect::<Vec<_>>()
                };
                let x = center_x(current);
                candidates
                    .into_iter()
                    .min_by(|&a, &b| {
                        let da = (center_x(&items[a]) - x).abs();
                        let db = (center_x(&items[b]) - x).abs();
                        da.total_cmp(&db)
                    })
            }
        }
    }
}
