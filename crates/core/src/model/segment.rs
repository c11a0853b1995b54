use chrono::{DateTime, Utc};
use photogrid_protocol::{GroupId, ItemRange, SegmentData, SharedStr};

use super::item::{TimelineItem, items_from_data};

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    /// Assets of one day that are not in any group.
    DateRange,
    /// A user-created group stored on the server.
    Group {
        group_id: GroupId,
        name: Option<SharedStr>,
    },
    /// Draft group holding the current selection until it is confirmed or
    /// cancelled.
    CreatingGroup,
}

/// A run of items laid out together, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub items: Vec<TimelineItem>,
    pub sort_date: DateTime<Utc>,
    /// Date of the most recent item.
    pub start: DateTime<Utc>,
    /// Date of the oldest item.
    pub end: DateTime<Utc>,
    /// Absolute range in the grid item array, set while the owning section
    /// is laid out.
    pub item_range: Option<ItemRange>,
}

impl Segment {
    pub fn from_data(data: SegmentData) -> Self {
        match data {
            SegmentData::DateRange(range) => {
                let items = range.items.into_iter().flat_map(items_from_data).collect();
                Segment {
                    kind: SegmentKind::DateRange,
                    items,
                    sort_date: range.sort_date.unwrap_or(range.start),
                    start: range.start,
                    end: range.end,
                    item_range: None,
                }
            }
            SegmentData::UserGroup(group) => {
                let items: Vec<TimelineItem> =
                    group.items.into_iter().flat_map(items_from_data).collect();
                let fallback = group.sort_date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                let (start, end) = date_bounds(&items).unwrap_or((fallback, fallback));
                Segment {
                    kind: SegmentKind::Group {
                        group_id: group.id,
                        name: group.name.map(SharedStr::from),
                    },
                    items,
                    sort_date: group.sort_date.unwrap_or(start),
                    start,
                    end,
                    item_range: None,
                }
            }
        }
    }

    /// Build a segment from items split off another one. Dates are derived
    /// from the items; `sort_date` defaults to the newest item. Returns
    /// `None` for an empty item list.
    pub fn synthesized(
        kind: SegmentKind,
        items: Vec<TimelineItem>,
        sort_date: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        let (start, end) = date_bounds(&items)?;
        Some(Segment {
            kind,
            items,
            sort_date: sort_date.unwrap_or(start),
            start,
            end,
            item_range: None,
        })
    }

    pub fn num_assets(&self) -> usize {
        self.items.iter().map(TimelineItem::num_assets).sum()
    }

    pub fn is_creating_group(&self) -> bool {
        matches!(self.kind, SegmentKind::CreatingGroup)
    }

    pub fn group_id(&self) -> Option<&GroupId> {
        match &self.kind {
            SegmentKind::Group { group_id, .. } => Some(group_id),
            _ => None,
        }
    }

    /// Recompute `start`/`end` after the item list changed.
    pub fn refresh_dates(&mut self) {
        if let Some((start, end)) = date_bounds(&self.items) {
            self.start = start;
            self.end = end;
        }
    }
}

/// Newest and oldest date over all items, `None` when empty.
pub fn date_bounds(items: &[TimelineItem]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let newest = items.iter().map(TimelineItem::newest_date).max()?;
    let oldest = items.iter().map(TimelineItem::oldest_date).min()?;
    Some((newest, oldest))
}
