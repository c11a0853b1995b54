use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::Asset;
use crate::shared_str::{GroupId, SeriesId, SharedStr};
use crate::types::Rect;

/// A single positioned element of the timeline grid.
///
/// The layout engine emits a flat `Vec<TimelineGridItem>` sorted by `top`.
/// Renderers consume it as-is: every record carries its own geometry and
/// the data it displays, so no lookups into sections or segments are needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineGridItem {
    /// Unique among all items at any point in time; stable across relayouts
    /// of the same content.
    pub key: SharedStr,
    pub top: f64,
    pub height: f64,
    #[serde(flatten)]
    pub kind: GridItemKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GridItemKind {
    Asset {
        left: f64,
        width: f64,
        /// Position among all assets of the timeline, counting every asset
        /// of a series.
        asset_index: usize,
        asset: Asset,
    },
    /// One displayed piece of a series.
    PhotoStack {
        left: f64,
        width: f64,
        series_id: SeriesId,
        cover: Asset,
        /// Global asset index of the first asset covered by this piece.
        first_asset_index: usize,
        /// Number of series assets folded into this piece.
        piece_len: usize,
        series_len: usize,
    },
    /// Month heading, spans the full container width.
    MajorTitle { month: NaiveDate },
    DayTitle {
        left: f64,
        width: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    GroupTitle {
        left: f64,
        width: f64,
        group_id: GroupId,
        name: Option<SharedStr>,
    },
    /// Title of a group that is being created; the renderer shows a text
    /// input here.
    GroupTitleInput { left: f64, width: f64 },
}

impl TimelineGridItem {
    pub fn is_title(&self) -> bool {
        !self.is_selectable()
    }

    /// Assets and photo stacks can be selected; titles cannot.
    pub fn is_selectable(&self) -> bool {
        matches!(
            self.kind,
            GridItemKind::Asset { .. } | GridItemKind::PhotoStack { .. }
        )
    }

    /// Horizontal extent, `None` for full-width items.
    pub fn horizontal(&self) -> Option<(f64, f64)> {
        match &self.kind {
            GridItemKind::Asset { left, width, .. }
            | GridItemKind::PhotoStack { left, width, .. }
            | GridItemKind::DayTitle { left, width, .. }
            | GridItemKind::GroupTitle { left, width, .. }
            | GridItemKind::GroupTitleInput { left, width } => Some((*left, *width)),
            GridItemKind::MajorTitle { .. } => None,
        }
    }

    /// Bounding box; full-width items span `container_width`.
    pub fn bounds(&self, container_width: f64) -> Rect {
        let (left, width) = self.horizontal().unwrap_or((0.0, container_width));
        Rect::new(left, self.top, width, self.height)
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}
