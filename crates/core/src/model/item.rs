use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use photogrid_protocol::{Asset, AssetId, ItemData, SeriesData, SeriesId, SharedStr};

/// A series of near-duplicate shots, shared by all of its displayed pieces.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetSeries {
    pub series_id: SeriesId,
    pub assets: Vec<Asset>,
    pub selection_indices: Vec<usize>,
}

/// One displayed piece of a series: the assets in `range`, shown with the
/// cover `series.assets[cover_index]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoStack {
    pub series: Arc<AssetSeries>,
    pub range: Range<usize>,
    pub cover_index: usize,
}

impl PhotoStack {
    pub fn cover(&self) -> &Asset {
        &self.series.assets[self.cover_index]
    }

    pub fn assets(&self) -> &[Asset] {
        &self.series.assets[self.range.clone()]
    }
}

/// Whatever is displayed as one thumbnail in the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineItem {
    Asset(Asset),
    PhotoStack(PhotoStack),
}

/// Identity of a displayed item, used as the selection key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Asset(AssetId),
    StackPiece { series_id: SeriesId, start: usize },
}

impl TimelineItem {
    /// The asset whose thumbnail represents this item.
    pub fn display_asset(&self) -> &Asset {
        match self {
            TimelineItem::Asset(asset) => asset,
            TimelineItem::PhotoStack(stack) => stack.cover(),
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.display_asset().aspect_ratio()
    }

    pub fn assets(&self) -> &[Asset] {
        match self {
            TimelineItem::Asset(asset) => std::slice::from_ref(asset),
            TimelineItem::PhotoStack(stack) => stack.assets(),
        }
    }

    /// Number of underlying assets, counting every asset of a stack piece.
    pub fn num_assets(&self) -> usize {
        self.assets().len()
    }

    pub fn series_id(&self) -> Option<&SeriesId> {
        match self {
            TimelineItem::Asset(_) => None,
            TimelineItem::PhotoStack(stack) => Some(&stack.series.series_id),
        }
    }

    pub fn id(&self) -> ItemId {
        match self {
            TimelineItem::Asset(asset) => ItemId::Asset(asset.id.clone()),
            TimelineItem::PhotoStack(stack) => ItemId::StackPiece {
                series_id: stack.series.series_id.clone(),
                start: stack.range.start,
            },
        }
    }

    /// Grid key of the item's thumbnail.
    pub fn key(&self) -> SharedStr {
        match self {
            TimelineItem::Asset(asset) => format!("asset-{}", asset.id).into(),
            TimelineItem::PhotoStack(stack) => {
                format!("stack-{}-{}", stack.series.series_id, stack.range.start).into()
            }
        }
    }

    pub fn newest_date(&self) -> DateTime<Utc> {
        self.assets()
            .iter()
            .map(|a| a.taken_date)
            .max()
            .unwrap_or(self.display_asset().taken_date)
    }

    pub fn oldest_date(&self) -> DateTime<Utc> {
        self.assets()
            .iter()
            .map(|a| a.taken_date)
            .min()
            .unwrap_or(self.display_asset().taken_date)
    }

    pub fn contains_any(&self, ids: &HashSet<AssetId>) -> bool {
        self.assets().iter().any(|a| ids.contains(&a.id))
    }
}

/// Convert a fetched item into displayed items; a series becomes one stack
/// per keeper.
pub fn items_from_data(data: ItemData) -> Vec<TimelineItem> {
    match data {
        ItemData::Asset(asset) => vec![TimelineItem::Asset(asset)],
        ItemData::PhotoSeries(series) => split_series(series),
    }
}

/// Split a series at each selected (keeper) asset.
///
/// Piece `k` starts at the `k`-th keeper (the first piece starts at 0) and
/// runs up to the next keeper; its cover is the keeper itself. A series
/// without keepers is shown as a single stack covered by its first asset.
pub fn split_series(data: SeriesData) -> Vec<TimelineItem> {
    let len = data.assets.len();
    if len == 0 {
        return Vec::new();
    }
    let mut keepers: Vec<usize> = data
        .selection_indices
        .iter()
        .copied()
        .filter(|&i| i < len)
        .collect();
    keepers.sort_unstable();
    keepers.dedup();
    if keepers.is_empty() {
        keepers.push(0);
    }

    let series = Arc::new(AssetSeries {
        series_id: data.series_id,
        assets: data.assets,
        selection_indices: keepers.clone(),
    });

    keepers
        .iter()
        .enumerate()
        .map(|(k, &cover_index)| {
            let start = if k == 0 { 0 } else { cover_index };
            let end = keepers.get(k + 1).copied().unwrap_or(len);
            TimelineItem::PhotoStack(PhotoStack {
                series: Arc::clone(&series),
                range: start..end,
                cover_index,
            })
        })
        .collect()
}
