//! Records exchanged with the data-fetch and mutation collaborators.
//!
//! These mirror the JSON shapes served by the media server: the section
//! catalog, per-section segment lists, and the responses of the hide /
//! create-group / add-to-group mutations. Field names are camelCase on the
//! wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared_str::{AssetId, GroupId, SectionId, SeriesId};

/// One photo or video as delivered by the server.
///
/// Only the fields the layout engine needs are typed; everything else the
/// server sends (representations, paths, metadata) is carried through
/// untouched in `extra` for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation in degrees the renderer applies to the pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_correction: Option<i32>,
    pub taken_date: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Asset {
    /// Width and height as displayed, i.e. swapped when the rotation
    /// correction is an odd multiple of 90°.
    pub fn display_size(&self) -> (f64, f64) {
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        match self.rotation_correction {
            Some(rot) if rot.rem_euclid(180) == 90 => (h, w),
            _ => (w, h),
        }
    }

    /// Displayed width / height. Degenerate sizes are treated as square.
    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = self.display_size();
        if w <= 0.0 || h <= 0.0 { 1.0 } else { w / h }
    }
}

/// Entry of the section catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionData {
    pub id: SectionId,
    pub avg_aspect_ratio: f64,
    pub num_assets: u64,
    /// Date of the most recent asset in the section.
    pub start_date: DateTime<Utc>,
    /// Date of the oldest asset in the section.
    pub end_date: DateTime<Utc>,
}

/// A segment as returned by the segment fetch of one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentData {
    DateRange(DateRangeData),
    UserGroup(UserGroupData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeData {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub items: Vec<ItemData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroupData {
    pub id: GroupId,
    #[serde(default)]
    pub name: Option<String>,
    pub items: Vec<ItemData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemData {
    Asset(Asset),
    PhotoSeries(SeriesData),
}

/// A burst of near-duplicate shots. `selection_indices` are the positions
/// in `assets` the user marked as keepers; the timeline shows one stack per
/// keeper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesData {
    pub series_id: SeriesId,
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub selection_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HideAction {
    Hide,
    Unhide,
}

/// Response of the create-group mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGroup {
    pub group_id: GroupId,
    pub display_date: DateTime<Utc>,
}
