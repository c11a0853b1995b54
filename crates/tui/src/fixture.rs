//! In-process library backed by a JSON file, standing in for the media
//! server.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use photogrid_core::{ApiError, TimelineApi};
use photogrid_protocol::{
    Asset, AssetId, CreatedGroup, GroupId, HideAction, ItemData, SectionData, SectionId,
    SegmentData,
};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct LibraryFile {
    sections: Vec<LibrarySection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibrarySection {
    id: SectionId,
    avg_aspect_ratio: f64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    segments: Vec<SegmentData>,
}

fn segment_items(segment: &SegmentData) -> &[ItemData] {
    match segment {
        SegmentData::DateRange(range) => &range.items,
        SegmentData::UserGroup(group) => &group.items,
    }
}

fn segment_items_mut(segment: &mut SegmentData) -> &mut Vec<ItemData> {
    match segment {
        SegmentData::DateRange(range) => &mut range.items,
        SegmentData::UserGroup(group) => &mut group.items,
    }
}

fn item_assets(item: &ItemData) -> &[Asset] {
    match item {
        ItemData::Asset(asset) => std::slice::from_ref(asset),
        ItemData::PhotoSeries(series) => &series.assets,
    }
}

/// Library file loaded into memory. Mutations only touch the in-memory
/// copy.
pub struct FixtureApi {
    sections: Vec<LibrarySection>,
    hidden: RefCell<HashSet<AssetId>>,
    groups: RefCell<HashSet<GroupId>>,
    next_group: Cell<u32>,
}

impl FixtureApi {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: LibraryFile = serde_json::from_str(json).context("malformed library file")?;
        let groups = file
            .sections
            .iter()
            .flat_map(|section| &section.segments)
            .filter_map(|segment| match segment {
                SegmentData::UserGroup(group) => Some(group.id.clone()),
                SegmentData::DateRange(_) => None,
            })
            .collect();
        Ok(Self {
            sections: file.sections,
            hidden: RefCell::default(),
            groups: RefCell::new(groups),
            next_group: Cell::new(1),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read library {}", path.display()))?;
        let api = Self::from_json_str(&json)?;
        info!(path = %path.display(), sections = api.sections.len(), "library loaded");
        Ok(api)
    }

    fn is_visible(&self, item: &ItemData) -> bool {
        let hidden = self.hidden.borrow();
        !item_assets(item).iter().any(|a| hidden.contains(&a.id))
    }

    fn visible_segments(&self, section: &LibrarySection) -> Vec<SegmentData> {
        section
            .segments
            .iter()
            .cloned()
            .filter_map(|mut segment| {
                segment_items_mut(&mut segment).retain(|item| self.is_visible(item));
                (!segment_items(&segment).is_empty()).then_some(segment)
            })
            .collect()
    }

    fn newest_date(&self, asset_ids: &[AssetId]) -> Option<DateTime<Utc>> {
        let wanted: HashSet<&AssetId> = asset_ids.iter().collect();
        self.sections
            .iter()
            .flat_map(|section| &section.segments)
            .flat_map(segment_items)
            .flat_map(item_assets)
            .filter(|asset| wanted.contains(&asset.id))
            .map(|asset| asset.taken_date)
            .max()
    }
}

impl TimelineApi for FixtureApi {
    async fn fetch_sections(&self) -> Result<Vec<SectionData>, ApiError> {
        Ok(self
            .sections
            .iter()
            .map(|section| SectionData {
                id: section.id.clone(),
                avg_aspect_ratio: section.avg_aspect_ratio,
                num_assets: self
                    .visible_segments(section)
                    .iter()
                    .flat_map(segment_items)
                    .map(|item| item_assets(item).len() as u64)
                    .sum(),
                start_date: section.start_date,
                end_date: section.end_date,
            })
            .collect())
    }

    async fn fetch_segments(&self, section_id: &SectionId) -> Result<Vec<SegmentData>, ApiError> {
        debug!(section = %section_id, "segments requested");
        self.sections
            .iter()
            .find(|section| &section.id == section_id)
            .map(|section| self.visible_segments(section))
            .ok_or_else(|| ApiError::NotFound(section_id.to_string()))
    }

    async fn set_hidden(&self, asset_ids: &[AssetId], action: HideAction) -> Result<(), ApiError> {
        let mut hidden = self.hidden.borrow_mut();
        for id in asset_ids {
            match action {
                HideAction::Hide => hidden.insert(id.clone()),
                HideAction::Unhide => hidden.remove(id),
            };
        }
        Ok(())
    }

    async fn create_group(&self, name: &str, asset_ids: &[AssetId]) -> Result<CreatedGroup, ApiError> {
        if asset_ids.is_empty() {
            return Err(ApiError::Request("group needs at least one asset".into()));
        }
        let display_date = self
            .newest_date(asset_ids)
            .ok_or_else(|| ApiError::NotFound(asset_ids[0].to_string()))?;
        let n = self.next_group.get();
        self.next_group.set(n + 1);
        let group_id = GroupId::from(format!("local-{n}"));
        self.groups.borrow_mut().insert(group_id.clone());
        info!(group = %group_id, name, assets = asset_ids.len(), "group stored");
        Ok(CreatedGroup {
            group_id,
            display_date,
        })
    }

    async fn add_to_group(&self, asset_ids: &[AssetId], group_id: &GroupId) -> Result<(), ApiError> {
        if !self.groups.borrow().contains(group_id) {
            return Err(ApiError::NotFound(group_id.to_string()));
        }
        info!(group = %group_id, assets = asset_ids.len(), "assets added to group");
        Ok(())
    }
}
