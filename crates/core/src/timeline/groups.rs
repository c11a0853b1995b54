use std::cell::Cell;
use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use photogrid_protocol::{AssetId, GroupId, SharedStr};
use tracing::{error, info, instrument};

use super::state::{Snapshot, TimelineState};
use super::{HostEvent, Timeline, TimelineMode};
use crate::api::TimelineApi;
use crate::error::TimelineError;
use crate::host::TimelineHost;
use crate::model::{ItemId, Segment, SegmentKind, TimelineItem};
use crate::options::TimelineOptions;

/// Position of a segment as (section, segment) indices.
type SegmentPos = (usize, usize);

fn find_segment(st: &TimelineState, pred: impl Fn(&Segment) -> bool) -> Option<SegmentPos> {
    st.sections.iter().enumerate().find_map(|(si, section)| {
        section
            .segments
            .as_ref()?
            .iter()
            .position(&pred)
            .map(|gi| (si, gi))
    })
}

fn find_draft(st: &TimelineState) -> Result<SegmentPos, TimelineError> {
    find_segment(st, Segment::is_creating_group).ok_or_else(|| {
        error!("draft group segment not found");
        TimelineError::DraftMissing
    })
}

fn draft_asset_ids(st: &TimelineState, (si, gi): SegmentPos) -> Vec<AssetId> {
    st.sections[si]
        .segments
        .as_ref()
        .and_then(|segments| segments.get(gi))
        .map(|draft| {
            draft
                .items
                .iter()
                .flat_map(TimelineItem::assets)
                .map(|a| a.id.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Split `segment` around the selected items. Selected items are appended
/// to `extracted`; the rest is returned as the segments replacing it.
fn extract_selected(
    segment: Segment,
    selected: &HashSet<ItemId>,
    extracted: &mut Vec<TimelineItem>,
) -> Vec<Segment> {
    match segment.kind {
        SegmentKind::DateRange => {
            let mut pieces = Vec::new();
            let mut run = Vec::new();
            for item in segment.items {
                if selected.contains(&item.id()) {
                    extracted.push(item);
                    pieces.extend(Segment::synthesized(
                        SegmentKind::DateRange,
                        std::mem::take(&mut run),
                        None,
                    ));
                } else {
                    run.push(item);
                }
            }
            pieces.extend(Segment::synthesized(SegmentKind::DateRange, run, None));
            pieces
        }
        SegmentKind::Group { .. } | SegmentKind::CreatingGroup => {
            let mut segment = segment;
            let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut segment.items)
                .into_iter()
                .partition(|item| selected.contains(&item.id()));
            extracted.extend(taken);
            segment.items = kept;
            if segment.items.is_empty() {
                Vec::new()
            } else {
                segment.refresh_dates();
                vec![segment]
            }
        }
    }
}

impl TimelineState {
    /// Relayout the given sections where they are laid out, plus any in
    /// `force`, then fix asset numbering.
    fn relayout_sections(
        &mut self,
        options: &TimelineOptions,
        indices: &BTreeSet<usize>,
        force: Option<usize>,
    ) -> Result<(), TimelineError> {
        for &index in indices {
            self.recount_assets(index);
        }
        for &index in indices {
            if self.sections[index].is_laid_out() || force == Some(index) {
                self.layout_section(options, index, false)?;
            }
        }
        self.renumber_asset_indices();
        Ok(())
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.sections = snapshot.sections;
        self.items = snapshot.items;
        self.visible_sections = snapshot.visible_sections;
        self.selection = snapshot.selection;
    }

    /// Put back the sections as they were before the draft. Sections loaded
    /// since then keep their segments, and the current visible run is laid
    /// out again where the snapshot has no layout for it.
    fn revert_draft(&mut self, options: &TimelineOptions, snapshot: Snapshot) -> Result<(), TimelineError> {
        let Snapshot {
            mut sections,
            items,
            selection,
            ..
        } = snapshot;
        for (restored, current) in sections.iter_mut().zip(self.sections.iter_mut()) {
            if !restored.is_loaded() && current.is_loaded() {
                restored.segments = current.segments.take();
                restored.num_assets = current.num_assets;
                restored.clear_layout();
            }
        }
        self.sections = sections;
        self.items = items;
        self.selection = selection;
        self.renumber_asset_indices();

        if let Some((first, last)) = self.visible_sections {
            for index in first..=last.min(self.sections.len().saturating_sub(1)) {
                let section = &self.sections[index];
                if section.is_loaded() && !section.is_laid_out() {
                    self.layout_section(options, index, true)?;
                }
            }
        }
        Ok(())
    }
}

/// Marks a draft save as in flight until dropped.
struct SavingDraft<'a>(&'a Cell<bool>);

impl<'a> SavingDraft<'a> {
    fn begin(flag: &'a Cell<bool>) -> Result<Self, TimelineError> {
        if flag.replace(true) {
            return Err(TimelineError::DraftSaving);
        }
        Ok(Self(flag))
    }
}

impl Drop for SavingDraft<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<A, H> Timeline<A, H>
where
    A: TimelineApi + 'static,
    H: TimelineHost,
{
    /// Move the selected items into a draft group placed among the
    /// sections they came from, and enter `CreatingGroup` mode.
    ///
    /// Returns `false`, changing nothing, when no loaded item is selected.
    #[instrument(skip(self))]
    pub fn create_group_clicked(&self) -> Result<bool, TimelineError> {
        self.update(|st| {
            if st.mode == TimelineMode::CreatingGroup {
                return Err(TimelineError::AlreadyCreatingGroup);
            }
            if st.selection.is_empty() {
                return Ok(false);
            }
            let snapshot = Snapshot {
                sections: st.sections.clone(),
                items: st.items.clone(),
                visible_sections: st.visible_sections,
                selection: st.selection.clone(),
            };
            match self.build_draft(st) {
                Ok(true) => {
                    st.selection.clear();
                    st.snapshot = Some(snapshot);
                    st.mode = TimelineMode::CreatingGroup;
                    Ok(true)
                }
                Ok(false) => {
                    st.restore(snapshot);
                    Ok(false)
                }
                Err(err) => {
                    st.restore(snapshot);
                    Err(err)
                }
            }
        })
    }

    fn build_draft(&self, st: &mut TimelineState) -> Result<bool, TimelineError> {
        let selected = st.selection.item_ids();
        let has_selected_items = st.sections.iter().any(|section| {
            section.segments.iter().flatten().any(|segment| {
                segment.items.iter().any(|item| selected.contains(&item.id()))
            })
        });
        if !has_selected_items {
            return Ok(false);
        }

        let mut extracted = Vec::new();
        let mut affected = BTreeSet::new();
        for (index, section) in st.sections.iter_mut().enumerate() {
            let Some(segments) = section.segments.take() else {
                continue;
            };
            let mut rebuilt = Vec::with_capacity(segments.len());
            for segment in segments {
                if segment.items.iter().any(|item| selected.contains(&item.id())) {
                    affected.insert(index);
                    rebuilt.extend(extract_selected(segment, &selected, &mut extracted));
                } else {
                    rebuilt.push(segment);
                }
            }
            section.segments = Some(rebuilt);
        }

        extracted.sort_by(|a, b| b.newest_date().cmp(&a.newest_date()));
        let Some(date) = extracted.iter().map(TimelineItem::oldest_date).min() else {
            return Ok(false);
        };
        let Some(draft) = Segment::synthesized(SegmentKind::CreatingGroup, extracted, Some(date)) else {
            return Ok(false);
        };

        let target = insertion_section(st, &affected, date).ok_or(TimelineError::DraftMissing)?;
        if let Some(segments) = st.sections[target].segments.as_mut() {
            let at = segments
                .iter()
                .position(|s| s.sort_date < date)
                .unwrap_or(segments.len());
            segments.insert(at, draft);
        }

        st.relayout_sections(&self.options, &affected, Some(target))?;

        let (si, gi) = find_draft(st)?;
        if let Some(range) = st.sections[si]
            .segments
            .as_ref()
            .and_then(|segments| segments[gi].item_range)
            .filter(|range| !range.is_empty())
        {
            let top = st.items[range.start_idx].top;
            let bottom = st.items[range.as_range()]
                .iter()
                .map(|item| item.bottom())
                .fold(top, f64::max);
            st.pending.push(HostEvent::ScrollToCenter {
                top,
                height: bottom - top,
            });
        }
        info!(section = target, sections = affected.len(), "draft group created");
        Ok(true)
    }

    /// Store the draft group on the server under `name` and turn it into a
    /// regular group.
    #[instrument(skip(self))]
    pub async fn confirm_create_group(&self, name: &str) -> Result<GroupId, TimelineError> {
        let asset_ids = {
            let st = self.state.borrow();
            if st.mode != TimelineMode::CreatingGroup {
                return Err(TimelineError::NotCreatingGroup);
            }
            draft_asset_ids(&st, find_draft(&st)?)
        };

        let _saving = SavingDraft::begin(&self.saving_draft)?;
        let created = self.api.create_group(name, &asset_ids).await?;

        self.update(|st| {
            let (si, gi) = find_draft(st)?;
            if let Some(draft) = st.sections[si].segments.as_mut().and_then(|s| s.get_mut(gi)) {
                draft.kind = SegmentKind::Group {
                    group_id: created.group_id.clone(),
                    name: (!name.is_empty()).then(|| SharedStr::from(name)),
                };
                draft.sort_date = created.display_date;
            }
            st.layout_section(&self.options, si, false)?;
            st.mode = TimelineMode::JustLooking;
            st.snapshot = None;
            info!(group = %created.group_id, assets = asset_ids.len(), "group created");
            Ok(created.group_id.clone())
        })
    }

    /// Throw the draft group away and restore the timeline as it was
    /// before `create_group_clicked`, selection included.
    ///
    /// Fails with `DraftSaving` while a confirm or add-to-group request is
    /// waiting on the server.
    pub fn cancel_create_group(&self) -> Result<(), TimelineError> {
        if self.saving_draft.get() {
            error!("draft cancelled while it is being saved");
            return Err(TimelineError::DraftSaving);
        }
        self.update(|st| {
            if st.mode != TimelineMode::CreatingGroup {
                return Err(TimelineError::NotCreatingGroup);
            }
            st.mode = TimelineMode::JustLooking;
            match st.snapshot.take() {
                Some(snapshot) => st.revert_draft(&self.options, snapshot),
                None => {
                    error!("no snapshot to restore");
                    Ok(())
                }
            }
        })
    }

    /// Add the draft group's items to the existing group `group_id` instead
    /// of creating a new one.
    #[instrument(skip(self))]
    pub async fn add_selected_to_existing_group(&self, group_id: &GroupId) -> Result<(), TimelineError> {
        let asset_ids = {
            let st = self.state.borrow();
            if st.mode != TimelineMode::CreatingGroup {
                return Err(TimelineError::NotCreatingGroup);
            }
            let draft = find_draft(&st)?;
            if find_segment(&st, |s| s.group_id() == Some(group_id)).is_none() {
                error!(group = %group_id, "target group is not loaded");
                return Err(TimelineError::GroupNotFound(group_id.clone()));
            }
            draft_asset_ids(&st, draft)
        };

        let _saving = SavingDraft::begin(&self.saving_draft)?;
        self.api.add_to_group(&asset_ids, group_id).await?;

        self.update(|st| {
            let (ds, dg) = find_draft(st)?;
            let draft = match st.sections[ds].segments.as_mut() {
                Some(segments) => segments.remove(dg),
                None => return Err(TimelineError::DraftMissing),
            };
            let (ts, tg) = find_segment(st, |s| s.group_id() == Some(group_id))
                .ok_or_else(|| TimelineError::GroupNotFound(group_id.clone()))?;
            if let Some(target) = st.sections[ts].segments.as_mut().and_then(|s| s.get_mut(tg)) {
                target.items.extend(draft.items);
                target
                    .items
                    .sort_by(|a, b| b.newest_date().cmp(&a.newest_date()));
                target.refresh_dates();
            }

            st.relayout_sections(&self.options, &BTreeSet::from([ds, ts]), None)?;
            st.mode = TimelineMode::JustLooking;
            st.snapshot = None;
            info!(group = %group_id, assets = asset_ids.len(), "added to existing group");
            Ok(())
        })
    }
}

/// Section that receives a draft group dated `date`: the last affected
/// section whose oldest segment is not newer than the group, or the last
/// affected section.
fn insertion_section(
    st: &TimelineState,
    affected: &BTreeSet<usize>,
    date: DateTime<Utc>,
) -> Option<usize> {
    affected
        .iter()
        .rev()
        .copied()
        .find(|&index| {
            st.sections[index]
                .segments
                .as_ref()
                .and_then(|segments| segments.last())
                .is_some_and(|last| last.sort_date <= date)
        })
        .or_else(|| affected.last().copied())
}
