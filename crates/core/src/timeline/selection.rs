use std::collections::{HashMap, HashSet};

use photogrid_protocol::{AssetId, HideAction};
use tracing::{debug, error, info, instrument};

use super::{HostEvent, Timeline, TimelineMode};
use crate::api::TimelineApi;
use crate::error::TimelineError;
use crate::host::TimelineHost;
use crate::model::{ItemId, TimelineItem};

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    ordinal: u64,
    /// Every underlying asset of the selected item.
    asset_ids: Vec<AssetId>,
}

/// Selected items keyed by identity, remembering the order of selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Selection {
    entries: HashMap<ItemId, Entry>,
    next_ordinal: u64,
}

impl Selection {
    pub fn select(&mut self, item: &TimelineItem) {
        let next = &mut self.next_ordinal;
        self.entries.entry(item.id()).or_insert_with(|| {
            let ordinal = *next;
            *next += 1;
            Entry {
                ordinal,
                asset_ids: item.assets().iter().map(|a| a.id.clone()).collect(),
            }
        });
    }

    pub fn deselect(&mut self, id: &ItemId) {
        self.entries.remove(id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_ordinal = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    fn ordered(&self) -> Vec<(&ItemId, &Entry)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.ordinal);
        entries
    }

    /// Selected items in the order they were selected.
    pub fn items(&self) -> Vec<ItemId> {
        self.ordered().into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Underlying asset ids in selection order, without duplicates.
    pub fn asset_ids(&self) -> Vec<AssetId> {
        let mut seen = HashSet::new();
        self.ordered()
            .into_iter()
            .flat_map(|(_, entry)| entry.asset_ids.iter())
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect()
    }

    pub fn item_ids(&self) -> HashSet<ItemId> {
        self.entries.keys().cloned().collect()
    }
}

impl<A, H> Timeline<A, H>
where
    A: TimelineApi + 'static,
    H: TimelineHost,
{
    /// Select or deselect the thumbnail at grid index `index`.
    ///
    /// A photo stack piece carries every other displayed piece of its series
    /// along, so a series is always selected as a whole.
    pub fn set_item_selected(&self, index: usize, selected: bool) -> Result<(), TimelineError> {
        self.update(|st| {
            let len = st.items.len();
            let item = st
                .items
                .get(index)
                .ok_or(TimelineError::ItemOutOfRange { index, len })?;
            if !item.is_selectable() {
                error!(index, "tried to select a title");
                return Err(TimelineError::NotSelectable(index));
            }
            let section_index = st.section_of_item(index).ok_or_else(|| {
                error!(index, "selected item belongs to no laid-out section");
                TimelineError::OrphanItem(index)
            })?;
            let section = &st.sections[section_index];
            let segment = section
                .segment_at_item(index)
                .and_then(|s| section.segments.as_ref()?.get(s))
                .ok_or_else(|| {
                    error!(index, "no segment covers selected item");
                    TimelineError::SegmentNotFound(index)
                })?;
            let range = segment.item_range.unwrap_or_default();
            let position = st.items[range.start_idx..index]
                .iter()
                .filter(|item| item.is_selectable())
                .count();
            let clicked = segment
                .items
                .get(position)
                .ok_or(TimelineError::SegmentNotFound(index))?;

            let mut affected = vec![clicked];
            if let Some(series) = clicked.series_id() {
                let same_series = |item: &&TimelineItem| item.series_id() == Some(series);
                affected.extend(segment.items[position + 1..].iter().take_while(same_series));
                affected.extend(segment.items[..position].iter().rev().take_while(same_series));
            }

            let affected: Vec<TimelineItem> = affected.into_iter().cloned().collect();
            for item in &affected {
                if selected {
                    st.selection.select(item);
                } else {
                    st.selection.deselect(&item.id());
                }
            }
            debug!(index, selected, pieces = affected.len(), "selection changed");
            Ok(())
        })
    }

    pub fn clear_selection(&self) {
        {
            let mut st = self.state.borrow_mut();
            st.selection.clear();
            st.refresh_derived();
            st.pending.push(HostEvent::Changed);
        }
        self.flush_host_events();
    }

    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.state.borrow().selection.contains(id)
    }

    /// Selected items in the order they were selected.
    pub fn selected_items(&self) -> Vec<ItemId> {
        self.state.borrow().selection.items()
    }

    /// Number of underlying assets selected, counting every asset of a
    /// selected series once.
    pub fn selected_asset_count(&self) -> usize {
        self.state.borrow().selection.asset_ids().len()
    }

    /// Hide every selected asset on the server, then drop them from the
    /// timeline. Returns the number of hidden assets.
    ///
    /// Nothing changes locally if the server call fails; the selection is
    /// kept so the user can retry.
    #[instrument(skip(self))]
    pub async fn hide_selected_assets(&self) -> Result<usize, TimelineError> {
        let asset_ids = {
            let st = self.state.borrow();
            if st.mode == TimelineMode::CreatingGroup {
                return Err(TimelineError::AlreadyCreatingGroup);
            }
            st.selection.asset_ids()
        };
        if asset_ids.is_empty() {
            return Ok(0);
        }

        self.api.set_hidden(&asset_ids, HideAction::Hide).await?;

        let hidden: HashSet<AssetId> = asset_ids.iter().cloned().collect();
        self.update(|st| {
            let mut affected = Vec::new();
            for (index, section) in st.sections.iter_mut().enumerate() {
                let Some(segments) = section.segments.as_mut() else {
                    continue;
                };
                let mut touched = false;
                for segment in segments.iter_mut() {
                    let before = segment.items.len();
                    segment.items.retain(|item| !item.contains_any(&hidden));
                    if segment.items.len() != before {
                        touched = true;
                        segment.refresh_dates();
                    }
                }
                if touched {
                    segments.retain(|segment| !segment.items.is_empty());
                    affected.push(index);
                }
            }
            for &index in &affected {
                st.recount_assets(index);
            }
            for &index in &affected {
                if st.sections[index].is_laid_out() {
                    st.layout_section(&self.options, index, false)?;
                }
            }
            st.renumber_asset_indices();
            st.selection.clear();
            info!(hidden = hidden.len(), sections = affected.len(), "assets hidden");
            Ok(hidden.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use photogrid_protocol::{Asset, SeriesData, SeriesId};

    use crate::model::split_series;

    fn asset(id: &str) -> Asset {
        Asset {
            id: AssetId::from(id),
            width: 10,
            height: 10,
            rotation_correction: None,
            taken_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn ordinals_follow_selection_order() {
        let mut sel = Selection::default();
        let b = TimelineItem::Asset(asset("b"));
        let a = TimelineItem::Asset(asset("a"));
        sel.select(&b);
        sel.select(&a);
        sel.select(&b);
        assert_eq!(sel.items(), vec![b.id(), a.id()]);
        sel.deselect(&b.id());
        assert_eq!(sel.asset_ids(), vec![AssetId::from("a")]);
    }

    #[test]
    fn series_pieces_expand_without_duplicates() {
        let pieces = split_series(SeriesData {
            series_id: SeriesId::from("s"),
            assets: vec![asset("s1"), asset("s2"), asset("s3")],
            selection_indices: vec![0, 2],
        });
        let mut sel = Selection::default();
        for piece in &pieces {
            sel.select(piece);
        }
        sel.select(&pieces[0]);
        assert_eq!(sel.asset_ids().len(), 3);
        assert_eq!(sel.items().len(), 2);
    }

    #[test]
    fn clear_resets_ordinals() {
        let mut sel = Selection::default();
        sel.select(&TimelineItem::Asset(asset("a")));
        sel.clear();
        assert!(sel.is_empty());
        assert_eq!(sel.next_ordinal, 0);
    }
}
