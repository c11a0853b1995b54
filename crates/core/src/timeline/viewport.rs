use photogrid_protocol::Viewport;
use tracing::{debug, error, info, instrument, warn};

use super::state::TimelineState;
use super::{HostEvent, ScrollOutcome, Timeline};
use crate::api::TimelineApi;
use crate::error::TimelineError;
use crate::host::TimelineHost;
use crate::layout::estimate_height;
use crate::model::{Section, Segment};

/// First and last index of the contiguous run of sections intersecting
/// `[lo, hi]`.
fn visible_run(sections: &[Section], lo: f64, hi: f64) -> Option<(usize, usize)> {
    let visible = |s: &Section| s.top <= hi && lo <= s.bottom();
    let first = sections.iter().position(visible)?;
    let run = sections[first..].iter().take_while(|s| visible(s)).count();
    Some((first, first + run - 1))
}

/// Drop every layout and stack the sections at their estimated heights.
fn reestimate(sections: &mut [Section], width: f64, target_row_height: f64) {
    let mut top = 0.0;
    for section in sections {
        section.clear_layout();
        section.top = top;
        section.height =
            estimate_height(section.avg_aspect_ratio, section.num_assets, width, target_row_height);
        top += section.height;
    }
}

impl<A, H> Timeline<A, H>
where
    A: TimelineApi + 'static,
    H: TimelineHost,
{
    /// Fetch the section catalog and place every section at its estimated
    /// height. Only the first call does anything; a failed call may be
    /// retried.
    #[instrument(skip(self))]
    pub async fn initialize(&self, viewport: Viewport) -> Result<(), TimelineError> {
        if self.initialized.replace(true) {
            return Ok(());
        }
        let catalog = match self.api.fetch_sections().await {
            Ok(catalog) => catalog,
            Err(err) => {
                self.initialized.set(false);
                error!(%err, "section catalog fetch failed");
                return Err(err.into());
            }
        };

        let target = self.options.target_row_height;
        self.update(|st| {
            st.viewport = viewport;
            let mut top = 0.0;
            st.sections = catalog
                .into_iter()
                .map(|data| {
                    let height =
                        estimate_height(data.avg_aspect_ratio, data.num_assets, viewport.width, target);
                    let section = Section::from_data(data, top, height);
                    top += height;
                    section
                })
                .collect();
            info!(sections = st.sections.len(), height = top, "timeline initialized");
            Ok(())
        })
    }

    /// Adapt to a new viewport size. All geometry is discarded and
    /// re-estimated for the new width, then the sections around
    /// `scroll_top` are laid out again.
    pub async fn resize(&self, viewport: Viewport, scroll_top: f64) -> Result<ScrollOutcome, TimelineError> {
        if !self.initialized.get() {
            return Err(TimelineError::NoViewport);
        }
        if self.state.borrow().viewport == viewport {
            return Ok(ScrollOutcome::Updated(self.visible_items()));
        }

        let target = self.options.target_row_height;
        self.update(|st| {
            st.viewport = viewport;
            st.items.clear();
            st.visible_sections = None;
            reestimate(&mut st.sections, viewport.width, target);
            // a draft's snapshot must come back at the new width too
            if let Some(snapshot) = st.snapshot.as_mut() {
                snapshot.items.clear();
                snapshot.visible_sections = None;
                reestimate(&mut snapshot.sections, viewport.width, target);
            }
            debug!(width = viewport.width, height = viewport.height, "viewport resized");
            Ok(())
        })?;
        self.on_scroll_change(scroll_top, false).await
    }

    /// Load and lay out the sections around the viewport at `top` and
    /// publish their grid items as visible.
    ///
    /// A call that is overtaken by a newer one while its sections load
    /// returns `Stale` without touching the layout.
    #[instrument(skip(self))]
    pub async fn on_scroll_change(
        &self,
        top: f64,
        force_relayout: bool,
    ) -> Result<ScrollOutcome, TimelineError> {
        if !self.initialized.get() {
            return Err(TimelineError::NoViewport);
        }
        let run = {
            let st = self.state.borrow();
            let margin = self.options.load_within_margin;
            visible_run(
                &st.sections,
                top - margin,
                top + st.viewport.height + margin,
            )
        };
        let Some((first, last)) = run else {
            return Ok(ScrollOutcome::Empty);
        };

        let generation = self.scroll_generation.get() + 1;
        self.scroll_generation.set(generation);

        futures::future::try_join_all((first..=last).map(|index| self.load_section(index))).await?;

        if self.scroll_generation.get() != generation {
            debug!(generation, "scroll result is stale");
            return Ok(ScrollOutcome::Stale);
        }

        self.update(|st| {
            for index in first..=last {
                if force_relayout || !st.sections[index].is_laid_out() {
                    st.layout_section(&self.options, index, true)?;
                }
            }
            st.visible_sections = Some((first, last));
            Ok(())
        })?;
        Ok(ScrollOutcome::Updated(self.visible_items()))
    }

    /// Fetch the segments of section `index` unless they are already
    /// loaded. Concurrent calls for the same section share one request.
    pub async fn load_section(&self, index: usize) -> Result<(), TimelineError> {
        let id = {
            let st = self.state.borrow();
            let section = st.sections.get(index).ok_or_else(|| {
                error!(index, "load of unknown section");
                st.section_count_error(index)
            })?;
            if section.is_loaded() {
                return Ok(());
            }
            section.id.clone()
        };

        let data = self.loader.request(&id).await?;

        let mut st = self.state.borrow_mut();
        let Some(section) = st.sections.get_mut(index).filter(|s| !s.is_loaded()) else {
            return Ok(());
        };
        let segments: Vec<Segment> = data.iter().cloned().map(Segment::from_data).collect();
        let counted: u64 = segments.iter().map(|s| s.num_assets() as u64).sum();
        section.segments = Some(segments);
        if counted != section.num_assets {
            warn!(
                section = %section.id,
                catalog = section.num_assets,
                loaded = counted,
                "section asset count differs from catalog"
            );
            section.num_assets = counted;
            st.renumber_asset_indices();
        }
        Ok(())
    }

    /// Lay out a loaded section, replacing its previous layout. With
    /// `adjust_scroll`, the host is asked to compensate the height change
    /// when the viewport is below the section's top.
    pub fn layout_section(&self, index: usize, adjust_scroll: bool) -> Result<(), TimelineError> {
        self.update(|st| st.layout_section(&self.options, index, adjust_scroll))
    }

    /// Replace the guessed height of the title at grid index `index` with
    /// the measured one, moving everything below it.
    ///
    /// The smallest measured title height becomes the guess for titles laid
    /// out from now on.
    pub fn set_actual_item_height(&self, index: usize, height: f64) -> Result<(), TimelineError> {
        if !height.is_finite() || height < 0.0 {
            return Err(TimelineError::InvalidHeight(height));
        }
        self.update(|st| st.measure_title(index, height))
    }
}

impl TimelineState {
    fn measure_title(&mut self, index: usize, height: f64) -> Result<(), TimelineError> {
        let len = self.items.len();
        let item = self
            .items
            .get(index)
            .ok_or(TimelineError::ItemOutOfRange { index, len })?;
        if item.is_selectable() {
            error!(index, "only titles can be measured");
            return Err(TimelineError::NotATitle(index));
        }
        let (old_height, item_top) = (item.height, item.top);
        if old_height == height {
            return Ok(());
        }
        let section_index = self.section_of_item(index).ok_or_else(|| {
            error!(index, "measured item belongs to no laid-out section");
            TimelineError::OrphanItem(index)
        })?;
        if self.measured_title_height.is_none_or(|guess| height < guess) {
            self.measured_title_height = Some(height);
        }
        let delta = height - old_height;
        let section = &mut self.sections[section_index];
        section.height += delta;
        let end = section.items.map_or(index + 1, |r| r.end_idx);

        self.items[index].height = height;
        for item in &mut self.items[index + 1..end] {
            item.top += delta;
        }
        self.shift_after(section_index, 0, delta);
        self.pending.push(HostEvent::AdjustScroll {
            delta,
            if_scroll_top_gt: item_top,
        });
        Ok(())
    }
}
