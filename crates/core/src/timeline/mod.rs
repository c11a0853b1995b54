//! The timeline controller: owns sections and grid items, decides what is
//! loaded and laid out, and applies selection and group edits.
//!
//! All methods take `&self`. State lives in a `RefCell` that is never
//! borrowed across an `.await`, so overlapping calls on a single-threaded
//! executor see each other's completed updates but never a half-applied
//! one. Host callbacks are queued while the state is borrowed and delivered
//! afterwards.

mod groups;
mod query;
mod selection;
mod state;
mod viewport;

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use photogrid_protocol::{ItemRange, TimelineGridItem, Viewport};

use crate::api::TimelineApi;
use crate::error::TimelineError;
use crate::host::TimelineHost;
use crate::loader::SegmentLoader;
use crate::model::Section;
use crate::options::TimelineOptions;

pub use query::Direction;

use state::TimelineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimelineMode {
    #[default]
    JustLooking,
    /// A draft group holds the selection until it is confirmed, cancelled
    /// or merged into an existing group.
    CreatingGroup,
}

/// Result of a scroll update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollOutcome {
    /// The visible run was loaded, laid out and published.
    Updated(ItemRange),
    /// A newer scroll update started while this one was loading; nothing
    /// was changed.
    Stale,
    /// There are no sections.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum HostEvent {
    AdjustScroll { delta: f64, if_scroll_top_gt: f64 },
    ScrollToCenter { top: f64, height: f64 },
    Changed,
}

pub struct Timeline<A, H> {
    options: TimelineOptions,
    api: Rc<A>,
    loader: SegmentLoader<A>,
    host: H,
    state: RefCell<TimelineState>,
    scroll_generation: Cell<u64>,
    initialized: Cell<bool>,
    /// Set while a confirm or add-to-group request for the draft is out.
    saving_draft: Cell<bool>,
}

impl<A, H> Timeline<A, H>
where
    A: TimelineApi + 'static,
    H: TimelineHost,
{
    pub fn new(options: TimelineOptions, api: Rc<A>, host: H) -> Self {
        Self {
            options,
            loader: SegmentLoader::new(Rc::clone(&api)),
            api,
            host,
            state: RefCell::new(TimelineState::default()),
            scroll_generation: Cell::new(0),
            initialized: Cell::new(false),
            saving_draft: Cell::new(false),
        }
    }

    pub fn options(&self) -> &TimelineOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// All laid-out grid items, sorted by section.
    ///
    /// The returned guard must be dropped before calling any method that
    /// changes the timeline.
    pub fn items(&self) -> Ref<'_, [TimelineGridItem]> {
        Ref::map(self.state.borrow(), |st| st.items.as_slice())
    }

    pub fn sections(&self) -> Ref<'_, [Section]> {
        Ref::map(self.state.borrow(), |st| st.sections.as_slice())
    }

    /// Grid items of the sections around the viewport.
    pub fn visible_items(&self) -> ItemRange {
        self.state.borrow().visible_items
    }

    pub fn timeline_height(&self) -> f64 {
        self.state.borrow().timeline_height
    }

    pub fn total_num_assets(&self) -> u64 {
        self.state.borrow().total_num_assets()
    }

    pub fn mode(&self) -> TimelineMode {
        self.state.borrow().mode
    }

    pub fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    /// Current guess for the height of title items.
    pub fn title_height(&self) -> f64 {
        self.state.borrow().title_height(&self.options)
    }

    /// Run a state mutation, refresh derived values and notify the host.
    ///
    /// Derived values are refreshed and the host is told about changes even
    /// when `f` fails halfway.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut TimelineState) -> Result<T, TimelineError>,
    ) -> Result<T, TimelineError> {
        let result = {
            let mut st = self.state.borrow_mut();
            let result = f(&mut st);
            st.refresh_derived();
            st.pending.push(HostEvent::Changed);
            result
        };
        self.flush_host_events();
        result
    }

    fn flush_host_events(&self) {
        let events = std::mem::take(&mut self.state.borrow_mut().pending);
        let mut changed = false;
        for event in events {
            match event {
                HostEvent::AdjustScroll {
                    delta,
                    if_scroll_top_gt,
                } => self.host.adjust_scroll_top(delta, if_scroll_top_gt),
                HostEvent::ScrollToCenter { top, height } => self.host.scroll_to_center(top, height),
                HostEvent::Changed => changed = true,
            }
        }
        if changed {
            self.host.timeline_changed();
        }
    }
}
