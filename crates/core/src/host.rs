/// Callbacks into whatever renders the timeline.
///
/// The timeline never calls the host while it holds a borrow of its own
/// state, so implementations may read the timeline from inside a callback.
pub trait TimelineHost {
    /// Content above the viewport changed height by `delta`. Shift the
    /// scroll offset by the same amount, but only if it is currently greater
    /// than `if_scroll_top_gt`.
    fn adjust_scroll_top(&self, delta: f64, if_scroll_top_gt: f64);

    /// Bring the band `[top, top + height)` to the middle of the viewport.
    fn scroll_to_center(&self, _top: f64, _height: f64) {}

    /// Items, sections or selection changed and should be redrawn.
    fn timeline_changed(&self) {}
}

/// Host for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl TimelineHost for NoopHost {
    fn adjust_scroll_top(&self, _delta: f64, _if_scroll_top_gt: f64) {}
}
