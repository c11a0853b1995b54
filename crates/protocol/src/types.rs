use serde::{Deserialize, Serialize};

/// An axis-aligned box in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// Size of the scroll container the grid is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Half-open `[start_idx, end_idx)` range of indices into the flattened
/// grid item array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRange {
    pub start_idx: usize,
    pub end_idx: usize,
}

impl ItemRange {
    pub fn new(start_idx: usize, end_idx: usize) -> Self {
        Self { start_idx, end_idx }
    }

    pub fn len(&self) -> usize {
        self.end_idx.saturating_sub(self.start_idx)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.start_idx <= idx && idx < self.end_idx
    }

    /// The same range moved by `delta` positions (negative moves towards 0).
    pub fn shifted(&self, delta: isize) -> Self {
        Self {
            start_idx: self.start_idx.saturating_add_signed(delta),
            end_idx: self.end_idx.saturating_add_signed(delta),
        }
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.start_idx..self.end_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifting_keeps_length() {
        let r = ItemRange::new(10, 15);
        assert_eq!(r.shifted(3), ItemRange::new(13, 18));
        assert_eq!(r.shifted(-10), ItemRange::new(0, 5));
        assert_eq!(r.shifted(-4).len(), 5);
    }

    #[test]
    fn contains_is_half_open() {
        let r = ItemRange::new(2, 4);
        assert!(!r.contains(1));
        assert!(r.contains(2));
        assert!(r.contains(3));
        assert!(!r.contains(4));
        assert!(ItemRange::new(3, 3).is_empty());
    }

    #[test]
    fn rect_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
    }
}
