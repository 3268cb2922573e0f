//! Viewport clipping and row geometry.
//!
//! The viewport is the scrolled pixel window, not the set of expanded rows.
//! [`visible_range`] bounds paint and layout work to the rows the window
//! intersects; it never touches selection or data state.

use std::ops::RangeInclusive;

use horizon_rowview_core::{Axis, Result, check_non_negative};

use super::offsets::OffsetTable;

/// The inclusive range of rows intersecting the clip band
/// `clip_top..clip_top + clip_height`.
///
/// Returns `None` when there are no rows, the band is empty, or it starts
/// past the last row. A band reaching past the last row is clamped to it.
///
/// # Example
///
/// ```
/// use horizon_rowview::model::{OffsetTable, visible_range};
///
/// let offsets = OffsetTable::fixed(20, 5);
/// assert_eq!(visible_range(&offsets, 30, 40).unwrap(), Some(1..=3));
/// assert_eq!(visible_range(&offsets, 90, 500).unwrap(), Some(4..=4));
/// assert_eq!(visible_range(&offsets, 100, 10).unwrap(), None);
/// ```
pub fn visible_range(offsets: &OffsetTable, clip_top: i32, clip_height: i32) -> Result<Option<RangeInclusive<usize>>> {
    let top = check_non_negative(Axis::Y, clip_top)?;
    let height = check_non_negative(Axis::Y, clip_height)?;
    if offsets.is_empty() || height == 0 {
        return Ok(None);
    }

    let Some(start) = offsets.row_at_unsigned(top) else {
        return Ok(None);
    };
    let last = offsets.len() - 1;
    let end = offsets
        .row_at_unsigned(top.saturating_add(height - 1))
        .unwrap_or(last)
        .min(last);
    Ok(Some(start..=end))
}

// ============================================================================
// Bounds
// ============================================================================

/// An integer rectangle in content coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Create bounds from origin and size.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// The right edge, exclusive.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// The bottom edge, exclusive.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Whether the bounds have no area.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the point lies inside.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// The smallest bounds covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// The vertical window currently scrolled into view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Scroll offset of the window's top edge.
    pub top: u32,
    /// Height of the window.
    pub height: u32,
}

impl Viewport {
    pub const fn new(top: u32, height: u32) -> Self {
        Self { top, height }
    }

    /// The bottom edge, exclusive.
    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }

    /// The scroll top that brings `bounds` into view with the least movement.
    ///
    /// Bounds taller than the window are aligned to its top edge.
    pub fn reveal(&self, bounds: &Bounds) -> u32 {
        if bounds.y < self.top {
            bounds.y
        } else if bounds.bottom() > self.bottom() {
            if bounds.height <= self.height {
                bounds.bottom() - self.height
            } else {
                bounds.y
            }
        } else {
            self.top
        }
    }

    /// The rows of `offsets` this window intersects.
    pub fn rows(&self, offsets: &OffsetTable) -> Option<RangeInclusive<usize>> {
        if offsets.is_empty() || self.height == 0 {
            return None;
        }
        let start = offsets.row_at_unsigned(self.top)?;
        let last = offsets.len() - 1;
        let end = offsets
            .row_at_unsigned(self.bottom() - 1)
            .unwrap_or(last)
            .min(last);
        Some(start..=end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_rowview_core::RowViewError;

    #[test]
    fn test_visible_range_fixed() {
        let offsets = OffsetTable::fixed(20, 5);
        assert_eq!(visible_range(&offsets, 0, 20).unwrap(), Some(0..=0));
        assert_eq!(visible_range(&offsets, 0, 21).unwrap(), Some(0..=1));
        assert_eq!(visible_range(&offsets, 45, 10).unwrap(), Some(2..=2));
        assert_eq!(visible_range(&offsets, 0, 0).unwrap(), None);
    }

    #[test]
    fn test_visible_range_variable() {
        let offsets = OffsetTable::from_extents([10, 30, 5, 40]);
        // Boundaries: 10, 40, 45, 85.
        assert_eq!(visible_range(&offsets, 9, 2).unwrap(), Some(0..=1));
        assert_eq!(visible_range(&offsets, 40, 6).unwrap(), Some(2..=3));
        assert_eq!(visible_range(&offsets, 50, 1000).unwrap(), Some(3..=3));
        assert_eq!(visible_range(&offsets, 85, 10).unwrap(), None);
    }

    #[test]
    fn test_zero_height_band_is_empty() {
        let fixed = OffsetTable::fixed(20, 5);
        let variable = OffsetTable::from_extents([10, 30, 5, 40]);
        for top in [0, 19, 20, 45, 99] {
            assert_eq!(visible_range(&fixed, top, 0).unwrap(), None, "top = {top}");
            assert_eq!(visible_range(&variable, top, 0).unwrap(), None, "top = {top}");
        }
        assert_eq!(visible_range(&fixed, 19, 1).unwrap(), Some(0..=0));
    }

    #[test]
    fn test_visible_range_empty_and_negative() {
        assert_eq!(visible_range(&OffsetTable::empty(), 0, 100).unwrap(), None);
        assert!(matches!(
            visible_range(&OffsetTable::fixed(20, 5), -1, 10),
            Err(RowViewError::NegativeCoordinate { value: -1, .. })
        ));
        assert!(visible_range(&OffsetTable::fixed(20, 5), 0, -10).is_err());
    }

    #[test]
    fn test_bounds_union() {
        let a = Bounds::new(0, 20, 100, 20);
        let b = Bounds::new(10, 60, 50, 20);
        assert_eq!(a.union(&b), Bounds::new(0, 20, 100, 60));
        assert_eq!(a.union(&Bounds::default()), a);
        assert!(a.contains(99, 39));
        assert!(!a.contains(100, 39));
    }

    #[test]
    fn test_reveal() {
        let viewport = Viewport::new(100, 50);
        assert_eq!(viewport.reveal(&Bounds::new(0, 110, 10, 20)), 100);
        assert_eq!(viewport.reveal(&Bounds::new(0, 80, 10, 20)), 80);
        assert_eq!(viewport.reveal(&Bounds::new(0, 140, 10, 20)), 110);
        assert_eq!(viewport.reveal(&Bounds::new(0, 140, 10, 80)), 140);
    }

    #[test]
    fn test_viewport_rows() {
        let offsets = OffsetTable::fixed(20, 5);
        assert_eq!(Viewport::new(30, 40).rows(&offsets), Some(1..=3));
        assert_eq!(Viewport::new(200, 40).rows(&offsets), None);
    }
}
