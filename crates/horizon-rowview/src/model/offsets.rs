//! Cumulative row boundaries and coordinate-to-row mapping.
//!
//! An [`OffsetTable`] stores, for each row `i`, the pixel offset at which the
//! row ends. Uniformly sized rows keep a single scalar instead of a full
//! boundary sequence; both representations answer the same queries.
//!
//! # Example
//!
//! ```
//! use horizon_rowview::model::OffsetTable;
//!
//! let offsets = OffsetTable::fixed(20, 5);
//! assert_eq!(offsets.boundary(4).unwrap(), 100);
//! assert_eq!(offsets.row_at(45).unwrap(), Some(2));
//! assert_eq!(offsets.row_at(100).unwrap(), None);
//! ```

use horizon_rowview_core::{Axis, Result, check_index, check_non_negative};

/// Cumulative end offsets of a sequence of rows (or columns).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetTable {
    /// `count` rows, each `extent` pixels tall.
    Fixed {
        /// Extent shared by every row.
        extent: u32,
        /// Number of rows.
        count: usize,
    },
    /// One end offset per row, monotonically non-decreasing.
    Variable {
        /// `boundaries[i]` is the end of row `i`.
        boundaries: Vec<u32>,
    },
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::Variable {
            boundaries: Vec::new(),
        }
    }
}

impl OffsetTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `count` rows of `extent` pixels each.
    pub fn fixed(extent: u32, count: usize) -> Self {
        Self::Fixed { extent, count }
    }

    /// Build boundaries by accumulating per-row extents.
    pub fn from_extents<I>(extents: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut end = 0u32;
        let boundaries = extents
            .into_iter()
            .map(|extent| {
                end = end.saturating_add(extent);
                end
            })
            .collect();
        Self::Variable { boundaries }
    }

    /// Like [`from_extents`](Self::from_extents), stopping at the first
    /// measurement error.
    pub fn try_from_extents<I, E>(extents: I) -> std::result::Result<Self, E>
    where
        I: IntoIterator<Item = std::result::Result<u32, E>>,
    {
        let mut end = 0u32;
        let mut boundaries = Vec::new();
        for extent in extents {
            end = end.saturating_add(extent?);
            boundaries.push(end);
        }
        Ok(Self::Variable { boundaries })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Self::Fixed { count, .. } => *count,
            Self::Variable { boundaries } => boundaries.len(),
        }
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the table is the single-scalar representation.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed { .. })
    }

    /// The shared extent, if the table is fixed.
    pub fn fixed_extent(&self) -> Option<u32> {
        match self {
            Self::Fixed { extent, .. } => Some(*extent),
            Self::Variable { .. } => None,
        }
    }

    /// End offset of the last row, 0 when empty.
    pub fn total_extent(&self) -> u32 {
        match self {
            Self::Fixed { extent, count } => end_of(*extent, *count),
            Self::Variable { boundaries } => boundaries.last().copied().unwrap_or(0),
        }
    }

    /// End offset of row `index`.
    pub fn boundary(&self, index: usize) -> Result<u32> {
        check_index(index, self.len())?;
        Ok(self.boundary_unchecked(index))
    }

    /// Start offset of row `index`.
    pub fn row_y(&self, index: usize) -> Result<u32> {
        check_index(index, self.len())?;
        Ok(self.start_unchecked(index))
    }

    /// Extent of row `index`.
    pub fn row_height(&self, index: usize) -> Result<u32> {
        check_index(index, self.len())?;
        Ok(self.boundary_unchecked(index) - self.start_unchecked(index))
    }

    /// The row containing offset `y`: the smallest `i` with
    /// `boundary(i) > y`, or `None` when `y` lies past the last row.
    pub fn row_at(&self, y: i32) -> Result<Option<usize>> {
        let y = check_non_negative(Axis::Y, y)?;
        Ok(self.row_at_unsigned(y))
    }

    pub(crate) fn row_at_unsigned(&self, y: u32) -> Option<usize> {
        match self {
            Self::Fixed { extent, count } => {
                if *extent == 0 {
                    return None;
                }
                let row = (y / extent) as usize;
                (row < *count).then_some(row)
            }
            Self::Variable { boundaries } => {
                let row = boundaries.partition_point(|&end| end <= y);
                (row < boundaries.len()).then_some(row)
            }
        }
    }

    /// Iterate over the end offsets of every row.
    pub fn boundaries(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).map(|i| self.boundary_unchecked(i))
    }

    fn boundary_unchecked(&self, index: usize) -> u32 {
        match self {
            Self::Fixed { extent, .. } => end_of(*extent, index + 1),
            Self::Variable { boundaries } => boundaries[index],
        }
    }

    fn start_unchecked(&self, index: usize) -> u32 {
        if index == 0 {
            0
        } else {
            self.boundary_unchecked(index - 1)
        }
    }
}

fn end_of(extent: u32, count: usize) -> u32 {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    extent.saturating_mul(count)
}
