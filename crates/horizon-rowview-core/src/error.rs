//! Error types for Horizon RowView.
//!
//! Precondition violations (negative coordinates, out-of-range indices,
//! paths that do not resolve) are reported as errors and are never clamped.
//! Broken internal invariants are programming errors and panic instead.

use std::fmt;

/// Result type alias for row view operations.
pub type Result<T> = std::result::Result<T, RowViewError>;

/// Boxed error produced by an external measurer or renderer.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The coordinate axis a geometry query was made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal (x) axis.
    X,
    /// Vertical (y) axis.
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
        }
    }
}

/// Errors that can occur while maintaining or querying a row index.
#[derive(Debug, thiserror::Error)]
pub enum RowViewError {
    /// A coordinate or extent was negative.
    #[error("{axis} coordinate must be non-negative, got {value}")]
    NegativeCoordinate { axis: Axis, value: i32 },

    /// A row, column or child index was out of range.
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A path component does not resolve to a node.
    #[error("path {path:?} does not resolve to a node")]
    InvalidPath { path: Vec<usize> },

    /// A branch operation was requested on a leaf node.
    #[error("node at {path:?} is not a branch")]
    NotABranch { path: Vec<usize> },

    /// A selection span whose start lies after its end.
    #[error("invalid range [{start}, {end}]")]
    InvalidRange { start: usize, end: usize },

    /// Selection was mutated while the select mode is `None`.
    #[error("selection is not enabled")]
    SelectionDisabled,

    /// More than one index was requested while the select mode is `Single`.
    #[error("only a single index may be selected in single-select mode")]
    SingleSelectMode,

    /// A node or item was checked while checkmarks are disabled.
    #[error("checkmarks are not enabled")]
    CheckmarksDisabled,

    /// A geometry query was made before the pending layout pass ran.
    #[error("layout is invalid; run a layout pass before querying geometry")]
    LayoutInvalid,

    /// The tree index has no tree data installed.
    #[error("no tree data has been set")]
    NoData,

    /// An external measurer failed; the error is passed through unchanged.
    #[error("row measurement failed: {source}")]
    Measure {
        #[source]
        source: BoxedError,
    },

    /// The layout configuration could not be parsed.
    #[error("invalid layout configuration: {source}")]
    Config {
        #[source]
        source: toml::de::Error,
    },
}

impl RowViewError {
    /// Create an out-of-bounds error.
    pub fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }

    /// Create an invalid path error.
    pub fn invalid_path(path: &[usize]) -> Self {
        Self::InvalidPath {
            path: path.to_vec(),
        }
    }

    /// Create a not-a-branch error.
    pub fn not_a_branch(path: &[usize]) -> Self {
        Self::NotABranch {
            path: path.to_vec(),
        }
    }

    /// Wrap an external measurement error.
    pub fn measure(source: impl Into<BoxedError>) -> Self {
        Self::Measure {
            source: source.into(),
        }
    }
}

impl From<toml::de::Error> for RowViewError {
    fn from(source: toml::de::Error) -> Self {
        Self::Config { source }
    }
}

/// Fails with [`RowViewError::NegativeCoordinate`] when `value` is negative.
pub fn check_non_negative(axis: Axis, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| RowViewError::NegativeCoordinate { axis, value })
}

/// Fails with [`RowViewError::IndexOutOfBounds`] when `index >= len`.
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(RowViewError::out_of_bounds(index, len))
    }
}
