//! Layout configuration.
//!
//! Every measurement constant an index needs lives in a [`LayoutConfig`]
//! owned by that index. Configs can be built in code with the `with_*`
//! builders or loaded from TOML; missing keys take their defaults.
//!
//! ```
//! use horizon_rowview::{LayoutConfig, RowSizing};
//!
//! let config = LayoutConfig::from_toml_str(
//!     r#"
//!     row_sizing = "variable"
//!     indent = 20
//!
//!     [checkmarks]
//!     width = 12
//!     height = 12
//!     padding = 3
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.row_sizing, RowSizing::Variable);
//! assert_eq!(config.min_row_height(), 18);
//! assert_eq!(config.spacing, 6);
//! ```

use horizon_rowview_core::Result;
use serde::{Deserialize, Serialize};

/// How row extents are computed during layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSizing {
    /// Every row shares one measured height.
    #[default]
    Fixed,
    /// Each row is measured on its own.
    Variable,
}

/// Size of the checkbox drawn in front of checkable rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckboxMetrics {
    pub width: u32,
    pub height: u32,
    /// Gap kept on each side of the box.
    pub padding: u32,
}

impl Default for CheckboxMetrics {
    fn default() -> Self {
        Self {
            width: 14,
            height: 14,
            padding: 2,
        }
    }
}

impl CheckboxMetrics {
    /// Minimum row height that fits the box and its padding.
    pub fn min_row_height(&self) -> u32 {
        self.height + 2 * self.padding
    }

    /// Horizontal space the box occupies in a flat row.
    pub fn row_indent(&self) -> u32 {
        self.width + 2 * self.padding
    }
}

/// Measurement constants for list, table and tree indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Fixed or per-row heights.
    pub row_sizing: RowSizing,
    /// Height used by [`RowSizing::Fixed`] instead of measuring a row.
    pub fixed_row_height: Option<u32>,
    /// Pixels appended after every row, e.g. a horizontal grid line.
    pub row_spacing: u32,
    /// Pixels between table columns.
    pub column_spacing: u32,
    /// Checkbox size; `None` disables checkmarks.
    pub checkmarks: Option<CheckboxMetrics>,
    /// Tree indentation per level.
    pub indent: u32,
    /// Gap after each indentation step.
    pub spacing: u32,
    /// Whether tree rows reserve room for an expand/collapse control.
    pub show_branch_controls: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_sizing: RowSizing::Fixed,
            fixed_row_height: None,
            row_spacing: 0,
            column_spacing: 1,
            checkmarks: None,
            indent: 16,
            spacing: 6,
            show_branch_controls: true,
        }
    }
}

impl LayoutConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_row_sizing(mut self, row_sizing: RowSizing) -> Self {
        self.row_sizing = row_sizing;
        self
    }

    pub fn with_fixed_row_height(mut self, height: u32) -> Self {
        self.fixed_row_height = Some(height);
        self
    }

    pub fn with_row_spacing(mut self, spacing: u32) -> Self {
        self.row_spacing = spacing;
        self
    }

    pub fn with_column_spacing(mut self, spacing: u32) -> Self {
        self.column_spacing = spacing;
        self
    }

    pub fn with_checkmarks(mut self, metrics: CheckboxMetrics) -> Self {
        self.checkmarks = Some(metrics);
        self
    }

    pub fn with_indent(mut self, indent: u32) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_spacing(mut self, spacing: u32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_branch_controls(mut self, show: bool) -> Self {
        self.show_branch_controls = show;
        self
    }

    /// Whether rows carry a checkbox.
    pub fn checkmarks_enabled(&self) -> bool {
        self.checkmarks.is_some()
    }

    /// Lower bound on every row's content height.
    pub fn min_row_height(&self) -> u32 {
        self.checkmarks.map_or(0, |metrics| metrics.min_row_height())
    }
}
