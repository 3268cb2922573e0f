//! Logging and debugging facilities for Horizon RowView.
//!
//! This module provides:
//! - Fixed `tracing` targets for the layout, visible-row and selection code
//! - A text rendering of the visible rows of a tree index
//! - Performance spans for profiling layout passes
//!
//! # Tracing Integration
//!
//! Nothing is logged unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_rowview::layout=debug")
//!     .init();
//! ```

use std::fmt::Write as FmtWrite;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal emission target.
    pub const SIGNAL: &str = "horizon_rowview_core::signal";
    /// Offset table and layout pass target.
    pub const LAYOUT: &str = "horizon_rowview::layout";
    /// Visible-row list maintenance target.
    pub const VISIBLE: &str = "horizon_rowview::visible";
    /// Selection tracking target.
    pub const SELECTION: &str = "horizon_rowview::selection";
    /// Performance span target.
    pub const PERF: &str = "horizon_rowview::perf";
}

/// Style options for row tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact representation, one dash per level.
    Compact,
}

/// Configuration for [`RowTreeDebug`] output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to prefix each line with its visible row index.
    pub show_rows: bool,
    /// Whether to list the flags set on each row.
    pub show_flags: bool,
    /// Maximum depth to print (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_rows: true,
            show_flags: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options for minimal output: labels and connectors only.
    pub fn minimal() -> Self {
        Self {
            show_rows: false,
            show_flags: false,
            ..Default::default()
        }
    }

    /// Set the tree style.
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// Limit the printed depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// One visible row handed to [`RowTreeDebug`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRow {
    /// Depth of the node; top-level nodes have depth 1.
    pub depth: usize,
    /// Display label.
    pub label: String,
    /// Names of the flags set on the row.
    pub flags: Vec<&'static str>,
}

impl DebugRow {
    /// Create a row without flags.
    pub fn new(depth: usize, label: impl Into<String>) -> Self {
        Self {
            depth,
            label: label.into(),
            flags: Vec::new(),
        }
    }

    /// Attach flag names.
    pub fn with_flags(mut self, flags: Vec<&'static str>) -> Self {
        self.flags = flags;
        self
    }
}

/// Renders a pre-order run of visible rows as an indented tree.
#[derive(Debug, Clone, Default)]
pub struct RowTreeDebug {
    options: TreeFormatOptions,
}

impl RowTreeDebug {
    /// Create a visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format `rows`, which must be in visible (pre-order) order.
    pub fn format(&self, rows: &[DebugRow]) -> String {
        let mut output = String::new();
        writeln!(output, "Visible rows ({} total):", rows.len()).expect("write to String");
        if rows.is_empty() {
            writeln!(output, "  (empty)").expect("write to String");
            return output;
        }

        for (row, entry) in rows.iter().enumerate() {
            if let Some(max) = self.options.max_depth
                && entry.depth > max
            {
                continue;
            }

            let is_last = Self::is_last_sibling(rows, row);
            output.push_str(&self.build_prefix(entry.depth, is_last));
            if self.options.show_rows {
                write!(output, "#{row} ").expect("write to String");
            }
            output.push_str(&entry.label);
            if self.options.show_flags && !entry.flags.is_empty() {
                write!(output, " [{}]", entry.flags.join(", ")).expect("write to String");
            }
            output.push('\n');
        }
        output
    }

    /// A row is the last among its siblings when no later row at the same
    /// depth appears before the list returns to a shallower depth.
    fn is_last_sibling(rows: &[DebugRow], row: usize) -> bool {
        let depth = rows[row].depth;
        for later in &rows[row + 1..] {
            if later.depth < depth {
                return true;
            }
            if later.depth == depth {
                return false;
            }
        }
        true
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth <= 1 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500} ",
                "\u{2514}\u{2500}\u{2500} ",
            ),
            TreeStyle::Compact => ("", "- ", "- "),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 2) {
            prefix.push_str(branch);
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to measure the duration of layout passes.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a performance span for `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<DebugRow> {
        vec![
            DebugRow::new(1, "A"),
            DebugRow::new(1, "B").with_flags(vec!["expanded"]),
            DebugRow::new(2, "B1").with_flags(vec!["selected"]),
            DebugRow::new(2, "B2"),
            DebugRow::new(1, "C"),
        ]
    }

    #[test]
    fn test_format_empty() {
        let output = RowTreeDebug::new().format(&[]);
        assert!(output.contains("0 total"));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_format_hierarchy() {
        let output = RowTreeDebug::new().format(&sample());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "#0 A");
        assert_eq!(lines[2], "#1 B [expanded]");
        assert_eq!(lines[3], "\u{251c}\u{2500}\u{2500} #2 B1 [selected]");
        assert_eq!(lines[4], "\u{2514}\u{2500}\u{2500} #3 B2");
        assert_eq!(lines[5], "#4 C");
    }

    #[test]
    fn test_format_minimal_ascii() {
        let options = TreeFormatOptions::minimal().with_style(TreeStyle::Ascii);
        let output = RowTreeDebug::with_options(options).format(&sample());
        assert!(output.contains("+-- B1\n"));
        assert!(output.contains("`-- B2\n"));
        assert!(!output.contains('#'));
        assert!(!output.contains("[expanded]"));
    }

    #[test]
    fn test_format_max_depth() {
        let options = TreeFormatOptions::minimal().with_max_depth(1);
        let output = RowTreeDebug::with_options(options).format(&sample());
        assert!(!output.contains("B1"));
        assert!(output.contains("C"));
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}
