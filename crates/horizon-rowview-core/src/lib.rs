//! Core systems for Horizon RowView.
//!
//! This crate provides the pieces the row indexes in `horizon-rowview` are
//! built on:
//!
//! - **Signals**: synchronous change notification between data sources,
//!   selection trackers and their observers
//! - **Errors**: the [`RowViewError`] taxonomy shared by every index
//! - **Logging**: `tracing` targets, performance spans and a text dump of
//!   visible rows
//!
//! # Signal Example
//!
//! ```
//! use horizon_rowview_core::Signal;
//!
//! let selection_changed = Signal::<Vec<usize>>::new();
//! let conn_id = selection_changed.connect(|rows| {
//!     println!("selected rows: {rows:?}");
//! });
//! selection_changed.emit(vec![1, 2, 3]);
//! selection_changed.disconnect(conn_id);
//! ```

mod error;
pub mod logging;
pub mod signal;

pub use error::{Axis, BoxedError, Result, RowViewError, check_index, check_non_negative};
pub use logging::{DebugRow, PerfSpan, RowTreeDebug, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionId, Signal};
