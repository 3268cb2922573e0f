//! Tests for offset tables, viewport clipping and range selection through
//! the public API.

use std::sync::Arc;

use horizon_rowview::RowViewError;
use horizon_rowview::model::{
    Bounds, OffsetTable, SelectMode, SelectionTracker, Span, UniformHeight, Viewport, visible_range,
};
use horizon_rowview::view::{ColumnSpec, ListIndex, TableIndex};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Offset Table
// ============================================================================

#[test]
fn test_offsets_are_monotonic_and_round_trip() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let extents: Vec<u32> = (0..rng.gen_range(1..=60)).map(|_| rng.gen_range(1..=40)).collect();
        let table = OffsetTable::from_extents(extents.iter().copied());

        let boundaries: Vec<u32> = table.boundaries().collect();
        assert!(boundaries.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(table.total_extent(), extents.iter().sum::<u32>());

        for row in 0..table.len() {
            let y = table.row_y(row).unwrap();
            assert_eq!(table.row_at(y as i32).unwrap(), Some(row));
            let last = y + table.row_height(row).unwrap() - 1;
            assert_eq!(table.row_at(last as i32).unwrap(), Some(row));
        }
        assert_eq!(table.row_at(table.total_extent() as i32).unwrap(), None);
    }
}

#[test]
fn test_fixed_and_variable_tables_agree() {
    let fixed = OffsetTable::fixed(17, 9);
    let variable = OffsetTable::from_extents(std::iter::repeat_n(17, 9));
    assert!(fixed.is_fixed() && !variable.is_fixed());
    assert_eq!(fixed.boundaries().collect::<Vec<_>>(), variable.boundaries().collect::<Vec<_>>());
    for y in 0..170 {
        assert_eq!(fixed.row_at(y).unwrap(), variable.row_at(y).unwrap(), "y = {y}");
    }
}

#[test]
fn test_offset_preconditions() {
    let table = OffsetTable::fixed(20, 3);
    assert!(matches!(
        table.row_y(3),
        Err(RowViewError::IndexOutOfBounds { index: 3, len: 3 })
    ));
    assert!(matches!(table.row_at(-1), Err(RowViewError::NegativeCoordinate { .. })));
    assert_eq!(OffsetTable::empty().row_at(0).unwrap(), None);
}

// ============================================================================
// Viewport
// ============================================================================

#[test]
fn test_visible_range_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(7);
    let extents: Vec<u32> = (0..40).map(|_| rng.gen_range(5..35)).collect();
    let table = OffsetTable::from_extents(extents.iter().copied());
    let total = table.total_extent() as i32;

    for _ in 0..200 {
        let top = rng.gen_range(0..total + 50);
        let height = rng.gen_range(0..120);
        let expected: Vec<usize> = (0..table.len())
            .filter(|&row| {
                let y = table.row_y(row).unwrap() as i32;
                let bottom = y + table.row_height(row).unwrap() as i32;
                height > 0 && y < top + height && bottom > top
            })
            .collect();
        let range = visible_range(&table, top, height).unwrap();
        let actual: Vec<usize> = range.map(|range| range.collect()).unwrap_or_default();
        assert_eq!(actual, expected, "clip {top}+{height}");
    }
}

#[test]
fn test_viewport_rows_and_reveal() {
    let table = OffsetTable::fixed(20, 10);
    let viewport = Viewport::new(30, 50);
    assert_eq!(viewport.rows(&table), Some(1..=3));
    assert_eq!(Viewport::new(500, 50).rows(&table), None);
    assert_eq!(viewport.reveal(&Bounds::new(0, 100, 10, 20)), 70);
    assert_eq!(viewport.reveal(&Bounds::new(0, 10, 10, 20)), 10);
    assert_eq!(viewport.reveal(&Bounds::new(0, 40, 10, 20)), 30);
    assert!(matches!(visible_range(&table, 0, -1), Err(RowViewError::NegativeCoordinate { .. })));
}

// ============================================================================
// Range Selection
// ============================================================================

fn random_spans(rng: &mut StdRng, rows: usize) -> Vec<Span> {
    (0..rng.gen_range(0..6))
        .map(|_| Span::normalize(rng.gen_range(0..rows), rng.gen_range(0..rows)))
        .collect()
}

#[test]
fn test_set_ranges_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(0xdead_beef);
    let mut tracker = SelectionTracker::new(100);
    tracker.set_select_mode(SelectMode::Multi);

    for _ in 0..100 {
        let spans = random_spans(&mut rng, 100);
        let once = tracker.set_ranges(&spans).unwrap();
        let twice = tracker.set_ranges(&once).unwrap();
        assert_eq!(once, twice);
        assert!(once.windows(2).all(|pair| pair[0].end + 1 < pair[1].start));

        let expected: Vec<usize> = (0..100)
            .filter(|&index| spans.iter().any(|span| span.contains(index)))
            .collect();
        assert_eq!(tracker.selected_indexes(), expected);
    }
}

#[test]
fn test_add_remove_notifications() {
    let mut tracker = SelectionTracker::new(20);
    tracker.set_select_mode(SelectMode::Multi);
    let added = Arc::new(Mutex::new(Vec::new()));
    let removed = Arc::new(Mutex::new(Vec::new()));
    let added_clone = added.clone();
    let removed_clone = removed.clone();
    tracker.range_added.connect(move |span: &Span| added_clone.lock().push(*span));
    tracker.range_removed.connect(move |span: &Span| removed_clone.lock().push(*span));

    tracker.add_range(2, 4).unwrap();
    tracker.add_range(8, 9).unwrap();
    assert_eq!(tracker.add_range(1, 10).unwrap(), vec![Span::new(1, 1), Span::new(5, 7), Span::new(10, 10)]);
    assert_eq!(tracker.ranges(), &[Span::new(1, 10)]);

    tracker.remove_range(4, 6).unwrap();
    assert_eq!(tracker.ranges(), &[Span::new(1, 3), Span::new(7, 10)]);
    assert_eq!(added.lock().len(), 5);
    assert_eq!(*removed.lock(), vec![Span::new(4, 6)]);
}

#[test]
fn test_select_mode_gates_mutation() {
    let mut tracker = SelectionTracker::new(10);
    assert!(matches!(
        tracker.add_range(0, 1),
        Err(RowViewError::SelectionDisabled | RowViewError::SingleSelectMode)
    ));
    assert!(matches!(tracker.set_ranges(&[Span::new(0, 1)]), Err(RowViewError::SingleSelectMode)));
    tracker.set_selected_index(Some(3)).unwrap();

    let changes = Arc::new(Mutex::new(Vec::new()));
    let changes_clone = changes.clone();
    tracker.ranges_changed.connect(move |previous: &Vec<Span>| changes_clone.lock().push(previous.clone()));

    tracker.set_select_mode(SelectMode::None);
    assert!(tracker.ranges().is_empty());
    assert_eq!(*changes.lock(), vec![vec![Span::single(3)]]);
    assert!(matches!(tracker.set_selected_index(Some(1)), Err(RowViewError::SelectionDisabled)));
    tracker.set_ranges(&[]).unwrap();
    assert_eq!(changes.lock().len(), 1);
}

// ============================================================================
// List and Table
// ============================================================================

#[test]
fn test_list_and_table_rows_agree() {
    let rows = vec![(); 12];
    let mut list = ListIndex::new(rows.len());
    let mut table = TableIndex::new(rows.len(), vec![ColumnSpec::fixed(40), ColumnSpec::relative(1)]);
    list.layout(&rows, &UniformHeight(18), 120).unwrap();
    table.layout(&rows, &UniformHeight(18), 120).unwrap();

    for y in [0, 17, 18, 100, 215, 216] {
        assert_eq!(list.item_at(y).unwrap(), table.row_at(y).unwrap());
    }
    assert_eq!(list.visible_range(50, 60).unwrap(), table.visible_range(50, 60).unwrap());
    assert_eq!(table.column_widths().unwrap(), &[40, 79]);
}
