//! Lazily materialized node records.
//!
//! Every node the index knows about lives in a [`NodeArena`], keyed by
//! [`NodeKey`]. A branch record starts with its children unloaded; the first
//! consumer that needs them calls [`NodeArena::ensure_loaded`], which walks
//! the branch in the [`TreeSource`] once and creates one record per child.
//!
//! A record refers to its parent by key. The key is a lookup, never
//! ownership: the arena owns every record, and unloading a branch destroys
//! its whole subtree before the branch forgets the child keys.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::sync::Arc;

use horizon_rowview_core::{Result, RowViewError};
use slotmap::{SlotMap, new_key_type};

use super::path::TreePath;
use super::source::{SourceNode, TreeSource};

new_key_type! {
    /// Identifies a node record in a [`NodeArena`].
    pub struct NodeKey;
}

// ============================================================================
// Node Flags
// ============================================================================

/// The tri-state check state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CheckState {
    /// The node is not checked.
    #[default]
    Unchecked,
    /// The node is checked.
    Checked,
    /// Some, but not all, descendants are checked.
    Mixed,
}

/// Cached per-node state, packed so one field can be cleared across the
/// whole tree in a single pass.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct NodeFlags(u8);

impl NodeFlags {
    /// No flags set.
    pub const NONE: NodeFlags = NodeFlags(0);
    /// The node is under the pointer.
    pub const HIGHLIGHTED: NodeFlags = NodeFlags(1 << 0);
    /// The node is selected.
    pub const SELECTED: NodeFlags = NodeFlags(1 << 1);
    /// The node is disabled.
    pub const DISABLED: NodeFlags = NodeFlags(1 << 2);
    /// The node's checkmark is disabled.
    pub const CHECKMARK_DISABLED: NodeFlags = NodeFlags(1 << 3);
    /// Check state is `Checked`.
    pub const CHECKED: NodeFlags = NodeFlags(1 << 4);
    /// Check state is `Mixed`.
    pub const MIXED: NodeFlags = NodeFlags(1 << 5);
    /// The branch is expanded.
    pub const EXPANDED: NodeFlags = NodeFlags(1 << 6);
    /// Both check state bits.
    pub const CHECK_STATE: NodeFlags = NodeFlags(Self::CHECKED.0 | Self::MIXED.0);

    /// Check if every bit of `flag` is set.
    pub fn has(&self, flag: NodeFlags) -> bool {
        (self.0 & flag.0) == flag.0
    }

    /// Set or clear every bit of `flag`.
    pub fn set(&mut self, flag: NodeFlags, on: bool) {
        if on {
            self.0 |= flag.0;
        } else {
            self.0 &= !flag.0;
        }
    }

    /// Clear every bit of `mask`.
    pub fn clear(&mut self, mask: NodeFlags) {
        self.0 &= !mask.0;
    }

    /// Whether no bits are set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_highlighted(&self) -> bool {
        self.has(Self::HIGHLIGHTED)
    }

    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.set(Self::HIGHLIGHTED, highlighted);
    }

    pub fn is_selected(&self) -> bool {
        self.has(Self::SELECTED)
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.set(Self::SELECTED, selected);
    }

    pub fn is_disabled(&self) -> bool {
        self.has(Self::DISABLED)
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.set(Self::DISABLED, disabled);
    }

    pub fn is_checkmark_disabled(&self) -> bool {
        self.has(Self::CHECKMARK_DISABLED)
    }

    pub fn set_checkmark_disabled(&mut self, disabled: bool) {
        self.set(Self::CHECKMARK_DISABLED, disabled);
    }

    pub fn is_expanded(&self) -> bool {
        self.has(Self::EXPANDED)
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.set(Self::EXPANDED, expanded);
    }

    /// Decode the check state bits.
    pub fn check_state(&self) -> CheckState {
        if self.has(Self::CHECKED) {
            CheckState::Checked
        } else if self.has(Self::MIXED) {
            CheckState::Mixed
        } else {
            CheckState::Unchecked
        }
    }

    /// Encode `state` into the check state bits.
    pub fn set_check_state(&mut self, state: CheckState) {
        self.clear(Self::CHECK_STATE);
        match state {
            CheckState::Checked => self.0 |= Self::CHECKED.0,
            CheckState::Mixed => self.0 |= Self::MIXED.0,
            CheckState::Unchecked => {}
        }
    }

    /// Names of the set flags, for debug output.
    pub fn names(&self) -> Vec<&'static str> {
        const NAMES: [(NodeFlags, &str); 7] = [
            (NodeFlags::HIGHLIGHTED, "highlighted"),
            (NodeFlags::SELECTED, "selected"),
            (NodeFlags::DISABLED, "disabled"),
            (NodeFlags::CHECKMARK_DISABLED, "checkmark-disabled"),
            (NodeFlags::CHECKED, "checked"),
            (NodeFlags::MIXED, "mixed"),
            (NodeFlags::EXPANDED, "expanded"),
        ];
        NAMES
            .iter()
            .filter(|(flag, _)| self.has(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Debug for NodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeFlags").field(&self.names()).finish()
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        NodeFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for NodeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for NodeFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        NodeFlags(self.0 & rhs.0)
    }
}

// ============================================================================
// Item Filters
// ============================================================================

/// A predicate over item payloads.
pub type ItemFilter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// The disabled and disabled-checkmark predicates applied when records are
/// created and when either predicate changes.
pub struct NodeFilters<T> {
    /// Items for which this returns `true` are disabled.
    pub disabled: Option<ItemFilter<T>>,
    /// Items for which this returns `true` have their checkmark disabled.
    pub checkmark_disabled: Option<ItemFilter<T>>,
}

impl<T> Default for NodeFilters<T> {
    fn default() -> Self {
        Self {
            disabled: None,
            checkmark_disabled: None,
        }
    }
}

impl<T> Clone for NodeFilters<T> {
    fn clone(&self) -> Self {
        Self {
            disabled: self.disabled.clone(),
            checkmark_disabled: self.checkmark_disabled.clone(),
        }
    }
}

impl<T> fmt::Debug for NodeFilters<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeFilters")
            .field("disabled", &self.disabled.is_some())
            .field("checkmark_disabled", &self.checkmark_disabled.is_some())
            .finish()
    }
}

impl<T> NodeFilters<T> {
    /// Whether the disabled predicate accepts `item`.
    pub fn is_disabled(&self, item: &T) -> bool {
        self.disabled.as_ref().is_some_and(|filter| filter(item))
    }

    /// Whether the disabled-checkmark predicate accepts `item`.
    pub fn is_checkmark_disabled(&self, item: &T) -> bool {
        self.checkmark_disabled
            .as_ref()
            .is_some_and(|filter| filter(item))
    }
}

// ============================================================================
// Node Records
// ============================================================================

/// Cached state for one materialized node.
#[derive(Debug)]
pub struct NodeRecord<T> {
    item: Option<Arc<T>>,
    parent: Option<NodeKey>,
    depth: usize,
    is_branch: bool,
    /// Flags; public so views can toggle state without arena round trips.
    pub flags: NodeFlags,
    children: Option<Vec<NodeKey>>,
}

impl<T> NodeRecord<T> {
    /// The payload; `None` only for the root.
    pub fn item(&self) -> Option<&Arc<T>> {
        self.item.as_ref()
    }

    /// The parent record, `None` for the root.
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Depth from the root; the root is 0 and its children are 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the record is a branch.
    pub fn is_branch(&self) -> bool {
        self.is_branch
    }

    /// Whether the branch's children have been materialized.
    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    /// The materialized children, `None` when unloaded or a leaf.
    pub fn children(&self) -> Option<&[NodeKey]> {
        self.children.as_deref()
    }

    /// Whether the branch is expanded. Leaves are never expanded.
    pub fn is_expanded(&self) -> bool {
        self.is_branch && self.flags.is_expanded()
    }
}

// ============================================================================
// Node Arena
// ============================================================================

/// Owns every materialized record of one tree.
#[derive(Debug)]
pub struct NodeArena<T> {
    records: SlotMap<NodeKey, NodeRecord<T>>,
    root: NodeKey,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeArena<T> {
    /// An arena holding only an unloaded root branch.
    pub fn new() -> Self {
        let mut records = SlotMap::with_key();
        let root = records.insert(Self::root_record());
        Self { records, root }
    }

    fn root_record() -> NodeRecord<T> {
        NodeRecord {
            item: None,
            parent: None,
            depth: 0,
            is_branch: true,
            flags: NodeFlags::EXPANDED,
            children: None,
        }
    }

    /// Destroy every record and start over with a fresh unloaded root.
    pub fn new_root(&mut self) -> NodeKey {
        self.records.clear();
        self.root = self.records.insert(Self::root_record());
        self.root
    }

    /// The root record's key.
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of live records, the root included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether only the root exists.
    pub fn is_empty(&self) -> bool {
        self.records.len() <= 1
    }

    /// Whether `key` names a live record.
    pub fn contains(&self, key: NodeKey) -> bool {
        self.records.contains_key(key)
    }

    /// The record for `key`.
    pub fn get(&self, key: NodeKey) -> Option<&NodeRecord<T>> {
        self.records.get(key)
    }

    /// The record for `key`, mutably.
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut NodeRecord<T>> {
        self.records.get_mut(key)
    }

    /// The record for a key that must be live.
    ///
    /// # Panics
    ///
    /// Panics if the record was destroyed; holding a stale key means the
    /// visible list has drifted from the arena.
    pub fn record(&self, key: NodeKey) -> &NodeRecord<T> {
        self.records
            .get(key)
            .unwrap_or_else(|| panic!("node record {key:?} is not in the arena"))
    }

    pub(crate) fn record_mut(&mut self, key: NodeKey) -> &mut NodeRecord<T> {
        self.records
            .get_mut(key)
            .unwrap_or_else(|| panic!("node record {key:?} is not in the arena"))
    }

    /// Create an unlinked record for `node` under `parent`, applying the
    /// predicates in `filters`.
    ///
    /// A panicking predicate propagates before anything is inserted.
    pub fn create(&mut self, parent: NodeKey, node: &SourceNode<T>, filters: &NodeFilters<T>) -> NodeKey {
        let depth = self.record(parent).depth + 1;
        let mut flags = NodeFlags::NONE;
        flags.set_disabled(filters.is_disabled(&node.item));
        flags.set_checkmark_disabled(filters.is_checkmark_disabled(&node.item));

        self.records.insert(NodeRecord {
            item: Some(Arc::clone(&node.item)),
            parent: Some(parent),
            depth,
            is_branch: node.is_branch,
            flags,
            children: None,
        })
    }

    /// Materialize the children of `branch` from `source` unless they are
    /// already loaded. Returns whether anything was loaded.
    pub fn ensure_loaded<S>(&mut self, branch: NodeKey, source: &S, filters: &NodeFilters<T>) -> Result<bool>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        let record = self.record(branch);
        if record.children.is_some() {
            return Ok(false);
        }
        let path = self.path_of(branch);
        if !record.is_branch {
            return Err(RowViewError::not_a_branch(path.as_slice()));
        }

        let nodes = source
            .children(path.as_slice())
            .ok_or_else(|| RowViewError::invalid_path(path.as_slice()))?;
        self.load_from(branch, &nodes, filters);
        Ok(true)
    }

    /// Replace the children of `branch` with fresh records for `nodes`.
    pub fn load_from(&mut self, branch: NodeKey, nodes: &[SourceNode<T>], filters: &NodeFilters<T>) {
        assert!(self.record(branch).is_branch, "only branches have children");
        self.unload(branch);
        let children: Vec<NodeKey> = nodes
            .iter()
            .map(|node| self.create(branch, node, filters))
            .collect();
        self.record_mut(branch).children = Some(children);
    }

    /// Destroy the subtree below `branch` and mark its children unloaded.
    pub fn unload(&mut self, branch: NodeKey) {
        if let Some(children) = self.record_mut(branch).children.take() {
            for child in children {
                self.destroy(child);
            }
        }
    }

    /// Unlink `key` from its parent and destroy it with its subtree.
    pub fn remove_subtree(&mut self, key: NodeKey) {
        assert!(key != self.root, "the root cannot be removed");
        if let Some(parent) = self.record(key).parent
            && let Some(siblings) = self.record_mut(parent).children.as_mut()
        {
            siblings.retain(|&sibling| sibling != key);
        }
        self.destroy(key);
    }

    /// Destroy `key` and every descendant, deepest first.
    fn destroy(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        let mut order = Vec::new();
        while let Some(next) = stack.pop() {
            order.push(next);
            if let Some(children) = self.record(next).children.as_ref() {
                stack.extend(children.iter().copied());
            }
        }
        for key in order.into_iter().rev() {
            self.records.remove(key);
        }
    }

    /// Create and link a record for `node` at `index` among the children of
    /// `branch`. The children must be loaded.
    pub fn insert_child(
        &mut self,
        branch: NodeKey,
        index: usize,
        node: &SourceNode<T>,
        filters: &NodeFilters<T>,
    ) -> Result<NodeKey> {
        let len = self.loaded_children(branch).len();
        if index > len {
            return Err(RowViewError::out_of_bounds(index, len + 1));
        }
        let key = self.create(branch, node, filters);
        self.loaded_children_mut(branch).insert(index, key);
        Ok(key)
    }

    /// Unlink and destroy `count` children of `branch` starting at `index`.
    pub fn remove_children(&mut self, branch: NodeKey, index: usize, count: usize) -> Result<()> {
        let len = self.loaded_children(branch).len();
        let end = index.saturating_add(count);
        if end > len {
            return Err(RowViewError::out_of_bounds(end - 1, len));
        }
        let removed: Vec<NodeKey> = self.loaded_children_mut(branch).drain(index..end).collect();
        for key in removed {
            self.destroy(key);
        }
        Ok(())
    }

    /// Replace child `index` of `branch` with a fresh record for `node`.
    pub fn replace_child(
        &mut self,
        branch: NodeKey,
        index: usize,
        node: &SourceNode<T>,
        filters: &NodeFilters<T>,
    ) -> Result<NodeKey> {
        let len = self.loaded_children(branch).len();
        if index >= len {
            return Err(RowViewError::out_of_bounds(index, len));
        }
        let key = self.create(branch, node, filters);
        let previous = std::mem::replace(&mut self.loaded_children_mut(branch)[index], key);
        self.destroy(previous);
        Ok(key)
    }

    fn loaded_children(&self, branch: NodeKey) -> &[NodeKey] {
        self.record(branch)
            .children
            .as_deref()
            .unwrap_or_else(|| panic!("children of {branch:?} are not loaded"))
    }

    fn loaded_children_mut(&mut self, branch: NodeKey) -> &mut Vec<NodeKey> {
        self.record_mut(branch)
            .children
            .as_mut()
            .unwrap_or_else(|| panic!("children of {branch:?} are not loaded"))
    }

    /// Reconstruct the path of `key` by walking parent keys.
    pub fn path_of(&self, key: NodeKey) -> TreePath {
        let mut components = Vec::with_capacity(self.record(key).depth);
        let mut current = key;
        while let Some(parent) = self.record(current).parent {
            let index = self
                .record(parent)
                .children()
                .and_then(|siblings| siblings.iter().position(|&sibling| sibling == current))
                .unwrap_or_else(|| panic!("{current:?} is not linked into its parent"));
            components.push(index);
            current = parent;
        }
        components.reverse();
        TreePath::from(components)
    }

    /// Resolve `path` to a record, materializing branches on the way.
    pub fn resolve<S>(&mut self, path: &[usize], source: &S, filters: &NodeFilters<T>) -> Result<NodeKey>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        let mut current = self.root;
        for (depth, &index) in path.iter().enumerate() {
            if !self.record(current).is_branch {
                return Err(RowViewError::not_a_branch(&path[..depth]));
            }
            self.ensure_loaded(current, source, filters)?;
            current = self
                .loaded_children(current)
                .get(index)
                .copied()
                .ok_or_else(|| RowViewError::invalid_path(&path[..=depth]))?;
        }
        Ok(current)
    }

    /// Resolve `path` without loading anything. `Ok(None)` means a branch on
    /// the way has not been materialized yet.
    pub fn find(&self, path: &[usize]) -> Result<Option<NodeKey>> {
        let mut current = self.root;
        for (depth, &index) in path.iter().enumerate() {
            let record = self.record(current);
            if !record.is_branch {
                return Err(RowViewError::not_a_branch(&path[..depth]));
            }
            let Some(children) = record.children() else {
                return Ok(None);
            };
            current = children
                .get(index)
                .copied()
                .ok_or_else(|| RowViewError::invalid_path(&path[..=depth]))?;
        }
        Ok(Some(current))
    }

    /// Visit every materialized record in pre-order, the root first.
    pub fn accept<F>(&mut self, mut visitor: F)
    where
        F: FnMut(NodeKey, &mut NodeRecord<T>),
    {
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let record = self.record_mut(key);
            visitor(key, record);
            if let Some(children) = record.children.as_ref() {
                stack.extend(children.iter().rev().copied());
            }
        }
    }

    /// Clear the bits of `mask` on every record.
    pub fn clear_flags(&mut self, mask: NodeFlags) {
        self.accept(|_, record| record.flags.clear(mask));
    }

    /// Re-evaluate both predicates for every materialized record.
    pub fn refresh_filters(&mut self, filters: &NodeFilters<T>) {
        self.accept(|_, record| {
            if let Some(item) = record.item.as_ref() {
                let disabled = filters.is_disabled(item);
                let checkmark_disabled = filters.is_checkmark_disabled(item);
                record.flags.set_disabled(disabled);
                record.flags.set_checkmark_disabled(checkmark_disabled);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::source::{TreeItem, TreeModel};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> TreeModel<String> {
        TreeModel::from_items(vec![
            TreeItem::leaf("A"),
            TreeItem::branch(
                "B",
                vec![
                    TreeItem::leaf("B1"),
                    TreeItem::branch("B2", vec![TreeItem::leaf("B2a")]),
                ],
            ),
            TreeItem::leaf("C"),
        ])
    }

    fn name(arena: &NodeArena<String>, key: NodeKey) -> String {
        arena.record(key).item().map(|i| i.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_flags_accessors() {
        let mut flags = NodeFlags::NONE;
        flags.set_selected(true);
        flags.set_check_state(CheckState::Mixed);
        assert!(flags.is_selected());
        assert_eq!(flags.check_state(), CheckState::Mixed);

        flags.set_check_state(CheckState::Checked);
        assert_eq!(flags.check_state(), CheckState::Checked);
        assert!(!flags.has(NodeFlags::MIXED));

        flags.clear(NodeFlags::CHECK_STATE | NodeFlags::SELECTED);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_flag_names() {
        let flags = NodeFlags::EXPANDED | NodeFlags::DISABLED;
        assert_eq!(flags.names(), vec!["disabled", "expanded"]);
    }

    #[test]
    fn test_ensure_loaded_is_idempotent() {
        let model = sample();
        let filters = NodeFilters::default();
        let mut arena = NodeArena::new();
        let root = arena.root();

        assert!(arena.ensure_loaded(root, &model, &filters).unwrap());
        assert!(!arena.ensure_loaded(root, &model, &filters).unwrap());
        assert_eq!(arena.len(), 4);

        let children = arena.record(root).children().unwrap().to_vec();
        assert_eq!(name(&arena, children[1]), "B");
        assert!(arena.record(children[1]).is_branch());
        assert!(!arena.record(children[1]).is_loaded());
        assert_eq!(arena.record(children[1]).depth(), 1);
    }

    #[test]
    fn test_resolve_and_path_of() {
        let model = sample();
        let filters = NodeFilters::default();
        let mut arena = NodeArena::new();

        let b2a = arena.resolve(&[1, 1, 0], &model, &filters).unwrap();
        assert_eq!(name(&arena, b2a), "B2a");
        assert_eq!(arena.record(b2a).depth(), 3);
        assert_eq!(arena.path_of(b2a), TreePath::from([1, 1, 0]));

        assert!(matches!(
            arena.resolve(&[0, 0], &model, &filters),
            Err(RowViewError::NotABranch { .. })
        ));
        assert!(matches!(
            arena.resolve(&[5], &model, &filters),
            Err(RowViewError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_find_does_not_load() {
        let model = sample();
        let filters = NodeFilters::default();
        let mut arena = NodeArena::new();
        assert_eq!(arena.find(&[1, 0]).unwrap(), None);

        arena.ensure_loaded(arena.root(), &model, &filters).unwrap();
        assert!(arena.find(&[1]).unwrap().is_some());
        assert_eq!(arena.find(&[1, 0]).unwrap(), None);
        assert!(arena.find(&[3]).is_err());
    }

    #[test]
    fn test_unload_destroys_subtree() {
        let model = sample();
        let filters = NodeFilters::default();
        let mut arena = NodeArena::new();
        let b2a = arena.resolve(&[1, 1, 0], &model, &filters).unwrap();
        assert_eq!(arena.len(), 7);

        let b = arena.find(&[1]).unwrap().unwrap();
        arena.unload(b);
        assert!(!arena.contains(b2a));
        assert!(!arena.record(b).is_loaded());
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_filters_applied_at_creation() {
        let model = sample();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let filters = NodeFilters {
            disabled: Some(Arc::new(move |item: &String| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                item.starts_with('B')
            }) as ItemFilter<String>),
            checkmark_disabled: None,
        };
        let mut arena = NodeArena::new();
        arena.ensure_loaded(arena.root(), &model, &filters).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let b = arena.find(&[1]).unwrap().unwrap();
        let a = arena.find(&[0]).unwrap().unwrap();
        assert!(arena.record(b).flags.is_disabled());
        assert!(!arena.record(a).flags.is_disabled());

        arena.refresh_filters(&NodeFilters::default());
        assert!(!arena.record(b).flags.is_disabled());
    }

    #[test]
    #[should_panic(expected = "predicate failed")]
    fn test_predicate_panic_propagates() {
        let model = sample();
        let filters = NodeFilters {
            disabled: Some(Arc::new(|_: &String| -> bool { panic!("predicate failed") }) as ItemFilter<String>),
            checkmark_disabled: None,
        };
        let mut arena = NodeArena::new();
        let _ = arena.ensure_loaded(arena.root(), &model, &filters);
    }

    #[test]
    fn test_accept_is_pre_order() {
        let model = sample();
        let filters = NodeFilters::default();
        let mut arena = NodeArena::new();
        arena.resolve(&[1, 1, 0], &model, &filters).unwrap();

        let mut seen = Vec::new();
        arena.accept(|_, record| {
            seen.push(record.item().map(|i| i.to_string()).unwrap_or_else(|| "root".into()));
        });
        assert_eq!(seen, vec!["root", "A", "B", "B1", "B2", "B2a", "C"]);
    }

    #[test]
    fn test_clear_flags() {
        let model = sample();
        let filters = NodeFilters::default();
        let mut arena = NodeArena::new();
        arena.ensure_loaded(arena.root(), &model, &filters).unwrap();
        arena.accept(|_, record| record.flags.set_selected(true));
        arena.clear_flags(NodeFlags::SELECTED);

        let mut any_selected = false;
        arena.accept(|_, record| any_selected |= record.flags.is_selected());
        assert!(!any_selected);
    }

    #[test]
    fn test_child_mutation() {
        let model = sample();
        let filters = NodeFilters::default();
        let mut arena = NodeArena::new();
        let root = arena.root();
        arena.ensure_loaded(root, &model, &filters).unwrap();

        let node = SourceNode::leaf(Arc::new("Z".to_string()));
        let z = arena.insert_child(root, 3, &node, &filters).unwrap();
        assert_eq!(arena.path_of(z), TreePath::from([3]));

        arena.remove_children(root, 0, 2).unwrap();
        assert_eq!(arena.path_of(z), TreePath::from([1]));
        assert!(arena.remove_children(root, 1, 5).is_err());

        let y = arena
            .replace_child(root, 0, &SourceNode::leaf(Arc::new("Y".to_string())), &filters)
            .unwrap();
        assert_eq!(name(&arena, y), "Y");
        assert_eq!(arena.len(), 3);
    }
}
