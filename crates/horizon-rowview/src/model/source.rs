//! Tree-shaped data sources and their change notifications.
//!
//! A [`TreeSource`] exposes nested ordered collections by path. The index
//! only reads it when materializing a branch for the first time, so any
//! type that can answer "how many children" and "which child" can drive a
//! [`TreeIndex`](crate::view::TreeIndex).
//!
//! [`TreeModel`] is the in-memory implementation. Its mutators emit a
//! [`TreeEvent`] for every structural change; an [`EventQueue`] attached to
//! the model buffers those events until the index applies them.
//!
//! # Example
//!
//! ```
//! use horizon_rowview::model::{EventQueue, TreeItem, TreeModel, TreePath};
//!
//! let model = TreeModel::<String>::from_items(vec![
//!     TreeItem::leaf("A"),
//!     TreeItem::branch("B", vec![TreeItem::leaf("B1"), TreeItem::leaf("B2")]),
//!     TreeItem::leaf("C"),
//! ]);
//! let queue = EventQueue::attach(&model);
//!
//! model.remove(&TreePath::from([1]), 0, 1).unwrap();
//! assert_eq!(queue.len(), 1);
//! ```

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use horizon_rowview_core::{ConnectionId, Result, RowViewError, Signal};
use parking_lot::{Mutex, RwLock};

use super::path::TreePath;

// ============================================================================
// Source Trait
// ============================================================================

/// One child as reported by a [`TreeSource`].
#[derive(Debug)]
pub struct SourceNode<T> {
    /// The payload, shared with the source.
    pub item: Arc<T>,
    /// Whether the child is itself a nested collection.
    pub is_branch: bool,
}

impl<T> Clone for SourceNode<T> {
    fn clone(&self) -> Self {
        Self {
            item: Arc::clone(&self.item),
            is_branch: self.is_branch,
        }
    }
}

impl<T> SourceNode<T> {
    /// A leaf node.
    pub fn leaf(item: Arc<T>) -> Self {
        Self {
            item,
            is_branch: false,
        }
    }

    /// A branch node.
    pub fn branch(item: Arc<T>) -> Self {
        Self {
            item,
            is_branch: true,
        }
    }
}

/// Read access to nested ordered collections, addressed by path.
pub trait TreeSource {
    /// The payload type of every node.
    type Item;

    /// Number of children of the branch at `path`, or `None` if `path` does
    /// not resolve to a branch. The empty path is the root collection.
    fn branch_len(&self, path: &[usize]) -> Option<usize>;

    /// Child `index` of the branch at `path`.
    fn child(&self, path: &[usize], index: usize) -> Option<SourceNode<Self::Item>>;

    /// Every child of the branch at `path`, in order.
    fn children(&self, path: &[usize]) -> Option<Vec<SourceNode<Self::Item>>> {
        let len = self.branch_len(path)?;
        (0..len).map(|index| self.child(path, index)).collect()
    }
}

// ============================================================================
// Tree Events
// ============================================================================

/// A structural change to a tree source.
///
/// Events carry the payloads an index needs to patch itself, so a queue of
/// events can be applied after the source has moved on.
#[derive(Debug)]
pub enum TreeEvent<T> {
    /// A node was inserted at `index` under `parent`.
    NodeInserted {
        parent: TreePath,
        index: usize,
        node: SourceNode<T>,
    },
    /// `count` nodes starting at `index` were removed from `parent`.
    NodesRemoved {
        parent: TreePath,
        index: usize,
        count: usize,
    },
    /// The node at `index` under `parent` was replaced or modified.
    NodeUpdated {
        parent: TreePath,
        index: usize,
        node: SourceNode<T>,
    },
    /// Every child of `parent` was removed.
    NodesCleared { parent: TreePath },
    /// The children of `parent` were reordered; `children` is the new order.
    NodesSorted {
        parent: TreePath,
        children: Vec<SourceNode<T>>,
    },
    /// The whole tree was replaced.
    Reset,
}

impl<T> Clone for TreeEvent<T> {
    fn clone(&self) -> Self {
        match self {
            Self::NodeInserted {
                parent,
                index,
                node,
            } => Self::NodeInserted {
                parent: parent.clone(),
                index: *index,
                node: node.clone(),
            },
            Self::NodesRemoved {
                parent,
                index,
                count,
            } => Self::NodesRemoved {
                parent: parent.clone(),
                index: *index,
                count: *count,
            },
            Self::NodeUpdated {
                parent,
                index,
                node,
            } => Self::NodeUpdated {
                parent: parent.clone(),
                index: *index,
                node: node.clone(),
            },
            Self::NodesCleared { parent } => Self::NodesCleared {
                parent: parent.clone(),
            },
            Self::NodesSorted { parent, children } => Self::NodesSorted {
                parent: parent.clone(),
                children: children.clone(),
            },
            Self::Reset => Self::Reset,
        }
    }
}

impl<T> TreeEvent<T> {
    /// The branch the event applies to, or `None` for [`TreeEvent::Reset`].
    pub fn parent(&self) -> Option<&TreePath> {
        match self {
            Self::NodeInserted { parent, .. }
            | Self::NodesRemoved { parent, .. }
            | Self::NodeUpdated { parent, .. }
            | Self::NodesCleared { parent }
            | Self::NodesSorted { parent, .. } => Some(parent),
            Self::Reset => None,
        }
    }
}

// ============================================================================
// Tree Items
// ============================================================================

/// A node of a [`TreeModel`].
#[derive(Debug)]
pub enum TreeItem<T> {
    /// A node without children.
    Leaf(Arc<T>),
    /// A node whose payload is an ordered collection of children.
    Branch {
        item: Arc<T>,
        children: Vec<TreeItem<T>>,
    },
}

impl<T> TreeItem<T> {
    /// Create a leaf.
    pub fn leaf(item: impl Into<T>) -> Self {
        Self::Leaf(Arc::new(item.into()))
    }

    /// Create a branch with `children`.
    pub fn branch(item: impl Into<T>, children: Vec<TreeItem<T>>) -> Self {
        Self::Branch {
            item: Arc::new(item.into()),
            children,
        }
    }

    /// The shared payload.
    pub fn item(&self) -> &Arc<T> {
        match self {
            Self::Leaf(item) | Self::Branch { item, .. } => item,
        }
    }

    /// Whether this node is a branch.
    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Branch { .. })
    }

    /// The children of a branch.
    pub fn children(&self) -> Option<&[TreeItem<T>]> {
        match self {
            Self::Leaf(_) => None,
            Self::Branch { children, .. } => Some(children),
        }
    }

    fn source_node(&self) -> SourceNode<T> {
        SourceNode {
            item: Arc::clone(self.item()),
            is_branch: self.is_branch(),
        }
    }
}

fn resolve_branch<'a, T>(roots: &'a [TreeItem<T>], path: &[usize]) -> Option<&'a [TreeItem<T>]> {
    let mut children = roots;
    for &index in path {
        children = children.get(index)?.children()?;
    }
    Some(children)
}

fn resolve_branch_mut<'a, T>(
    roots: &'a mut Vec<TreeItem<T>>,
    path: &[usize],
) -> Result<&'a mut Vec<TreeItem<T>>> {
    let mut children = roots;
    for (depth, &index) in path.iter().enumerate() {
        let item = children
            .get_mut(index)
            .ok_or_else(|| RowViewError::invalid_path(&path[..=depth]))?;
        children = match item {
            TreeItem::Branch { children, .. } => children,
            TreeItem::Leaf(_) => return Err(RowViewError::not_a_branch(&path[..=depth])),
        };
    }
    Ok(children)
}

// ============================================================================
// Tree Model
// ============================================================================

/// In-memory nested collection that announces its structural changes.
///
/// Mutators take `&self`; the storage lock is released before the change
/// signal is emitted, so slots may read the model.
pub struct TreeModel<T> {
    roots: RwLock<Vec<TreeItem<T>>>,
    /// Emitted after every structural change.
    pub changed: Signal<TreeEvent<T>>,
}

impl<T> Default for TreeModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeModel<T> {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    /// Create a model holding `roots`.
    pub fn from_items(roots: Vec<TreeItem<T>>) -> Self {
        Self {
            roots: RwLock::new(roots),
            changed: Signal::new(),
        }
    }

    /// Insert `item` at `index` under `parent`.
    pub fn insert(&self, parent: &TreePath, index: usize, item: TreeItem<T>) -> Result<()> {
        let node = item.source_node();
        {
            let mut roots = self.roots.write();
            let children = resolve_branch_mut(&mut roots, parent.as_slice())?;
            if index > children.len() {
                return Err(RowViewError::out_of_bounds(index, children.len() + 1));
            }
            children.insert(index, item);
        }
        self.changed.emit(TreeEvent::NodeInserted {
            parent: parent.clone(),
            index,
            node,
        });
        Ok(())
    }

    /// Append `item` under `parent`.
    pub fn push(&self, parent: &TreePath, item: TreeItem<T>) -> Result<()> {
        let len = self
            .branch_len(parent.as_slice())
            .ok_or_else(|| RowViewError::invalid_path(parent.as_slice()))?;
        self.insert(parent, len, item)
    }

    /// Remove `count` children of `parent` starting at `index`.
    pub fn remove(&self, parent: &TreePath, index: usize, count: usize) -> Result<Vec<TreeItem<T>>> {
        let removed: Vec<TreeItem<T>> = {
            let mut roots = self.roots.write();
            let children = resolve_branch_mut(&mut roots, parent.as_slice())?;
            let end = index.saturating_add(count);
            if end > children.len() {
                return Err(RowViewError::out_of_bounds(end - 1, children.len()));
            }
            children.drain(index..end).collect()
        };
        if count > 0 {
            self.changed.emit(TreeEvent::NodesRemoved {
                parent: parent.clone(),
                index,
                count,
            });
        }
        Ok(removed)
    }

    /// Replace the child at `index` under `parent`, returning the old one.
    ///
    /// Passing an item that shares the previous payload (`Arc::ptr_eq`)
    /// marks the node as modified in place.
    pub fn update(&self, parent: &TreePath, index: usize, item: TreeItem<T>) -> Result<TreeItem<T>> {
        let node = item.source_node();
        let previous = {
            let mut roots = self.roots.write();
            let children = resolve_branch_mut(&mut roots, parent.as_slice())?;
            let len = children.len();
            let slot = children
                .get_mut(index)
                .ok_or(RowViewError::out_of_bounds(index, len))?;
            std::mem::replace(slot, item)
        };
        self.changed.emit(TreeEvent::NodeUpdated {
            parent: parent.clone(),
            index,
            node,
        });
        Ok(previous)
    }

    /// Remove every child of `parent`.
    pub fn clear(&self, parent: &TreePath) -> Result<()> {
        {
            let mut roots = self.roots.write();
            resolve_branch_mut(&mut roots, parent.as_slice())?.clear();
        }
        self.changed.emit(TreeEvent::NodesCleared {
            parent: parent.clone(),
        });
        Ok(())
    }

    /// Stable-sort the children of `parent` by their payloads.
    pub fn sort_by<F>(&self, parent: &TreePath, mut compare: F) -> Result<()>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let children = {
            let mut roots = self.roots.write();
            let children = resolve_branch_mut(&mut roots, parent.as_slice())?;
            children.sort_by(|a, b| compare(&**a.item(), &**b.item()));
            children.iter().map(TreeItem::source_node).collect()
        };
        self.changed.emit(TreeEvent::NodesSorted {
            parent: parent.clone(),
            children,
        });
        Ok(())
    }

    /// Replace the whole tree.
    pub fn reset(&self, roots: Vec<TreeItem<T>>) {
        *self.roots.write() = roots;
        self.changed.emit(TreeEvent::Reset);
    }
}

impl<T> TreeSource for TreeModel<T> {
    type Item = T;

    fn branch_len(&self, path: &[usize]) -> Option<usize> {
        resolve_branch(&self.roots.read(), path).map(<[TreeItem<T>]>::len)
    }

    fn child(&self, path: &[usize], index: usize) -> Option<SourceNode<T>> {
        let roots = self.roots.read();
        resolve_branch(&roots, path)?
            .get(index)
            .map(TreeItem::source_node)
    }

    fn children(&self, path: &[usize]) -> Option<Vec<SourceNode<T>>> {
        let roots = self.roots.read();
        let children = resolve_branch(&roots, path)?;
        Some(children.iter().map(TreeItem::source_node).collect())
    }
}

// ============================================================================
// Event Queue
// ============================================================================

/// Buffers the events a [`TreeModel`] emits until an index applies them.
pub struct EventQueue<T> {
    events: Arc<Mutex<VecDeque<TreeEvent<T>>>>,
    connection: ConnectionId,
}

impl<T: Send + Sync + 'static> EventQueue<T> {
    /// Connect a new queue to `model`.
    pub fn attach(model: &TreeModel<T>) -> Self {
        let events: Arc<Mutex<VecDeque<TreeEvent<T>>>> = Arc::default();
        let sink = Arc::clone(&events);
        let connection = model.changed.connect(move |event: &TreeEvent<T>| {
            sink.lock().push_back(event.clone());
        });
        Self { events, connection }
    }

    /// Disconnect from `model`. Buffered events are kept.
    pub fn detach(&self, model: &TreeModel<T>) -> bool {
        model.changed.disconnect(self.connection)
    }
}

impl<T> EventQueue<T> {
    /// Take every buffered event, oldest first.
    pub fn drain(&self) -> Vec<TreeEvent<T>> {
        self.events.lock().drain(..).collect()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events are buffered.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
