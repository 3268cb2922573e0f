//! Paths locating nodes from the root of a tree.

use std::fmt;

/// An ordered sequence of child indices locating a node from the root.
///
/// The empty path is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath(Vec<usize>);

impl TreePath {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of components; equals the depth of the node it locates.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The path of child `index` under this path.
    pub fn child(&self, index: usize) -> Self {
        let mut components = Vec::with_capacity(self.0.len() + 1);
        components.extend_from_slice(&self.0);
        components.push(index);
        Self(components)
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    /// The index of this node within its parent.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &TreePath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// The components as a slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub(crate) fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub(crate) fn pop(&mut self) -> Option<usize> {
        self.0.pop()
    }

    pub(crate) fn components_mut(&mut self) -> &mut Vec<usize> {
        &mut self.0
    }
}

impl From<Vec<usize>> for TreePath {
    fn from(components: Vec<usize>) -> Self {
        Self(components)
    }
}

impl From<&[usize]> for TreePath {
    fn from(components: &[usize]) -> Self {
        Self(components.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for TreePath {
    fn from(components: [usize; N]) -> Self {
        Self(components.to_vec())
    }
}

impl AsRef<[usize]> for TreePath {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/")?;
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path() {
        let root = TreePath::root();
        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert_eq!(root.parent(), None);
        assert_eq!(root.to_string(), "/");
    }

    #[test]
    fn test_child_and_parent() {
        let path = TreePath::root().child(1).child(0);
        assert_eq!(path.as_slice(), &[1, 0]);
        assert_eq!(path.last(), Some(0));
        assert_eq!(path.parent(), Some(TreePath::from([1])));
        assert_eq!(path.to_string(), "/1/0");
    }

    #[test]
    fn test_ancestry() {
        let branch = TreePath::from([1]);
        assert!(branch.is_ancestor_of(&TreePath::from([1, 0])));
        assert!(!branch.is_ancestor_of(&branch));
        assert!(!branch.is_ancestor_of(&TreePath::from([2, 0])));
        assert!(TreePath::root().is_ancestor_of(&branch));
    }
}
