//! Nested tree reconstruction from flat parent-pointer rows.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;

/// A row that knows its own key and its parent's key.
pub trait TreeItem {
    /// Key type shared by the row and its parent reference.
    type Key: Copy + Eq + Hash + Debug;

    /// This row's key.
    fn key(&self) -> Self::Key;

    /// The parent's key, `None` for a top-level row.
    fn parent_key(&self) -> Option<Self::Key>;
}

/// A row with its nested children, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<T> {
    /// The row itself.
    #[serde(flatten)]
    pub item: T,
    /// Child subtrees.
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    /// Creates a node without children.
    #[must_use]
    pub const fn leaf(item: T) -> Self {
        Self {
            item,
            children: Vec::new(),
        }
    }

    /// Number of rows in this subtree, the node itself included.
    #[must_use]
    pub fn count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Visits every row of the subtree in pre-order with its depth (0 for self).
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a T, usize)) {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            visit(&node.item, depth);
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }
}

impl<T> Drop for TreeNode<T> {
    // Unlinks descendants onto a heap stack so that each drops childless.
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Result of assembling a flat listing.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledTree<T: TreeItem> {
    /// Trees rooted at top-level rows (or at the rows picked by a root filter).
    pub tree: Vec<TreeNode<T>>,
    /// Subtrees whose root references a parent that is not in the listing,
    /// plus subtrees cut out of a parent cycle.
    pub orphans: Vec<TreeNode<T>>,
    /// Keys at which a parent cycle was broken. Each is the root of one orphan subtree.
    pub cycles: Vec<T::Key>,
    /// Keys that appeared more than once. Later copies are kept as orphan leaves.
    pub duplicates: Vec<T::Key>,
    /// Rows left out because they are not under any root picked by a root filter.
    pub excluded: usize,
}

impl<T: TreeItem> AssembledTree<T> {
    /// Number of rows nested under roots.
    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.tree.iter().map(TreeNode::count).sum()
    }

    /// Number of rows in orphan subtrees.
    #[must_use]
    pub fn orphan_count(&self) -> usize {
        self.orphans.iter().map(TreeNode::count).sum()
    }

    /// True when every row nested under a root.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.cycles.is_empty() && self.duplicates.is_empty()
    }
}

/// Tree assembler for flat parent-pointer listings.
pub struct TreeAssembler;

impl TreeAssembler {
    /// Assembles every row into a forest rooted at the rows without a parent.
    ///
    /// Every input row appears exactly once in the result: nested under its
    /// parent, or inside an orphan subtree when its parent is missing or the
    /// parent chain loops. Siblings keep their input order.
    #[must_use]
    pub fn assemble<T: TreeItem>(items: Vec<T>) -> AssembledTree<T> {
        Self::assemble_inner(items, None)
    }

    /// Assembles only the subtrees under rows matching `is_root`.
    ///
    /// A matching row nested under another matching row stays nested.
    /// Rows outside the picked subtrees are counted in `excluded` rather
    /// than reported as orphans.
    #[must_use]
    pub fn assemble_from<T: TreeItem>(
        items: Vec<T>,
        is_root: impl Fn(&T) -> bool,
    ) -> AssembledTree<T> {
        Self::assemble_inner(items, Some(&is_root))
    }

    fn assemble_inner<T: TreeItem>(
        items: Vec<T>,
        root_filter: Option<&dyn Fn(&T) -> bool>,
    ) -> AssembledTree<T> {
        let len = items.len();
        let keys: Vec<T::Key> = items.iter().map(TreeItem::key).collect();
        let parents: Vec<Option<T::Key>> = items.iter().map(TreeItem::parent_key).collect();

        let mut index: HashMap<T::Key, usize> = HashMap::with_capacity(len);
        let mut duplicate_positions = Vec::new();
        for (pos, key) in keys.iter().enumerate() {
            if index.contains_key(key) {
                duplicate_positions.push(pos);
            } else {
                index.insert(*key, pos);
            }
        }

        let mut children: HashMap<T::Key, Vec<usize>> = HashMap::new();
        for (pos, parent) in parents.iter().enumerate() {
            if let Some(parent) = parent
                && index.get(&keys[pos]) == Some(&pos)
            {
                children.entry(*parent).or_default().push(pos);
            }
        }

        let roots: Vec<usize> = match root_filter {
            None => (0..len)
                .filter(|&pos| index.get(&keys[pos]) == Some(&pos) && parents[pos].is_none())
                .collect(),
            Some(is_root) => {
                let picked: Vec<bool> = items.iter().map(is_root).collect();
                (0..len)
                    .filter(|&pos| {
                        picked[pos]
                            && index.get(&keys[pos]) == Some(&pos)
                            && !has_picked_ancestor(pos, &keys, &parents, &index, &picked)
                    })
                    .collect()
            }
        };

        let mut arena: Vec<Option<T>> = items.into_iter().map(Some).collect();
        let mut visited = vec![false; len];
        let mut assembled = AssembledTree {
            tree: Vec::with_capacity(roots.len()),
            orphans: Vec::new(),
            cycles: Vec::new(),
            duplicates: Vec::new(),
            excluded: 0,
        };

        let mut builder = Builder {
            arena: &mut arena,
            keys: &keys,
            children: &children,
            visited: &mut visited,
        };

        for &root in &roots {
            if let Some(node) = builder.build(root) {
                assembled.tree.push(node);
            }
        }

        if root_filter.is_some() {
            assembled.excluded = builder.visited.iter().filter(|seen| !**seen).count();
            return assembled;
        }

        // Rows whose parent is absent from the listing.
        for pos in 0..len {
            let is_first = index.get(&keys[pos]) == Some(&pos);
            let parent_missing = parents[pos].is_some_and(|parent| !index.contains_key(&parent));
            if is_first && parent_missing && !builder.visited[pos] {
                tracing::warn!(
                    key = ?keys[pos],
                    parent = ?parents[pos],
                    "orphan row: parent not in listing"
                );
                if let Some(node) = builder.build(pos) {
                    assembled.orphans.push(node);
                }
            }
        }

        // Anything still unvisited hangs off a parent cycle.
        for pos in 0..len {
            if builder.visited[pos] || index.get(&keys[pos]) != Some(&pos) {
                continue;
            }
            let entry = cycle_entry(pos, &keys, &parents, &index);
            tracing::warn!(key = ?keys[entry], "parent cycle broken at row");
            assembled.cycles.push(keys[entry]);
            if let Some(node) = builder.build(entry) {
                assembled.orphans.push(node);
            }
        }

        for pos in duplicate_positions {
            tracing::warn!(key = ?keys[pos], "duplicate row kept as orphan leaf");
            assembled.duplicates.push(keys[pos]);
            if let Some(item) = builder.arena[pos].take() {
                assembled.orphans.push(TreeNode::leaf(item));
            }
        }

        assembled
    }
}

/// Moves rows out of the arena into owned subtrees.
struct Builder<'a, T: TreeItem> {
    arena: &'a mut [Option<T>],
    keys: &'a [T::Key],
    children: &'a HashMap<T::Key, Vec<usize>>,
    visited: &'a mut [bool],
}

/// A subtree under construction with the child positions still to attach.
struct Frame<T> {
    node: TreeNode<T>,
    pending: std::vec::IntoIter<usize>,
}

impl<T: TreeItem> Builder<'_, T> {
    fn child_positions(&self, pos: usize) -> std::vec::IntoIter<usize> {
        self.children
            .get(&self.keys[pos])
            .cloned()
            .unwrap_or_default()
            .into_iter()
    }

    /// Builds the subtree at `root` with an explicit stack.
    fn build(&mut self, root: usize) -> Option<TreeNode<T>> {
        if self.visited[root] {
            return None;
        }
        self.visited[root] = true;
        let item = self.arena[root].take()?;
        let mut stack = vec![Frame {
            node: TreeNode::leaf(item),
            pending: self.child_positions(root),
        }];

        loop {
            let next = stack.last_mut()?.pending.next();
            match next {
                Some(child) => {
                    if self.visited[child] {
                        continue;
                    }
                    self.visited[child] = true;
                    if let Some(item) = self.arena[child].take() {
                        let pending = self.child_positions(child);
                        stack.push(Frame {
                            node: TreeNode::leaf(item),
                            pending,
                        });
                    }
                }
                None => {
                    let done = stack.pop()?;
                    match stack.last_mut() {
                        Some(parent) => parent.node.children.push(done.node),
                        None => return Some(done.node),
                    }
                }
            }
        }
    }
}

fn has_picked_ancestor<K: Copy + Eq + Hash>(
    pos: usize,
    keys: &[K],
    parents: &[Option<K>],
    index: &HashMap<K, usize>,
    picked: &[bool],
) -> bool {
    let mut steps = 0;
    let mut current = pos;
    while let Some(parent) = parents[current].and_then(|key| index.get(&key).copied()) {
        if parent == pos || steps > keys.len() {
            return false;
        }
        if picked[parent] {
            return true;
        }
        current = parent;
        steps += 1;
    }
    false
}

/// Follows parent references from `pos` until a row repeats, then returns
/// the earliest-listed row on that cycle.
fn cycle_entry<K: Copy + Eq + Hash>(
    pos: usize,
    keys: &[K],
    parents: &[Option<K>],
    index: &HashMap<K, usize>,
) -> usize {
    let mut seen: HashMap<usize, usize> = HashMap::new();
    let mut path = Vec::new();
    let mut current = pos;
    loop {
        if let Some(&at) = seen.get(&current) {
            return path[at..].iter().copied().min().unwrap_or(current);
        }
        seen.insert(current, path.len());
        path.push(current);
        match parents[current].and_then(|key| index.get(&key).copied()) {
            Some(parent) if path.len() <= keys.len() => current = parent,
            _ => return current,
        }
    }
}
