//! Pruning assembled trees to rows matching a predicate.

use super::assembler::TreeNode;

/// Keeps every row matching `pred` together with its ancestors.
///
/// A kept ancestor loses the children that neither match nor lead to a
/// match. Descendants of a match are not kept unless they match too.
#[must_use]
pub fn retain_matches<T>(
    roots: Vec<TreeNode<T>>,
    pred: &impl Fn(&T) -> bool,
) -> Vec<TreeNode<T>> {
    roots.into_iter().filter_map(|node| prune(node, pred)).collect()
}

/// A node whose children are being pruned, with the survivors so far.
struct Frame<T> {
    node: TreeNode<T>,
    pending: std::vec::IntoIter<TreeNode<T>>,
    kept: Vec<TreeNode<T>>,
}

impl<T> Frame<T> {
    fn open(mut node: TreeNode<T>) -> Self {
        let pending = std::mem::take(&mut node.children).into_iter();
        Self {
            node,
            pending,
            kept: Vec::new(),
        }
    }
}

/// Prunes one subtree in post-order with an explicit stack.
fn prune<T>(root: TreeNode<T>, pred: &impl Fn(&T) -> bool) -> Option<TreeNode<T>> {
    let mut stack = vec![Frame::open(root)];
    loop {
        let next = stack.last_mut()?.pending.next();
        if let Some(child) = next {
            stack.push(Frame::open(child));
            continue;
        }
        let Frame { mut node, kept, .. } = stack.pop()?;
        let keep = !kept.is_empty() || pred(&node.item);
        node.children = kept;
        match stack.last_mut() {
            Some(parent) if keep => parent.kept.push(node),
            Some(_) => {}
            None => return keep.then_some(node),
        }
    }
}
