//! Property-based tests for tree assembly.

use std::collections::HashSet;

use proptest::prelude::*;

use super::assembler::{TreeAssembler, TreeItem, TreeNode};

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: u16,
    parent: Option<u16>,
}

impl TreeItem for Row {
    type Key = u16;

    fn key(&self) -> u16 {
        self.id
    }

    fn parent_key(&self) -> Option<u16> {
        self.parent
    }
}

/// Rows with unique ids whose parents may be missing, forward, or cyclic.
fn rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(prop::option::of(0u16..80), 0..60).prop_map(|parents| {
        parents
            .into_iter()
            .enumerate()
            .map(|(i, parent)| Row {
                id: u16::try_from(i).unwrap_or(u16::MAX),
                parent,
            })
            .collect()
    })
}

fn collect(nodes: &[TreeNode<Row>], out: &mut Vec<u16>) {
    for node in nodes {
        node.walk(|row, _| out.push(row.id));
    }
}

fn links_hold(nodes: &[TreeNode<Row>]) -> bool {
    nodes.iter().all(|node| {
        node.children
            .iter()
            .all(|child| child.item.parent == Some(node.item.id))
            && links_hold(&node.children)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every row lands exactly once, nested under roots or in an orphan subtree.
    #[test]
    fn prop_every_row_placed_once(rows in rows()) {
        let expected: HashSet<u16> = rows.iter().map(|r| r.id).collect();
        let assembled = TreeAssembler::assemble(rows.clone());

        let mut placed = Vec::new();
        collect(&assembled.tree, &mut placed);
        collect(&assembled.orphans, &mut placed);

        prop_assert_eq!(placed.len(), rows.len());
        let unique: HashSet<u16> = placed.into_iter().collect();
        prop_assert_eq!(unique, expected);
    }

    /// Every nested child references its enclosing node as parent.
    #[test]
    fn prop_children_reference_parent(rows in rows()) {
        let assembled = TreeAssembler::assemble(rows);
        prop_assert!(links_hold(&assembled.tree));
        prop_assert!(links_hold(&assembled.orphans));
    }

    /// Tree roots are exactly the rows without a parent.
    #[test]
    fn prop_roots_have_no_parent(rows in rows()) {
        let top: Vec<u16> = rows.iter().filter(|r| r.parent.is_none()).map(|r| r.id).collect();
        let assembled = TreeAssembler::assemble(rows);
        let roots: Vec<u16> = assembled.tree.iter().map(|n| n.item.id).collect();
        prop_assert_eq!(roots, top);
    }

    /// Assembling the same input twice yields the same result.
    #[test]
    fn prop_assembly_is_deterministic(rows in rows()) {
        let first = TreeAssembler::assemble(rows.clone());
        let second = TreeAssembler::assemble(rows);
        prop_assert_eq!(&first.tree, &second.tree);
        prop_assert_eq!(&first.orphans, &second.orphans);
        prop_assert_eq!(&first.cycles, &second.cycles);
        prop_assert_eq!(&first.duplicates, &second.duplicates);
    }

    /// An orphan root either has a missing parent or breaks a cycle.
    #[test]
    fn prop_present_parents_nest(rows in rows()) {
        let keys: HashSet<u16> = rows.iter().map(|r| r.id).collect();
        let assembled = TreeAssembler::assemble(rows);
        for orphan in &assembled.orphans {
            let parent = orphan.item.parent;
            prop_assert!(parent.is_some());
            let missing = parent.is_some_and(|p| !keys.contains(&p));
            prop_assert!(missing || assembled.cycles.contains(&orphan.item.id));
        }
    }
}
