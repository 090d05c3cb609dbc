//! Property-based tests for code composition and suffix allocation.

use std::collections::HashSet;

use aip_shared::types::{NodeId, OfficeId};
use proptest::prelude::*;

use super::code::{CodeIndex, compose_full_code};
use super::sequence::{SuffixPolicy, format_suffix, next_suffix};
use super::types::{HierarchyNode, NodeKind, Office};

fn office() -> Office {
    Office {
        id: OfficeId::new(),
        sector_code: "01".into(),
        lgu_level_code: "1".into(),
        office_type_code: "02".into(),
        code: "005".into(),
        name: "Municipal Health Office".into(),
        is_lee: false,
    }
}

/// Builds a random forest: each node's parent is an earlier node or none.
fn forest(parents: &[Option<prop::sample::Index>], office: &Office) -> Vec<HierarchyNode> {
    let mut nodes: Vec<HierarchyNode> = Vec::with_capacity(parents.len());
    for (i, parent) in parents.iter().enumerate() {
        let parent_id = match parent {
            Some(idx) if i > 0 => Some(nodes[idx.index(i)].id),
            _ => None,
        };
        nodes.push(HierarchyNode {
            id: NodeId::new(),
            kind: if parent_id.is_some() { NodeKind::SubActivity } else { NodeKind::Program },
            title: format!("node {i}"),
            description: None,
            code_suffix: format_suffix(u32::try_from(i % 999).unwrap_or(0) + 1),
            parent_id,
            office_id: office.id,
            is_active: true,
        });
    }
    nodes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A node's full code is its parent's full code plus its own suffix, or
    /// the office code plus its suffix at the root.
    #[test]
    fn prop_code_extends_parent_code(
        parents in prop::collection::vec(prop::option::of(any::<prop::sample::Index>()), 1..40),
    ) {
        let office = office();
        let offices = vec![office.clone()];
        let nodes = forest(&parents, &office);
        let index = CodeIndex::build(&nodes, &offices).unwrap();

        for node in &nodes {
            let code = compose_full_code(
                node,
                |id| nodes.iter().find(|n| n.id == id),
                |id| offices.iter().find(|o| o.id == id),
            )
            .unwrap();
            prop_assert_eq!(index.full_code(node.id), Some(code.as_str()));

            let expected_prefix = match node.parent_id {
                Some(parent_id) => index.full_code(parent_id).unwrap().to_string(),
                None => office.full_code().unwrap(),
            };
            prop_assert_eq!(code, format!("{}-{}", expected_prefix, node.code_suffix));
        }
    }

    /// Allocating and immediately consuming suffixes never repeats one.
    #[test]
    fn prop_consumed_allocations_are_unique(
        existing in prop::collection::hash_set(1u32..500, 0..30),
        rounds in 1usize..50,
    ) {
        let mut siblings: Vec<String> = existing.iter().copied().map(format_suffix).collect();
        let mut seen: HashSet<String> = siblings.iter().cloned().collect();
        let max_before = existing.iter().copied().max().unwrap_or(0);

        for _ in 0..rounds {
            let suffix = next_suffix(&siblings, SuffixPolicy::Strict).unwrap();
            prop_assert!(seen.insert(suffix.clone()), "duplicate suffix {}", suffix);
            prop_assert!(suffix.parse::<u32>().unwrap() > max_before);
            siblings.push(suffix);
        }
    }

    /// The allocated suffix is strictly greater than every numeric sibling.
    #[test]
    fn prop_next_is_max_plus_one(existing in prop::collection::vec(1u32..999, 1..30)) {
        let siblings: Vec<String> = existing.iter().copied().map(format_suffix).collect();
        let max = existing.iter().copied().max().unwrap_or(0);
        let suffix = next_suffix(&siblings, SuffixPolicy::Lenient).unwrap();
        prop_assert_eq!(suffix, format_suffix(max + 1));
    }
}
