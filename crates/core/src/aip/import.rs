//! Planning the import of master nodes into a fiscal year.

use std::collections::{HashMap, HashSet};

use aip_shared::types::NodeId;

use crate::hierarchy::{HierarchyError, HierarchyNode};

/// Expands a selection of master nodes with every ancestor not yet in the
/// fiscal year, so the imported tree has no orphans.
///
/// The plan lists ancestors before descendants (shallowest first, then in
/// master listing order) and leaves out nodes already in the year. Selecting
/// a node twice, or selecting it together with its ancestors, is harmless.
///
/// # Errors
///
/// - `NodeNotFound` if a selected node is not in `nodes`.
/// - `BrokenAncestry` if an ancestor is missing.
/// - `AncestryCycle` if a parent chain loops.
pub fn plan_import(
    selection: &[NodeId],
    nodes: &[HierarchyNode],
    existing: &HashSet<NodeId>,
) -> Result<Vec<NodeId>, HierarchyError> {
    let position: HashMap<NodeId, usize> =
        nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
    // node position -> depth
    let mut needed: HashMap<usize, usize> = HashMap::new();

    for &selected in selection {
        let start = *position
            .get(&selected)
            .ok_or(HierarchyError::NodeNotFound(selected))?;

        let mut chain = vec![start];
        let mut on_chain = HashSet::from([start]);
        let mut current = start;
        while let Some(parent_id) = nodes[current].parent_id {
            let parent = *position.get(&parent_id).ok_or(HierarchyError::BrokenAncestry {
                node_id: nodes[current].id,
                missing_parent: parent_id,
            })?;
            if !on_chain.insert(parent) {
                return Err(HierarchyError::AncestryCycle(parent_id));
            }
            chain.push(parent);
            current = parent;
        }

        let depth_of_start = chain.len() - 1;
        for (steps_up, pos) in chain.into_iter().enumerate() {
            needed.insert(pos, depth_of_start - steps_up);
        }
    }

    let mut plan: Vec<(usize, usize)> = needed
        .into_iter()
        .filter(|(pos, _)| !existing.contains(&nodes[*pos].id))
        .map(|(pos, depth)| (depth, pos))
        .collect();
    plan.sort_unstable();

    tracing::debug!(
        selected = selection.len(),
        planned = plan.len(),
        "planned fiscal year import"
    );
    Ok(plan.into_iter().map(|(_, pos)| nodes[pos].id).collect())
}

/// Active master nodes that have no entry in the fiscal year yet.
#[must_use]
pub fn available_to_import<'a>(
    nodes: &'a [HierarchyNode],
    existing: &HashSet<NodeId>,
) -> Vec<&'a HierarchyNode> {
    nodes
        .iter()
        .filter(|n| n.is_active && !existing.contains(&n.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::NodeKind;
    use aip_shared::types::OfficeId;

    fn node(kind: NodeKind, parent: Option<&HierarchyNode>, office_id: OfficeId) -> HierarchyNode {
        HierarchyNode {
            id: NodeId::new(),
            kind,
            title: kind.to_string(),
            description: None,
            code_suffix: "001".into(),
            parent_id: parent.map(|p| p.id),
            office_id,
            is_active: true,
        }
    }

    fn chain() -> Vec<HierarchyNode> {
        let office_id = OfficeId::new();
        let program = node(NodeKind::Program, None, office_id);
        let project = node(NodeKind::Project, Some(&program), office_id);
        let activity = node(NodeKind::Activity, Some(&project), office_id);
        let sub = node(NodeKind::SubActivity, Some(&activity), office_id);
        vec![sub, activity, project, program]
    }

    #[test]
    fn test_selection_pulls_in_ancestors_first() {
        let nodes = chain();
        let plan = plan_import(&[nodes[0].id], &nodes, &HashSet::new()).unwrap();
        assert_eq!(plan, vec![nodes[3].id, nodes[2].id, nodes[1].id, nodes[0].id]);
    }

    #[test]
    fn test_existing_ancestors_are_reused() {
        let nodes = chain();
        let existing = HashSet::from([nodes[3].id, nodes[2].id]);
        let plan = plan_import(&[nodes[0].id], &nodes, &existing).unwrap();
        assert_eq!(plan, vec![nodes[1].id, nodes[0].id]);
    }

    #[test]
    fn test_overlapping_selection_is_deduplicated() {
        let nodes = chain();
        let selection = [nodes[0].id, nodes[2].id, nodes[0].id];
        let plan = plan_import(&selection, &nodes, &HashSet::new()).unwrap();
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn test_everything_present_is_empty_plan() {
        let nodes = chain();
        let existing: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
        assert!(plan_import(&[nodes[0].id], &nodes, &existing).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_selection() {
        let nodes = chain();
        let err = plan_import(&[NodeId::new()], &nodes, &HashSet::new()).unwrap_err();
        assert!(matches!(err, HierarchyError::NodeNotFound(_)));
    }

    #[test]
    fn test_missing_ancestor() {
        let mut nodes = chain();
        nodes.pop(); // drop the program
        let err = plan_import(&[nodes[0].id], &nodes, &HashSet::new()).unwrap_err();
        assert!(matches!(err, HierarchyError::BrokenAncestry { .. }));
    }

    #[test]
    fn test_available_skips_inactive_and_existing() {
        let mut nodes = chain();
        nodes[1].is_active = false;
        let existing = HashSet::from([nodes[3].id]);
        let available: Vec<NodeId> = available_to_import(&nodes, &existing)
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(available, vec![nodes[0].id, nodes[2].id]);
    }
}
