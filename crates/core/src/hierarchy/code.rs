//! Full-code composition.
//!
//! A node's full code is its root office's code followed by the suffix of
//! every node from the root Program down to the node itself, joined by `-`.

use std::collections::{HashMap, HashSet};

use aip_shared::types::{NodeId, OfficeId};

use super::error::HierarchyError;
use super::types::{HierarchyNode, Office};

/// Joins an office code and the suffixes of a root-to-node path.
fn join_code<'a>(office_code: &str, suffixes: impl Iterator<Item = &'a str>) -> String {
    let mut code = office_code.to_string();
    for suffix in suffixes {
        code.push('-');
        code.push_str(suffix);
    }
    code
}

/// Composes the full code of `node` from a caller-supplied ancestor lookup.
///
/// Walks parent references up to the root, starts from the root office's
/// code and appends each suffix on the way back down. Pure: no lookups are
/// cached between calls.
///
/// # Errors
///
/// - `BrokenAncestry` if a parent reference cannot be resolved.
/// - `MissingOffice` if the root's office cannot be resolved.
/// - `AncestryCycle` if the parent chain loops.
pub fn compose_full_code<'a, P, O>(
    node: &'a HierarchyNode,
    parent_of: P,
    office_of: O,
) -> Result<String, HierarchyError>
where
    P: Fn(NodeId) -> Option<&'a HierarchyNode>,
    O: Fn(OfficeId) -> Option<&'a Office>,
{
    let mut chain = vec![node];
    let mut seen = HashSet::from([node.id]);
    let mut current = node;

    while let Some(parent_id) = current.parent_id {
        let parent = parent_of(parent_id).ok_or(HierarchyError::BrokenAncestry {
            node_id: current.id,
            missing_parent: parent_id,
        })?;
        if !seen.insert(parent.id) {
            return Err(HierarchyError::AncestryCycle(parent.id));
        }
        chain.push(parent);
        current = parent;
    }

    let office = office_of(current.office_id).ok_or(HierarchyError::MissingOffice {
        node_id: current.id,
        office_id: current.office_id,
    })?;

    Ok(join_code(
        &office.full_code()?,
        chain.iter().rev().map(|n| n.code_suffix.as_str()),
    ))
}

/// Full codes for every node of a flat listing, resolved once.
///
/// Rendering a listing row by row with [`compose_full_code`] re-walks shared
/// ancestors for every row. The index walks each node once and reuses the
/// parent's memoized code for its children.
#[derive(Debug, Clone, Default)]
pub struct CodeIndex {
    codes: HashMap<NodeId, String>,
}

impl CodeIndex {
    /// Builds the index from a flat node listing and the offices it references.
    ///
    /// # Errors
    ///
    /// Fails on the first node with a broken parent chain, missing office, or
    /// ancestry cycle. A partial index is never returned.
    pub fn build(nodes: &[HierarchyNode], offices: &[Office]) -> Result<Self, HierarchyError> {
        let by_id: HashMap<NodeId, &HierarchyNode> = nodes.iter().map(|n| (n.id, n)).collect();
        let mut office_codes = HashMap::with_capacity(offices.len());
        for office in offices {
            office_codes.insert(office.id, office.full_code()?);
        }

        let mut codes: HashMap<NodeId, String> = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if codes.contains_key(&node.id) {
                continue;
            }

            // Climb until a memoized ancestor or the root.
            let mut path = vec![node];
            let mut on_path = HashSet::from([node.id]);
            let mut current = node;
            let base = loop {
                let Some(parent_id) = current.parent_id else {
                    let code = office_codes.get(&current.office_id).ok_or(
                        HierarchyError::MissingOffice {
                            node_id: current.id,
                            office_id: current.office_id,
                        },
                    )?;
                    break code.clone();
                };
                if let Some(code) = codes.get(&parent_id) {
                    break code.clone();
                }
                let parent = by_id.get(&parent_id).copied().ok_or(HierarchyError::BrokenAncestry {
                    node_id: current.id,
                    missing_parent: parent_id,
                })?;
                if !on_path.insert(parent.id) {
                    return Err(HierarchyError::AncestryCycle(parent.id));
                }
                path.push(parent);
                current = parent;
            };

            // Fill codes from the top of the climbed path down.
            let mut code = base;
            for step in path.iter().rev() {
                code = join_code(&code, std::iter::once(step.code_suffix.as_str()));
                codes.insert(step.id, code.clone());
            }
        }

        tracing::debug!(nodes = codes.len(), "built full-code index");
        Ok(Self { codes })
    }

    /// Returns the full code of a node, if it was part of the listing.
    #[must_use]
    pub fn full_code(&self, id: NodeId) -> Option<&str> {
        self.codes.get(&id).map(String::as_str)
    }

    /// Number of nodes in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::types::NodeKind;

    fn office() -> Office {
        Office {
            id: OfficeId::new(),
            sector_code: "01".into(),
            lgu_level_code: "1".into(),
            office_type_code: "02".into(),
            code: "005".into(),
            name: "Municipal Agriculture Office".into(),
            is_lee: false,
        }
    }

    fn node(
        kind: NodeKind,
        suffix: &str,
        parent: Option<&HierarchyNode>,
        office: &Office,
    ) -> HierarchyNode {
        HierarchyNode {
            id: NodeId::new(),
            kind,
            title: format!("{kind} {suffix}"),
            description: None,
            code_suffix: suffix.into(),
            parent_id: parent.map(|p| p.id),
            office_id: office.id,
            is_active: true,
        }
    }

    fn compose(
        target: &HierarchyNode,
        nodes: &[HierarchyNode],
        offices: &[Office],
    ) -> Result<String, HierarchyError> {
        compose_full_code(
            target,
            |id| nodes.iter().find(|n| n.id == id),
            |id| offices.iter().find(|o| o.id == id),
        )
    }

    #[test]
    fn test_root_program_code() {
        let office = office();
        let program = node(NodeKind::Program, "001", None, &office);
        let code = compose(&program, &[program.clone()], &[office]).unwrap();
        assert_eq!(code, "01-1-02-005-001");
    }

    #[test]
    fn test_nested_code() {
        let office = office();
        let program = node(NodeKind::Program, "001", None, &office);
        let project = node(NodeKind::Project, "002", Some(&program), &office);
        let activity = node(NodeKind::Activity, "003", Some(&project), &office);
        let nodes = vec![program, project, activity.clone()];

        let code = compose(&activity, &nodes, &[office]).unwrap();
        assert_eq!(code, "01-1-02-005-001-002-003");
    }

    #[test]
    fn test_broken_ancestry_names_offending_node() {
        let office = office();
        let program = node(NodeKind::Program, "001", None, &office);
        let project = node(NodeKind::Project, "001", Some(&program), &office);
        let activity = node(NodeKind::Activity, "001", Some(&project), &office);
        // Program is missing from the listing.
        let nodes = vec![project.clone(), activity.clone()];

        let err = compose(&activity, &nodes, &[office]).unwrap_err();
        match err {
            HierarchyError::BrokenAncestry { node_id, missing_parent } => {
                assert_eq!(node_id, project.id);
                assert_eq!(missing_parent, program.id);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_office() {
        let office = office();
        let program = node(NodeKind::Program, "001", None, &office);
        let err = compose(&program, &[program.clone()], &[]).unwrap_err();
        assert!(matches!(err, HierarchyError::MissingOffice { .. }));
    }

    #[test]
    fn test_cycle_is_reported() {
        let office = office();
        let mut a = node(NodeKind::Project, "001", None, &office);
        let mut b = node(NodeKind::Project, "002", None, &office);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        let nodes = vec![a.clone(), b];

        let err = compose(&a, &nodes, &[office]).unwrap_err();
        assert!(matches!(err, HierarchyError::AncestryCycle(_)));
    }

    #[test]
    fn test_index_matches_single_composition() {
        let office = office();
        let program = node(NodeKind::Program, "001", None, &office);
        let project_a = node(NodeKind::Project, "001", Some(&program), &office);
        let project_b = node(NodeKind::Project, "002", Some(&program), &office);
        let activity = node(NodeKind::Activity, "001", Some(&project_b), &office);
        // Children listed before parents on purpose.
        let nodes = vec![activity, project_b, project_a, program];
        let offices = vec![office];

        let index = CodeIndex::build(&nodes, &offices).unwrap();
        assert_eq!(index.len(), 4);
        for n in &nodes {
            assert_eq!(index.full_code(n.id).unwrap(), compose(n, &nodes, &offices).unwrap());
        }
    }

    #[test]
    fn test_index_fails_on_broken_ancestry() {
        let office = office();
        let program = node(NodeKind::Program, "001", None, &office);
        let project = node(NodeKind::Project, "001", Some(&program), &office);

        let err = CodeIndex::build(&[project], &[office]).unwrap_err();
        assert!(matches!(err, HierarchyError::BrokenAncestry { .. }));
    }
}
