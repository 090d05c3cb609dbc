//! Rows of the master hierarchy and of a fiscal year's AIP.

use std::collections::HashMap;

use aip_shared::types::NodeId;
use serde::Serialize;

use crate::budget::{BudgetEntry, BudgetError, TrancheTotals};
use crate::hierarchy::{CodeIndex, HierarchyError, HierarchyNode, Office};
use crate::tree::{AssembledTree, TreeAssembler, TreeItem, TreeNode, retain_matches};

/// A hierarchy node with its full code and, in a fiscal-year view, its entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AipRow {
    /// The node.
    pub node: HierarchyNode,
    /// Full code resolved from the node's ancestry.
    pub full_code: String,
    /// The node's budget entry for the year. Always `None` in the master view.
    pub entry: Option<BudgetEntry>,
}

impl TreeItem for AipRow {
    type Key = NodeId;

    fn key(&self) -> NodeId {
        self.node.id
    }

    fn parent_key(&self) -> Option<NodeId> {
        self.node.parent_id
    }
}

impl AipRow {
    /// Case-insensitive match on the title, or a match on the full code.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        self.full_code.contains(query)
            || self
                .node
                .title
                .to_lowercase()
                .contains(&query.to_lowercase())
    }
}

/// Rows for every node of the master hierarchy, ordered by full code.
///
/// # Errors
///
/// Fails if any node's ancestry is broken. See [`CodeIndex::build`].
pub fn master_rows(
    nodes: Vec<HierarchyNode>,
    offices: &[Office],
) -> Result<Vec<AipRow>, HierarchyError> {
    let index = CodeIndex::build(&nodes, offices)?;
    let mut rows = nodes
        .into_iter()
        .map(|node| {
            let full_code = resolved(&index, &node)?;
            Ok(AipRow {
                node,
                full_code,
                entry: None,
            })
        })
        .collect::<Result<Vec<_>, HierarchyError>>()?;
    rows.sort_by(|a, b| a.full_code.cmp(&b.full_code));
    Ok(rows)
}

/// Rows for the entries of one fiscal year, ordered by full code.
///
/// `nodes` is the whole master hierarchy so that codes resolve even for
/// entries whose ancestors were never imported.
///
/// # Errors
///
/// - `NodeNotFound` if an entry references a node not in `nodes`.
/// - Any ancestry error from building the code index.
pub fn fiscal_year_rows(
    nodes: &[HierarchyNode],
    offices: &[Office],
    entries: Vec<BudgetEntry>,
) -> Result<Vec<AipRow>, HierarchyError> {
    let index = CodeIndex::build(nodes, offices)?;
    let by_id: HashMap<NodeId, &HierarchyNode> = nodes.iter().map(|n| (n.id, n)).collect();

    let mut rows = entries
        .into_iter()
        .map(|entry| {
            let node = by_id
                .get(&entry.node_id)
                .copied()
                .ok_or(HierarchyError::NodeNotFound(entry.node_id))?;
            Ok(AipRow {
                node: node.clone(),
                full_code: resolved(&index, node)?,
                entry: Some(entry),
            })
        })
        .collect::<Result<Vec<_>, HierarchyError>>()?;
    rows.sort_by(|a, b| a.full_code.cmp(&b.full_code));
    Ok(rows)
}

fn resolved(index: &CodeIndex, node: &HierarchyNode) -> Result<String, HierarchyError> {
    index
        .full_code(node.id)
        .map(str::to_string)
        .ok_or(HierarchyError::NodeNotFound(node.id))
}

/// Assembles rows into a tree, optionally keeping only search matches and
/// their ancestors.
#[must_use]
pub fn build_tree(rows: Vec<AipRow>, search: Option<&str>) -> AssembledTree<AipRow> {
    let mut assembled = TreeAssembler::assemble(rows);
    if let Some(query) = search.map(str::trim).filter(|q| !q.is_empty()) {
        let pred = |row: &AipRow| row.matches(query);
        assembled.tree = retain_matches(std::mem::take(&mut assembled.tree), &pred);
        assembled.orphans = retain_matches(std::mem::take(&mut assembled.orphans), &pred);
    }
    if !assembled.orphans.is_empty() {
        tracing::warn!(
            orphans = assembled.orphan_count(),
            cycles = assembled.cycles.len(),
            "AIP tree has rows outside the hierarchy"
        );
    }
    assembled
}

/// Sum of the entry amounts of a row and all its descendants.
///
/// # Errors
///
/// Returns `AmountOverflow` if the sum leaves the decimal range.
pub fn subtree_totals(node: &TreeNode<AipRow>) -> Result<TrancheTotals, BudgetError> {
    let mut totals = TrancheTotals::default();
    let mut outcome = Ok(());
    node.walk(|row, _| {
        if outcome.is_ok()
            && let Some(entry) = &row.entry
        {
            outcome = totals.merge(&entry.amounts);
        }
    });
    outcome.map(|()| totals)
}
