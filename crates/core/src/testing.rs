//! In-memory storage used by the service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use aip_shared::types::{BudgetEntryId, ItemizedCostId, NodeId, OfficeId};

use crate::budget::{BudgetEntry, BudgetError, CostLedger, ItemizedCost, TrancheTotals};
use crate::hierarchy::{HierarchyError, HierarchyNode, HierarchyStore, Office, SiblingScope};

/// Mutex-backed store implementing every storage trait of the engine.
#[derive(Default)]
pub struct MemoryStore {
    offices: Mutex<HashMap<OfficeId, Office>>,
    nodes: Mutex<Vec<HierarchyNode>>,
    entries: Mutex<HashMap<BudgetEntryId, BudgetEntry>>,
    costs: Mutex<Vec<ItemizedCost>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn insert_office(&self, office: Office) {
        self.offices.lock().unwrap().insert(office.id, office);
    }

    pub fn insert_node(&self, node: HierarchyNode) {
        self.nodes.lock().unwrap().push(node);
    }

    pub fn insert_entry(&self, entry: BudgetEntry) {
        self.entries.lock().unwrap().insert(entry.id, entry);
    }

    pub fn insert_cost(&self, cost: ItemizedCost) {
        self.costs.lock().unwrap().push(cost);
    }

    pub fn remove_cost(&self, id: ItemizedCostId) {
        self.costs.lock().unwrap().retain(|c| c.id != id);
    }

    pub fn entry(&self, id: BudgetEntryId) -> Option<BudgetEntry> {
        self.entries.lock().unwrap().get(&id).cloned()
    }

    /// Makes every subsequent write-back fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl HierarchyStore for MemoryStore {
    async fn find_node(&self, id: NodeId) -> Result<Option<HierarchyNode>, HierarchyError> {
        Ok(self.nodes.lock().unwrap().iter().find(|n| n.id == id).cloned())
    }

    async fn find_office(&self, id: OfficeId) -> Result<Option<Office>, HierarchyError> {
        Ok(self.offices.lock().unwrap().get(&id).cloned())
    }

    async fn list_sibling_suffixes(
        &self,
        scope: SiblingScope,
    ) -> Result<Vec<String>, HierarchyError> {
        Ok(self
            .nodes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.sibling_scope() == scope)
            .map(|n| n.code_suffix.clone())
            .collect())
    }
}

impl CostLedger for MemoryStore {
    async fn list_costs(&self, entry_id: BudgetEntryId) -> Result<Vec<ItemizedCost>, BudgetError> {
        Ok(self
            .costs
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.entry_id == entry_id)
            .cloned()
            .collect())
    }

    async fn write_totals(
        &self,
        entry_id: BudgetEntryId,
        totals: TrancheTotals,
    ) -> Result<(), BudgetError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BudgetError::Storage("write rejected".into()));
        }
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get_mut(&entry_id).ok_or(BudgetError::EntryNotFound(entry_id))?;
        entry.amounts = totals;
        Ok(())
    }
}
