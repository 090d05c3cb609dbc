//! Rollup service: recomputes an entry's totals against storage.

use std::future::Future;

use aip_shared::types::BudgetEntryId;

use super::error::BudgetError;
use super::rollup::{AccountClassifier, RollupAggregator};
use super::types::{ItemizedCost, TrancheTotals};

/// Storage access needed by the rollup.
///
/// The db crate implements this over an open transaction, so the listing,
/// the write-back and the triggering cost mutation commit or roll back
/// together.
pub trait CostLedger: Send + Sync {
    /// List every itemized cost of an entry.
    fn list_costs(
        &self,
        entry_id: BudgetEntryId,
    ) -> impl Future<Output = Result<Vec<ItemizedCost>, BudgetError>> + Send;

    /// Replace an entry's tranche amounts.
    fn write_totals(
        &self,
        entry_id: BudgetEntryId,
        totals: TrancheTotals,
    ) -> impl Future<Output = Result<(), BudgetError>> + Send;
}

impl<L: CostLedger> CostLedger for &L {
    fn list_costs(
        &self,
        entry_id: BudgetEntryId,
    ) -> impl Future<Output = Result<Vec<ItemizedCost>, BudgetError>> + Send {
        (**self).list_costs(entry_id)
    }

    fn write_totals(
        &self,
        entry_id: BudgetEntryId,
        totals: TrancheTotals,
    ) -> impl Future<Output = Result<(), BudgetError>> + Send {
        (**self).write_totals(entry_id, totals)
    }
}

/// Rollup service for itemized cost totals.
pub struct RollupService<L: CostLedger, C: AccountClassifier> {
    ledger: L,
    classifier: C,
}

impl<L: CostLedger, C: AccountClassifier + Sync> RollupService<L, C> {
    /// Create a new rollup service.
    #[must_use]
    pub const fn new(ledger: L, classifier: C) -> Self {
        Self { ledger, classifier }
    }

    /// Recomputes an entry's totals from its current itemized costs and
    /// replaces the stored amounts.
    ///
    /// Running it twice without an intervening change writes the same totals.
    ///
    /// # Errors
    ///
    /// - `UnmappedAccount` / negative-input errors from the aggregation.
    /// - `RollupPersistence` if the write-back fails. The caller must roll
    ///   back the cost mutation that triggered the rollup.
    pub async fn recalculate_entry_totals(
        &self,
        entry_id: BudgetEntryId,
    ) -> Result<TrancheTotals, BudgetError> {
        let costs = self.ledger.list_costs(entry_id).await?;
        let totals = RollupAggregator::aggregate(&costs, &self.classifier)?;

        self.ledger
            .write_totals(entry_id, totals)
            .await
            .map_err(|err| {
                tracing::error!(%entry_id, error = %err, "rollup write-back failed");
                BudgetError::RollupPersistence {
                    entry_id,
                    reason: err.to_string(),
                }
            })?;

        tracing::info!(
            %entry_id,
            lines = costs.len(),
            total = %totals.total(),
            "recalculated entry totals"
        );
        Ok(totals)
    }
}

/// Checks tranche amounts typed in directly by the user.
///
/// # Errors
///
/// - `ItemizedModeActive` if the entry already has itemized costs.
/// - `NegativeAmount` if any tranche is negative.
/// - `AmountOverflow` if the grand total is not representable.
pub fn validate_manual_amounts(
    entry_id: BudgetEntryId,
    amounts: &TrancheTotals,
    itemized_lines: usize,
) -> Result<(), BudgetError> {
    if itemized_lines > 0 {
        return Err(BudgetError::ItemizedModeActive(entry_id));
    }
    if amounts.has_negative() {
        return Err(BudgetError::NegativeAmount);
    }
    if amounts.checked_total().is_none() {
        return Err(BudgetError::AmountOverflow);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::rollup::UacsClassifier;
    use crate::budget::types::BudgetEntry;
    use crate::testing::MemoryStore;
    use aip_shared::types::{ItemizedCostId, NodeId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn cost(
        entry_id: BudgetEntryId,
        account: &str,
        quantity: Decimal,
        unit_cost: Decimal,
    ) -> ItemizedCost {
        ItemizedCost {
            id: ItemizedCostId::new(),
            entry_id,
            account_code: account.into(),
            description: "line".into(),
            quantity,
            unit_cost,
            amount: Decimal::ZERO,
            price_item_code: None,
        }
    }

    fn store_with_entry() -> (MemoryStore, BudgetEntryId) {
        let store = MemoryStore::default();
        let entry = BudgetEntry::new(NodeId::new(), 2027);
        let entry_id = entry.id;
        store.insert_entry(entry);
        (store, entry_id)
    }

    #[tokio::test]
    async fn test_recalculate_writes_totals() {
        let (store, entry_id) = store_with_entry();
        store.insert_cost(cost(entry_id, "5-02-03-010", dec!(3), dec!(150.00)));
        store.insert_cost(cost(entry_id, "5-02-02-010", dec!(1), dec!(2500.00)));

        let service = RollupService::new(&store, UacsClassifier);
        let totals = service.recalculate_entry_totals(entry_id).await.unwrap();

        assert_eq!(totals.mooe, dec!(2950.00));
        assert_eq!(totals.total(), dec!(2950.00));
        assert_eq!(store.entry(entry_id).unwrap().amounts, totals);
    }

    #[tokio::test]
    async fn test_recalculate_is_idempotent() {
        let (store, entry_id) = store_with_entry();
        store.insert_cost(cost(entry_id, "5-01-01-010", dec!(12), dec!(18000.00)));
        store.insert_cost(cost(entry_id, "1-06-05-030", dec!(2), dec!(45000.00)));

        let service = RollupService::new(&store, UacsClassifier);
        let first = service.recalculate_entry_totals(entry_id).await.unwrap();
        let second = service.recalculate_entry_totals(entry_id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.ps, dec!(216000.00));
        assert_eq!(second.co, dec!(90000.00));
    }

    #[tokio::test]
    async fn test_removing_last_cost_zeroes_totals() {
        let (store, entry_id) = store_with_entry();
        let line = cost(entry_id, "5-02-03-010", dec!(1), dec!(100));
        let line_id = line.id;
        store.insert_cost(line);

        let service = RollupService::new(&store, UacsClassifier);
        service.recalculate_entry_totals(entry_id).await.unwrap();
        store.remove_cost(line_id);
        let totals = service.recalculate_entry_totals(entry_id).await.unwrap();

        assert_eq!(totals.total(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_write_back_failure_is_rollup_persistence() {
        let (store, entry_id) = store_with_entry();
        store.insert_cost(cost(entry_id, "5-02-03-010", dec!(1), dec!(100)));
        store.fail_writes(true);

        let service = RollupService::new(&store, UacsClassifier);
        let err = service.recalculate_entry_totals(entry_id).await.unwrap_err();

        assert!(matches!(
            err,
            BudgetError::RollupPersistence { entry_id: id, .. } if id == entry_id
        ));
        assert!(err.is_incident());
        assert_eq!(store.entry(entry_id).unwrap().total(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_unmapped_account_does_not_write() {
        let (store, entry_id) = store_with_entry();
        store.insert_cost(cost(entry_id, "5-02-03-010", dec!(1), dec!(100)));
        store.insert_cost(cost(entry_id, "8-88-88-888", dec!(1), dec!(100)));

        let service = RollupService::new(&store, UacsClassifier);
        let err = service.recalculate_entry_totals(entry_id).await.unwrap_err();

        assert!(matches!(err, BudgetError::UnmappedAccount(_)));
        assert_eq!(store.entry(entry_id).unwrap().total(), Decimal::ZERO);
    }

    #[test]
    fn test_manual_amounts_rules() {
        let entry_id = BudgetEntryId::new();
        let amounts = TrancheTotals {
            mooe: dec!(50000),
            ..TrancheTotals::default()
        };
        assert!(validate_manual_amounts(entry_id, &amounts, 0).is_ok());
        assert!(matches!(
            validate_manual_amounts(entry_id, &amounts, 2),
            Err(BudgetError::ItemizedModeActive(_))
        ));

        let negative = TrancheTotals {
            fe: dec!(-1),
            ..TrancheTotals::default()
        };
        assert!(matches!(
            validate_manual_amounts(entry_id, &negative, 0),
            Err(BudgetError::NegativeAmount)
        ));

        let unbounded = TrancheTotals {
            ps: Decimal::MAX,
            co: Decimal::MAX,
            ..TrancheTotals::default()
        };
        assert!(matches!(
            validate_manual_amounts(entry_id, &unbounded, 0),
            Err(BudgetError::AmountOverflow)
        ));
    }
}
