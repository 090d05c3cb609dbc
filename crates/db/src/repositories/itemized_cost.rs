//! Itemized cost repository.
//!
//! Every mutation locks the owning entry, writes the cost and recomputes the
//! entry's tranche totals in the same transaction. If the rollup fails, the
//! cost write is rolled back with it.

use std::collections::HashMap;

use aip_core::budget::{
    BudgetError, ItemizedCost, NewCost, PricedCost, RollupService, Tranche, TrancheTotals,
    price_cost,
};
use aip_shared::AppError;
use aip_shared::types::{BudgetEntryId, ItemizedCostId};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::convert::chart_from_models;
use crate::entities::{budget_entries, chart_of_accounts, itemized_costs, price_list_items};
use crate::store::SeaStore;

/// Decimal places kept for quantities and unit costs.
const QUANTITY_SCALE: u32 = 4;

/// Error types for itemized cost operations.
#[derive(Debug, thiserror::Error)]
pub enum CostError {
    /// Budget error (validation, pricing, rollup).
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CostError> for AppError {
    fn from(err: CostError) -> Self {
        match err {
            CostError::Budget(inner) => inner.into(),
            CostError::Database(db) => Self::Database(db.to_string()),
        }
    }
}

/// A cost mutation's result together with the entry's new totals.
#[derive(Debug, Clone)]
pub struct CostChange {
    /// The written cost, `None` after a delete.
    pub cost: Option<ItemizedCost>,
    /// The owning entry's recomputed totals.
    pub totals: TrancheTotals,
}

/// Itemized cost repository.
#[derive(Debug, Clone)]
pub struct ItemizedCostRepository {
    db: DatabaseConnection,
}

impl ItemizedCostRepository {
    /// Creates a new itemized cost repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds a cost line to an entry and rolls the entry up.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, pricing errors (`UnmappedAccount`,
    /// `UnitCostUnavailable`, negative inputs) or `RollupPersistence`.
    pub async fn create(
        &self,
        entry_id: BudgetEntryId,
        input: NewCost,
    ) -> Result<CostChange, CostError> {
        let txn = self.db.begin().await?;
        lock_entry(&txn, entry_id).await?;

        let chart = load_chart(&txn).await?;
        let priced = price(&txn, input, &chart).await?;

        let now = Utc::now().fixed_offset();
        let model = itemized_costs::ActiveModel {
            id: Set(ItemizedCostId::new().into_inner()),
            budget_entry_id: Set(entry_id.into_inner()),
            account_code: Set(priced.account_code),
            description: Set(priced.description),
            quantity: Set(priced.quantity),
            unit_cost: Set(priced.unit_cost),
            amount: Set(priced.amount),
            price_item_code: Set(priced.price_item_code),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let totals = rollup(&txn, entry_id, &chart).await?;
        txn.commit().await?;

        tracing::info!(
            %entry_id,
            cost_id = %model.id,
            tranche = %priced.tranche,
            "added itemized cost"
        );
        Ok(CostChange {
            cost: Some(model.into()),
            totals,
        })
    }

    /// Replaces a cost line and rolls its entry up.
    ///
    /// # Errors
    ///
    /// `CostNotFound`, pricing errors or `RollupPersistence`.
    pub async fn update(
        &self,
        id: ItemizedCostId,
        input: NewCost,
    ) -> Result<CostChange, CostError> {
        let txn = self.db.begin().await?;
        let entry_id = entry_of(&txn, id).await?;
        lock_entry(&txn, entry_id).await?;

        let chart = load_chart(&txn).await?;
        let priced = price(&txn, input, &chart).await?;

        let model = itemized_costs::ActiveModel {
            id: Set(id.into_inner()),
            account_code: Set(priced.account_code),
            description: Set(priced.description),
            quantity: Set(priced.quantity),
            unit_cost: Set(priced.unit_cost),
            amount: Set(priced.amount),
            price_item_code: Set(priced.price_item_code),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        let totals = rollup(&txn, entry_id, &chart).await?;
        txn.commit().await?;

        tracing::info!(%entry_id, cost_id = %id, "updated itemized cost");
        Ok(CostChange {
            cost: Some(model.into()),
            totals,
        })
    }

    /// Removes a cost line and rolls its entry up.
    ///
    /// # Errors
    ///
    /// `CostNotFound` or `RollupPersistence`.
    pub async fn delete(&self, id: ItemizedCostId) -> Result<CostChange, CostError> {
        let txn = self.db.begin().await?;
        let entry_id = entry_of(&txn, id).await?;
        lock_entry(&txn, entry_id).await?;

        itemized_costs::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await?;

        let chart = load_chart(&txn).await?;
        let totals = rollup(&txn, entry_id, &chart).await?;
        txn.commit().await?;

        tracing::info!(%entry_id, cost_id = %id, "removed itemized cost");
        Ok(CostChange { cost: None, totals })
    }

    /// Lists an entry's cost lines in creation order.
    pub async fn list(&self, entry_id: BudgetEntryId) -> Result<Vec<ItemizedCost>, CostError> {
        Ok(itemized_costs::Entity::find()
            .filter(itemized_costs::Column::BudgetEntryId.eq(entry_id.into_inner()))
            .order_by_asc(itemized_costs::Column::CreatedAt)
            .order_by_asc(itemized_costs::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(ItemizedCost::from)
            .collect())
    }

    /// Recomputes an entry's totals without changing any cost line.
    ///
    /// Running it repeatedly leaves the entry unchanged.
    pub async fn recalculate(&self, entry_id: BudgetEntryId) -> Result<TrancheTotals, CostError> {
        let txn = self.db.begin().await?;
        lock_entry(&txn, entry_id).await?;
        let chart = load_chart(&txn).await?;
        let totals = rollup(&txn, entry_id, &chart).await?;
        txn.commit().await?;
        Ok(totals)
    }
}

/// Locks the entry row so that concurrent cost mutations serialize.
async fn lock_entry(txn: &DatabaseTransaction, entry_id: BudgetEntryId) -> Result<(), CostError> {
    budget_entries::Entity::find_by_id(entry_id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(BudgetError::EntryNotFound(entry_id))?;
    Ok(())
}

async fn entry_of(
    txn: &DatabaseTransaction,
    id: ItemizedCostId,
) -> Result<BudgetEntryId, CostError> {
    let cost = itemized_costs::Entity::find_by_id(id.into_inner())
        .one(txn)
        .await?
        .ok_or(BudgetError::CostNotFound(id))?;
    Ok(BudgetEntryId::from_uuid(cost.budget_entry_id))
}

async fn load_chart(txn: &DatabaseTransaction) -> Result<HashMap<String, Tranche>, CostError> {
    let rows = chart_of_accounts::Entity::find().all(txn).await?;
    Ok(chart_from_models(rows)?)
}

/// Resolves the unit cost (price list fallback) and the amount of a line.
async fn price(
    txn: &DatabaseTransaction,
    mut input: NewCost,
    chart: &HashMap<String, Tranche>,
) -> Result<PricedCost, CostError> {
    input.quantity = input.quantity.round_dp(QUANTITY_SCALE);
    input.unit_cost = input.unit_cost.map(|u| u.round_dp(QUANTITY_SCALE));

    let mut catalog: HashMap<String, Decimal> = HashMap::new();
    if input.unit_cost.is_none()
        && let Some(item) = input.price_item_code.as_deref()
    {
        let unit_price = price_list_items::Entity::find_by_id(item.to_string())
            .select_only()
            .column(price_list_items::Column::UnitPrice)
            .into_tuple::<Decimal>()
            .one(txn)
            .await?;
        if let Some(unit_price) = unit_price {
            catalog.insert(item.to_string(), unit_price);
        }
    }

    Ok(price_cost(input, &catalog, chart)?)
}

async fn rollup(
    txn: &DatabaseTransaction,
    entry_id: BudgetEntryId,
    chart: &HashMap<String, Tranche>,
) -> Result<TrancheTotals, CostError> {
    let service = RollupService::new(SeaStore::new(txn), chart);
    Ok(service.recalculate_entry_totals(entry_id).await?)
}
