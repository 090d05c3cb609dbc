//! Budget entry repository: fiscal-year import, listing and direct edits.

use std::collections::HashSet;

use aip_core::aip::{AipRow, available_to_import, build_tree, fiscal_year_rows, plan_import};
use aip_core::budget::{
    BudgetEntry, BudgetError, EntryDetails, EntryStatus, TrancheTotals, validate_manual_amounts,
};
use aip_core::hierarchy::{HierarchyError, HierarchyNode, Office};
use aip_core::tree::AssembledTree;
use aip_shared::AppError;
use aip_shared::types::{BudgetEntryId, NodeId, round_money};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::convert::{entries_from_models, nodes_from_models};
use crate::entities::{budget_entries, hierarchy_nodes, itemized_costs, offices};

/// Error types for budget entry operations.
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    /// Hierarchy error (unknown node, broken ancestry).
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Budget error (validation, itemized mode).
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<EntryError> for AppError {
    fn from(err: EntryError) -> Self {
        match err {
            EntryError::Hierarchy(inner) => inner.into(),
            EntryError::Budget(inner) => inner.into(),
            EntryError::Database(db) => Self::Database(db.to_string()),
        }
    }
}

/// Budget entry repository.
#[derive(Debug, Clone)]
pub struct BudgetEntryRepository {
    db: DatabaseConnection,
}

impl BudgetEntryRepository {
    /// Creates a new budget entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Imports master nodes into a fiscal year together with any missing
    /// ancestors, so the year's tree has no orphans.
    ///
    /// Create-or-reuse: a node already in the year keeps its entry, and a
    /// concurrent import of the same node is absorbed by the
    /// `(fiscal_year, node_id)` uniqueness rule. Returns the entries of the
    /// planned nodes in plan order.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` for an unknown selection, or an ancestry error.
    pub async fn import_nodes(
        &self,
        fiscal_year: i32,
        selection: &[NodeId],
    ) -> Result<Vec<BudgetEntry>, EntryError> {
        let txn = self.db.begin().await?;

        let nodes = nodes_from_models(hierarchy_nodes::Entity::find().all(&txn).await?)?;
        let existing = existing_node_ids(&txn, fiscal_year).await?;
        let plan = plan_import(selection, &nodes, &existing)?;

        for node_id in &plan {
            let now = Utc::now().fixed_offset();
            let model = budget_entries::ActiveModel {
                id: Set(BudgetEntryId::new().into_inner()),
                node_id: Set(node_id.into_inner()),
                fiscal_year: Set(fiscal_year),
                start_date: Set(None),
                end_date: Set(None),
                expected_output: Set(None),
                funding_source: Set(None),
                ps_amount: Set(Decimal::ZERO),
                mooe_amount: Set(Decimal::ZERO),
                fe_amount: Set(Decimal::ZERO),
                co_amount: Set(Decimal::ZERO),
                cc_adaptation: Set(Decimal::ZERO),
                cc_mitigation: Set(Decimal::ZERO),
                cc_typology_code: Set(None),
                status: Set(EntryStatus::default().as_str().to_string()),
                created_at: Set(now),
                updated_at: Set(now),
            };
            budget_entries::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        budget_entries::Column::FiscalYear,
                        budget_entries::Column::NodeId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }

        let planned: Vec<_> = plan.iter().map(|id| id.into_inner()).collect();
        let models = budget_entries::Entity::find()
            .filter(budget_entries::Column::FiscalYear.eq(fiscal_year))
            .filter(budget_entries::Column::NodeId.is_in(planned))
            .all(&txn)
            .await?;
        txn.commit().await?;

        let mut entries = entries_from_models(models)?;
        entries.sort_by_key(|e| plan.iter().position(|id| *id == e.node_id));

        tracing::info!(
            fiscal_year,
            selected = selection.len(),
            imported = entries.len(),
            "imported nodes into fiscal year"
        );
        Ok(entries)
    }

    /// Finds an entry by ID.
    pub async fn find(&self, id: BudgetEntryId) -> Result<Option<BudgetEntry>, EntryError> {
        budget_entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(BudgetEntry::try_from)
            .transpose()
            .map_err(EntryError::from)
    }

    /// Lists every entry of a fiscal year.
    pub async fn entries_for_year(&self, fiscal_year: i32) -> Result<Vec<BudgetEntry>, EntryError> {
        let models = budget_entries::Entity::find()
            .filter(budget_entries::Column::FiscalYear.eq(fiscal_year))
            .order_by_asc(budget_entries::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(entries_from_models(models)?)
    }

    /// The fiscal year's AIP as a tree, optionally filtered by a search query.
    ///
    /// Entries whose parent node was never imported come back as orphans.
    pub async fn fiscal_year_tree(
        &self,
        fiscal_year: i32,
        search: Option<&str>,
    ) -> Result<AssembledTree<AipRow>, EntryError> {
        let nodes = nodes_from_models(hierarchy_nodes::Entity::find().all(&self.db).await?)?;
        let offices: Vec<Office> = offices::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(Office::from)
            .collect();
        let entries = self.entries_for_year(fiscal_year).await?;

        let rows = fiscal_year_rows(&nodes, &offices, entries)?;
        Ok(build_tree(rows, search))
    }

    /// Active master nodes not yet imported into the fiscal year.
    pub async fn available_to_import(
        &self,
        fiscal_year: i32,
    ) -> Result<Vec<HierarchyNode>, EntryError> {
        let nodes = nodes_from_models(
            hierarchy_nodes::Entity::find()
                .order_by_asc(hierarchy_nodes::Column::CreatedAt)
                .all(&self.db)
                .await?,
        )?;
        let existing = existing_node_ids(&self.db, fiscal_year).await?;
        Ok(available_to_import(&nodes, &existing)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Updates the descriptive fields of an entry.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, `InvalidSchedule` or `NegativeAmount`.
    pub async fn update_details(
        &self,
        id: BudgetEntryId,
        details: EntryDetails,
    ) -> Result<BudgetEntry, EntryError> {
        details.validate()?;
        let model = budget_entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(BudgetError::EntryNotFound(id))?;

        let mut active: budget_entries::ActiveModel = model.into();
        active.start_date = Set(details.schedule.start);
        active.end_date = Set(details.schedule.end);
        active.expected_output = Set(details.expected_output);
        active.funding_source = Set(details.funding_source);
        active.cc_adaptation = Set(details.climate.adaptation);
        active.cc_mitigation = Set(details.climate.mitigation);
        active.cc_typology_code = Set(details.climate.typology_code);
        active.status = Set(details.status.as_str().to_string());
        active.updated_at = Set(Utc::now().fixed_offset());

        let updated = active.update(&self.db).await?;
        Ok(BudgetEntry::try_from(updated)?)
    }

    /// Sets tranche amounts directly on an entry without itemized costs.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, `ItemizedModeActive` if the entry has itemized
    /// costs, or `NegativeAmount`.
    pub async fn set_manual_amounts(
        &self,
        id: BudgetEntryId,
        amounts: TrancheTotals,
    ) -> Result<BudgetEntry, EntryError> {
        let txn = self.db.begin().await?;

        let model = budget_entries::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(BudgetError::EntryNotFound(id))?;
        let lines = itemized_costs::Entity::find()
            .filter(itemized_costs::Column::BudgetEntryId.eq(id.into_inner()))
            .count(&txn)
            .await?;
        validate_manual_amounts(id, &amounts, usize::try_from(lines).unwrap_or(usize::MAX))?;

        let mut active: budget_entries::ActiveModel = model.into();
        active.ps_amount = Set(round_money(amounts.ps));
        active.mooe_amount = Set(round_money(amounts.mooe));
        active.fe_amount = Set(round_money(amounts.fe));
        active.co_amount = Set(round_money(amounts.co));
        active.updated_at = Set(Utc::now().fixed_offset());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(entry_id = %id, total = %amounts.total(), "set manual entry amounts");
        Ok(BudgetEntry::try_from(updated)?)
    }

    /// Deletes an entry and, by cascade, its itemized costs.
    ///
    /// # Errors
    ///
    /// `EntryNotFound` if the entry does not exist.
    pub async fn delete(&self, id: BudgetEntryId) -> Result<(), EntryError> {
        let result = budget_entries::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(BudgetError::EntryNotFound(id).into());
        }
        tracing::info!(entry_id = %id, "deleted budget entry");
        Ok(())
    }
}

async fn existing_node_ids<C: ConnectionTrait>(
    conn: &C,
    fiscal_year: i32,
) -> Result<HashSet<NodeId>, DbErr> {
    Ok(budget_entries::Entity::find()
        .select_only()
        .column(budget_entries::Column::NodeId)
        .filter(budget_entries::Column::FiscalYear.eq(fiscal_year))
        .into_tuple::<uuid::Uuid>()
        .all(conn)
        .await?
        .into_iter()
        .map(NodeId::from_uuid)
        .collect())
}
