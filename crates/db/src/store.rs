//! Engine storage traits implemented over a `SeaORM` connection.

use aip_core::budget::{BudgetError, CostLedger, ItemizedCost, TrancheTotals};
use aip_core::hierarchy::{HierarchyError, HierarchyNode, HierarchyStore, Office, SiblingScope};
use aip_shared::types::{BudgetEntryId, NodeId, OfficeId};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::{budget_entries, hierarchy_nodes, itemized_costs, offices};

/// Storage adapter bound to a connection or an open transaction.
///
/// Bind it to the transaction that will also perform the write, so that the
/// engine's reads and the write see one snapshot and commit together.
#[derive(Debug, Clone, Copy)]
pub struct SeaStore<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> SeaStore<'c, C> {
    /// Creates a store over `conn`.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

fn hierarchy_storage(err: DbErr) -> HierarchyError {
    HierarchyError::Storage(err.to_string())
}

fn budget_storage(err: DbErr) -> BudgetError {
    BudgetError::Storage(err.to_string())
}

impl<C: ConnectionTrait + Send + Sync> HierarchyStore for SeaStore<'_, C> {
    async fn find_node(&self, id: NodeId) -> Result<Option<HierarchyNode>, HierarchyError> {
        hierarchy_nodes::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await
            .map_err(hierarchy_storage)?
            .map(HierarchyNode::try_from)
            .transpose()
    }

    async fn find_office(&self, id: OfficeId) -> Result<Option<Office>, HierarchyError> {
        Ok(offices::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await
            .map_err(hierarchy_storage)?
            .map(Office::from))
    }

    async fn list_sibling_suffixes(
        &self,
        scope: SiblingScope,
    ) -> Result<Vec<String>, HierarchyError> {
        let query = hierarchy_nodes::Entity::find()
            .select_only()
            .column(hierarchy_nodes::Column::CodeSuffix);
        let query = match scope {
            SiblingScope::Children(parent_id) => {
                query.filter(hierarchy_nodes::Column::ParentId.eq(parent_id.into_inner()))
            }
            SiblingScope::Root(office_id) => query
                .filter(hierarchy_nodes::Column::ParentId.is_null())
                .filter(hierarchy_nodes::Column::OfficeId.eq(office_id.into_inner())),
        };

        query
            .into_tuple::<String>()
            .all(self.conn)
            .await
            .map_err(hierarchy_storage)
    }
}

impl<C: ConnectionTrait + Send + Sync> CostLedger for SeaStore<'_, C> {
    async fn list_costs(&self, entry_id: BudgetEntryId) -> Result<Vec<ItemizedCost>, BudgetError> {
        Ok(itemized_costs::Entity::find()
            .filter(itemized_costs::Column::BudgetEntryId.eq(entry_id.into_inner()))
            .order_by_asc(itemized_costs::Column::CreatedAt)
            .order_by_asc(itemized_costs::Column::Id)
            .all(self.conn)
            .await
            .map_err(budget_storage)?
            .into_iter()
            .map(ItemizedCost::from)
            .collect())
    }

    async fn write_totals(
        &self,
        entry_id: BudgetEntryId,
        totals: TrancheTotals,
    ) -> Result<(), BudgetError> {
        let result = budget_entries::Entity::update_many()
            .col_expr(budget_entries::Column::PsAmount, Expr::value(totals.ps))
            .col_expr(budget_entries::Column::MooeAmount, Expr::value(totals.mooe))
            .col_expr(budget_entries::Column::FeAmount, Expr::value(totals.fe))
            .col_expr(budget_entries::Column::CoAmount, Expr::value(totals.co))
            .col_expr(budget_entries::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(budget_entries::Column::Id.eq(entry_id.into_inner()))
            .exec(self.conn)
            .await
            .map_err(budget_storage)?;

        if result.rows_affected == 0 {
            return Err(BudgetError::EntryNotFound(entry_id));
        }
        Ok(())
    }
}
