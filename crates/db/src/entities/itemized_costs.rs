//! `SeaORM` Entity for itemized_costs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "itemized_costs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_entry_id: Uuid,
    pub account_code: String,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((15, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 4)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub price_item_code: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget_entries::Entity",
        from = "Column::BudgetEntryId",
        to = "super::budget_entries::Column::Id",
        on_delete = "Cascade"
    )]
    BudgetEntries,
}

impl Related<super::budget_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
