//! `SeaORM` Entity for budget_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub node_id: Uuid,
    pub fiscal_year: i32,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub expected_output: Option<String>,
    pub funding_source: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub ps_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub mooe_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub fe_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub co_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub cc_adaptation: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub cc_mitigation: Decimal,
    pub cc_typology_code: Option<String>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hierarchy_nodes::Entity",
        from = "Column::NodeId",
        to = "super::hierarchy_nodes::Column::Id"
    )]
    HierarchyNodes,
    #[sea_orm(has_many = "super::itemized_costs::Entity")]
    ItemizedCosts,
}

impl Related<super::hierarchy_nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HierarchyNodes.def()
    }
}

impl Related<super::itemized_costs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemizedCosts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
