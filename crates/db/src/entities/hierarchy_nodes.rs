//! `SeaORM` Entity for hierarchy_nodes table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "hierarchy_nodes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub code_suffix: String,
    pub parent_id: Option<Uuid>,
    pub office_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::offices::Entity",
        from = "Column::OfficeId",
        to = "super::offices::Column::Id"
    )]
    Offices,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    SelfRef,
    #[sea_orm(has_many = "super::budget_entries::Entity")]
    BudgetEntries,
}

impl Related<super::offices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offices.def()
    }
}

impl Related<super::budget_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
