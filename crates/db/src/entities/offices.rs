//! `SeaORM` Entity for offices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "offices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sector_code: String,
    pub lgu_level_code: String,
    pub office_type_code: String,
    pub code: String,
    pub name: String,
    pub is_lee: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::hierarchy_nodes::Entity")]
    HierarchyNodes,
}

impl Related<super::hierarchy_nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HierarchyNodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
