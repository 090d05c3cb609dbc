//! `SeaORM` entities.

pub mod prelude;

pub mod budget_entries;
pub mod chart_of_accounts;
pub mod hierarchy_nodes;
pub mod itemized_costs;
pub mod offices;
pub mod price_list_items;
