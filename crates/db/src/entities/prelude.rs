//! Entity re-exports.

pub use super::budget_entries::Entity as BudgetEntries;
pub use super::chart_of_accounts::Entity as ChartOfAccounts;
pub use super::hierarchy_nodes::Entity as HierarchyNodes;
pub use super::itemized_costs::Entity as ItemizedCosts;
pub use super::offices::Entity as Offices;
pub use super::price_list_items::Entity as PriceListItems;
