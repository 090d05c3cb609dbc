//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod budget_entry;
pub mod hierarchy;
pub mod itemized_cost;
pub mod office;

pub use budget_entry::{BudgetEntryRepository, EntryError};
pub use hierarchy::{HierarchyRepository, NodeError};
pub use itemized_cost::{CostChange, CostError, ItemizedCostRepository};
pub use office::{CreateOfficeInput, OfficeError, OfficeRepository};
