//! AIP views: the master hierarchy and a fiscal year's entries as trees.

pub mod import;
pub mod rows;

pub use import::{available_to_import, plan_import};
pub use rows::{AipRow, build_tree, fiscal_year_rows, master_rows, subtree_totals};
