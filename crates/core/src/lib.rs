//! Hierarchical code and rollup engine for the Annual Investment Program.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the `HierarchyStore` and `CostLedger` traits,
//! which the db crate implements over an open transaction.
//!
//! # Modules
//!
//! - `hierarchy` - Office and PPA full codes, sibling suffix allocation
//! - `tree` - Flat parent-pointer listings to nested trees
//! - `budget` - Budget entries, itemized costs and the PS/MOOE/FE/CO rollup
//! - `aip` - Master and fiscal-year tree views, import planning

pub mod aip;
pub mod budget;
pub mod hierarchy;
pub mod tree;

#[cfg(test)]
mod testing;
