//! Budget entries, itemized costs and the tranche rollup.
//!
//! This module implements:
//! - Entry, cost and tranche types (`types`)
//! - Line amounts and the PS/MOOE/FE/CO aggregation (`rollup`)
//! - Price list fallback for unit costs (`catalog`)
//! - The storage-backed rollup service (`service`)

pub mod catalog;
pub mod error;
pub mod rollup;
pub mod service;
pub mod types;


pub use catalog::{PriceCatalog, PricedCost, price_cost, resolve_unit_cost};
pub use error::BudgetError;
pub use rollup::{AccountClassifier, RollupAggregator, UacsClassifier, line_amount};
pub use service::{CostLedger, RollupService, validate_manual_amounts};
pub use types::{
    BudgetEntry, ClimateTags, EntryDetails, EntryStatus, ItemizedCost, NewCost, Schedule, Tranche,
    TrancheTotals,
};
