//! Budget error types.

use aip_shared::AppError;
use aip_shared::types::{BudgetEntryId, ItemizedCostId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Budget entry, itemized cost and rollup errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    // ========== Lookup Errors ==========
    /// Budget entry not found.
    #[error("Budget entry not found: {0}")]
    EntryNotFound(BudgetEntryId),

    /// Itemized cost not found.
    #[error("Itemized cost not found: {0}")]
    CostNotFound(ItemizedCostId),

    // ========== Input Errors ==========
    /// The account code maps to no tranche.
    #[error("Account code {0} is not mapped to PS, MOOE, FE or CO")]
    UnmappedAccount(String),

    /// Quantity cannot be negative.
    #[error("Quantity cannot be negative: {0}")]
    NegativeQuantity(Decimal),

    /// Unit cost cannot be negative.
    #[error("Unit cost cannot be negative: {0}")]
    NegativeUnitCost(Decimal),

    /// Amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// A line amount or a tranche sum is outside the representable range.
    #[error("Amount exceeds the supported range")]
    AmountOverflow,

    /// No explicit unit cost and no price list entry to take one from.
    #[error("No unit cost given and no price list price for {0}")]
    UnitCostUnavailable(String),

    /// Completion date precedes start date.
    #[error("Schedule ends on {end} before it starts on {start}")]
    InvalidSchedule {
        /// Start date.
        start: NaiveDate,
        /// Completion date.
        end: NaiveDate,
    },

    /// Unknown tranche string.
    #[error("Unknown tranche: {0}")]
    InvalidTranche(String),

    /// Unknown status string.
    #[error("Unknown entry status: {0}")]
    InvalidStatus(String),

    // ========== Rollup Errors ==========
    /// Manual tranche amounts were given for an entry that has itemized costs.
    #[error("Entry {0} has itemized costs; its amounts are computed")]
    ItemizedModeActive(BudgetEntryId),

    /// Writing recomputed totals back failed. The triggering write must roll back.
    #[error("Rollup write-back failed for entry {entry_id}: {reason}")]
    RollupPersistence {
        /// Entry whose totals could not be written.
        entry_id: BudgetEntryId,
        /// Underlying failure.
        reason: String,
    },

    // ========== Storage Errors ==========
    /// The storage collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BudgetError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::CostNotFound(_) => "COST_NOT_FOUND",
            Self::UnmappedAccount(_) => "UNMAPPED_ACCOUNT",
            Self::NegativeQuantity(_) => "NEGATIVE_QUANTITY",
            Self::NegativeUnitCost(_) => "NEGATIVE_UNIT_COST",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::UnitCostUnavailable(_) => "UNIT_COST_UNAVAILABLE",
            Self::InvalidSchedule { .. } => "INVALID_SCHEDULE",
            Self::InvalidTranche(_) => "INVALID_TRANCHE",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::ItemizedModeActive(_) => "ITEMIZED_MODE_ACTIVE",
            Self::RollupPersistence { .. } => "ROLLUP_PERSISTENCE",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if the error should be raised as an incident.
    #[must_use]
    pub const fn is_incident(&self) -> bool {
        matches!(self, Self::RollupPersistence { .. } | Self::Storage(_))
    }
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        let message = err.to_string();
        match err {
            BudgetError::EntryNotFound(_) | BudgetError::CostNotFound(_) => Self::NotFound(message),
            BudgetError::UnmappedAccount(_)
            | BudgetError::NegativeQuantity(_)
            | BudgetError::NegativeUnitCost(_)
            | BudgetError::NegativeAmount
            | BudgetError::AmountOverflow
            | BudgetError::UnitCostUnavailable(_)
            | BudgetError::InvalidSchedule { .. }
            | BudgetError::InvalidTranche(_)
            | BudgetError::InvalidStatus(_) => Self::Validation(message),
            BudgetError::ItemizedModeActive(_) => Self::BusinessRule(message),
            BudgetError::RollupPersistence { .. } => Self::DataIntegrity(message),
            BudgetError::Storage(_) => Self::Database(message),
        }
    }
}
