//! Price list lookup for itemized costs.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::error::BudgetError;
use super::rollup::{AccountClassifier, line_amount};
use super::types::{NewCost, Tranche};

/// Read-only catalog of standard unit prices.
pub trait PriceCatalog {
    /// Unit price of a price list item, `None` if unknown.
    fn unit_price(&self, item_code: &str) -> Option<Decimal>;
}

impl PriceCatalog for HashMap<String, Decimal> {
    fn unit_price(&self, item_code: &str) -> Option<Decimal> {
        self.get(item_code).copied()
    }
}

impl<P: PriceCatalog + ?Sized> PriceCatalog for &P {
    fn unit_price(&self, item_code: &str) -> Option<Decimal> {
        (**self).unit_price(item_code)
    }
}

/// An itemized cost input with its unit cost, amount and tranche resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCost {
    /// Chart of accounts code.
    pub account_code: String,
    /// Tranche the account rolls up into.
    pub tranche: Tranche,
    /// Item description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Resolved unit cost.
    pub unit_cost: Decimal,
    /// `round(quantity * unit_cost, 2)`.
    pub amount: Decimal,
    /// Price list item.
    pub price_item_code: Option<String>,
}

/// Picks the unit cost of a new line: explicit value first, then the price list.
///
/// # Errors
///
/// Returns `UnitCostUnavailable` when neither is available.
pub fn resolve_unit_cost<P: PriceCatalog + ?Sized>(
    cost: &NewCost,
    catalog: &P,
) -> Result<Decimal, BudgetError> {
    if let Some(unit_cost) = cost.unit_cost {
        return Ok(unit_cost);
    }
    let item = cost
        .price_item_code
        .as_deref()
        .ok_or_else(|| BudgetError::UnitCostUnavailable(cost.description.clone()))?;
    catalog
        .unit_price(item)
        .ok_or_else(|| BudgetError::UnitCostUnavailable(item.to_string()))
}

/// Validates a new line and computes its amount.
///
/// # Errors
///
/// - `UnmappedAccount` if the account maps to no tranche.
/// - `UnitCostUnavailable` if no unit cost can be resolved.
/// - `NegativeQuantity` / `NegativeUnitCost` for negative inputs.
/// - `AmountOverflow` if the line amount is out of range.
pub fn price_cost<P, C>(
    cost: NewCost,
    catalog: &P,
    classifier: &C,
) -> Result<PricedCost, BudgetError>
where
    P: PriceCatalog + ?Sized,
    C: AccountClassifier + ?Sized,
{
    let account_code = cost.account_code.trim().to_string();
    let tranche = classifier
        .tranche_of(&account_code)
        .ok_or_else(|| BudgetError::UnmappedAccount(account_code.clone()))?;
    let unit_cost = resolve_unit_cost(&cost, catalog)?;
    let amount = line_amount(cost.quantity, unit_cost)?;

    Ok(PricedCost {
        account_code,
        tranche,
        description: cost.description.trim().to_string(),
        quantity: cost.quantity,
        unit_cost,
        amount,
        price_item_code: cost.price_item_code,
    })
}
