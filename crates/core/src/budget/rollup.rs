//! Tranche rollup of itemized costs.

use std::collections::HashMap;

use aip_shared::types::round_money;
use rust_decimal::Decimal;

use super::error::BudgetError;
use super::types::{ItemizedCost, Tranche, TrancheTotals};

/// Largest line amount a cost line can carry: `9_999_999_999_999.99`,
/// the range of a `NUMERIC(15,2)` column.
pub const MAX_LINE_AMOUNT: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

/// Computes `round(quantity * unit_cost, 2)`.
///
/// # Errors
///
/// - `NegativeQuantity` or `NegativeUnitCost` for negative inputs.
/// - `AmountOverflow` if the product exceeds [`MAX_LINE_AMOUNT`].
pub fn line_amount(quantity: Decimal, unit_cost: Decimal) -> Result<Decimal, BudgetError> {
    if quantity < Decimal::ZERO {
        return Err(BudgetError::NegativeQuantity(quantity));
    }
    if unit_cost < Decimal::ZERO {
        return Err(BudgetError::NegativeUnitCost(unit_cost));
    }
    let amount = quantity
        .checked_mul(unit_cost)
        .map(round_money)
        .filter(|amount| *amount <= MAX_LINE_AMOUNT)
        .ok_or(BudgetError::AmountOverflow)?;
    Ok(amount)
}

/// Maps an account code to the tranche it rolls up into.
pub trait AccountClassifier {
    /// Returns the tranche of an account code, `None` if unmapped.
    fn tranche_of(&self, account_code: &str) -> Option<Tranche>;
}

/// Chart of accounts loaded as `code -> tranche`.
impl AccountClassifier for HashMap<String, Tranche> {
    fn tranche_of(&self, account_code: &str) -> Option<Tranche> {
        self.get(account_code).copied()
    }
}

impl<C: AccountClassifier + ?Sized> AccountClassifier for &C {
    fn tranche_of(&self, account_code: &str) -> Option<Tranche> {
        (**self).tranche_of(account_code)
    }
}

/// Classifies by UACS code prefix. See [`Tranche::from_uacs_code`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UacsClassifier;

impl AccountClassifier for UacsClassifier {
    fn tranche_of(&self, account_code: &str) -> Option<Tranche> {
        Tranche::from_uacs_code(account_code)
    }
}

/// Sums itemized costs into tranche totals.
pub struct RollupAggregator;

impl RollupAggregator {
    /// Recomputes every line amount and sums it into its account's tranche.
    ///
    /// Stored amounts are ignored, so a stale amount column cannot leak into
    /// the totals. The result depends only on the costs given.
    ///
    /// # Errors
    ///
    /// - `UnmappedAccount` if an account code maps to no tranche.
    /// - `NegativeQuantity` / `NegativeUnitCost` for negative inputs.
    /// - `AmountOverflow` if a line or a sum leaves the decimal range.
    pub fn aggregate<C: AccountClassifier + ?Sized>(
        costs: &[ItemizedCost],
        classifier: &C,
    ) -> Result<TrancheTotals, BudgetError> {
        let mut totals = TrancheTotals::default();
        for cost in costs {
            let tranche = classifier
                .tranche_of(&cost.account_code)
                .ok_or_else(|| BudgetError::UnmappedAccount(cost.account_code.clone()))?;
            totals.add(tranche, line_amount(cost.quantity, cost.unit_cost)?)?;
        }
        Ok(normalize(totals))
    }
}

/// Rescales every tranche to two decimal places.
fn normalize(totals: TrancheTotals) -> TrancheTotals {
    TrancheTotals {
        ps: round_money(totals.ps),
        mooe: round_money(totals.mooe),
        fe: round_money(totals.fe),
        co: round_money(totals.co),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aip_shared::types::{BudgetEntryId, ItemizedCostId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn cost(account: &str, quantity: Decimal, unit_cost: Decimal) -> ItemizedCost {
        ItemizedCost {
            id: ItemizedCostId::new(),
            entry_id: BudgetEntryId::new(),
            account_code: account.into(),
            description: "item".into(),
            quantity,
            unit_cost,
            amount: Decimal::ZERO,
            price_item_code: None,
        }
    }

    #[rstest]
    #[case(dec!(3), dec!(150.00), dec!(450.00))]
    #[case(dec!(1), dec!(2500.00), dec!(2500.00))]
    #[case(dec!(0.5), dec!(0.05), dec!(0.03))]
    #[case(dec!(2.5), dec!(0.01), dec!(0.03))]
    #[case(dec!(0), dec!(999.99), dec!(0.00))]
    fn test_line_amount(
        #[case] quantity: Decimal,
        #[case] unit_cost: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(line_amount(quantity, unit_cost).unwrap(), expected);
    }

    #[test]
    fn test_line_amount_overflow_is_an_error() {
        let huge = Decimal::from(1_000_000_000_000_000_i64);
        assert!(matches!(line_amount(huge, huge), Err(BudgetError::AmountOverflow)));
        assert!(matches!(
            line_amount(Decimal::MAX, dec!(2)),
            Err(BudgetError::AmountOverflow)
        ));
    }

    #[test]
    fn test_line_amount_upper_bound() {
        assert_eq!(line_amount(dec!(1), MAX_LINE_AMOUNT).unwrap(), dec!(9999999999999.99));
        assert!(matches!(
            line_amount(dec!(1), dec!(10000000000000.00)),
            Err(BudgetError::AmountOverflow)
        ));
    }

    #[test]
    fn test_line_amount_rejects_negatives() {
        assert!(matches!(line_amount(dec!(-1), dec!(5)), Err(BudgetError::NegativeQuantity(_))));
        assert!(matches!(line_amount(dec!(1), dec!(-5)), Err(BudgetError::NegativeUnitCost(_))));
    }

    #[test]
    fn test_office_supplies_and_training() {
        let costs = vec![
            cost("5-02-03-010", dec!(3), dec!(150.00)),
            cost("5-02-02-010", dec!(1), dec!(2500.00)),
        ];
        let totals = RollupAggregator::aggregate(&costs, &UacsClassifier).unwrap();

        assert_eq!(totals.mooe, dec!(2950.00));
        assert_eq!(totals.ps, dec!(0.00));
        assert_eq!(totals.fe, dec!(0.00));
        assert_eq!(totals.co, dec!(0.00));
        assert_eq!(totals.total(), dec!(2950.00));
    }

    #[test]
    fn test_stale_amount_is_ignored() {
        let mut line = cost("5-01-01-010", dec!(2), dec!(100));
        line.amount = dec!(999999);
        let totals = RollupAggregator::aggregate(&[line], &UacsClassifier).unwrap();
        assert_eq!(totals.ps, dec!(200.00));
    }

    #[test]
    fn test_unmapped_account_fails() {
        let chart = HashMap::from([("5-02-03-010".to_string(), Tranche::Mooe)]);
        let costs = vec![cost("5-02-03-010", dec!(1), dec!(1)), cost("9-99-99", dec!(1), dec!(1))];
        let err = RollupAggregator::aggregate(&costs, &chart).unwrap_err();
        assert!(matches!(err, BudgetError::UnmappedAccount(code) if code == "9-99-99"));
    }

    #[test]
    fn test_chart_overrides_prefix() {
        // A chart may place an account in a tranche its prefix would not suggest.
        let chart = HashMap::from([("5-02-99-990".to_string(), Tranche::Co)]);
        let totals = RollupAggregator::aggregate(&[cost("5-02-99-990", dec!(1), dec!(10))], &chart)
            .unwrap();
        assert_eq!(totals.co, dec!(10.00));
        assert_eq!(totals.mooe, dec!(0.00));
    }

    #[test]
    fn test_empty_is_zero() {
        let totals = RollupAggregator::aggregate(&[], &UacsClassifier).unwrap();
        assert_eq!(totals, TrancheTotals::default());
        assert_eq!(totals.total(), Decimal::ZERO);
    }
}
