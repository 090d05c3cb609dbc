//! Budget entry and itemized cost types.

use std::fmt;
use std::str::FromStr;

use aip_shared::types::{BudgetEntryId, ItemizedCostId, NodeId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::error::BudgetError;

/// Expense class an account code rolls up into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tranche {
    /// Personal Services.
    Ps,
    /// Maintenance and Other Operating Expenses.
    Mooe,
    /// Financial Expenses.
    Fe,
    /// Capital Outlay.
    Co,
}

impl Tranche {
    /// All tranches in display order.
    pub const ALL: [Self; 4] = [Self::Ps, Self::Mooe, Self::Fe, Self::Co];

    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ps => "ps",
            Self::Mooe => "mooe",
            Self::Fe => "fe",
            Self::Co => "co",
        }
    }

    /// Classifies a UACS object code by its prefix.
    ///
    /// Expense codes `5-01` are PS, `5-02` MOOE, `5-03` FE. Asset codes
    /// `1-0x` are capital outlay. Separators are ignored, so `50203010`
    /// and `5-02-03-010` classify the same.
    #[must_use]
    pub fn from_uacs_code(code: &str) -> Option<Self> {
        let digits: Vec<u8> = code.bytes().filter(u8::is_ascii_digit).collect();
        match digits.as_slice() {
            [b'5', b'0', b'1', ..] => Some(Self::Ps),
            [b'5', b'0', b'2', ..] => Some(Self::Mooe),
            [b'5', b'0', b'3', ..] => Some(Self::Fe),
            [b'1', b'0', _, ..] => Some(Self::Co),
            _ => None,
        }
    }
}

impl fmt::Display for Tranche {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for Tranche {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ps" => Ok(Self::Ps),
            "mooe" => Ok(Self::Mooe),
            "fe" => Ok(Self::Fe),
            "co" => Ok(Self::Co),
            other => Err(BudgetError::InvalidTranche(other.to_string())),
        }
    }
}

/// Per-tranche amounts of an entry.
///
/// The grand total is derived, never stored. It is still emitted when
/// serialized so that views can print it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TrancheTotals {
    /// Personal Services.
    pub ps: Decimal,
    /// Maintenance and Other Operating Expenses.
    pub mooe: Decimal,
    /// Financial Expenses.
    pub fe: Decimal,
    /// Capital Outlay.
    pub co: Decimal,
}

impl TrancheTotals {
    /// Sum of the four tranches.
    ///
    /// Totals built with [`add`](Self::add) always have a representable sum.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.ps + self.mooe + self.fe + self.co
    }

    /// Sum of the four tranches, `None` on overflow.
    #[must_use]
    pub fn checked_total(&self) -> Option<Decimal> {
        self.ps
            .checked_add(self.mooe)?
            .checked_add(self.fe)?
            .checked_add(self.co)
    }

    /// Amount of one tranche.
    #[must_use]
    pub const fn get(&self, tranche: Tranche) -> Decimal {
        match tranche {
            Tranche::Ps => self.ps,
            Tranche::Mooe => self.mooe,
            Tranche::Fe => self.fe,
            Tranche::Co => self.co,
        }
    }

    /// Adds an amount to one tranche.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow`, leaving `self` unchanged, if the tranche or
    /// the grand total would leave the decimal range.
    pub fn add(&mut self, tranche: Tranche, amount: Decimal) -> Result<(), BudgetError> {
        let mut next = *self;
        let slot = match tranche {
            Tranche::Ps => &mut next.ps,
            Tranche::Mooe => &mut next.mooe,
            Tranche::Fe => &mut next.fe,
            Tranche::Co => &mut next.co,
        };
        *slot = slot.checked_add(amount).ok_or(BudgetError::AmountOverflow)?;
        next.checked_total().ok_or(BudgetError::AmountOverflow)?;
        *self = next;
        Ok(())
    }

    /// Adds every tranche of `other`.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if any sum leaves the decimal range.
    pub fn merge(&mut self, other: &Self) -> Result<(), BudgetError> {
        for tranche in Tranche::ALL {
            self.add(tranche, other.get(tranche))?;
        }
        Ok(())
    }

    /// Returns true if any tranche is negative.
    #[must_use]
    pub fn has_negative(&self) -> bool {
        Tranche::ALL
            .iter()
            .any(|t| self.get(*t) < Decimal::ZERO)
    }
}

impl Serialize for TrancheTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TrancheTotals", 5)?;
        state.serialize_field("ps", &self.ps)?;
        state.serialize_field("mooe", &self.mooe)?;
        state.serialize_field("fe", &self.fe)?;
        state.serialize_field("co", &self.co)?;
        state.serialize_field("total", &self.total())?;
        state.end()
    }
}

/// Implementation window of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Start date.
    pub start: Option<NaiveDate>,
    /// Completion date.
    pub end: Option<NaiveDate>,
}

impl Schedule {
    /// Rejects a completion date before the start date.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchedule` if `end < start`.
    pub fn validate(&self) -> Result<(), BudgetError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end < start => {
                Err(BudgetError::InvalidSchedule { start, end })
            }
            _ => Ok(()),
        }
    }
}

/// Climate Change Expenditure Tagging of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimateTags {
    /// Climate change adaptation amount.
    pub adaptation: Decimal,
    /// Climate change mitigation amount.
    pub mitigation: Decimal,
    /// CCET typology code.
    pub typology_code: Option<String>,
}

/// Workflow label of an entry. Transitions are not enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Being prepared.
    #[default]
    Draft,
    /// Sent for review.
    Submitted,
    /// Approved by the council.
    Approved,
}

impl EntryStatus {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
        }
    }
}

impl FromStr for EntryStatus {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            other => Err(BudgetError::InvalidStatus(other.to_string())),
        }
    }
}

/// A hierarchy node's budget for one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetEntry {
    /// Entry ID.
    pub id: BudgetEntryId,
    /// Budgeted node.
    pub node_id: NodeId,
    /// Fiscal year, e.g. 2027.
    pub fiscal_year: i32,
    /// Implementation window.
    pub schedule: Schedule,
    /// Expected output.
    pub expected_output: Option<String>,
    /// Funding source.
    pub funding_source: Option<String>,
    /// Tranche amounts. Derived from itemized costs when there are any.
    pub amounts: TrancheTotals,
    /// Climate tagging.
    pub climate: ClimateTags,
    /// Workflow label.
    pub status: EntryStatus,
}

impl BudgetEntry {
    /// Creates an empty draft entry for a node and year.
    #[must_use]
    pub fn new(node_id: NodeId, fiscal_year: i32) -> Self {
        Self {
            id: BudgetEntryId::new(),
            node_id,
            fiscal_year,
            schedule: Schedule::default(),
            expected_output: None,
            funding_source: None,
            amounts: TrancheTotals::default(),
            climate: ClimateTags::default(),
            status: EntryStatus::Draft,
        }
    }

    /// Grand total of the entry.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.amounts.total()
    }
}

/// Descriptive fields of an entry that can be edited directly.
#[derive(Debug, Clone, Default)]
pub struct EntryDetails {
    /// Implementation window.
    pub schedule: Schedule,
    /// Expected output.
    pub expected_output: Option<String>,
    /// Funding source.
    pub funding_source: Option<String>,
    /// Climate tagging.
    pub climate: ClimateTags,
    /// Workflow label.
    pub status: EntryStatus,
}

impl EntryDetails {
    /// Validates the schedule and the climate amounts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchedule` or `NegativeAmount`.
    pub fn validate(&self) -> Result<(), BudgetError> {
        self.schedule.validate()?;
        if self.climate.adaptation < Decimal::ZERO || self.climate.mitigation < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount);
        }
        Ok(())
    }
}

/// A line item of an entry's procurement plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemizedCost {
    /// Cost ID.
    pub id: ItemizedCostId,
    /// Owning entry.
    pub entry_id: BudgetEntryId,
    /// Chart of accounts code.
    pub account_code: String,
    /// Item description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit cost.
    pub unit_cost: Decimal,
    /// `round(quantity * unit_cost, 2)`, recomputed on every write.
    pub amount: Decimal,
    /// Price list item the unit cost was taken from.
    pub price_item_code: Option<String>,
}

/// Input for creating or replacing an itemized cost.
#[derive(Debug, Clone)]
pub struct NewCost {
    /// Chart of accounts code.
    pub account_code: String,
    /// Item description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Explicit unit cost. Falls back to the price list when absent.
    pub unit_cost: Option<Decimal>,
    /// Price list item.
    pub price_item_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("5-01-01-010", Some(Tranche::Ps))]
    #[case("5-02-03-010", Some(Tranche::Mooe))]
    #[case("50203010", Some(Tranche::Mooe))]
    #[case("5-03-01-040", Some(Tranche::Fe))]
    #[case("1-06-04-010", Some(Tranche::Co))]
    #[case("1-07-05-030", Some(Tranche::Co))]
    #[case("4-01-01-010", None)]
    #[case("2-01", None)]
    #[case("", None)]
    fn test_from_uacs_code(#[case] code: &str, #[case] expected: Option<Tranche>) {
        assert_eq!(Tranche::from_uacs_code(code), expected);
    }

    #[rstest]
    #[case("PS", Tranche::Ps)]
    #[case("mooe", Tranche::Mooe)]
    #[case(" Fe ", Tranche::Fe)]
    #[case("co", Tranche::Co)]
    fn test_tranche_from_str(#[case] input: &str, #[case] expected: Tranche) {
        assert_eq!(input.parse::<Tranche>().unwrap(), expected);
        assert_eq!(expected.as_str().parse::<Tranche>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_tranche() {
        assert!(matches!("capex".parse::<Tranche>(), Err(BudgetError::InvalidTranche(_))));
    }

    #[test]
    fn test_totals_add_and_total() {
        let mut totals = TrancheTotals::default();
        totals.add(Tranche::Mooe, dec!(450.00)).unwrap();
        totals.add(Tranche::Mooe, dec!(2500.00)).unwrap();
        totals.add(Tranche::Co, dec!(10000.00)).unwrap();

        assert_eq!(totals.mooe, dec!(2950.00));
        assert_eq!(totals.get(Tranche::Co), dec!(10000.00));
        assert_eq!(totals.total(), dec!(12950.00));
        assert!(!totals.has_negative());
    }

    #[test]
    fn test_totals_add_overflow_leaves_totals_unchanged() {
        let mut totals = TrancheTotals {
            mooe: Decimal::MAX,
            ..TrancheTotals::default()
        };
        let err = totals.add(Tranche::Mooe, dec!(1)).unwrap_err();
        assert!(matches!(err, BudgetError::AmountOverflow));
        assert_eq!(totals.mooe, Decimal::MAX);

        // Each tranche fits, but the grand total would not.
        let err = totals.add(Tranche::Ps, dec!(1)).unwrap_err();
        assert!(matches!(err, BudgetError::AmountOverflow));
        assert_eq!(totals.ps, Decimal::ZERO);
    }

    #[test]
    fn test_totals_serialize_with_total() {
        let totals = TrancheTotals {
            ps: dec!(1.00),
            mooe: dec!(2.00),
            fe: dec!(0),
            co: dec!(3.50),
        };
        let json = serde_json::to_value(totals).unwrap();
        assert_eq!(json["total"], serde_json::json!("6.50"));
        assert_eq!(json["mooe"], serde_json::json!("2.00"));
    }

    #[test]
    fn test_schedule_end_before_start() {
        let schedule = Schedule {
            start: NaiveDate::from_ymd_opt(2027, 6, 1),
            end: NaiveDate::from_ymd_opt(2027, 1, 31),
        };
        assert!(matches!(schedule.validate(), Err(BudgetError::InvalidSchedule { .. })));
        assert!(Schedule::default().validate().is_ok());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [EntryStatus::Draft, EntryStatus::Submitted, EntryStatus::Approved] {
            assert_eq!(status.as_str().parse::<EntryStatus>().unwrap(), status);
        }
        assert!("archived".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn test_new_entry_is_empty_draft() {
        let entry = BudgetEntry::new(NodeId::new(), 2027);
        assert_eq!(entry.status, EntryStatus::Draft);
        assert_eq!(entry.total(), Decimal::ZERO);
    }
}
