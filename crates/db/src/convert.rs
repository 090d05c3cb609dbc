//! Conversions between entity models and engine types.

use std::collections::HashMap;

use aip_core::budget::{
    BudgetEntry, BudgetError, ClimateTags, ItemizedCost, Schedule, Tranche, TrancheTotals,
};
use aip_core::hierarchy::{HierarchyError, HierarchyNode, Office};
use aip_shared::types::{BudgetEntryId, ItemizedCostId, NodeId, OfficeId};

use crate::entities::{budget_entries, chart_of_accounts, hierarchy_nodes, itemized_costs, offices};

impl From<offices::Model> for Office {
    fn from(model: offices::Model) -> Self {
        Self {
            id: OfficeId::from_uuid(model.id),
            sector_code: model.sector_code,
            lgu_level_code: model.lgu_level_code,
            office_type_code: model.office_type_code,
            code: model.code,
            name: model.name,
            is_lee: model.is_lee,
        }
    }
}

impl TryFrom<hierarchy_nodes::Model> for HierarchyNode {
    type Error = HierarchyError;

    fn try_from(model: hierarchy_nodes::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NodeId::from_uuid(model.id),
            kind: model.kind.parse()?,
            title: model.title,
            description: model.description,
            code_suffix: model.code_suffix,
            parent_id: model.parent_id.map(NodeId::from_uuid),
            office_id: OfficeId::from_uuid(model.office_id),
            is_active: model.is_active,
        })
    }
}

/// Converts a listing of node rows, failing on the first unknown kind.
pub(crate) fn nodes_from_models(
    models: Vec<hierarchy_nodes::Model>,
) -> Result<Vec<HierarchyNode>, HierarchyError> {
    models.into_iter().map(HierarchyNode::try_from).collect()
}

impl TryFrom<budget_entries::Model> for BudgetEntry {
    type Error = BudgetError;

    fn try_from(model: budget_entries::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BudgetEntryId::from_uuid(model.id),
            node_id: NodeId::from_uuid(model.node_id),
            fiscal_year: model.fiscal_year,
            schedule: Schedule {
                start: model.start_date,
                end: model.end_date,
            },
            expected_output: model.expected_output,
            funding_source: model.funding_source,
            amounts: TrancheTotals {
                ps: model.ps_amount,
                mooe: model.mooe_amount,
                fe: model.fe_amount,
                co: model.co_amount,
            },
            climate: ClimateTags {
                adaptation: model.cc_adaptation,
                mitigation: model.cc_mitigation,
                typology_code: model.cc_typology_code,
            },
            status: model.status.parse()?,
        })
    }
}

/// Converts a listing of entry rows, failing on the first unknown status.
pub(crate) fn entries_from_models(
    models: Vec<budget_entries::Model>,
) -> Result<Vec<BudgetEntry>, BudgetError> {
    models.into_iter().map(BudgetEntry::try_from).collect()
}

impl From<itemized_costs::Model> for ItemizedCost {
    fn from(model: itemized_costs::Model) -> Self {
        Self {
            id: ItemizedCostId::from_uuid(model.id),
            entry_id: BudgetEntryId::from_uuid(model.budget_entry_id),
            account_code: model.account_code,
            description: model.description,
            quantity: model.quantity,
            unit_cost: model.unit_cost,
            amount: model.amount,
            price_item_code: model.price_item_code,
        }
    }
}

/// Builds the `code -> tranche` classifier from chart of accounts rows.
pub(crate) fn chart_from_models(
    models: Vec<chart_of_accounts::Model>,
) -> Result<HashMap<String, Tranche>, BudgetError> {
    models
        .into_iter()
        .map(|row| Ok((row.code, row.tranche.parse()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aip_core::budget::EntryStatus;
    use aip_core::hierarchy::NodeKind;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn node_model(kind: &str) -> hierarchy_nodes::Model {
        let now = Utc::now().fixed_offset();
        hierarchy_nodes::Model {
            id: Uuid::now_v7(),
            kind: kind.into(),
            title: "Solid Waste Management".into(),
            description: None,
            code_suffix: "003".into(),
            parent_id: Some(Uuid::now_v7()),
            office_id: Uuid::now_v7(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_node_model_converts() {
        let model = node_model("sub_activity");
        let parent = model.parent_id;
        let node = HierarchyNode::try_from(model).unwrap();
        assert_eq!(node.kind, NodeKind::SubActivity);
        assert_eq!(node.parent_id.map(NodeId::into_inner), parent);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = HierarchyNode::try_from(node_model("portfolio")).unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidNodeKind(_)));
    }

    #[test]
    fn test_entry_model_converts() {
        let now = Utc::now().fixed_offset();
        let model = budget_entries::Model {
            id: Uuid::now_v7(),
            node_id: Uuid::now_v7(),
            fiscal_year: 2027,
            start_date: NaiveDate::from_ymd_opt(2027, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2027, 12, 31),
            expected_output: Some("2 km concrete road".into()),
            funding_source: Some("20% Development Fund".into()),
            ps_amount: dec!(0.00),
            mooe_amount: dec!(2950.00),
            fe_amount: dec!(0.00),
            co_amount: dec!(1500000.00),
            cc_adaptation: dec!(500000.00),
            cc_mitigation: dec!(0.00),
            cc_typology_code: Some("A2-01".into()),
            status: "submitted".into(),
            created_at: now,
            updated_at: now,
        };
        let entry = BudgetEntry::try_from(model).unwrap();
        assert_eq!(entry.status, EntryStatus::Submitted);
        assert_eq!(entry.total(), dec!(1502950.00));
        assert_eq!(entry.climate.typology_code.as_deref(), Some("A2-01"));
    }

    #[test]
    fn test_chart_rows_build_classifier() {
        let rows = vec![
            chart_of_accounts::Model {
                code: "5-02-03-010".into(),
                title: "Office Supplies Expenses".into(),
                tranche: "mooe".into(),
            },
            chart_of_accounts::Model {
                code: "1-07-05-030".into(),
                title: "Information and Communications Technology Equipment".into(),
                tranche: "co".into(),
            },
        ];
        let chart = chart_from_models(rows).unwrap();
        assert_eq!(chart.get("5-02-03-010"), Some(&Tranche::Mooe));
        assert_eq!(chart.get("1-07-05-030"), Some(&Tranche::Co));
    }
}
