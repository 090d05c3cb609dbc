//! Database seeder for AIP planner development.
//!
//! Seeds the chart of accounts, a small price list, a demo office with a
//! Program/Project/Activity hierarchy, imports part of it into a fiscal year
//! and adds itemized costs, then logs the resulting AIP tree.
//!
//! Usage: cargo run --bin seeder [-- --json]
//!
//! Run the migrator first. Seeding twice reuses the demo office and only
//! logs its tree.

use aip_core::aip::{AipRow, subtree_totals};
use aip_core::budget::{
    ClimateTags, EntryDetails, EntryStatus, NewCost, Schedule, Tranche, TrancheTotals,
};
use aip_core::hierarchy::{NewNode, NodeKind, PreparedNode};
use aip_core::tree::TreeNode;
use aip_db::entities::{chart_of_accounts, price_list_items};
use aip_db::repositories::CreateOfficeInput;
use aip_db::{BudgetEntryRepository, HierarchyRepository, ItemizedCostRepository, OfficeRepository};
use aip_shared::AppConfig;
use aip_shared::config::LoggingConfig;
use aip_shared::types::{NodeId, OfficeId};
use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEMO_FISCAL_YEAR: i32 = 2027;

/// Demo office code segments: sector, LGU level, office type, office.
const DEMO_OFFICE: (&str, &str, &str, &str) = ("01", "1", "02", "005");

const ACCOUNTS: &[(&str, &str)] = &[
    ("5-01-01-010", "Salaries and Wages - Regular"),
    ("5-01-02-010", "Personal Economic Relief Allowance"),
    ("5-02-01-010", "Traveling Expenses - Local"),
    ("5-02-02-010", "Training Expenses"),
    ("5-02-03-010", "Office Supplies Expenses"),
    ("5-02-03-090", "Fuel, Oil and Lubricants Expenses"),
    ("5-03-01-040", "Bank Charges"),
    ("1-07-05-030", "Information and Communication Technology Equipment"),
    ("1-07-06-010", "Motor Vehicles"),
];

const PRICE_LIST: &[(&str, &str, &str, Decimal)] = &[
    ("PL-BOND-A4", "Bond paper, A4, 70gsm", "ream", dec!(150.00)),
    ("PL-INK-BLK", "Printer ink, black", "bottle", dec!(385.50)),
    ("PL-LAPTOP", "Laptop computer, mid-range", "unit", dec!(48500.00)),
    ("PL-DIESEL", "Diesel fuel", "liter", dec!(62.75)),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let db = aip_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;

    seed_chart_of_accounts(&db).await?;
    seed_price_list(&db).await?;

    let offices = OfficeRepository::new(db.clone());
    let hierarchy = HierarchyRepository::new(db.clone(), config.engine);
    let entries = BudgetEntryRepository::new(db.clone());

    match find_demo_office(&offices).await? {
        Some(office_id) => {
            tracing::info!(%office_id, "demo office already seeded, skipping hierarchy");
        }
        None => {
            let office_id = create_demo_office(&offices).await?;
            let plan = seed_hierarchy(&hierarchy, office_id).await?;
            seed_fiscal_year(&db, &entries, &plan).await?;
        }
    }

    let aip = entries
        .fiscal_year_tree(DEMO_FISCAL_YEAR, None)
        .await
        .context("failed to load fiscal year tree")?;
    if std::env::args().any(|arg| arg == "--json") {
        println!("{}", serde_json::to_string_pretty(&aip.tree)?);
    } else {
        for root in &aip.tree {
            log_tree(root, 0)?;
        }
    }
    if !aip.is_clean() {
        tracing::warn!(orphans = aip.orphan_count(), "fiscal year tree is not clean");
    }

    tracing::info!(fiscal_year = DEMO_FISCAL_YEAR, rows = aip.tree_count(), "seeding complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn seed_chart_of_accounts(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (code, title) in ACCOUNTS {
        let Some(tranche) = Tranche::from_uacs_code(code) else {
            tracing::warn!(code, "account code does not classify into a tranche, skipping");
            continue;
        };
        chart_of_accounts::Entity::insert(chart_of_accounts::ActiveModel {
            code: Set((*code).to_string()),
            title: Set((*title).to_string()),
            tranche: Set(tranche.as_str().to_string()),
        })
        .on_conflict(OnConflict::column(chart_of_accounts::Column::Code).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    }
    tracing::info!(accounts = ACCOUNTS.len(), "seeded chart of accounts");
    Ok(())
}

async fn seed_price_list(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (code, description, unit, unit_price) in PRICE_LIST {
        price_list_items::Entity::insert(price_list_items::ActiveModel {
            code: Set((*code).to_string()),
            description: Set((*description).to_string()),
            unit: Set((*unit).to_string()),
            unit_price: Set(*unit_price),
        })
        .on_conflict(
            OnConflict::column(price_list_items::Column::Code)
                .update_columns([
                    price_list_items::Column::Description,
                    price_list_items::Column::Unit,
                    price_list_items::Column::UnitPrice,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    }
    tracing::info!(items = PRICE_LIST.len(), "seeded price list");
    Ok(())
}

async fn find_demo_office(offices: &OfficeRepository) -> anyhow::Result<Option<OfficeId>> {
    let (sector, lgu_level, office_type, code) = DEMO_OFFICE;
    let wanted = format!("{sector}-{lgu_level}-{office_type}-{code}");
    for office in offices.list().await? {
        if office.full_code()? == wanted {
            return Ok(Some(office.id));
        }
    }
    Ok(None)
}

async fn create_demo_office(offices: &OfficeRepository) -> anyhow::Result<OfficeId> {
    let (sector, lgu_level, office_type, code) = DEMO_OFFICE;
    let office = offices
        .create(CreateOfficeInput {
            sector_code: sector.to_string(),
            lgu_level_code: lgu_level.to_string(),
            office_type_code: office_type.to_string(),
            code: code.to_string(),
            name: "Municipal Planning and Development Office".to_string(),
            is_lee: false,
        })
        .await?;
    Ok(office.id)
}

/// Nodes the fiscal-year step needs to reference.
struct DemoPlan {
    training: NodeId,
    supplies: NodeId,
    equipment: NodeId,
    staffing: NodeId,
}

async fn create(
    hierarchy: &HierarchyRepository,
    kind: NodeKind,
    title: &str,
    parent_id: Option<NodeId>,
    office_id: Option<OfficeId>,
) -> anyhow::Result<PreparedNode> {
    let node = hierarchy
        .create_node(NewNode {
            kind,
            title: title.to_string(),
            description: None,
            parent_id,
            office_id,
        })
        .await?;
    Ok(node)
}

async fn seed_hierarchy(
    hierarchy: &HierarchyRepository,
    office_id: OfficeId,
) -> anyhow::Result<DemoPlan> {
    let governance = create(
        hierarchy,
        NodeKind::Program,
        "Good Governance Program",
        None,
        Some(office_id),
    )
    .await?;
    create(
        hierarchy,
        NodeKind::Program,
        "Disaster Risk Reduction Program",
        None,
        Some(office_id),
    )
    .await?;

    let capacity = create(
        hierarchy,
        NodeKind::Project,
        "Capacity Development Project",
        Some(governance.id),
        None,
    )
    .await?;
    let ict = create(
        hierarchy,
        NodeKind::Project,
        "ICT Modernization Project",
        Some(governance.id),
        None,
    )
    .await?;

    let training = create(
        hierarchy,
        NodeKind::Activity,
        "Barangay Development Planning Training",
        Some(capacity.id),
        None,
    )
    .await?;
    let supplies = create(
        hierarchy,
        NodeKind::SubActivity,
        "Training Materials",
        Some(training.id),
        None,
    )
    .await?;
    let staffing = create(
        hierarchy,
        NodeKind::Activity,
        "Planning Staff Support",
        Some(capacity.id),
        None,
    )
    .await?;
    let equipment = create(
        hierarchy,
        NodeKind::Activity,
        "Office Equipment Upgrade",
        Some(ict.id),
        None,
    )
    .await?;

    tracing::info!(%office_id, "seeded demo hierarchy");
    Ok(DemoPlan {
        training: training.id,
        supplies: supplies.id,
        equipment: equipment.id,
        staffing: staffing.id,
    })
}

fn line(
    account_code: &str,
    description: &str,
    quantity: Decimal,
    unit_cost: Option<Decimal>,
    item: Option<&str>,
) -> NewCost {
    NewCost {
        account_code: account_code.to_string(),
        description: description.to_string(),
        quantity,
        unit_cost,
        price_item_code: item.map(str::to_string),
    }
}

async fn seed_fiscal_year(
    db: &DatabaseConnection,
    entries: &BudgetEntryRepository,
    plan: &DemoPlan,
) -> anyhow::Result<()> {
    // Ancestors come along with the selection.
    let imported = entries
        .import_nodes(DEMO_FISCAL_YEAR, &[plan.supplies, plan.equipment, plan.staffing])
        .await?;
    let entry_for = |node_id: NodeId| {
        imported
            .iter()
            .find(|e| e.node_id == node_id)
            .map(|e| e.id)
            .with_context(|| format!("node {node_id} was not imported"))
    };

    let costs = ItemizedCostRepository::new(db.clone());

    let training = entry_for(plan.training)?;
    costs
        .create(
            training,
            line("5-02-02-010", "Venue and meals", dec!(30), Some(dec!(450.00)), None),
        )
        .await?;
    costs
        .create(
            training,
            line("5-02-01-010", "Resource speaker travel", dec!(2), Some(dec!(3500.00)), None),
        )
        .await?;

    let supplies = entry_for(plan.supplies)?;
    costs
        .create(supplies, line("5-02-03-010", "Bond paper", dec!(3), Some(dec!(150.00)), None))
        .await?;
    costs
        .create(supplies, line("5-02-03-010", "Printer ink", dec!(4), None, Some("PL-INK-BLK")))
        .await?;

    let equipment = entry_for(plan.equipment)?;
    costs
        .create(
            equipment,
            line("1-07-05-030", "Laptop computers", dec!(5), None, Some("PL-LAPTOP")),
        )
        .await?;

    // Manual amounts on an entry without itemized lines.
    let staffing = entry_for(plan.staffing)?;
    entries
        .set_manual_amounts(
            staffing,
            TrancheTotals {
                ps: dec!(360000.00),
                ..Default::default()
            },
        )
        .await?;
    entries
        .update_details(
            staffing,
            EntryDetails {
                schedule: Schedule {
                    start: NaiveDate::from_ymd_opt(DEMO_FISCAL_YEAR, 1, 1),
                    end: NaiveDate::from_ymd_opt(DEMO_FISCAL_YEAR, 12, 31),
                },
                expected_output: Some("Two planning officers deployed".to_string()),
                funding_source: Some("General Fund".to_string()),
                climate: ClimateTags::default(),
                status: EntryStatus::Submitted,
            },
        )
        .await?;

    tracing::info!(fiscal_year = DEMO_FISCAL_YEAR, entries = imported.len(), "seeded fiscal year");
    Ok(())
}

fn log_tree(node: &TreeNode<AipRow>, depth: usize) -> anyhow::Result<()> {
    let totals = subtree_totals(node)?;
    tracing::info!(
        "{:indent$}{} {} [PS {} | MOOE {} | FE {} | CO {} | total {}]",
        "",
        node.item.full_code,
        node.item.node.title,
        totals.ps,
        totals.mooe,
        totals.fe,
        totals.co,
        totals.total(),
        indent = depth * 2,
    );
    for child in &node.children {
        log_tree(child, depth + 1)?;
    }
    Ok(())
}
