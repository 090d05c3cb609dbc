//! Initial database migration.
//!
//! Creates the office, hierarchy, chart of accounts, price list, budget entry
//! and itemized cost tables with the uniqueness rules the code allocator
//! relies on.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: OFFICES & HIERARCHY
        // ============================================================
        db.execute_unprepared(OFFICES_SQL).await?;
        db.execute_unprepared(HIERARCHY_NODES_SQL).await?;

        // ============================================================
        // PART 2: REFERENCE DATA
        // ============================================================
        db.execute_unprepared(CHART_OF_ACCOUNTS_SQL).await?;
        db.execute_unprepared(PRICE_LIST_ITEMS_SQL).await?;

        // ============================================================
        // PART 3: FISCAL YEAR AIP
        // ============================================================
        db.execute_unprepared(BUDGET_ENTRIES_SQL).await?;
        db.execute_unprepared(ITEMIZED_COSTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const OFFICES_SQL: &str = r"
CREATE TABLE offices (
    id                UUID PRIMARY KEY,
    sector_code       VARCHAR(2) NOT NULL,
    lgu_level_code    VARCHAR(1) NOT NULL,
    office_type_code  VARCHAR(2) NOT NULL,
    code              VARCHAR(3) NOT NULL,
    name              VARCHAR(255) NOT NULL,
    is_lee            BOOLEAN NOT NULL DEFAULT FALSE,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_offices_code UNIQUE (sector_code, lgu_level_code, office_type_code, code)
);
";

const HIERARCHY_NODES_SQL: &str = r"
CREATE TABLE hierarchy_nodes (
    id           UUID PRIMARY KEY,
    kind         VARCHAR(20) NOT NULL,
    title        TEXT NOT NULL,
    description  TEXT,
    code_suffix  VARCHAR(3) NOT NULL,
    parent_id    UUID REFERENCES hierarchy_nodes(id) ON DELETE RESTRICT,
    office_id    UUID NOT NULL REFERENCES offices(id) ON DELETE RESTRICT,
    is_active    BOOLEAN NOT NULL DEFAULT TRUE,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_hierarchy_nodes_kind
        CHECK (kind IN ('program', 'project', 'activity', 'sub_activity')),
    CONSTRAINT chk_hierarchy_nodes_root_is_program
        CHECK (parent_id IS NOT NULL OR kind = 'program'),
    CONSTRAINT uq_hierarchy_nodes_sibling_suffix UNIQUE (parent_id, code_suffix)
);

-- NULL parents never collide in the constraint above, so roots get their own index.
CREATE UNIQUE INDEX uq_hierarchy_nodes_root_suffix
    ON hierarchy_nodes (office_id, code_suffix)
    WHERE parent_id IS NULL;

CREATE INDEX idx_hierarchy_nodes_parent ON hierarchy_nodes (parent_id);
CREATE INDEX idx_hierarchy_nodes_office ON hierarchy_nodes (office_id);
";

const CHART_OF_ACCOUNTS_SQL: &str = r"
CREATE TABLE chart_of_accounts (
    code     VARCHAR(20) PRIMARY KEY,
    title    VARCHAR(255) NOT NULL,
    tranche  VARCHAR(4) NOT NULL,

    CONSTRAINT chk_chart_of_accounts_tranche CHECK (tranche IN ('ps', 'mooe', 'fe', 'co'))
);
";

const PRICE_LIST_ITEMS_SQL: &str = r"
CREATE TABLE price_list_items (
    code         VARCHAR(50) PRIMARY KEY,
    description  VARCHAR(255) NOT NULL,
    unit         VARCHAR(30) NOT NULL,
    unit_price   NUMERIC(15, 2) NOT NULL,

    CONSTRAINT chk_price_list_items_price CHECK (unit_price >= 0)
);
";

const BUDGET_ENTRIES_SQL: &str = r"
CREATE TABLE budget_entries (
    id                UUID PRIMARY KEY,
    node_id           UUID NOT NULL REFERENCES hierarchy_nodes(id) ON DELETE RESTRICT,
    fiscal_year       INTEGER NOT NULL,
    start_date        DATE,
    end_date          DATE,
    expected_output   TEXT,
    funding_source    VARCHAR(255),
    ps_amount         NUMERIC(15, 2) NOT NULL DEFAULT 0,
    mooe_amount       NUMERIC(15, 2) NOT NULL DEFAULT 0,
    fe_amount         NUMERIC(15, 2) NOT NULL DEFAULT 0,
    co_amount         NUMERIC(15, 2) NOT NULL DEFAULT 0,
    cc_adaptation     NUMERIC(15, 2) NOT NULL DEFAULT 0,
    cc_mitigation     NUMERIC(15, 2) NOT NULL DEFAULT 0,
    cc_typology_code  VARCHAR(20),
    status            VARCHAR(20) NOT NULL DEFAULT 'draft',
    created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_budget_entries_year_node UNIQUE (fiscal_year, node_id),
    CONSTRAINT chk_budget_entries_amounts CHECK (
        ps_amount >= 0 AND mooe_amount >= 0 AND fe_amount >= 0 AND co_amount >= 0
        AND cc_adaptation >= 0 AND cc_mitigation >= 0
    ),
    CONSTRAINT chk_budget_entries_schedule
        CHECK (start_date IS NULL OR end_date IS NULL OR end_date >= start_date),
    CONSTRAINT chk_budget_entries_status CHECK (status IN ('draft', 'submitted', 'approved'))
);

CREATE INDEX idx_budget_entries_year ON budget_entries (fiscal_year);
";

const ITEMIZED_COSTS_SQL: &str = r"
CREATE TABLE itemized_costs (
    id               UUID PRIMARY KEY,
    budget_entry_id  UUID NOT NULL REFERENCES budget_entries(id) ON DELETE CASCADE,
    account_code     VARCHAR(20) NOT NULL REFERENCES chart_of_accounts(code) ON DELETE RESTRICT,
    description      TEXT NOT NULL,
    quantity         NUMERIC(15, 4) NOT NULL,
    unit_cost        NUMERIC(15, 4) NOT NULL,
    amount           NUMERIC(15, 2) NOT NULL,
    price_item_code  VARCHAR(50) REFERENCES price_list_items(code) ON DELETE SET NULL,
    created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_itemized_costs_quantity CHECK (quantity >= 0),
    CONSTRAINT chk_itemized_costs_unit_cost CHECK (unit_cost >= 0)
);

CREATE INDEX idx_itemized_costs_entry ON itemized_costs (budget_entry_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS itemized_costs;
DROP TABLE IF EXISTS budget_entries;
DROP TABLE IF EXISTS price_list_items;
DROP TABLE IF EXISTS chart_of_accounts;
DROP TABLE IF EXISTS hierarchy_nodes;
DROP TABLE IF EXISTS offices;
";
