//! Initial database migration.
//!
//! Creates the enums, reference tables, the stock ledger table, and the
//! history table with its snapshot columns.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(ORGANIZATIONS_SQL).await?;
        db.execute_unprepared(ITEMS_SQL).await?;
        db.execute_unprepared(STOCK_ENTRIES_SQL).await?;
        db.execute_unprepared(STOCK_HISTORIES_SQL).await?;

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

const ENUMS_SQL: &str = r"
-- Stock entry kinds
CREATE TYPE stock_entry_kind AS ENUM (
    'first_stock',
    'receipt',
    'issue',
    'mutation',
    'count'
);

-- Business source of a movement
CREATE TYPE movement_source AS ENUM (
    'purchase',
    'usage',
    'adjustment',
    'return'
);

-- Audit history actions
CREATE TYPE history_action AS ENUM (
    'CREATE',
    'MUTATION_IN',
    'MUTATION_OUT',
    'COUNT',
    'UPDATE_BEFORE',
    'UPDATE_AFTER',
    'DELETE_BEFORE',
    'ROLLBACK'
);
";

const ORGANIZATIONS_SQL: &str = r"
CREATE TABLE organizations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL,
    code VARCHAR(50) UNIQUE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ITEMS_SQL: &str = r"
CREATE TABLE items (
    id BIGSERIAL PRIMARY KEY,
    code VARCHAR(50) UNIQUE NOT NULL,
    name VARCHAR(200) NOT NULL,
    unit VARCHAR(20) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const STOCK_ENTRIES_SQL: &str = r"
CREATE TABLE stock_entries (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    item_id BIGINT NOT NULL REFERENCES items(id),
    txn_date TIMESTAMPTZ NOT NULL,
    amount BIGINT NOT NULL,
    balance BIGINT NOT NULL,
    kind stock_entry_kind NOT NULL,
    ref_id UUID,
    target_id UUID,
    source movement_source,
    from_organization_id UUID,
    to_organization_id UUID,
    physical_qty BIGINT,
    system_qty BIGINT,
    difference BIGINT,
    created_by VARCHAR(120) NOT NULL,
    deleted_by VARCHAR(120),
    created_at TIMESTAMPTZ NOT NULL,
    deleted_at TIMESTAMPTZ,
    page_code VARCHAR(50),
    notes TEXT
);

CREATE INDEX idx_stock_entries_partition_date
    ON stock_entries (organization_id, item_id, txn_date);

CREATE INDEX idx_stock_entries_partition_live
    ON stock_entries (organization_id, item_id, txn_date, deleted_at);

CREATE INDEX idx_stock_entries_ref_id ON stock_entries (ref_id);
";

const STOCK_HISTORIES_SQL: &str = r"
CREATE TABLE stock_histories (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    item_id BIGINT NOT NULL REFERENCES items(id),
    trigger_entry_id UUID,
    snapshot_from_date TIMESTAMPTZ NOT NULL,
    data_before JSONB,
    data_after JSONB,
    action history_action NOT NULL,
    changed_by VARCHAR(120) NOT NULL,
    reason TEXT,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX idx_stock_histories_partition_date
    ON stock_histories (organization_id, item_id, snapshot_from_date);

CREATE INDEX idx_stock_histories_action ON stock_histories (action);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS stock_histories;
DROP TABLE IF EXISTS stock_entries;
DROP TABLE IF EXISTS items;
DROP TABLE IF EXISTS organizations;
DROP TYPE IF EXISTS history_action;
DROP TYPE IF EXISTS movement_source;
DROP TYPE IF EXISTS stock_entry_kind;
";
