//! Database seeder for kardex development and testing.
//!
//! Seeds sample organizations, items, and opening stock movements when the
//! tables are empty.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

use kardex_core::ledger::{CreateEntryInput, EntryKind};
use kardex_db::entities::{items, organizations, stock_entries};
use kardex_db::{Deadline, LedgerRepository};

/// Main warehouse ID (consistent for all seeds)
const MAIN_WAREHOUSE_ID: &str = "b159a190-e72f-4295-853c-ddbbe19fa6f6";
/// First branch ID (consistent for all seeds)
const BRANCH_1_ID: &str = "2003eacc-5f39-4f3d-94d7-6e01c1bebd6a";
/// Second branch ID (consistent for all seeds)
const BRANCH_2_ID: &str = "9cf2bfa5-29b7-4be4-a9cc-969e567f8fe3";
/// Retail store ID (consistent for all seeds)
const RETAIL_STORE_ID: &str = "545dc82f-3ea6-4355-be7c-18821ad8940c";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = kardex_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding organizations...");
    seed_organizations(&db).await;

    println!("Seeding items...");
    seed_items(&db).await;

    println!("Seeding opening stock...");
    seed_opening_stock(&db).await;

    println!("Seeding complete!");
}

fn org_id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap()
}

async fn seed_organizations(db: &DatabaseConnection) {
    let count = organizations::Entity::find()
        .count(db)
        .await
        .expect("Failed to count organizations");
    if count > 0 {
        println!("Organizations already present, skipping");
        return;
    }

    let rows = [
        (MAIN_WAREHOUSE_ID, "Main Warehouse", "WH-MAIN"),
        (BRANCH_1_ID, "Branch Office 1", "BR-001"),
        (BRANCH_2_ID, "Branch Office 2", "BR-002"),
        (RETAIL_STORE_ID, "Retail Store", "RT-001"),
    ];

    for (id, name, code) in rows {
        let org = organizations::ActiveModel {
            id: Set(org_id(id)),
            name: Set(name.to_string()),
            code: Set(code.to_string()),
            created_at: Set(Utc::now().into()),
        };
        org.insert(db).await.expect("Failed to seed organization");
    }
    println!("Seeded {} organizations", rows.len());
}

async fn seed_items(db: &DatabaseConnection) {
    let count = items::Entity::find()
        .count(db)
        .await
        .expect("Failed to count items");
    if count > 0 {
        println!("Items already present, skipping");
        return;
    }

    let rows = [
        ("ITEM-001", "Laptop Dell XPS 13", "unit"),
        ("ITEM-002", "Mouse Wireless Logitech", "pcs"),
        ("ITEM-003", "Monitor 24 inch", "unit"),
        ("ITEM-004", "Keyboard Mechanical", "pcs"),
    ];

    for (code, name, unit) in rows {
        let item = items::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            unit: Set(unit.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        item.insert(db).await.expect("Failed to seed item");
    }
    println!("Seeded {} items", rows.len());
}

/// Opens stock for the main warehouse through the real write path so the
/// seeded ledger carries balances and history like production data.
async fn seed_opening_stock(db: &DatabaseConnection) {
    let count = stock_entries::Entity::find()
        .count(db)
        .await
        .expect("Failed to count stock entries");
    if count > 0 {
        println!("Stock entries already present, skipping");
        return;
    }

    let item_rows = items::Entity::find()
        .all(db)
        .await
        .expect("Failed to load items");

    let ledger = LedgerRepository::new(db.clone());
    let warehouse = org_id(MAIN_WAREHOUSE_ID);

    for (index, item) in item_rows.iter().enumerate() {
        let input = CreateEntryInput {
            organization_id: warehouse,
            item_id: item.id,
            txn_date: Utc::now().fixed_offset(),
            amount: 50 + 25 * index as i64,
            kind: EntryKind::FirstStock,
            changed_by: "seeder".to_string(),
            reason: Some("Opening stock".to_string()),
            ref_id: None,
            target_id: None,
            source: None,
            page_code: None,
            notes: None,
        };
        ledger
            .create_entry(input, Deadline::none())
            .await
            .expect("Failed to seed opening stock");
    }
    println!("Seeded opening stock for {} items", item_rows.len());
}
