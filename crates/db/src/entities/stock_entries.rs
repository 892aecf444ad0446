//! `SeaORM` entity for the stock_entries table.
//!
//! One row per stock event within a `(organization, item)` partition. Rows
//! are never hard-deleted by normal operations; `deleted_at` marks
//! tombstones that remain readable for audit and rollback.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{MovementSource, StockEntryKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub item_id: i64,
    pub txn_date: DateTimeWithTimeZone,
    pub amount: i64,
    pub balance: i64,
    pub kind: StockEntryKind,
    pub ref_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    pub source: Option<MovementSource>,
    pub from_organization_id: Option<Uuid>,
    pub to_organization_id: Option<Uuid>,
    pub physical_qty: Option<i64>,
    pub system_qty: Option<i64>,
    pub difference: Option<i64>,
    pub created_by: String,
    pub deleted_by: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub page_code: Option<String>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organizations,
    #[sea_orm(
        belongs_to = "super::items::Entity",
        from = "Column::ItemId",
        to = "super::items::Column::Id"
    )]
    Items,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
