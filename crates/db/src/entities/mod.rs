//! `SeaORM` entity definitions for the stock ledger schema.

pub mod items;
pub mod organizations;
pub mod sea_orm_active_enums;
pub mod stock_entries;
pub mod stock_histories;
