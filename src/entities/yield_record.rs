use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "yield_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[serde(rename = "livestock")]
    pub livestock_id: i32,
    /// Free-form product label, e.g. "Milk" or "Eggs"
    pub yield_type: String,
    pub quantity: Decimal,
    pub unit: String,
    pub date: NaiveDate,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::livestock::Entity",
        from = "Column::LivestockId",
        to = "super::livestock::Column::Id",
        on_delete = "Cascade"
    )]
    Livestock,
}

impl Related<super::livestock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Livestock.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
