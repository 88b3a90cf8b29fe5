use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feeds")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    /// Catalog price used when a feed record carries no price of its own
    pub cost_per_kg: Option<Decimal>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::feed_record::Entity")]
    FeedRecords,
}

impl Related<super::feed_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
