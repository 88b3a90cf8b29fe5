use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog entry for a veterinary drug; not tied to any farm.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "drugs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub active_ingredient: Option<String>,
    pub species_target: Option<String>,
    pub recommended_dosage_min: Option<Decimal>,
    pub recommended_dosage_max: Option<Decimal>,
    pub unit: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::amu_record::Entity")]
    AmuRecords,
}

impl Related<super::amu_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AmuRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
