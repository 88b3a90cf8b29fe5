use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Drug administration attached to a health event.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "amu_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[serde(rename = "health_record")]
    pub health_record_id: i32,
    #[serde(rename = "drug")]
    pub drug_id: Option<i32>,
    pub dosage: String,
    /// Days until products from the animal are safe for consumption
    pub withdrawal_period: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::health_record::Entity",
        from = "Column::HealthRecordId",
        to = "super::health_record::Column::Id",
        on_delete = "Cascade"
    )]
    HealthRecord,
    #[sea_orm(
        belongs_to = "super::drug::Entity",
        from = "Column::DrugId",
        to = "super::drug::Column::Id",
        on_delete = "Cascade"
    )]
    Drug,
}

impl Related<super::health_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HealthRecord.def()
    }
}

impl Related<super::drug::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drug.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
