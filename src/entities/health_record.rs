use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum EventType {
    #[sea_orm(string_value = "vaccination")]
    #[serde(rename = "vaccination")]
    #[strum(serialize = "vaccination")]
    Vaccination,
    #[sea_orm(string_value = "sickness")]
    #[serde(rename = "sickness")]
    #[strum(serialize = "sickness")]
    Sickness,
    #[sea_orm(string_value = "check-up")]
    #[serde(rename = "check-up")]
    #[strum(serialize = "check-up")]
    CheckUp,
    #[sea_orm(string_value = "treatment")]
    #[serde(rename = "treatment")]
    #[strum(serialize = "treatment")]
    Treatment,
}

impl EventType {
    /// Events that involve administering a drug.
    pub fn involves_medication(self) -> bool {
        matches!(self, EventType::Sickness | EventType::Treatment)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "health_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[serde(rename = "livestock")]
    pub livestock_id: i32,
    pub event_type: EventType,
    pub event_date: NaiveDate,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment_outcome: Option<String>,
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
    #[sea_orm(has_many = "super::amu_record::Entity")]
    AmuRecords,
}

impl Related<super::livestock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Livestock.def()
    }
}

impl Related<super::amu_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AmuRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
