use chrono::NaiveDate;
use rust_decimal::Decimal;
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
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum Gender {
    #[sea_orm(string_value = "M")]
    M,
    #[sea_orm(string_value = "F")]
    F,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    #[sea_orm(string_value = "healthy")]
    Healthy,
    #[sea_orm(string_value = "sick")]
    Sick,
    #[sea_orm(string_value = "recovering")]
    Recovering,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "livestock")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[serde(rename = "farm")]
    pub farm_id: i32,
    #[sea_orm(unique)]
    pub tag_id: String,
    pub species: String,
    pub breed: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub health_status: HealthStatus,
    pub current_weight_kg: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::farm::Entity",
        from = "Column::FarmId",
        to = "super::farm::Column::Id",
        on_delete = "Cascade"
    )]
    Farm,
    #[sea_orm(has_many = "super::health_record::Entity")]
    HealthRecords,
    #[sea_orm(has_many = "super::feed_record::Entity")]
    FeedRecords,
    #[sea_orm(has_many = "super::yield_record::Entity")]
    YieldRecords,
}

impl Related<super::farm::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Farm.def()
    }
}

impl Related<super::health_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HealthRecords.def()
    }
}

impl Related<super::feed_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedRecords.def()
    }
}

impl Related<super::yield_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::YieldRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
