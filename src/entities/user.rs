use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account that can own a farm or hold a labourer profile.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::farm::Entity")]
    OwnedFarm,
    #[sea_orm(has_one = "super::labourer::Entity")]
    LabourerProfile,
}

impl Related<super::farm::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OwnedFarm.def()
    }
}

impl Related<super::labourer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LabourerProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
