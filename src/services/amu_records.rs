use crate::{
    auth::{authorize, Action, Caller, FarmRef, ResourceKind},
    db::DbPool,
    entities::{amu_record, drug, health_record, livestock},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmuRecordView {
    #[serde(flatten)]
    pub record: amu_record::Model,
    pub drug_name: Option<String>,
}

impl AmuRecordView {
    pub fn new(record: amu_record::Model, drug: Option<drug::Model>) -> Self {
        Self {
            record,
            drug_name: drug.map(|d| d.name),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAmuRecord {
    pub health_record: i32,
    pub drug: Option<i32>,
    #[validate(length(min = 1, max = 50), custom = "super::not_blank")]
    pub dosage: String,
    #[validate(range(min = 0))]
    pub withdrawal_period: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_amu_patch"))]
pub struct UpdateAmuRecord {
    pub health_record: Option<i32>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub drug: Option<Option<i32>>,
    #[validate(length(min = 1, max = 50))]
    pub dosage: Option<String>,
    #[validate(range(min = 0))]
    pub withdrawal_period: Option<i32>,
}

fn validate_amu_patch(patch: &UpdateAmuRecord) -> Result<(), ValidationError> {
    match &patch.dosage {
        Some(dosage) => super::not_blank(dosage),
        None => Ok(()),
    }
}

/// Service for antimicrobial-usage records
#[derive(Clone)]
pub struct AmuRecordService {
    db_pool: Arc<DbPool>,
}

impl AmuRecordService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn list_amu_records(&self, caller: &Caller) -> Result<Vec<AmuRecordView>, ServiceError> {
        let Some(farm_id) = caller.visible_farm_id() else {
            return Ok(Vec::new());
        };

        let rows = amu_record::Entity::find()
            .join(JoinType::InnerJoin, amu_record::Relation::HealthRecord.def())
            .join(JoinType::InnerJoin, health_record::Relation::Livestock.def())
            .filter(livestock::Column::FarmId.eq(farm_id))
            .order_by_asc(amu_record::Column::Id)
            .find_also_related(drug::Entity)
            .all(&*self.db_pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(record, drug)| AmuRecordView::new(record, drug))
            .collect())
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn create_amu_record(
        &self,
        caller: &Caller,
        input: CreateAmuRecord,
    ) -> Result<AmuRecordView, ServiceError> {
        let db = &*self.db_pool;
        let (_, farm_id) = super::visible_health_record(db, caller, input.health_record)
            .await?
            .ok_or_else(|| super::invalid_reference("health_record", input.health_record))?;
        authorize(caller, ResourceKind::AmuRecord, FarmRef::ViaLivestock(Some(farm_id)), Action::Create)?;

        let drug = match input.drug {
            Some(drug_id) => Some(existing_drug(db, drug_id).await?),
            None => None,
        };

        let created = amu_record::ActiveModel {
            health_record_id: Set(input.health_record),
            drug_id: Set(input.drug),
            dosage: Set(input.dosage),
            withdrawal_period: Set(input.withdrawal_period),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(amu_record_id = created.id, health_record_id = created.health_record_id, "amu record created");
        Ok(AmuRecordView::new(created, drug))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn get_amu_record(&self, caller: &Caller, id: i32) -> Result<AmuRecordView, ServiceError> {
        let record = self.load_authorized(caller, id, Action::Read).await?;
        let drug = match record.drug_id {
            Some(drug_id) => drug::Entity::find_by_id(drug_id).one(&*self.db_pool).await?,
            None => None,
        };
        Ok(AmuRecordView::new(record, drug))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn update_amu_record(
        &self,
        caller: &Caller,
        id: i32,
        input: UpdateAmuRecord,
    ) -> Result<AmuRecordView, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.load_authorized(caller, id, Action::Update).await?;

        let mut active: amu_record::ActiveModel = existing.clone().into();
        if let Some(health_record_id) = input.health_record {
            if health_record_id != existing.health_record_id {
                let (_, farm_id) = super::visible_health_record(db, caller, health_record_id)
                    .await?
                    .ok_or_else(|| super::invalid_reference("health_record", health_record_id))?;
                authorize(caller, ResourceKind::AmuRecord, FarmRef::ViaLivestock(Some(farm_id)), Action::Update)?;
            }
            active.health_record_id = Set(health_record_id);
        }
        if let Some(drug_id) = input.drug {
            if let Some(drug_id) = drug_id {
                existing_drug(db, drug_id).await?;
            }
            active.drug_id = Set(drug_id);
        }
        if let Some(dosage) = input.dosage {
            active.dosage = Set(dosage);
        }
        if let Some(withdrawal_period) = input.withdrawal_period {
            active.withdrawal_period = Set(withdrawal_period);
        }

        let updated = active.update(db).await?;
        info!(amu_record_id = id, "amu record updated");

        let drug = match updated.drug_id {
            Some(drug_id) => drug::Entity::find_by_id(drug_id).one(db).await?,
            None => None,
        };
        Ok(AmuRecordView::new(updated, drug))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn delete_amu_record(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        self.load_authorized(caller, id, Action::Delete).await?;
        amu_record::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        info!(amu_record_id = id, "amu record deleted");
        Ok(())
    }

    async fn load_authorized(
        &self,
        caller: &Caller,
        id: i32,
        action: Action,
    ) -> Result<amu_record::Model, ServiceError> {
        let db = &*self.db_pool;
        let record = amu_record::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("AMU record", id))?;

        let farm_id = health_record::Entity::find_by_id(record.health_record_id)
            .find_also_related(livestock::Entity)
            .one(db)
            .await?
            .and_then(|(_, animal)| animal)
            .map(|animal| animal.farm_id);

        let farm_id = super::ensure_in_scope(caller, farm_id, "AMU record", id)?;
        authorize(caller, ResourceKind::AmuRecord, FarmRef::ViaLivestock(Some(farm_id)), action)?;
        Ok(record)
    }
}

async fn existing_drug<C: ConnectionTrait>(db: &C, drug_id: i32) -> Result<drug::Model, ServiceError> {
    drug::Entity::find_by_id(drug_id)
        .one(db)
        .await?
        .ok_or_else(|| super::invalid_reference("drug", drug_id))
}
