use super::amu_records::AmuRecordView;
use crate::{
    auth::{authorize, Action, Caller, FarmRef, ResourceKind},
    db::DbPool,
    entities::{
        amu_record, drug,
        health_record::{self, EventType},
        livestock,
    },
    errors::ServiceError,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Health event with the drug administrations recorded against it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecordView {
    #[serde(flatten)]
    pub record: health_record::Model,
    pub amu_records: Vec<AmuRecordView>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHealthRecord {
    pub livestock: i32,
    pub event_type: EventType,
    pub event_date: NaiveDate,
    pub notes: Option<String>,
    #[validate(length(max = 255))]
    pub diagnosis: Option<String>,
    #[validate(length(max = 20))]
    pub treatment_outcome: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateHealthRecord {
    pub livestock: Option<i32>,
    pub event_type: Option<EventType>,
    pub event_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub diagnosis: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub treatment_outcome: Option<Option<String>>,
}

/// Service for livestock health events
#[derive(Clone)]
pub struct HealthRecordService {
    db_pool: Arc<DbPool>,
}

impl HealthRecordService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn list_health_records(
        &self,
        caller: &Caller,
    ) -> Result<Vec<HealthRecordView>, ServiceError> {
        let Some(farm_id) = caller.visible_farm_id() else {
            return Ok(Vec::new());
        };

        let records = health_record::Entity::find()
            .inner_join(livestock::Entity)
            .filter(livestock::Column::FarmId.eq(farm_id))
            .order_by_asc(health_record::Column::Id)
            .all(&*self.db_pool)
            .await?;

        attach_amu_records(&*self.db_pool, records).await
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn create_health_record(
        &self,
        caller: &Caller,
        input: CreateHealthRecord,
    ) -> Result<HealthRecordView, ServiceError> {
        let db = &*self.db_pool;
        let animal = super::visible_livestock(db, caller, input.livestock)
            .await?
            .ok_or_else(|| super::invalid_reference("livestock", input.livestock))?;
        authorize(
            caller,
            ResourceKind::HealthRecord,
            FarmRef::ViaLivestock(Some(animal.farm_id)),
            Action::Create,
        )?;

        let created = health_record::ActiveModel {
            livestock_id: Set(animal.id),
            event_type: Set(input.event_type),
            event_date: Set(input.event_date),
            notes: Set(input.notes),
            diagnosis: Set(input.diagnosis),
            treatment_outcome: Set(input.treatment_outcome),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(health_record_id = created.id, livestock_id = animal.id, event_type = %created.event_type, "health record created");
        Ok(HealthRecordView {
            record: created,
            amu_records: Vec::new(),
        })
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn get_health_record(
        &self,
        caller: &Caller,
        id: i32,
    ) -> Result<HealthRecordView, ServiceError> {
        let record = self.load_authorized(caller, id, Action::Read).await?;
        self.single_view(record).await
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn update_health_record(
        &self,
        caller: &Caller,
        id: i32,
        input: UpdateHealthRecord,
    ) -> Result<HealthRecordView, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.load_authorized(caller, id, Action::Update).await?;

        let mut active: health_record::ActiveModel = existing.clone().into();
        if let Some(livestock_id) = input.livestock {
            if livestock_id != existing.livestock_id {
                let animal = super::visible_livestock(db, caller, livestock_id)
                    .await?
                    .ok_or_else(|| super::invalid_reference("livestock", livestock_id))?;
                authorize(
                    caller,
                    ResourceKind::HealthRecord,
                    FarmRef::ViaLivestock(Some(animal.farm_id)),
                    Action::Update,
                )?;
            }
            active.livestock_id = Set(livestock_id);
        }
        if let Some(event_type) = input.event_type {
            active.event_type = Set(event_type);
        }
        if let Some(event_date) = input.event_date {
            active.event_date = Set(event_date);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        if let Some(diagnosis) = input.diagnosis {
            active.diagnosis = Set(diagnosis);
        }
        if let Some(outcome) = input.treatment_outcome {
            active.treatment_outcome = Set(outcome);
        }

        let updated = active.update(db).await?;
        info!(health_record_id = id, "health record updated");
        self.single_view(updated).await
    }

    /// Deleting a health record removes its AMU records.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn delete_health_record(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        self.load_authorized(caller, id, Action::Delete).await?;
        health_record::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        info!(health_record_id = id, "health record deleted");
        Ok(())
    }

    async fn load_authorized(
        &self,
        caller: &Caller,
        id: i32,
        action: Action,
    ) -> Result<health_record::Model, ServiceError> {
        let (record, animal) = health_record::Entity::find_by_id(id)
            .find_also_related(livestock::Entity)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Health record", id))?;

        let farm_id = super::ensure_in_scope(
            caller,
            animal.map(|a| a.farm_id),
            "Health record",
            id,
        )?;
        authorize(
            caller,
            ResourceKind::HealthRecord,
            FarmRef::ViaLivestock(Some(farm_id)),
            action,
        )?;
        Ok(record)
    }

    async fn single_view(&self, record: health_record::Model) -> Result<HealthRecordView, ServiceError> {
        let mut views = attach_amu_records(&*self.db_pool, vec![record]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::InternalError("health record view missing".to_string()))
    }
}

/// Pairs each health record with its AMU records, keeping input order.
pub(crate) async fn attach_amu_records<C: ConnectionTrait>(
    db: &C,
    records: Vec<health_record::Model>,
) -> Result<Vec<HealthRecordView>, ServiceError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = records.iter().map(|r| r.id).collect();
    let amu_rows = amu_record::Entity::find()
        .filter(amu_record::Column::HealthRecordId.is_in(ids))
        .order_by_asc(amu_record::Column::Id)
        .find_also_related(drug::Entity)
        .all(db)
        .await?;

    let mut by_record: HashMap<i32, Vec<AmuRecordView>> = HashMap::new();
    for (amu, drug) in amu_rows {
        by_record
            .entry(amu.health_record_id)
            .or_default()
            .push(AmuRecordView::new(amu, drug));
    }

    Ok(records
        .into_iter()
        .map(|record| {
            let amu_records = by_record.remove(&record.id).unwrap_or_default();
            HealthRecordView {
                record,
                amu_records,
            }
        })
        .collect())
}
