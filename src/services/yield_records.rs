use crate::{
    auth::{authorize, Action, Caller, FarmRef, ResourceKind},
    db::DbPool,
    entities::{livestock, yield_record},
    errors::ServiceError,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateYieldRecord {
    pub livestock: i32,
    #[validate(length(min = 1, max = 50))]
    pub yield_type: String,
    #[validate(custom = "super::non_negative")]
    pub quantity: Decimal,
    #[validate(length(min = 1, max = 20))]
    pub unit: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateYieldRecord {
    pub livestock: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub yield_type: Option<String>,
    #[validate(custom = "super::non_negative")]
    pub quantity: Option<Decimal>,
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Service for production (milk, eggs, ...) records
#[derive(Clone)]
pub struct YieldRecordService {
    db_pool: Arc<DbPool>,
}

impl YieldRecordService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn list_yield_records(
        &self,
        caller: &Caller,
    ) -> Result<Vec<yield_record::Model>, ServiceError> {
        let Some(farm_id) = caller.visible_farm_id() else {
            return Ok(Vec::new());
        };

        Ok(yield_record::Entity::find()
            .inner_join(livestock::Entity)
            .filter(livestock::Column::FarmId.eq(farm_id))
            .order_by_asc(yield_record::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn create_yield_record(
        &self,
        caller: &Caller,
        input: CreateYieldRecord,
    ) -> Result<yield_record::Model, ServiceError> {
        let db = &*self.db_pool;
        let animal = super::visible_livestock(db, caller, input.livestock)
            .await?
            .ok_or_else(|| super::invalid_reference("livestock", input.livestock))?;
        authorize(
            caller,
            ResourceKind::YieldRecord,
            FarmRef::ViaLivestock(Some(animal.farm_id)),
            Action::Create,
        )?;

        let created = yield_record::ActiveModel {
            livestock_id: Set(animal.id),
            yield_type: Set(input.yield_type),
            quantity: Set(input.quantity),
            unit: Set(input.unit),
            date: Set(input.date),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(yield_record_id = created.id, livestock_id = animal.id, yield_type = %created.yield_type, "yield record created");
        Ok(created)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn get_yield_record(
        &self,
        caller: &Caller,
        id: i32,
    ) -> Result<yield_record::Model, ServiceError> {
        self.load_authorized(caller, id, Action::Read).await
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn update_yield_record(
        &self,
        caller: &Caller,
        id: i32,
        input: UpdateYieldRecord,
    ) -> Result<yield_record::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.load_authorized(caller, id, Action::Update).await?;

        let mut active: yield_record::ActiveModel = existing.clone().into();
        if let Some(livestock_id) = input.livestock {
            if livestock_id != existing.livestock_id {
                let animal = super::visible_livestock(db, caller, livestock_id)
                    .await?
                    .ok_or_else(|| super::invalid_reference("livestock", livestock_id))?;
                authorize(
                    caller,
                    ResourceKind::YieldRecord,
                    FarmRef::ViaLivestock(Some(animal.farm_id)),
                    Action::Update,
                )?;
            }
            active.livestock_id = Set(livestock_id);
        }
        if let Some(yield_type) = input.yield_type {
            active.yield_type = Set(yield_type);
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }

        let updated = active.update(db).await?;
        info!(yield_record_id = id, "yield record updated");
        Ok(updated)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn delete_yield_record(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        self.load_authorized(caller, id, Action::Delete).await?;
        yield_record::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        info!(yield_record_id = id, "yield record deleted");
        Ok(())
    }

    async fn load_authorized(
        &self,
        caller: &Caller,
        id: i32,
        action: Action,
    ) -> Result<yield_record::Model, ServiceError> {
        let (record, animal) = yield_record::Entity::find_by_id(id)
            .find_also_related(livestock::Entity)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Yield record", id))?;

        let farm_id = super::ensure_in_scope(caller, animal.map(|a| a.farm_id), "Yield record", id)?;
        authorize(caller, ResourceKind::YieldRecord, FarmRef::ViaLivestock(Some(farm_id)), action)?;
        Ok(record)
    }
}
