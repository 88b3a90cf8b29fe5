use crate::{
    auth::{authorize, Action, Caller, FarmRef, ResourceKind},
    db::DbPool,
    entities::livestock::{self, Gender, HealthStatus},
    errors::ServiceError,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

const DUPLICATE_TAG: &str = "livestock with this tag id already exists.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLivestock {
    #[validate(length(min = 1, max = 100))]
    pub tag_id: String,
    #[validate(length(min = 1, max = 100))]
    pub species: String,
    #[validate(length(min = 1, max = 100))]
    pub breed: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub health_status: HealthStatus,
    #[validate(custom = "super::non_negative")]
    pub current_weight_kg: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_livestock_patch"))]
pub struct UpdateLivestock {
    #[validate(length(min = 1, max = 100))]
    pub tag_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub species: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub breed: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub health_status: Option<HealthStatus>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub current_weight_kg: Option<Option<Decimal>>,
}

fn validate_livestock_patch(patch: &UpdateLivestock) -> Result<(), ValidationError> {
    match &patch.current_weight_kg {
        Some(Some(weight)) => super::non_negative(weight),
        _ => Ok(()),
    }
}

/// Service for managing livestock
#[derive(Clone)]
pub struct LivestockService {
    db_pool: Arc<DbPool>,
}

impl LivestockService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn list_livestock(&self, caller: &Caller) -> Result<Vec<livestock::Model>, ServiceError> {
        let Some(farm_id) = caller.visible_farm_id() else {
            return Ok(Vec::new());
        };
        Ok(livestock::Entity::find()
            .filter(livestock::Column::FarmId.eq(farm_id))
            .order_by_asc(livestock::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    /// Registers an animal on the caller's own farm.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn create_livestock(
        &self,
        caller: &Caller,
        input: CreateLivestock,
    ) -> Result<livestock::Model, ServiceError> {
        let farm_id = caller.owned_farm_id().ok_or_else(|| {
            ServiceError::Forbidden("Only farm owners can add livestock.".to_string())
        })?;

        let created = livestock::ActiveModel {
            farm_id: Set(farm_id),
            tag_id: Set(input.tag_id),
            species: Set(input.species),
            breed: Set(input.breed),
            date_of_birth: Set(input.date_of_birth),
            gender: Set(input.gender),
            health_status: Set(input.health_status),
            current_weight_kg: Set(input.current_weight_kg),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_write_error(e, DUPLICATE_TAG))?;

        info!(livestock_id = created.id, farm_id, "livestock created");
        Ok(created)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn get_livestock(&self, caller: &Caller, id: i32) -> Result<livestock::Model, ServiceError> {
        self.load_authorized(caller, id, Action::Read).await
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn update_livestock(
        &self,
        caller: &Caller,
        id: i32,
        input: UpdateLivestock,
    ) -> Result<livestock::Model, ServiceError> {
        let existing = self.load_authorized(caller, id, Action::Update).await?;

        let mut active: livestock::ActiveModel = existing.into();
        if let Some(tag_id) = input.tag_id {
            active.tag_id = Set(tag_id);
        }
        if let Some(species) = input.species {
            active.species = Set(species);
        }
        if let Some(breed) = input.breed {
            active.breed = Set(breed);
        }
        if let Some(date_of_birth) = input.date_of_birth {
            active.date_of_birth = Set(date_of_birth);
        }
        if let Some(gender) = input.gender {
            active.gender = Set(gender);
        }
        if let Some(health_status) = input.health_status {
            active.health_status = Set(health_status);
        }
        if let Some(weight) = input.current_weight_kg {
            active.current_weight_kg = Set(weight);
        }

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_write_error(e, DUPLICATE_TAG))?;
        info!(livestock_id = id, "livestock updated");
        Ok(updated)
    }

    /// Deleting an animal removes its health, feed and yield history.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn delete_livestock(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        self.load_authorized(caller, id, Action::Delete).await?;
        livestock::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        info!(livestock_id = id, "livestock deleted");
        Ok(())
    }

    async fn load_authorized(
        &self,
        caller: &Caller,
        id: i32,
        action: Action,
    ) -> Result<livestock::Model, ServiceError> {
        let animal = livestock::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Livestock", id))?;
        let farm_id = super::ensure_in_scope(caller, Some(animal.farm_id), "Livestock", id)?;
        authorize(caller, ResourceKind::Livestock, FarmRef::Direct(Some(farm_id)), action)?;
        Ok(animal)
    }
}
