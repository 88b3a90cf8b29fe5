use crate::{
    auth::{authorize, Action, Caller, FarmRef, ResourceKind},
    db::DbPool,
    entities::farm,
    errors::ServiceError,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFarm {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(max = 255))]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateFarm {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub location: Option<Option<String>>,
}

/// Service for managing farms
#[derive(Clone)]
pub struct FarmService {
    db_pool: Arc<DbPool>,
}

impl FarmService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Every farm, so prospective labourers can choose one to join.
    #[instrument(skip(self))]
    pub async fn list_farms(&self) -> Result<Vec<farm::Model>, ServiceError> {
        Ok(farm::Entity::find()
            .order_by_asc(farm::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn create_farm(
        &self,
        caller: &Caller,
        input: CreateFarm,
    ) -> Result<farm::Model, ServiceError> {
        let db = &*self.db_pool;
        let already_owns = farm::Entity::find()
            .filter(farm::Column::OwnerId.eq(caller.user_id()))
            .one(db)
            .await?
            .is_some();
        if already_owns {
            return Err(ServiceError::Conflict("You already own a farm.".to_string()));
        }

        let created = farm::ActiveModel {
            owner_id: Set(caller.user_id()),
            name: Set(input.name),
            location: Set(input.location),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write_error(e, "You already own a farm."))?;

        info!(farm_id = created.id, "farm created");
        Ok(created)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn get_farm(&self, caller: &Caller, id: i32) -> Result<farm::Model, ServiceError> {
        self.load_authorized(caller, id, Action::Read).await
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn update_farm(
        &self,
        caller: &Caller,
        id: i32,
        input: UpdateFarm,
    ) -> Result<farm::Model, ServiceError> {
        let existing = self.load_authorized(caller, id, Action::Update).await?;

        let mut active: farm::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(location) = input.location {
            active.location = Set(location);
        }

        let updated = active.update(&*self.db_pool).await?;
        info!(farm_id = id, "farm updated");
        Ok(updated)
    }

    /// Removes the farm together with its labourers, livestock and records.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn delete_farm(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        self.load_authorized(caller, id, Action::Delete).await?;
        farm::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        info!(farm_id = id, "farm deleted");
        Ok(())
    }

    async fn load_authorized(
        &self,
        caller: &Caller,
        id: i32,
        action: Action,
    ) -> Result<farm::Model, ServiceError> {
        let farm = farm::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Farm", id))?;
        authorize(caller, ResourceKind::Farm, FarmRef::Farm(farm.id), action)?;
        Ok(farm)
    }
}
