use super::drugs::ensure_catalog_manager;
use crate::{auth::Caller, db::DbPool, entities::feed, errors::ServiceError};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

const DUPLICATE_NAME: &str = "feed with this name already exists.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFeed {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(custom = "super::non_negative")]
    pub cost_per_kg: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_feed_patch"))]
pub struct UpdateFeed {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub cost_per_kg: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub notes: Option<Option<String>>,
}

fn validate_feed_patch(patch: &UpdateFeed) -> Result<(), ValidationError> {
    match &patch.cost_per_kg {
        Some(Some(cost)) => super::non_negative(cost),
        _ => Ok(()),
    }
}

/// Service for the shared feed catalog
#[derive(Clone)]
pub struct FeedService {
    db_pool: Arc<DbPool>,
}

impl FeedService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_feeds(&self) -> Result<Vec<feed::Model>, ServiceError> {
        Ok(feed::Entity::find()
            .order_by_asc(feed::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_feed(&self, id: i32) -> Result<feed::Model, ServiceError> {
        feed::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Feed", id))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn create_feed(&self, caller: &Caller, input: CreateFeed) -> Result<feed::Model, ServiceError> {
        ensure_catalog_manager(caller)?;

        let created = feed::ActiveModel {
            name: Set(input.name),
            cost_per_kg: Set(input.cost_per_kg),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_write_error(e, DUPLICATE_NAME))?;

        info!(feed_id = created.id, name = %created.name, "feed created");
        Ok(created)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn update_feed(
        &self,
        caller: &Caller,
        id: i32,
        input: UpdateFeed,
    ) -> Result<feed::Model, ServiceError> {
        ensure_catalog_manager(caller)?;
        let existing = self.get_feed(id).await?;

        let mut active: feed::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(cost) = input.cost_per_kg {
            active.cost_per_kg = Set(cost);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_write_error(e, DUPLICATE_NAME))?;
        info!(feed_id = id, "feed updated");
        Ok(updated)
    }

    /// Feed records that used this feed keep their label but lose the link.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn delete_feed(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        ensure_catalog_manager(caller)?;
        self.get_feed(id).await?;
        feed::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        info!(feed_id = id, "feed deleted");
        Ok(())
    }
}
