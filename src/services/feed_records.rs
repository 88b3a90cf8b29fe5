use crate::{
    auth::{authorize, Action, Caller, FarmRef, ResourceKind},
    db::DbPool,
    entities::{feed, feed_record, livestock},
    errors::ServiceError,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedRecordView {
    #[serde(flatten)]
    pub record: feed_record::Model,
    pub feed_name: Option<String>,
}

impl FeedRecordView {
    pub fn new(record: feed_record::Model, feed: Option<feed::Model>) -> Self {
        Self {
            record,
            feed_name: feed.map(|f| f.name),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFeedRecord {
    pub livestock: i32,
    #[validate(length(min = 1, max = 100))]
    pub feed_type: String,
    pub feed: Option<i32>,
    #[validate(custom = "super::non_negative")]
    pub quantity_kg: Decimal,
    #[validate(custom = "super::non_negative")]
    pub price_per_kg: Option<Decimal>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_feed_record_patch"))]
pub struct UpdateFeedRecord {
    pub livestock: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub feed_type: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub feed: Option<Option<i32>>,
    #[validate(custom = "super::non_negative")]
    pub quantity_kg: Option<Decimal>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub price_per_kg: Option<Option<Decimal>>,
    pub date: Option<NaiveDate>,
}

fn validate_feed_record_patch(patch: &UpdateFeedRecord) -> Result<(), ValidationError> {
    match &patch.price_per_kg {
        Some(Some(price)) => super::non_negative(price),
        _ => Ok(()),
    }
}

/// Service for feeding records; approved labourers may create and edit them
#[derive(Clone)]
pub struct FeedRecordService {
    db_pool: Arc<DbPool>,
}

impl FeedRecordService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn list_feed_records(&self, caller: &Caller) -> Result<Vec<FeedRecordView>, ServiceError> {
        let Some(farm_id) = caller.visible_farm_id() else {
            return Ok(Vec::new());
        };

        let rows = feed_record::Entity::find()
            .inner_join(livestock::Entity)
            .filter(livestock::Column::FarmId.eq(farm_id))
            .order_by_asc(feed_record::Column::Id)
            .find_also_related(feed::Entity)
            .all(&*self.db_pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(record, feed)| FeedRecordView::new(record, feed))
            .collect())
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn create_feed_record(
        &self,
        caller: &Caller,
        input: CreateFeedRecord,
    ) -> Result<FeedRecordView, ServiceError> {
        let db = &*self.db_pool;
        let animal = super::visible_livestock(db, caller, input.livestock)
            .await?
            .ok_or_else(|| super::invalid_reference("livestock", input.livestock))?;
        authorize(
            caller,
            ResourceKind::FeedRecord,
            FarmRef::ViaLivestock(Some(animal.farm_id)),
            Action::Create,
        )?;

        let feed = match input.feed {
            Some(feed_id) => Some(existing_feed(db, feed_id).await?),
            None => None,
        };

        let created = feed_record::ActiveModel {
            livestock_id: Set(animal.id),
            feed_type: Set(input.feed_type),
            feed_id: Set(input.feed),
            quantity_kg: Set(input.quantity_kg),
            price_per_kg: Set(input.price_per_kg),
            date: Set(input.date),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(feed_record_id = created.id, livestock_id = animal.id, "feed record created");
        Ok(FeedRecordView::new(created, feed))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn get_feed_record(&self, caller: &Caller, id: i32) -> Result<FeedRecordView, ServiceError> {
        let record = self.load_authorized(caller, id, Action::Read).await?;
        self.view(record).await
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn update_feed_record(
        &self,
        caller: &Caller,
        id: i32,
        input: UpdateFeedRecord,
    ) -> Result<FeedRecordView, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.load_authorized(caller, id, Action::Update).await?;

        let mut active: feed_record::ActiveModel = existing.clone().into();
        if let Some(livestock_id) = input.livestock {
            if livestock_id != existing.livestock_id {
                let animal = super::visible_livestock(db, caller, livestock_id)
                    .await?
                    .ok_or_else(|| super::invalid_reference("livestock", livestock_id))?;
                authorize(
                    caller,
                    ResourceKind::FeedRecord,
                    FarmRef::ViaLivestock(Some(animal.farm_id)),
                    Action::Update,
                )?;
            }
            active.livestock_id = Set(livestock_id);
        }
        if let Some(feed_type) = input.feed_type {
            active.feed_type = Set(feed_type);
        }
        if let Some(feed_id) = input.feed {
            if let Some(feed_id) = feed_id {
                existing_feed(db, feed_id).await?;
            }
            active.feed_id = Set(feed_id);
        }
        if let Some(quantity) = input.quantity_kg {
            active.quantity_kg = Set(quantity);
        }
        if let Some(price) = input.price_per_kg {
            active.price_per_kg = Set(price);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }

        let updated = active.update(db).await?;
        info!(feed_record_id = id, "feed record updated");
        self.view(updated).await
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn delete_feed_record(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        self.load_authorized(caller, id, Action::Delete).await?;
        feed_record::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        info!(feed_record_id = id, "feed record deleted");
        Ok(())
    }

    async fn load_authorized(
        &self,
        caller: &Caller,
        id: i32,
        action: Action,
    ) -> Result<feed_record::Model, ServiceError> {
        let (record, animal) = feed_record::Entity::find_by_id(id)
            .find_also_related(livestock::Entity)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Feed record", id))?;

        let farm_id = super::ensure_in_scope(caller, animal.map(|a| a.farm_id), "Feed record", id)?;
        authorize(caller, ResourceKind::FeedRecord, FarmRef::ViaLivestock(Some(farm_id)), action)?;
        Ok(record)
    }

    async fn view(&self, record: feed_record::Model) -> Result<FeedRecordView, ServiceError> {
        let feed = match record.feed_id {
            Some(feed_id) => feed::Entity::find_by_id(feed_id).one(&*self.db_pool).await?,
            None => None,
        };
        Ok(FeedRecordView::new(record, feed))
    }
}

async fn existing_feed<C: ConnectionTrait>(db: &C, feed_id: i32) -> Result<feed::Model, ServiceError> {
    feed::Entity::find_by_id(feed_id)
        .one(db)
        .await?
        .ok_or_else(|| super::invalid_reference("feed", feed_id))
}
