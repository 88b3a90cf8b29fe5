use crate::{
    auth::Caller,
    db::DbPool,
    entities::drug,
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

const DUPLICATE_NAME: &str = "drug with this name already exists.";

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_dosage_range"))]
pub struct CreateDrug {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 100))]
    pub active_ingredient: Option<String>,
    #[validate(length(max = 100))]
    pub species_target: Option<String>,
    #[validate(custom = "super::non_negative")]
    pub recommended_dosage_min: Option<Decimal>,
    #[validate(custom = "super::non_negative")]
    pub recommended_dosage_max: Option<Decimal>,
    #[validate(length(max = 50))]
    pub unit: Option<String>,
    pub notes: Option<String>,
}

fn validate_dosage_range(input: &CreateDrug) -> Result<(), ValidationError> {
    match (input.recommended_dosage_min, input.recommended_dosage_max) {
        (Some(min), Some(max)) if min > max => {
            let mut err = ValidationError::new("dosage_range");
            err.message = Some("recommended_dosage_min cannot exceed recommended_dosage_max".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_drug_patch"))]
pub struct UpdateDrug {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub active_ingredient: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub species_target: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub recommended_dosage_min: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub recommended_dosage_max: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub notes: Option<Option<String>>,
}

fn validate_drug_patch(patch: &UpdateDrug) -> Result<(), ValidationError> {
    for dosage in [&patch.recommended_dosage_min, &patch.recommended_dosage_max]
        .into_iter()
        .flatten()
        .flatten()
    {
        super::non_negative(dosage)?;
    }
    Ok(())
}

/// Service for the shared drug catalog
#[derive(Clone)]
pub struct DrugService {
    db_pool: Arc<DbPool>,
}

impl DrugService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_drugs(&self) -> Result<Vec<drug::Model>, ServiceError> {
        Ok(drug::Entity::find()
            .order_by_asc(drug::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_drug(&self, id: i32) -> Result<drug::Model, ServiceError> {
        drug::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Drug", id))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn create_drug(&self, caller: &Caller, input: CreateDrug) -> Result<drug::Model, ServiceError> {
        ensure_catalog_manager(caller)?;

        let created = drug::ActiveModel {
            name: Set(input.name),
            active_ingredient: Set(input.active_ingredient),
            species_target: Set(input.species_target),
            recommended_dosage_min: Set(input.recommended_dosage_min),
            recommended_dosage_max: Set(input.recommended_dosage_max),
            unit: Set(input.unit),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_write_error(e, DUPLICATE_NAME))?;

        info!(drug_id = created.id, name = %created.name, "drug created");
        Ok(created)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn update_drug(
        &self,
        caller: &Caller,
        id: i32,
        input: UpdateDrug,
    ) -> Result<drug::Model, ServiceError> {
        ensure_catalog_manager(caller)?;
        let existing = self.get_drug(id).await?;

        let mut active: drug::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(active_ingredient) = input.active_ingredient {
            active.active_ingredient = Set(active_ingredient);
        }
        if let Some(species_target) = input.species_target {
            active.species_target = Set(species_target);
        }
        if let Some(min) = input.recommended_dosage_min {
            active.recommended_dosage_min = Set(min);
        }
        if let Some(max) = input.recommended_dosage_max {
            active.recommended_dosage_max = Set(max);
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_write_error(e, DUPLICATE_NAME))?;
        info!(drug_id = id, "drug updated");
        Ok(updated)
    }

    /// Deleting a drug also deletes the AMU records that reference it.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn delete_drug(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        ensure_catalog_manager(caller)?;
        self.get_drug(id).await?;
        drug::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        info!(drug_id = id, "drug deleted");
        Ok(())
    }
}

/// Only farm owners maintain the shared catalogs.
pub(crate) fn ensure_catalog_manager(caller: &Caller) -> Result<(), ServiceError> {
    if caller.owned_farm().is_some() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Only farm owners can manage the catalog.".to_string(),
        ))
    }
}
