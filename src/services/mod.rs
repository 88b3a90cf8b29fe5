pub mod ai;
pub mod amu_records;
pub mod drugs;
pub mod farms;
pub mod feed_records;
pub mod feeds;
pub mod health_records;
pub mod insights;
pub mod labourers;
pub mod livestock;
pub mod users;
pub mod yield_records;

use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

use crate::auth::Caller;
use crate::entities::{health_record, livestock as livestock_entity};
use crate::errors::ServiceError;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in partial updates.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Ensure this value is greater than or equal to 0.".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("This field may not be blank.".into());
        return Err(err);
    }
    Ok(())
}

/// A reference in a request body that points at nothing the caller can see.
pub(crate) fn invalid_reference(field: &str, id: i32) -> ServiceError {
    ServiceError::BadRequest(format!(
        "{}: Invalid pk \"{}\" - object does not exist.",
        field, id
    ))
}

/// Fails with 404 unless `farm_id` is the farm whose records `caller` may list.
pub(crate) fn ensure_in_scope(
    caller: &Caller,
    farm_id: Option<i32>,
    resource: &str,
    id: i32,
) -> Result<i32, ServiceError> {
    match (farm_id, caller.visible_farm_id()) {
        (Some(farm), Some(visible)) if farm == visible => Ok(farm),
        _ => Err(ServiceError::not_found(resource, id)),
    }
}

/// Livestock `id` if it belongs to the caller's visible farm.
pub(crate) async fn visible_livestock<C: ConnectionTrait>(
    db: &C,
    caller: &Caller,
    id: i32,
) -> Result<Option<livestock_entity::Model>, ServiceError> {
    let Some(visible) = caller.visible_farm_id() else {
        return Ok(None);
    };
    Ok(livestock_entity::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|animal| animal.farm_id == visible))
}

/// Health record `id` and the farm it resolves to, if visible to the caller.
pub(crate) async fn visible_health_record<C: ConnectionTrait>(
    db: &C,
    caller: &Caller,
    id: i32,
) -> Result<Option<(health_record::Model, i32)>, ServiceError> {
    let Some(visible) = caller.visible_farm_id() else {
        return Ok(None);
    };
    let found = health_record::Entity::find_by_id(id)
        .find_also_related(livestock_entity::Entity)
        .one(db)
        .await?;
    Ok(match found {
        Some((record, Some(animal))) if animal.farm_id == visible => Some((record, animal.farm_id)),
        _ => None,
    })
}
