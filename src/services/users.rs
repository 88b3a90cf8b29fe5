use super::labourers::LabourerView;
use crate::{
    auth::{Caller, CallerRole},
    db::DbPool,
    entities::{farm, labourer, user},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// The authenticated user together with their farm relations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub owned_farm: Option<farm::Model>,
    pub labourer_profile: Option<LabourerView>,
}

#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn profile(&self, caller: &Caller) -> Result<Profile, ServiceError> {
        let db = &*self.db_pool;

        // an owner may also hold a labourer profile; report both
        let labourer = match &caller.role {
            CallerRole::Labourer(profile) => Some(profile.clone()),
            _ => {
                labourer::Entity::find()
                    .filter(labourer::Column::UserId.eq(caller.user_id()))
                    .one(db)
                    .await?
            }
        };

        let labourer_profile = match labourer {
            Some(profile) => {
                let farm_name = match profile.farm_id {
                    Some(farm_id) => farm::Entity::find_by_id(farm_id)
                        .one(db)
                        .await?
                        .map(|f| f.name),
                    None => None,
                };
                Some(LabourerView {
                    labourer: profile,
                    user_name: caller.user.username.clone(),
                    user_email: caller.user.email.clone(),
                    farm_name,
                })
            }
            None => None,
        };

        let user::Model {
            id,
            username,
            email,
            ..
        } = caller.user.clone();

        Ok(Profile {
            id,
            username,
            email,
            owned_farm: caller.owned_farm().cloned(),
            labourer_profile,
        })
    }
}
