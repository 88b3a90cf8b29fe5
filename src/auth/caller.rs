use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use super::{AuthError, AuthService};
use crate::entities::{farm, labourer, user};
use crate::errors::ServiceError;
use crate::AppState;

/// What the caller is to the farms in the system.
///
/// An owned farm takes precedence over a labourer profile.
#[derive(Debug, Clone, PartialEq)]
pub enum CallerRole {
    Owner(farm::Model),
    Labourer(labourer::Model),
    Guest,
}

/// Authenticated user plus their resolved role, built once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub user: user::Model,
    pub role: CallerRole,
}

impl Caller {
    pub fn new(user: user::Model, role: CallerRole) -> Self {
        Self { user, role }
    }

    /// Looks up the farm and labourer profile attached to `user`.
    pub async fn resolve<C: ConnectionTrait>(db: &C, user: user::Model) -> Result<Self, ServiceError> {
        if let Some(farm) = farm::Entity::find()
            .filter(farm::Column::OwnerId.eq(user.id))
            .one(db)
            .await?
        {
            return Ok(Self::new(user, CallerRole::Owner(farm)));
        }

        let role = labourer::Entity::find()
            .filter(labourer::Column::UserId.eq(user.id))
            .one(db)
            .await?
            .map(CallerRole::Labourer)
            .unwrap_or(CallerRole::Guest);

        Ok(Self::new(user, role))
    }

    pub fn user_id(&self) -> i32 {
        self.user.id
    }

    pub fn owned_farm(&self) -> Option<&farm::Model> {
        match &self.role {
            CallerRole::Owner(farm) => Some(farm),
            _ => None,
        }
    }

    pub fn owned_farm_id(&self) -> Option<i32> {
        self.owned_farm().map(|farm| farm.id)
    }

    pub fn labourer(&self) -> Option<&labourer::Model> {
        match &self.role {
            CallerRole::Labourer(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn owns(&self, farm_id: i32) -> bool {
        self.owned_farm_id() == Some(farm_id)
    }

    pub fn is_approved_labourer_of(&self, farm_id: i32) -> bool {
        self.labourer()
            .map(|profile| profile.is_approved_for(farm_id))
            .unwrap_or(false)
    }

    /// Farm whose records this caller may list: the owned farm, or the farm of
    /// an approved labourer. Pending and rejected labourers see nothing.
    pub fn visible_farm_id(&self) -> Option<i32> {
        match &self.role {
            CallerRole::Owner(farm) => Some(farm.id),
            CallerRole::Labourer(profile) => profile
                .farm_id
                .filter(|farm_id| profile.is_approved_for(*farm_id)),
            CallerRole::Guest => None,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(AuthService::token_from_header)
            .ok_or(AuthError::MissingAuth)?;

        let claims = state.auth.validate_token(token)?;
        let user_id = claims.user_id()?;

        let user = user::Entity::find_by_id(user_id)
            .one(&*state.db)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        Self::resolve(&*state.db, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::labourer::LabourerStatus;
    use chrono::Utc;

    fn user(id: i32) -> user::Model {
        user::Model {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@farm.test"),
            created_at: Utc::now(),
        }
    }

    fn labourer_on(farm_id: Option<i32>, status: LabourerStatus) -> CallerRole {
        CallerRole::Labourer(labourer::Model {
            id: 1,
            user_id: 2,
            farm_id,
            status,
        })
    }

    #[test]
    fn owner_sees_own_farm() {
        let caller = Caller::new(
            user(1),
            CallerRole::Owner(farm::Model {
                id: 10,
                owner_id: 1,
                name: "Green Pastures".into(),
                location: None,
            }),
        );
        assert_eq!(caller.visible_farm_id(), Some(10));
        assert!(caller.owns(10));
    }

    #[test]
    fn only_approved_labourers_see_their_farm() {
        let approved = Caller::new(user(2), labourer_on(Some(10), LabourerStatus::Approved));
        let pending = Caller::new(user(2), labourer_on(Some(10), LabourerStatus::Pending));
        let rejected = Caller::new(user(2), labourer_on(Some(10), LabourerStatus::Rejected));
        let unattached = Caller::new(user(2), labourer_on(None, LabourerStatus::Pending));

        assert_eq!(approved.visible_farm_id(), Some(10));
        assert_eq!(pending.visible_farm_id(), None);
        assert_eq!(rejected.visible_farm_id(), None);
        assert_eq!(unattached.visible_farm_id(), None);
    }

    #[test]
    fn guest_sees_nothing() {
        let caller = Caller::new(user(3), CallerRole::Guest);
        assert_eq!(caller.visible_farm_id(), None);
        assert!(!caller.owns(10));
    }
}
