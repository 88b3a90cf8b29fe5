use crate::{
    auth::{authorize, Action, Caller, FarmRef, ResourceKind},
    db::DbPool,
    entities::{
        farm,
        labourer::{self, LabourerStatus},
        user,
    },
    errors::ServiceError,
    notifications::{EmailMessage, Notifier},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Labourer profile with the names a dashboard needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabourerView {
    #[serde(flatten)]
    pub labourer: labourer::Model,
    pub user_name: String,
    pub user_email: String,
    pub farm_name: Option<String>,
}

/// `{"detail": ...}` acknowledgement for labourer actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detail {
    pub detail: String,
}

impl Detail {
    fn new(detail: &str) -> Self {
        Self {
            detail: detail.to_string(),
        }
    }
}

/// Service for labourer profiles and the join-farm handshake
#[derive(Clone)]
pub struct LabourerService {
    db_pool: Arc<DbPool>,
    notifier: Arc<dyn Notifier>,
    from_address: String,
}

impl LabourerService {
    pub fn new(db_pool: Arc<DbPool>, notifier: Arc<dyn Notifier>, from_address: String) -> Self {
        Self {
            db_pool,
            notifier,
            from_address,
        }
    }

    /// Owners see the labourers of their farm; labourers see their own profile.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn list_labourers(&self, caller: &Caller) -> Result<Vec<LabourerView>, ServiceError> {
        let query = if let Some(farm_id) = caller.owned_farm_id() {
            labourer::Entity::find().filter(labourer::Column::FarmId.eq(farm_id))
        } else if caller.labourer().is_some() {
            labourer::Entity::find().filter(labourer::Column::UserId.eq(caller.user_id()))
        } else {
            return Ok(Vec::new());
        };

        let labourers = query
            .order_by_asc(labourer::Column::Id)
            .all(&*self.db_pool)
            .await?;

        let mut views = Vec::with_capacity(labourers.len());
        for labourer in labourers {
            views.push(self.to_view(labourer).await?);
        }
        Ok(views)
    }

    /// Creates the caller's profile, unattached and pending.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn create_labourer(&self, caller: &Caller) -> Result<LabourerView, ServiceError> {
        let db = &*self.db_pool;
        if self.profile_of(caller.user_id()).await?.is_some() {
            return Err(ServiceError::Forbidden(
                "You already have a labourer profile.".to_string(),
            ));
        }

        let created = labourer::ActiveModel {
            user_id: Set(caller.user_id()),
            farm_id: Set(None),
            status: Set(LabourerStatus::Pending),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write_error(e, "You already have a labourer profile."))?;

        info!(labourer_id = created.id, "labourer profile created");
        self.to_view(created).await
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn get_labourer(&self, caller: &Caller, id: i32) -> Result<LabourerView, ServiceError> {
        let labourer = self.load_in_scope(caller, id).await?;
        if labourer.user_id != caller.user_id() {
            authorize(
                caller,
                ResourceKind::Labourer,
                FarmRef::Direct(labourer.farm_id),
                Action::Read,
            )?;
        }
        self.to_view(labourer).await
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn delete_labourer(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let labourer = self.load_in_scope(caller, id).await?;
        authorize(
            caller,
            ResourceKind::Labourer,
            FarmRef::Direct(labourer.farm_id),
            Action::Delete,
        )?;
        labourer::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        info!(labourer_id = id, "labourer deleted");
        Ok(())
    }

    /// Asks to join `farm_id`; the farm owner is told by email.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn join_farm(&self, caller: &Caller, farm_id: i32) -> Result<Detail, ServiceError> {
        let db = &*self.db_pool;
        let farm = farm::Entity::find_by_id(farm_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Farm", farm_id))?;

        let labourer = self
            .profile_of(caller.user_id())
            .await?
            .ok_or_else(|| ServiceError::BadRequest("Labourer profile not found.".to_string()))?;

        if let Some(message) = join_conflict(&labourer, farm.id) {
            return Err(ServiceError::Conflict(message.to_string()));
        }

        let owner = user::Entity::find_by_id(farm.owner_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::InternalError(format!("farm {} has no owner", farm.id)))?;

        let txn = db.begin().await?;
        let mut active: labourer::ActiveModel = labourer.into();
        active.farm_id = Set(Some(farm.id));
        active.status = Set(LabourerStatus::Pending);
        let saved = active.update(&txn).await?;

        self.notifier
            .send(EmailMessage::new(
                "New Labourer Request",
                format!(
                    "{} wants to join your farm, \"{}\". Go to your dashboard to approve or reject.",
                    caller.user.username, farm.name
                ),
                self.from_address.clone(),
                owner.email,
            ))
            .await?;
        txn.commit().await?;

        info!(labourer_id = saved.id, farm_id = farm.id, "join request sent");
        Ok(Detail::new("Request to join farm sent."))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn approve_labourer(&self, caller: &Caller, id: i32) -> Result<Detail, ServiceError> {
        let (labourer, farm) = self.load_pending_for_owner(caller, id).await?;
        let db = &*self.db_pool;

        let member = user::Entity::find_by_id(labourer.user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::InternalError(format!("labourer {} has no user", id)))?;

        let txn = db.begin().await?;
        let mut active: labourer::ActiveModel = labourer.into();
        active.status = Set(LabourerStatus::Approved);
        active.update(&txn).await?;

        self.notifier
            .send(EmailMessage::new(
                "Farm Join Request Approved",
                format!(
                    "Your request to join the farm \"{}\" has been approved.",
                    farm.name
                ),
                self.from_address.clone(),
                member.email,
            ))
            .await?;
        txn.commit().await?;

        info!(labourer_id = id, farm_id = farm.id, "labourer approved");
        Ok(Detail::new("Labourer approved."))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn reject_labourer(&self, caller: &Caller, id: i32) -> Result<Detail, ServiceError> {
        let (labourer, farm) = self.load_pending_for_owner(caller, id).await?;

        let mut active: labourer::ActiveModel = labourer.into();
        active.status = Set(LabourerStatus::Rejected);
        active.update(&*self.db_pool).await?;

        info!(labourer_id = id, farm_id = farm.id, "labourer rejected");
        Ok(Detail::new("Labourer rejected."))
    }

    async fn profile_of(&self, user_id: i32) -> Result<Option<labourer::Model>, ServiceError> {
        Ok(labourer::Entity::find()
            .filter(labourer::Column::UserId.eq(user_id))
            .one(&*self.db_pool)
            .await?)
    }

    /// Labourer `id` if it is on the caller's owned farm or is the caller's own profile.
    async fn load_in_scope(&self, caller: &Caller, id: i32) -> Result<labourer::Model, ServiceError> {
        let labourer = labourer::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Labourer", id))?;

        let on_owned_farm = caller.owned_farm_id().is_some() && labourer.farm_id == caller.owned_farm_id();
        let own_profile = caller.owned_farm_id().is_none() && labourer.user_id == caller.user_id();
        if on_owned_farm || own_profile {
            Ok(labourer)
        } else {
            Err(ServiceError::not_found("Labourer", id))
        }
    }

    async fn load_pending_for_owner(
        &self,
        caller: &Caller,
        id: i32,
    ) -> Result<(labourer::Model, farm::Model), ServiceError> {
        let labourer = self.load_in_scope(caller, id).await?;
        let farm = match (labourer.farm_id, caller.owned_farm()) {
            (Some(farm_id), Some(owned)) if owned.id == farm_id => owned.clone(),
            _ => {
                return Err(ServiceError::Forbidden(
                    "You are not the owner of this farm.".to_string(),
                ))
            }
        };

        if labourer.status != LabourerStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "Labourer request is already {}.",
                labourer.status
            )));
        }
        Ok((labourer, farm))
    }

    async fn to_view(&self, labourer: labourer::Model) -> Result<LabourerView, ServiceError> {
        let db = &*self.db_pool;
        let member = user::Entity::find_by_id(labourer.user_id).one(db).await?;
        let farm_name = match labourer.farm_id {
            Some(farm_id) => farm::Entity::find_by_id(farm_id)
                .one(db)
                .await?
                .map(|farm| farm.name),
            None => None,
        };
        let (user_name, user_email) = member
            .map(|u| (u.username, u.email))
            .unwrap_or_default();

        Ok(LabourerView {
            labourer,
            user_name,
            user_email,
            farm_name,
        })
    }
}

/// Reason a join request must be refused, if any.
pub fn join_conflict(labourer: &labourer::Model, target_farm: i32) -> Option<&'static str> {
    let current = labourer.farm_id?;
    match (current == target_farm, labourer.status) {
        (true, LabourerStatus::Pending) => Some("You have already sent a request to join this farm."),
        (true, LabourerStatus::Approved) => Some("You are already an approved member of this farm."),
        (false, LabourerStatus::Pending) => Some(
            "You have a pending request for another farm. Please wait for approval or rejection.",
        ),
        (false, LabourerStatus::Approved) => Some("You are already an approved member of another farm."),
        (_, LabourerStatus::Rejected) => None,
    }
}
