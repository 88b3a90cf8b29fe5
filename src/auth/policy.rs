//! Object-level access decisions.
//!
//! Every farm-scoped record resolves to exactly one farm; who may do what to it
//! depends only on the caller's relation to that farm and the record kind.

use super::Caller;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Farm,
    Labourer,
    Livestock,
    HealthRecord,
    AmuRecord,
    FeedRecord,
    YieldRecord,
}

impl ResourceKind {
    /// Record kinds approved labourers may write (but not delete).
    fn labourer_writable(self) -> bool {
        matches!(self, ResourceKind::FeedRecord | ResourceKind::YieldRecord)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// How an object leads to its owning farm, tried in this order: the object is
/// a farm, it has a farm of its own, or it hangs off a livestock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FarmRef {
    Farm(i32),
    Direct(Option<i32>),
    ViaLivestock(Option<i32>),
}

impl FarmRef {
    pub fn farm_id(self) -> Option<i32> {
        match self {
            FarmRef::Farm(id) => Some(id),
            FarmRef::Direct(farm) | FarmRef::ViaLivestock(farm) => farm,
        }
    }
}

/// Pure decision: may `caller` perform `action` on a `kind` object owned by `farm`?
pub fn is_allowed(caller: &Caller, kind: ResourceKind, farm: FarmRef, action: Action) -> bool {
    if kind == ResourceKind::Farm {
        return matches!(farm, FarmRef::Farm(id) if caller.owns(id));
    }

    let Some(farm_id) = farm.farm_id() else {
        return false;
    };

    if caller.owns(farm_id) {
        return true;
    }

    if !caller.is_approved_labourer_of(farm_id) {
        return false;
    }

    match action {
        Action::Read => true,
        Action::Create | Action::Update => kind.labourer_writable(),
        Action::Delete => false,
    }
}

/// [`is_allowed`] as a `Result`, failing with 403.
pub fn authorize(
    caller: &Caller,
    kind: ResourceKind,
    farm: FarmRef,
    action: Action,
) -> Result<(), ServiceError> {
    if is_allowed(caller, kind, farm, action) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = caller.user_id(),
            %kind,
            %action,
            "access denied"
        );
        Err(ServiceError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CallerRole;
    use crate::entities::{farm, labourer, labourer::LabourerStatus, user};
    use rstest::rstest;

    const FARM: i32 = 10;
    const OTHER_FARM: i32 = 20;

    fn caller(role: CallerRole) -> Caller {
        Caller::new(
            user::Model {
                id: 1,
                username: "tunde".into(),
                email: "tunde@farm.test".into(),
                created_at: chrono::Utc::now(),
            },
            role,
        )
    }

    fn owner() -> Caller {
        caller(CallerRole::Owner(farm::Model {
            id: FARM,
            owner_id: 1,
            name: "Sunrise Poultry".into(),
            location: None,
        }))
    }

    fn labourer(status: LabourerStatus) -> Caller {
        caller(CallerRole::Labourer(labourer::Model {
            id: 3,
            user_id: 1,
            farm_id: Some(FARM),
            status,
        }))
    }

    #[rstest]
    #[case(Action::Read)]
    #[case(Action::Update)]
    #[case(Action::Delete)]
    fn farm_objects_are_owner_only(#[case] action: Action) {
        assert!(is_allowed(&owner(), ResourceKind::Farm, FarmRef::Farm(FARM), action));
        assert!(!is_allowed(&owner(), ResourceKind::Farm, FarmRef::Farm(OTHER_FARM), action));
        assert!(!is_allowed(
            &labourer(LabourerStatus::Approved),
            ResourceKind::Farm,
            FarmRef::Farm(FARM),
            action
        ));
    }

    #[rstest]
    #[case(ResourceKind::Livestock, Action::Delete)]
    #[case(ResourceKind::HealthRecord, Action::Update)]
    #[case(ResourceKind::AmuRecord, Action::Create)]
    #[case(ResourceKind::FeedRecord, Action::Delete)]
    #[case(ResourceKind::YieldRecord, Action::Read)]
    fn owner_has_full_access_on_own_farm(#[case] kind: ResourceKind, #[case] action: Action) {
        assert!(is_allowed(&owner(), kind, FarmRef::ViaLivestock(Some(FARM)), action));
        assert!(!is_allowed(&owner(), kind, FarmRef::ViaLivestock(Some(OTHER_FARM)), action));
    }

    #[rstest]
    #[case(ResourceKind::Livestock, Action::Read, true)]
    #[case(ResourceKind::Livestock, Action::Update, false)]
    #[case(ResourceKind::Livestock, Action::Delete, false)]
    #[case(ResourceKind::HealthRecord, Action::Read, true)]
    #[case(ResourceKind::HealthRecord, Action::Create, false)]
    #[case(ResourceKind::AmuRecord, Action::Update, false)]
    #[case(ResourceKind::Labourer, Action::Read, true)]
    #[case(ResourceKind::FeedRecord, Action::Create, true)]
    #[case(ResourceKind::FeedRecord, Action::Update, true)]
    #[case(ResourceKind::FeedRecord, Action::Delete, false)]
    #[case(ResourceKind::YieldRecord, Action::Create, true)]
    #[case(ResourceKind::YieldRecord, Action::Update, true)]
    #[case(ResourceKind::YieldRecord, Action::Delete, false)]
    fn approved_labourer_matrix(
        #[case] kind: ResourceKind,
        #[case] action: Action,
        #[case] expected: bool,
    ) {
        let caller = labourer(LabourerStatus::Approved);
        assert_eq!(
            is_allowed(&caller, kind, FarmRef::ViaLivestock(Some(FARM)), action),
            expected
        );
    }

    #[rstest]
    #[case(LabourerStatus::Pending)]
    #[case(LabourerStatus::Rejected)]
    fn unapproved_labourers_cannot_touch_records(#[case] status: LabourerStatus) {
        let caller = labourer(status);
        for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
            assert!(!is_allowed(
                &caller,
                ResourceKind::FeedRecord,
                FarmRef::ViaLivestock(Some(FARM)),
                action
            ));
        }
    }

    #[test]
    fn unresolvable_farm_fails_closed() {
        assert!(!is_allowed(&owner(), ResourceKind::Labourer, FarmRef::Direct(None), Action::Read));
        assert!(!is_allowed(
            &caller(CallerRole::Guest),
            ResourceKind::Livestock,
            FarmRef::Direct(Some(FARM)),
            Action::Read
        ));
    }

    #[test]
    fn authorize_maps_denial_to_forbidden() {
        let err = authorize(
            &labourer(LabourerStatus::Approved),
            ResourceKind::Livestock,
            FarmRef::Direct(Some(FARM)),
            Action::Delete,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
