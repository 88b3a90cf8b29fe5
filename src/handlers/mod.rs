pub mod amu_records;
pub mod common;
pub mod drugs;
pub mod farms;
pub mod feed_records;
pub mod feeds;
pub mod health;
pub mod health_records;
pub mod insights;
pub mod labourers;
pub mod livestock;
pub mod users;
pub mod yield_records;

use crate::{
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    notifications::Notifier,
    services::{
        ai::{AiService, GenerativeClient},
        amu_records::AmuRecordService,
        drugs::DrugService,
        farms::FarmService,
        feed_records::FeedRecordService,
        feeds::FeedService,
        health_records::HealthRecordService,
        insights::InsightsService,
        labourers::LabourerService,
        livestock::LivestockService,
        users::UserService,
        yield_records::YieldRecordService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub farms: Arc<FarmService>,
    pub labourers: Arc<LabourerService>,
    pub livestock: Arc<LivestockService>,
    pub drugs: Arc<DrugService>,
    pub feeds: Arc<FeedService>,
    pub health_records: Arc<HealthRecordService>,
    pub amu_records: Arc<AmuRecordService>,
    pub feed_records: Arc<FeedRecordService>,
    pub yield_records: Arc<YieldRecordService>,
    pub users: Arc<UserService>,
    pub insights: Arc<InsightsService>,
    pub ai: Arc<AiService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let generative_client = Arc::new(GenerativeClient::new(config)?);

        Ok(Self {
            farms: Arc::new(FarmService::new(db_pool.clone())),
            labourers: Arc::new(LabourerService::new(
                db_pool.clone(),
                notifier,
                config.notification_from.clone(),
            )),
            livestock: Arc::new(LivestockService::new(db_pool.clone())),
            drugs: Arc::new(DrugService::new(db_pool.clone())),
            feeds: Arc::new(FeedService::new(db_pool.clone())),
            health_records: Arc::new(HealthRecordService::new(db_pool.clone())),
            amu_records: Arc::new(AmuRecordService::new(db_pool.clone())),
            feed_records: Arc::new(FeedRecordService::new(db_pool.clone())),
            yield_records: Arc::new(YieldRecordService::new(db_pool.clone())),
            users: Arc::new(UserService::new(db_pool.clone())),
            insights: Arc::new(InsightsService::new(db_pool.clone())),
            ai: Arc::new(AiService::new(db_pool, generative_client)),
        })
    }
}
