pub mod amu_record;
pub mod drug;
pub mod farm;
pub mod feed;
pub mod feed_record;
pub mod health_record;
pub mod labourer;
pub mod livestock;
pub mod user;
pub mod yield_record;
