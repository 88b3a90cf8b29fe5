use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // users
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // farms
        manager
            .create_table(
                Table::create()
                    .table(Farms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Farms::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Farms::OwnerId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Farms::Name).string_len(150).not_null())
                    .col(ColumnDef::new(Farms::Location).string_len(255).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_farms_owner")
                            .from(Farms::Table, Farms::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // labourers
        manager
            .create_table(
                Table::create()
                    .table(Labourers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Labourers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Labourers::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Labourers::FarmId).integer().null())
                    .col(
                        ColumnDef::new(Labourers::Status)
                            .string_len(10)
                            .not_null()
                            .default("pending"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_labourers_user")
                            .from(Labourers::Table, Labourers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_labourers_farm")
                            .from(Labourers::Table, Labourers::FarmId)
                            .to(Farms::Table, Farms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // livestock
        manager
            .create_table(
                Table::create()
                    .table(Livestock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Livestock::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Livestock::FarmId).integer().not_null())
                    .col(
                        ColumnDef::new(Livestock::TagId)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Livestock::Species).string_len(100).not_null())
                    .col(ColumnDef::new(Livestock::Breed).string_len(100).not_null())
                    .col(ColumnDef::new(Livestock::DateOfBirth).date().not_null())
                    .col(ColumnDef::new(Livestock::Gender).string_len(1).not_null())
                    .col(
                        ColumnDef::new(Livestock::HealthStatus)
                            .string_len(20)
                            .not_null()
                            .default("healthy"),
                    )
                    .col(
                        ColumnDef::new(Livestock::CurrentWeightKg)
                            .decimal_len(7, 2)
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_livestock_farm")
                            .from(Livestock::Table, Livestock::FarmId)
                            .to(Farms::Table, Farms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // drugs
        manager
            .create_table(
                Table::create()
                    .table(Drugs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Drugs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Drugs::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Drugs::ActiveIngredient).string_len(100).null())
                    .col(ColumnDef::new(Drugs::SpeciesTarget).string_len(100).null())
                    .col(
                        ColumnDef::new(Drugs::RecommendedDosageMin)
                            .decimal_len(7, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Drugs::RecommendedDosageMax)
                            .decimal_len(7, 2)
                            .null(),
                    )
                    .col(ColumnDef::new(Drugs::Unit).string_len(50).null())
                    .col(ColumnDef::new(Drugs::Notes).text().null())
                    .to_owned(),
            )
            .await?;

        // feeds
        manager
            .create_table(
                Table::create()
                    .table(Feeds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feeds::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Feeds::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Feeds::CostPerKg).decimal_len(10, 2).null())
                    .col(ColumnDef::new(Feeds::Notes).text().null())
                    .to_owned(),
            )
            .await?;

        // health_records
        manager
            .create_table(
                Table::create()
                    .table(HealthRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HealthRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HealthRecords::LivestockId).integer().not_null())
                    .col(
                        ColumnDef::new(HealthRecords::EventType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(HealthRecords::EventDate).date().not_null())
                    .col(ColumnDef::new(HealthRecords::Notes).text().null())
                    .col(ColumnDef::new(HealthRecords::Diagnosis).string_len(255).null())
                    .col(
                        ColumnDef::new(HealthRecords::TreatmentOutcome)
                            .string_len(20)
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_health_records_livestock")
                            .from(HealthRecords::Table, HealthRecords::LivestockId)
                            .to(Livestock::Table, Livestock::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // amu_records
        manager
            .create_table(
                Table::create()
                    .table(AmuRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AmuRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AmuRecords::HealthRecordId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AmuRecords::DrugId).integer().null())
                    .col(ColumnDef::new(AmuRecords::Dosage).string_len(50).not_null())
                    .col(
                        ColumnDef::new(AmuRecords::WithdrawalPeriod)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_amu_records_health_record")
                            .from(AmuRecords::Table, AmuRecords::HealthRecordId)
                            .to(HealthRecords::Table, HealthRecords::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_amu_records_drug")
                            .from(AmuRecords::Table, AmuRecords::DrugId)
                            .to(Drugs::Table, Drugs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // feed_records
        manager
            .create_table(
                Table::create()
                    .table(FeedRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeedRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeedRecords::LivestockId).integer().not_null())
                    .col(ColumnDef::new(FeedRecords::FeedType).string_len(100).not_null())
                    .col(ColumnDef::new(FeedRecords::FeedId).integer().null())
                    .col(
                        ColumnDef::new(FeedRecords::QuantityKg)
                            .decimal_len(7, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeedRecords::PricePerKg)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .col(ColumnDef::new(FeedRecords::Date).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feed_records_livestock")
                            .from(FeedRecords::Table, FeedRecords::LivestockId)
                            .to(Livestock::Table, Livestock::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feed_records_feed")
                            .from(FeedRecords::Table, FeedRecords::FeedId)
                            .to(Feeds::Table, Feeds::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // yield_records
        manager
            .create_table(
                Table::create()
                    .table(YieldRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(YieldRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(YieldRecords::LivestockId).integer().not_null())
                    .col(ColumnDef::new(YieldRecords::YieldType).string_len(50).not_null())
                    .col(
                        ColumnDef::new(YieldRecords::Quantity)
                            .decimal_len(7, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(YieldRecords::Unit).string_len(20).not_null())
                    .col(ColumnDef::new(YieldRecords::Date).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_yield_records_livestock")
                            .from(YieldRecords::Table, YieldRecords::LivestockId)
                            .to(Livestock::Table, Livestock::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // insights queries filter every record family by livestock and date
        manager
            .create_index(
                Index::create()
                    .name("idx_health_records_livestock_date")
                    .table(HealthRecords::Table)
                    .col(HealthRecords::LivestockId)
                    .col(HealthRecords::EventDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feed_records_livestock_date")
                    .table(FeedRecords::Table)
                    .col(FeedRecords::LivestockId)
                    .col(FeedRecords::Date)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_yield_records_livestock_date")
                    .table(YieldRecords::Table)
                    .col(YieldRecords::LivestockId)
                    .col(YieldRecords::Date)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(YieldRecords::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FeedRecords::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AmuRecords::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HealthRecords::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Feeds::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Drugs::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Livestock::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Labourers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Farms::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Username,
    Email,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Farms {
    Table,
    Id,
    OwnerId,
    Name,
    Location,
}

#[derive(DeriveIden)]
pub enum Labourers {
    Table,
    Id,
    UserId,
    FarmId,
    Status,
}

#[derive(DeriveIden)]
pub enum Livestock {
    Table,
    Id,
    FarmId,
    TagId,
    Species,
    Breed,
    DateOfBirth,
    Gender,
    HealthStatus,
    CurrentWeightKg,
}

#[derive(DeriveIden)]
pub enum Drugs {
    Table,
    Id,
    Name,
    ActiveIngredient,
    SpeciesTarget,
    RecommendedDosageMin,
    RecommendedDosageMax,
    Unit,
    Notes,
}

#[derive(DeriveIden)]
pub enum Feeds {
    Table,
    Id,
    Name,
    CostPerKg,
    Notes,
}

#[derive(DeriveIden)]
pub enum HealthRecords {
    Table,
    Id,
    LivestockId,
    EventType,
    EventDate,
    Notes,
    Diagnosis,
    TreatmentOutcome,
}

#[derive(DeriveIden)]
pub enum AmuRecords {
    Table,
    Id,
    HealthRecordId,
    DrugId,
    Dosage,
    WithdrawalPeriod,
}

#[derive(DeriveIden)]
pub enum FeedRecords {
    Table,
    Id,
    LivestockId,
    FeedType,
    FeedId,
    QuantityKg,
    PricePerKg,
    Date,
}

#[derive(DeriveIden)]
pub enum YieldRecords {
    Table,
    Id,
    LivestockId,
    YieldType,
    Quantity,
    Unit,
    Date,
}
