//! Seed data tool - populates the database with demo farms for exploring the insights
//!
//! Run with: cargo run --bin farmsense-seed -- seed --print-tokens
//!
//! Uses the same layered configuration as the server (`config/`, `APP__*`).
//! `seed` creates:
//! - 3 owners with their farms
//! - 5 labourers (one still pending)
//! - 6 drugs and 8 feeds
//! - 14 animals with a year of health/AMU history and six months of feed and yield records

use anyhow::{bail, Context};
use chrono::{Days, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rand::{rngs::ThreadRng, seq::SliceRandom, Rng};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use std::collections::BTreeMap;
use tracing::info;

use farmsense_api::{
    auth::{AuthConfig, AuthService},
    config::{load_config, AppConfig},
    db::{self, DbPool},
    entities::{
        amu_record, drug, farm, feed, feed_record,
        health_record::{self, EventType},
        labourer::{self, LabourerStatus},
        livestock::{self, Gender, HealthStatus},
        user, yield_record,
    },
};

#[derive(Parser)]
#[command(name = "farmsense-seed", about = "Demo data and token tooling for FarmSense", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear every table and load the demo farms
    Seed(SeedArgs),
    /// Print counts and per-farm statistics
    Verify,
    /// Insert a user and print a bearer token for it
    CreateUser(CreateUserArgs),
    /// Print a bearer token for an existing user
    Token(TokenArgs),
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long, help = "Print a bearer token for every seeded user")]
    print_tokens: bool,
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
}

#[derive(Args)]
struct TokenArgs {
    #[arg(long)]
    username: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let cfg = load_config().context("failed to load configuration")?;
    let db = db::establish_connection_from_app_config(&cfg).await?;
    db::run_migrations(&db).await?;

    match cli.command {
        Commands::Seed(args) => {
            let users = seed(&db).await?;
            if args.print_tokens {
                print_tokens(&cfg, &users)?;
            }
        }
        Commands::Verify => verify(&db).await?,
        Commands::CreateUser(args) => {
            let created = user::ActiveModel {
                username: Set(args.username),
                email: Set(args.email),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db)
            .await
            .context("failed to create user")?;
            info!("Created user {} (id {})", created.username, created.id);
            print_tokens(&cfg, &[created])?;
        }
        Commands::Token(args) => {
            let Some(found) = user::Entity::find()
                .filter(user::Column::Username.eq(args.username.as_str()))
                .one(&db)
                .await?
            else {
                bail!("no user named {}", args.username);
            };
            print_tokens(&cfg, &[found])?;
        }
    }

    Ok(())
}

fn print_tokens(cfg: &AppConfig, users: &[user::Model]) -> anyhow::Result<()> {
    let auth = AuthService::new(AuthConfig::from(cfg));
    for account in users {
        let token = auth.issue_token(account.id, &account.username)?;
        println!("{:<20} Bearer {}", account.username, token);
    }
    Ok(())
}

async fn seed(db: &DbPool) -> anyhow::Result<Vec<user::Model>> {
    info!("=== FarmSense Seed Data ===");
    clear_existing_data(db).await?;

    let (owners, farms) = create_farms_and_owners(db).await?;
    info!("  Created {} farms", farms.len());
    let labourers = create_labourers(db, &farms).await?;
    info!("  Created {} labourers", labourers.len());
    let drugs = create_drugs(db).await?;
    let feeds = create_feeds(db).await?;
    info!("  Created {} drugs and {} feeds", drugs.len(), feeds.len());
    let animals = create_livestock(db, &farms).await?;
    info!("  Created {} animals", animals.len());

    let today = Utc::now().date_naive();
    let (health, amu) = create_health_records(db, &animals, &drugs, today).await?;
    info!("  Created {} health records and {} AMU records", health, amu);
    let feedings = create_feed_records(db, &animals, &feeds, today).await?;
    info!("  Created {} feed records", feedings);
    let yields = create_yield_records(db, &animals, today).await?;
    info!("  Created {} yield records", yields);

    info!("=== Seed Data Complete ===");
    Ok(owners.into_iter().chain(labourers).collect())
}

async fn clear_existing_data(db: &DbPool) -> anyhow::Result<()> {
    info!("Clearing existing data...");
    amu_record::Entity::delete_many().exec(db).await?;
    health_record::Entity::delete_many().exec(db).await?;
    feed_record::Entity::delete_many().exec(db).await?;
    yield_record::Entity::delete_many().exec(db).await?;
    livestock::Entity::delete_many().exec(db).await?;
    labourer::Entity::delete_many().exec(db).await?;
    farm::Entity::delete_many().exec(db).await?;
    drug::Entity::delete_many().exec(db).await?;
    feed::Entity::delete_many().exec(db).await?;
    user::Entity::delete_many().exec(db).await?;
    Ok(())
}

async fn create_user(db: &DbPool, username: &str, email: &str) -> anyhow::Result<user::Model> {
    Ok(user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

async fn create_farms_and_owners(
    db: &DbPool,
) -> anyhow::Result<(Vec<user::Model>, Vec<farm::Model>)> {
    let farm_data = [
        ("greenpastures_farm", "owner@greenpastures.com", "Green Pastures Dairy Farm", "Nairobi, Kenya"),
        ("sunrise_poultry", "owner@sunrisepoultry.com", "Sunrise Poultry Farm", "Kampala, Uganda"),
        ("mountain_cattle", "owner@mountaincattle.com", "Mountain Cattle Ranch", "Arusha, Tanzania"),
    ];

    let mut owners = Vec::new();
    let mut farms = Vec::new();
    for (username, email, name, location) in farm_data {
        let owner = create_user(db, username, email).await?;
        let created = farm::ActiveModel {
            owner_id: Set(owner.id),
            name: Set(name.to_string()),
            location: Set(Some(location.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;
        owners.push(owner);
        farms.push(created);
    }
    Ok((owners, farms))
}

async fn create_labourers(db: &DbPool, farms: &[farm::Model]) -> anyhow::Result<Vec<user::Model>> {
    let labourer_data = [
        ("john_worker", "john@greenpastures.com", 0, LabourerStatus::Approved),
        ("mary_worker", "mary@greenpastures.com", 0, LabourerStatus::Approved),
        ("peter_worker", "peter@sunrisepoultry.com", 1, LabourerStatus::Approved),
        ("sarah_worker", "sarah@sunrisepoultry.com", 1, LabourerStatus::Pending),
        ("david_worker", "david@mountaincattle.com", 2, LabourerStatus::Approved),
    ];

    let mut users = Vec::new();
    for (username, email, farm_index, status) in labourer_data {
        let account = create_user(db, username, email).await?;
        labourer::ActiveModel {
            user_id: Set(account.id),
            farm_id: Set(farms.get(farm_index).map(|f| f.id)),
            status: Set(status),
            ..Default::default()
        }
        .insert(db)
        .await?;
        users.push(account);
    }
    Ok(users)
}

async fn create_drugs(db: &DbPool) -> anyhow::Result<Vec<drug::Model>> {
    let drug_data = [
        ("Oxytetracycline 20%", "Oxytetracycline", "Cattle", dec!(5.0), dec!(10.0), "Broad spectrum antibiotic for bacterial infections"),
        ("Penicillin G", "Benzylpenicillin", "Cattle", dec!(2.0), dec!(5.0), "For gram-positive bacterial infections"),
        ("Amoxicillin 15%", "Amoxicillin", "Poultry", dec!(1.0), dec!(3.0), "Beta-lactam antibiotic for respiratory infections"),
        ("Enrofloxacin 10%", "Enrofloxacin", "Poultry", dec!(0.5), dec!(2.0), "Fluoroquinolone for severe bacterial infections"),
        ("Ivermectin 1%", "Ivermectin", "Cattle", dec!(1.0), dec!(2.0), "Antiparasitic for internal and external parasites"),
        ("Meloxicam", "Meloxicam", "Cattle", dec!(0.5), dec!(1.0), "NSAID for pain relief and inflammation"),
    ];

    let mut drugs = Vec::new();
    for (name, ingredient, species, min, max, notes) in drug_data {
        let created = drug::ActiveModel {
            name: Set(name.to_string()),
            active_ingredient: Set(Some(ingredient.to_string())),
            species_target: Set(Some(species.to_string())),
            recommended_dosage_min: Set(Some(min)),
            recommended_dosage_max: Set(Some(max)),
            unit: Set(Some("ml".to_string())),
            notes: Set(Some(notes.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;
        drugs.push(created);
    }
    Ok(drugs)
}

async fn create_feeds(db: &DbPool) -> anyhow::Result<Vec<feed::Model>> {
    let feed_data = [
        ("Dairy Meal", dec!(45.0), "High protein feed for dairy cattle"),
        ("Maize Bran", dec!(25.0), "Energy-rich feed supplement"),
        ("Layers Mash", dec!(35.0), "Complete feed for laying hens"),
        ("Broiler Starter", dec!(40.0), "High protein feed for young broilers"),
        ("Hay", dec!(15.0), "Roughage for cattle"),
        ("Silage", dec!(20.0), "Fermented feed for cattle"),
        ("Wheat Bran", dec!(30.0), "Fiber-rich feed supplement"),
        ("Soybean Meal", dec!(55.0), "High protein supplement"),
    ];

    let mut feeds = Vec::new();
    for (name, cost, notes) in feed_data {
        let created = feed::ActiveModel {
            name: Set(name.to_string()),
            cost_per_kg: Set(Some(cost)),
            notes: Set(Some(notes.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;
        feeds.push(created);
    }
    Ok(feeds)
}

async fn create_livestock(db: &DbPool, farms: &[farm::Model]) -> anyhow::Result<Vec<livestock::Model>> {
    // (farm index, tag, species, breed, gender, date of birth, weight)
    let herd = [
        (0, "COW-001", "Cattle", "Holstein Friesian", Gender::F, "2020-03-15", dec!(450.0)),
        (0, "COW-002", "Cattle", "Holstein Friesian", Gender::F, "2019-07-22", dec!(480.0)),
        (0, "COW-003", "Cattle", "Jersey", Gender::F, "2021-01-10", dec!(380.0)),
        (0, "COW-004", "Cattle", "Holstein Friesian", Gender::F, "2018-11-05", dec!(520.0)),
        (0, "COW-005", "Cattle", "Holstein Friesian", Gender::F, "2020-09-18", dec!(460.0)),
        (1, "CHK-001", "Poultry", "Rhode Island Red", Gender::F, "2023-06-01", dec!(2.5)),
        (1, "CHK-002", "Poultry", "Rhode Island Red", Gender::F, "2023-06-15", dec!(2.3)),
        (1, "CHK-003", "Poultry", "Leghorn", Gender::F, "2023-05-20", dec!(2.1)),
        (1, "CHK-004", "Poultry", "Rhode Island Red", Gender::F, "2023-07-10", dec!(2.2)),
        (1, "CHK-005", "Poultry", "Leghorn", Gender::F, "2023-05-05", dec!(2.0)),
        (2, "BEEF-001", "Cattle", "Angus", Gender::M, "2021-04-12", dec!(600.0)),
        (2, "BEEF-002", "Cattle", "Hereford", Gender::F, "2020-08-30", dec!(550.0)),
        (2, "BEEF-003", "Cattle", "Angus", Gender::M, "2022-02-14", dec!(580.0)),
        (2, "BEEF-004", "Cattle", "Hereford", Gender::F, "2021-12-03", dec!(520.0)),
    ];

    let mut animals = Vec::new();
    for (farm_index, tag, species, breed, gender, born, weight) in herd {
        let Some(owner_farm) = farms.get(farm_index) else {
            bail!("farm {} was not created", farm_index);
        };
        let created = livestock::ActiveModel {
            farm_id: Set(owner_farm.id),
            tag_id: Set(tag.to_string()),
            species: Set(species.to_string()),
            breed: Set(breed.to_string()),
            date_of_birth: Set(NaiveDate::parse_from_str(born, "%Y-%m-%d")?),
            gender: Set(gender),
            health_status: Set(HealthStatus::Healthy),
            current_weight_kg: Set(Some(weight)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        animals.push(created);
    }
    Ok(animals)
}

fn days_ago(today: NaiveDate, rng: &mut ThreadRng, max_days: u64) -> NaiveDate {
    today - Days::new(rng.gen_range(1..=max_days))
}

fn decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default().round_dp(2)
}

/// Days before produce from a treated animal may be sold.
fn withdrawal_days(active_ingredient: Option<&str>) -> i32 {
    match active_ingredient {
        Some("Oxytetracycline") => 7,
        Some("Benzylpenicillin") => 3,
        Some("Amoxicillin") => 5,
        Some("Enrofloxacin") => 10,
        Some("Ivermectin") => 14,
        Some("Meloxicam") => 2,
        _ => 7,
    }
}

fn describe(event_type: EventType) -> (&'static [&'static str], &'static [&'static str]) {
    match event_type {
        EventType::Sickness => (
            &["Mastitis", "Respiratory infection", "Digestive upset", "Lameness", "Fever"],
            &["Recovered", "Under treatment", "Recovering"],
        ),
        EventType::Treatment => (
            &["Bacterial infection", "Parasitic infestation", "Injury", "Inflammation"],
            &["Completed", "Ongoing", "Recovered"],
        ),
        EventType::Vaccination => (
            &["Routine vaccination", "Booster vaccination", "Annual vaccination"],
            &["Successful", "No reactions"],
        ),
        EventType::CheckUp => (
            &["Routine health check", "Weight monitoring", "General examination"],
            &["Healthy", "Good condition", "Normal"],
        ),
    }
}

async fn create_health_records(
    db: &DbPool,
    animals: &[livestock::Model],
    drugs: &[drug::Model],
    today: NaiveDate,
) -> anyhow::Result<(usize, usize)> {
    let event_types = [
        EventType::Vaccination,
        EventType::Sickness,
        EventType::CheckUp,
        EventType::Treatment,
    ];
    let mut health_count = 0;
    let mut amu_count = 0;

    for animal in animals {
        let records = rand::thread_rng().gen_range(2..=5);
        for _ in 0..records {
            // ThreadRng is not Send, so draw everything before awaiting
            let (event_type, event_date, diagnosis, outcome, treatment) = {
                let mut rng = rand::thread_rng();
                let event_type = *event_types.choose(&mut rng).unwrap_or(&EventType::CheckUp);
                let (diagnoses, outcomes) = describe(event_type);
                let treatment = if event_type.involves_medication() && rng.gen_bool(0.7) {
                    let matching: Vec<&drug::Model> = drugs
                        .iter()
                        .filter(|d| d.species_target.as_deref() == Some(animal.species.as_str()))
                        .collect();
                    matching.choose(&mut rng).map(|chosen| {
                        let min = chosen.recommended_dosage_min.unwrap_or(dec!(1));
                        let max = chosen.recommended_dosage_max.unwrap_or(dec!(5));
                        let low: f64 = min.try_into().unwrap_or(1.0);
                        let high: f64 = max.try_into().unwrap_or(5.0);
                        let dose = rng.gen_range(low..=high.max(low));
                        (
                            (*chosen).clone(),
                            format!("{:.1} {}", dose, chosen.unit.as_deref().unwrap_or_default()),
                        )
                    })
                } else {
                    None
                };
                (
                    event_type,
                    days_ago(today, &mut rng, 365),
                    diagnoses.choose(&mut rng).copied().unwrap_or_default(),
                    outcomes.choose(&mut rng).copied().unwrap_or_default(),
                    treatment,
                )
            };

            let record = health_record::ActiveModel {
                livestock_id: Set(animal.id),
                event_type: Set(event_type),
                event_date: Set(event_date),
                notes: Set(Some(format!("Health event for {}", animal.tag_id))),
                diagnosis: Set(Some(diagnosis.to_string())),
                treatment_outcome: Set(Some(outcome.to_string())),
                ..Default::default()
            }
            .insert(db)
            .await?;
            health_count += 1;

            if let Some((chosen, dosage)) = treatment {
                amu_record::ActiveModel {
                    health_record_id: Set(record.id),
                    drug_id: Set(Some(chosen.id)),
                    dosage: Set(dosage),
                    withdrawal_period: Set(withdrawal_days(chosen.active_ingredient.as_deref())),
                    ..Default::default()
                }
                .insert(db)
                .await?;
                amu_count += 1;
            }
        }
    }
    Ok((health_count, amu_count))
}

async fn create_feed_records(
    db: &DbPool,
    animals: &[livestock::Model],
    feeds: &[feed::Model],
    today: NaiveDate,
) -> anyhow::Result<usize> {
    const CATTLE_FEEDS: [&str; 6] = ["Dairy Meal", "Maize Bran", "Hay", "Silage", "Wheat Bran", "Soybean Meal"];
    const POULTRY_FEEDS: [&str; 5] = ["Layers Mash", "Broiler Starter", "Maize Bran", "Wheat Bran", "Soybean Meal"];

    let mut count = 0;
    for animal in animals {
        let cattle = animal.species == "Cattle";
        let allowed: &[&str] = if cattle { &CATTLE_FEEDS } else { &POULTRY_FEEDS };
        let available: Vec<&feed::Model> = feeds
            .iter()
            .filter(|f| allowed.contains(&f.name.as_str()))
            .collect();

        let entries: Vec<_> = {
            let mut rng = rand::thread_rng();
            let records = rng.gen_range(15..=30);
            (0..records)
                .filter_map(|_| {
                    let chosen = *available.choose(&mut rng)?;
                    let quantity = if cattle {
                        rng.gen_range(5.0..15.0)
                    } else {
                        rng.gen_range(0.1..0.3)
                    };
                    let price = match chosen.cost_per_kg.and_then(|c| f64::try_from(c).ok()) {
                        Some(cost) => cost + rng.gen_range(-5.0..5.0),
                        None => rng.gen_range(20.0..60.0),
                    };
                    Some((chosen.clone(), decimal(quantity), decimal(price), days_ago(today, &mut rng, 180)))
                })
                .collect()
        };

        for (chosen, quantity, price, date) in entries {
            feed_record::ActiveModel {
                livestock_id: Set(animal.id),
                feed_type: Set(chosen.name.clone()),
                feed_id: Set(Some(chosen.id)),
                quantity_kg: Set(quantity),
                price_per_kg: Set(Some(price)),
                date: Set(date),
                ..Default::default()
            }
            .insert(db)
            .await?;
            count += 1;
        }
    }
    Ok(count)
}

async fn create_yield_records(
    db: &DbPool,
    animals: &[livestock::Model],
    today: NaiveDate,
) -> anyhow::Result<usize> {
    let mut count = 0;
    for animal in animals {
        let (yield_type, unit) = if animal.species == "Cattle" {
            ("Milk", "liters")
        } else {
            ("Eggs", "units")
        };

        let entries: Vec<(Decimal, NaiveDate)> = {
            let mut rng = rand::thread_rng();
            let records = rng.gen_range(60..=120);
            (0..records)
                .map(|_| {
                    let quantity = match (animal.species.as_str(), animal.breed.as_str()) {
                        ("Cattle", "Holstein Friesian") => rng.gen_range(20.0..35.0),
                        ("Cattle", "Jersey") => rng.gen_range(15.0..25.0),
                        ("Cattle", _) => rng.gen_range(10.0..20.0),
                        _ => rng.gen_range(0.0..1.0),
                    };
                    (decimal(quantity), days_ago(today, &mut rng, 180))
                })
                .filter(|(quantity, _)| !quantity.is_zero())
                .collect()
        };

        for (quantity, date) in entries {
            yield_record::ActiveModel {
                livestock_id: Set(animal.id),
                yield_type: Set(yield_type.to_string()),
                quantity: Set(quantity),
                unit: Set(unit.to_string()),
                date: Set(date),
                ..Default::default()
            }
            .insert(db)
            .await?;
            count += 1;
        }
    }
    Ok(count)
}

async fn verify(db: &DbPool) -> anyhow::Result<()> {
    println!("=== DATABASE SEEDING VERIFICATION ===\n");
    println!("Users:          {}", user::Entity::find().count(db).await?);
    println!("Farms:          {}", farm::Entity::find().count(db).await?);
    println!("Labourers:      {}", labourer::Entity::find().count(db).await?);
    println!("Livestock:      {}", livestock::Entity::find().count(db).await?);
    println!("Drugs:          {}", drug::Entity::find().count(db).await?);
    println!("Feeds:          {}", feed::Entity::find().count(db).await?);
    println!("Health Records: {}", health_record::Entity::find().count(db).await?);
    println!("AMU Records:    {}", amu_record::Entity::find().count(db).await?);
    println!("Feed Records:   {}", feed_record::Entity::find().count(db).await?);
    println!("Yield Records:  {}\n", yield_record::Entity::find().count(db).await?);

    let animals = livestock::Entity::find().all(db).await?;

    println!("=== FARM DETAILS ===");
    let farms = farm::Entity::find().find_also_related(user::Entity).all(db).await?;
    for (owned, owner) in &farms {
        let labourers = labourer::Entity::find()
            .filter(labourer::Column::FarmId.eq(owned.id))
            .count(db)
            .await?;
        println!("{} ({})", owned.name, owned.location.as_deref().unwrap_or("-"));
        println!("   Owner: {}", owner.as_ref().map(|o| o.username.as_str()).unwrap_or("-"));
        println!(
            "   Livestock: {} animals",
            animals.iter().filter(|a| a.farm_id == owned.id).count()
        );
        println!("   Labourers: {}\n", labourers);
    }

    println!("=== LIVESTOCK BY SPECIES ===");
    let mut species: BTreeMap<&str, usize> = BTreeMap::new();
    for animal in &animals {
        *species.entry(animal.species.as_str()).or_default() += 1;
    }
    for (name, count) in species {
        println!("{}: {} animals", name, count);
    }

    println!("\n=== AMU RECORDS PER FARM ===");
    for (owned, _) in &farms {
        let amu = amu_record::Entity::find()
            .inner_join(health_record::Entity)
            .filter(
                health_record::Column::LivestockId.is_in(
                    animals
                        .iter()
                        .filter(|a| a.farm_id == owned.id)
                        .map(|a| a.id),
                ),
            )
            .count(db)
            .await?;
        println!("{}: {} AMU records", owned.name, amu);
    }

    println!("\n=== FEED & YIELD DATA ===");
    let feed_records = feed_record::Entity::find().all(db).await?;
    let feed_cost: Decimal = feed_records
        .iter()
        .map(|r| r.quantity_kg * r.price_per_kg.unwrap_or_default())
        .sum();
    let yields = yield_record::Entity::find().all(db).await?;
    let total_yield: Decimal = yields.iter().map(|r| r.quantity).sum();
    println!("Total Feed Cost: {:.2}", feed_cost);
    println!("Total Yield:     {:.2} units", total_yield);

    println!("\n=== RECENT ACTIVITY (Last 30 days) ===");
    let since = Utc::now().date_naive() - Days::new(30);
    let recent_health = health_record::Entity::find()
        .filter(health_record::Column::EventDate.gte(since))
        .count(db)
        .await?;
    println!("Recent Health Records: {}", recent_health);
    println!(
        "Recent Feed Records:   {}",
        feed_records.iter().filter(|r| r.date >= since).count()
    );
    println!(
        "Recent Yield Records:  {}",
        yields.iter().filter(|r| r.date >= since).count()
    );

    println!("\nDatabase verification complete.");
    Ok(())
}
