//! Prompt text for the generative model.

use crate::{
    entities::{drug, livestock},
    services::{amu_records::AmuRecordView, health_records::HealthRecordView},
};
use std::fmt::Write;

pub const INSIGHTS_SYSTEM_INSTRUCTION: &str = "You are an expert veterinary assistant specializing in livestock health and antimicrobial usage (AMU) analysis.";

/// Field guide handed to the model for one voice-fillable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSchema {
    pub description: &'static str,
    pub fields: &'static str,
    pub example: &'static str,
}

pub const LIVESTOCK_FORM: FormSchema = FormSchema {
    description: "\
- tag_id: Animal identification tag/ID
- species: Animal species (cow, buffalo, goat, sheep, chicken, pig)
- breed: Animal breed name
- gender: Gender (M for male, F for female)
- health_status: Health status (healthy, sick, recovering)
- current_weight_kg: Weight in kilograms
- date_of_birth: Birth date in YYYY-MM-DD format",
    fields: "\
- tag_id: String (required) - Animal identification
- species: String (required) - Animal species
- breed: String (required) - Animal breed
- gender: String (required) - M or F
- health_status: String (required) - healthy, sick, or recovering
- current_weight_kg: Decimal (optional) - Weight in kg
- date_of_birth: Date (required) - Birth date",
    example: r#"{
  "tag_id": "COW-001",
  "species": "cow",
  "breed": "Holstein",
  "gender": "F",
  "health_status": "healthy",
  "current_weight_kg": 500,
  "date_of_birth": "2023-01-15"
}"#,
};

pub const HEALTH_FORM: FormSchema = FormSchema {
    description: "\
- livestock: Livestock ID or tag
- event_type: Event type (vaccination, sickness, check-up, treatment)
- event_date: Event date in YYYY-MM-DD format
- notes: Additional notes
- diagnosis: Medical diagnosis
- treatment_outcome: Treatment outcome (recovered, ongoing, completed)",
    fields: "\
- livestock: String (required) - Livestock ID
- event_type: String (required) - vaccination, sickness, check-up, treatment
- event_date: Date (required) - Event date
- notes: String (optional) - Additional notes
- diagnosis: String (optional) - Medical diagnosis
- treatment_outcome: String (optional) - Treatment outcome",
    example: r#"{
  "livestock": "COW-001",
  "event_type": "vaccination",
  "event_date": "2024-01-15",
  "notes": "Routine vaccination",
  "diagnosis": "Preventive care",
  "treatment_outcome": "completed"
}"#,
};

pub const FEED_RECORD_FORM: FormSchema = FormSchema {
    description: "\
- livestock: Livestock ID or tag
- feed_type: Type of feed (hay, grass, silage, concentrate, grain, etc.)
- feed: Feed name or brand
- quantity_kg: Quantity in kilograms
- price_per_kg: Price per kilogram
- date: Feeding date in YYYY-MM-DD format",
    fields: "\
- livestock: String (required) - Livestock ID
- feed_type: String (required) - Feed type
- feed: String (required) - Feed name
- quantity_kg: Decimal (required) - Quantity in kg
- price_per_kg: Decimal (required) - Price per kg
- date: Date (required) - Feeding date",
    example: r#"{
  "livestock": "COW-001",
  "feed_type": "hay",
  "feed": "Alfalfa hay",
  "quantity_kg": 10.0,
  "price_per_kg": 50.0,
  "date": "2024-01-15"
}"#,
};

pub const YIELD_RECORD_FORM: FormSchema = FormSchema {
    description: "\
- livestock: Livestock ID or tag (e.g., COW-123)
- yield_type: Type of yield (milk, eggs, wool, meat, etc.)
- quantity: Yield quantity (numeric)
- unit: Unit of measure (e.g., liters, kg, pieces)
- quality_grade: Quality grade (A, B, C) (optional)
- date: Yield date (accept natural formats like 9 26 2023 or YYYY-MM-DD)
- notes: Additional notes (optional)",
    fields: "\
- livestock: String (required) - Livestock ID
- yield_type: String (required) - Yield type
- quantity: Decimal (required) - Yield quantity
- unit: String (required) - Unit of measure (liters, kg, pieces)
- quality_grade: String (optional) - Quality grade
- date: Date (required) - Yield date in YYYY-MM-DD
- notes: String (optional) - Additional notes",
    example: r#"{
  "livestock": "COW-123",
  "yield_type": "milk",
  "quantity": 15,
  "unit": "liters",
  "quality_grade": "A",
  "date": "2023-09-26",
  "notes": "Morning milking"
}"#,
};

pub const DRUG_FORM: FormSchema = FormSchema {
    description: "\
- name: Drug name
- active_ingredient: Active ingredient
- unit: Measurement unit (e.g., ml, mg, tablet)
- notes: Additional notes (e.g., manufacturer, remarks)",
    fields: "\
- name: String (required) - Drug name
- active_ingredient: String (required) - Active ingredient
- unit: String (optional) - Measurement unit
- notes: String (optional) - Notes or manufacturer details",
    example: r#"{
  "name": "Penicillin",
  "active_ingredient": "Penicillin",
  "unit": "ml",
  "notes": "Manufactured by ABC Pharma"
}"#,
};

pub const FEED_FORM: FormSchema = FormSchema {
    description: "\
- name: Feed name
- cost_per_kg: Price per kilogram
- notes: Additional notes or remarks (optional)",
    fields: "\
- name: String (required) - Feed name
- cost_per_kg: Decimal (required) - Price per kg
- notes: String (optional) - Additional notes or remarks",
    example: r#"{
  "name": "Sunflower seeds",
  "cost_per_kg": 500.0,
  "notes": "Do not buy them; they are expensive."
}"#,
};

/// Schema for `form_type`; anything unrecognised is treated as a livestock form.
pub fn form_schema(form_type: &str) -> &'static FormSchema {
    match form_type {
        "health" => &HEALTH_FORM,
        "feed_record" => &FEED_RECORD_FORM,
        "yield_record" => &YIELD_RECORD_FORM,
        "drug" => &DRUG_FORM,
        "feed" => &FEED_FORM,
        _ => &LIVESTOCK_FORM,
    }
}

pub fn voice_prompt(transcript: &str, form_type: &str, language: &str) -> String {
    let schema = form_schema(form_type);
    format!(
        "You are an expert livestock management assistant. I need you to parse the following voice transcript and extract {form_type} information in a structured JSON format.
Voice Transcript: \"{transcript}\"

The transcript language code is \"{language}\". If the transcript is not in English, first translate it to English accurately, then extract the fields.

Please analyze this transcript and extract the following information:
{description}

Expected fields:
{fields}

Important:
- Return ONLY a valid JSON object.
- Do NOT add markdown formatting like ```json.

Example response format:
{example}
",
        description = schema.description,
        fields = schema.fields,
        example = schema.example,
    )
}

fn display_or_none<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}

pub fn insights_prompt(
    animal: &livestock::Model,
    health_records: &[HealthRecordView],
    amu_records: &[AmuRecordView],
    drugs: &[drug::Model],
) -> String {
    let health_json = serde_json::to_string_pretty(health_records).unwrap_or_default();
    let amu_json = serde_json::to_string_pretty(amu_records).unwrap_or_default();

    let mut prompt = format!(
        "Analyze the following data for a livestock animal and provide insights on AMU (Antimicrobial Usage).
Determine if the current drug dosages are correct based on recommended ranges and animal weight.
If not correct, suggest adjustments (e.g., bring the dosage up or down by X quantity).
Also, provide any additional relevant insights about the animal's health and drug usage.

Livestock Details:
- Species: {species}
- Breed: {breed}
- Gender: {gender}
- Current Weight (kg): {weight}
- Health Status: {health_status}

Recent Health Records:
{health_json}

Recent AMU Records:
{amu_json}

Recommended Drug Information (if available in AMU records):
",
        species = animal.species,
        breed = animal.breed,
        gender = animal.gender,
        weight = display_or_none(animal.current_weight_kg),
        health_status = animal.health_status,
    );

    for drug in drugs {
        let _ = write!(
            prompt,
            "- Drug Name: {}\n- Active Ingredient: {}\n- Species Target: {}\n- Recommended Dosage Min: {} {}\n",
            drug.name,
            display_or_none(drug.active_ingredient.as_deref()),
            display_or_none(drug.species_target.as_deref()),
            display_or_none(drug.recommended_dosage_min),
            drug.unit.as_deref().unwrap_or_default(),
        );
    }

    prompt
}
