use super::{labels, palette_color, time_period, to_chart_value, Dataset, Month};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

const PALETTE: [&str; 5] = ["#36A2EB", "#FF6384", "#4BC0C0", "#9966FF", "#FF9F40"];

#[derive(Debug, Clone, PartialEq)]
pub struct YieldRow {
    pub date: NaiveDate,
    pub yield_type: String,
    pub quantity: Decimal,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldSummary {
    pub total_yield: f64,
    pub types: Vec<String>,
    pub time_period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset<f64>>,
    pub summary: YieldSummary,
}

/// Monthly production per yield type, optionally restricted to one type.
pub fn yield_chart(rows: &[YieldRow], buckets: &[Month], yield_type: Option<&str>) -> YieldChartData {
    let mut ordered: Vec<&YieldRow> = rows
        .iter()
        .filter(|row| yield_type.map_or(true, |wanted| row.yield_type == wanted))
        .collect();
    ordered.sort_by(|a, b| {
        Month::of(a.date)
            .cmp(&Month::of(b.date))
            .then_with(|| a.yield_type.cmp(&b.yield_type))
    });

    let unit = ordered.first().map(|row| row.unit.clone()).unwrap_or_default();

    // yield type -> month -> quantity, types in order of first appearance
    let mut per_type: Vec<(&str, HashMap<Month, Decimal>)> = Vec::new();
    for row in &ordered {
        let kind = row.yield_type.as_str();
        let slot = match per_type.iter().position(|(seen, _)| *seen == kind) {
            Some(index) => index,
            None => {
                per_type.push((kind, HashMap::new()));
                per_type.len() - 1
            }
        };
        *per_type[slot].1.entry(Month::of(row.date)).or_default() += row.quantity;
    }

    let total: Decimal = ordered.iter().map(|row| row.quantity).sum();

    let datasets = per_type
        .iter()
        .enumerate()
        .map(|(index, (kind, per_month))| {
            let data = buckets
                .iter()
                .map(|month| to_chart_value(per_month.get(month).copied().unwrap_or_default()))
                .collect();
            Dataset::new(
                format!("{kind} ({unit})"),
                data,
                &palette_color(&PALETTE, index),
            )
            .fill(false)
        })
        .collect();

    YieldChartData {
        labels: labels(buckets),
        datasets,
        summary: YieldSummary {
            total_yield: to_chart_value(total),
            types: per_type.iter().map(|(kind, _)| kind.to_string()).collect(),
            time_period: time_period(buckets),
        },
    }
}
