use super::{labels, palette_color, time_period, to_chart_value, Chart, Dataset, Month};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

const SPEND_COLOR: &str = "#1976d2";
const PALETTE: [&str; 8] = [
    "#1976d2", "#2e7d32", "#ed6c02", "#d32f2f", "#6d4c41", "#00897b", "#7b1fa2", "#5c6bc0",
];

/// A feeding with its optional catalog entry resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRow {
    pub date: NaiveDate,
    pub quantity_kg: Decimal,
    pub price_per_kg: Option<Decimal>,
    pub feed_type: String,
    pub feed_name: Option<String>,
    pub catalog_cost_per_kg: Option<Decimal>,
}

impl FeedRow {
    /// Quantity times the record's own price, else the catalog price, else zero.
    pub fn cost(&self) -> Decimal {
        let price = self
            .price_per_kg
            .or(self.catalog_cost_per_kg)
            .unwrap_or(Decimal::ZERO);
        self.quantity_kg * price
    }

    fn breakdown_key(&self) -> String {
        match (&self.feed_name, self.feed_type.trim()) {
            (Some(name), _) => name.clone(),
            (None, feed_type) if !feed_type.is_empty() => feed_type.to_string(),
            _ => "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSummary {
    pub total_spend: f64,
    pub avg_monthly_spend: f64,
    pub time_period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedChartData {
    pub spend_chart: Chart<f64>,
    pub breakdown_chart: Chart<f64>,
    pub summary: FeedSummary,
}

/// Monthly spend plus a stacked per-feed breakdown.
pub fn feed_chart(rows: &[FeedRow], buckets: &[Month]) -> FeedChartData {
    let mut ordered: Vec<&FeedRow> = rows.iter().collect();
    // named feeds before ad-hoc ones within a month
    ordered.sort_by(|a, b| {
        Month::of(a.date)
            .cmp(&Month::of(b.date))
            .then_with(|| match (&a.feed_name, &b.feed_name) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.feed_type.cmp(&b.feed_type))
    });

    let mut monthly: HashMap<Month, Decimal> = HashMap::new();
    let mut series: Vec<(String, HashMap<Month, Decimal>)> = Vec::new();
    for row in ordered {
        let month = Month::of(row.date);
        let cost = row.cost();
        *monthly.entry(month).or_default() += cost;

        let key = row.breakdown_key();
        let position = match series.iter().position(|(label, _)| *label == key) {
            Some(position) => position,
            None => {
                series.push((key, HashMap::new()));
                series.len() - 1
            }
        };
        *series[position].1.entry(month).or_default() += cost;
    }

    let spend: Vec<Decimal> = buckets
        .iter()
        .map(|month| monthly.get(month).copied().unwrap_or_default())
        .collect();
    let total: Decimal = spend.iter().copied().sum();
    let average = if buckets.is_empty() {
        Decimal::ZERO
    } else {
        total / Decimal::from(buckets.len())
    };

    let breakdown = series
        .iter()
        .enumerate()
        .map(|(index, (label, per_month))| {
            let data = buckets
                .iter()
                .map(|month| to_chart_value(per_month.get(month).copied().unwrap_or_default()))
                .collect();
            Dataset::new(label.clone(), data, &palette_color(&PALETTE, index)).stack("feed")
        })
        .collect();

    FeedChartData {
        spend_chart: Chart {
            labels: labels(buckets),
            datasets: vec![Dataset::new(
                "Total Spend (₦)",
                spend.into_iter().map(to_chart_value).collect(),
                SPEND_COLOR,
            )
            .fill(false)],
        },
        breakdown_chart: Chart {
            labels: labels(buckets),
            datasets: breakdown,
        },
        summary: FeedSummary {
            total_spend: to_chart_value(total),
            avg_monthly_spend: to_chart_value(average),
            time_period: time_period(buckets),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::super::month_buckets;
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(
        date: NaiveDate,
        quantity_kg: Decimal,
        price_per_kg: Option<Decimal>,
        feed: Option<(&str, Option<Decimal>)>,
        feed_type: &str,
    ) -> FeedRow {
        FeedRow {
            date,
            quantity_kg,
            price_per_kg,
            feed_type: feed_type.to_string(),
            feed_name: feed.map(|(name, _)| name.to_string()),
            catalog_cost_per_kg: feed.and_then(|(_, cost)| cost),
        }
    }

    #[test]
    fn cost_prefers_record_price_then_catalog() {
        let own = row(date(2024, 5, 1), dec!(2), Some(dec!(10)), Some(("Hay", Some(dec!(50)))), "Forage");
        let catalog = row(date(2024, 5, 1), dec!(2), None, Some(("Hay", Some(dec!(50)))), "Forage");
        let neither = row(date(2024, 5, 1), dec!(2), None, None, "Forage");

        assert_eq!(own.cost(), dec!(20));
        assert_eq!(catalog.cost(), dec!(100));
        assert_eq!(neither.cost(), Decimal::ZERO);
    }

    #[test]
    fn same_month_records_sum_into_one_bucket() {
        let buckets = month_buckets(date(2024, 4, 1), date(2024, 6, 30));
        let rows = vec![
            row(date(2024, 5, 3), dec!(5), Some(dec!(20)), None, "Hay"),
            row(date(2024, 5, 18), dec!(3), Some(dec!(30)), None, "Hay"),
        ];

        let chart = feed_chart(&rows, &buckets);
        assert_eq!(chart.spend_chart.datasets[0].label, "Total Spend (₦)");
        assert_eq!(chart.spend_chart.datasets[0].data, vec![0.0, 190.0, 0.0]);
        assert_eq!(chart.summary.total_spend, 190.0);
        assert_eq!(chart.summary.avg_monthly_spend, 63.33);
        assert_eq!(chart.breakdown_chart.datasets.len(), 1);
        assert_eq!(chart.breakdown_chart.datasets[0].data, vec![0.0, 190.0, 0.0]);
    }

    #[test]
    fn breakdown_keys_on_catalog_name_then_type() {
        let buckets = month_buckets(date(2024, 1, 1), date(2024, 2, 28));
        let rows = vec![
            row(date(2024, 2, 1), dec!(1), Some(dec!(4)), None, ""),
            row(date(2024, 1, 9), dec!(2), None, None, "Silage"),
            row(date(2024, 1, 2), dec!(4), None, Some(("Layer Mash", Some(dec!(50)))), "Concentrate"),
        ];

        let chart = feed_chart(&rows, &buckets);
        let labels: Vec<_> = chart
            .breakdown_chart
            .datasets
            .iter()
            .map(|d| d.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Layer Mash", "Silage", "Unknown"]);
        assert_eq!(chart.breakdown_chart.datasets[0].data, vec![200.0, 0.0]);
        assert_eq!(chart.breakdown_chart.datasets[1].data, vec![0.0, 0.0]);
        assert_eq!(chart.breakdown_chart.datasets[2].data, vec![0.0, 4.0]);
        assert_eq!(chart.breakdown_chart.datasets[1].stack.as_deref(), Some("feed"));
        assert_eq!(chart.summary.total_spend, 204.0);
    }

    #[test]
    fn empty_rows_report_zero_spend() {
        let buckets = month_buckets(date(2024, 1, 16), date(2025, 1, 15));
        let chart = feed_chart(&[], &buckets);
        assert_eq!(chart.spend_chart.datasets[0].data, vec![0.0; 13]);
        assert!(chart.breakdown_chart.datasets.is_empty());
        assert_eq!(chart.summary.avg_monthly_spend, 0.0);
    }
}
