use super::{labels, palette_color, time_period, Chart, Dataset, Month};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const PALETTE: [&str; 10] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#FF6384", "#C9CBCF",
    "#4BC0C0", "#FF9F40",
];

/// One drug administration, dated by its health event.
#[derive(Debug, Clone, PartialEq)]
pub struct AmuRow {
    pub event_date: NaiveDate,
    /// `(drug id, drug name)` when a drug was recorded.
    pub drug: Option<(i32, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmuSummary {
    pub total_treatments: usize,
    pub unique_drugs: usize,
    pub time_period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmuChartData {
    pub chart_data: Chart<u32>,
    pub summary: AmuSummary,
}

/// Monthly administration counts, one series per drug.
pub fn amu_chart(rows: &[AmuRow], buckets: &[Month]) -> AmuChartData {
    // drug id -> (name, month -> count); BTreeMap keeps series in drug id order
    let mut per_drug: BTreeMap<i32, (String, BTreeMap<Month, u32>)> = BTreeMap::new();
    for row in rows {
        if let Some((drug_id, name)) = &row.drug {
            let entry = per_drug
                .entry(*drug_id)
                .or_insert_with(|| (name.clone(), BTreeMap::new()));
            *entry.1.entry(Month::of(row.event_date)).or_insert(0) += 1;
        }
    }

    let datasets = per_drug
        .values()
        .enumerate()
        .map(|(index, (name, counts))| {
            let data = buckets
                .iter()
                .map(|month| counts.get(month).copied().unwrap_or(0))
                .collect();
            Dataset::new(name.clone(), data, &palette_color(&PALETTE, index))
                .border_width(1)
                .fill(false)
        })
        .collect();

    let unique_drugs = rows
        .iter()
        .filter_map(|row| row.drug.as_ref().map(|(id, _)| *id))
        .collect::<BTreeSet<_>>()
        .len();

    AmuChartData {
        chart_data: Chart {
            labels: labels(buckets),
            datasets,
        },
        summary: AmuSummary {
            total_treatments: rows.len(),
            unique_drugs,
            time_period: time_period(buckets),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::super::month_buckets;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(date: NaiveDate, drug: Option<(i32, &str)>) -> AmuRow {
        AmuRow {
            event_date: date,
            drug: drug.map(|(id, name)| (id, name.to_string())),
        }
    }

    #[test]
    fn counts_treatments_across_drugs_and_months() {
        let buckets = month_buckets(date(2024, 1, 16), date(2025, 1, 15));
        let rows = vec![
            row(date(2024, 3, 2), Some((7, "Oxytetracycline"))),
            row(date(2024, 3, 20), Some((7, "Oxytetracycline"))),
            row(date(2024, 5, 1), Some((2, "Ivermectin"))),
            row(date(2024, 8, 9), Some((7, "Oxytetracycline"))),
        ];

        let chart = amu_chart(&rows, &buckets);
        assert_eq!(chart.summary.total_treatments, 4);
        assert_eq!(chart.summary.unique_drugs, 2);
        assert_eq!(chart.summary.time_period, "Jan 2024 to Jan 2025");

        let datasets = &chart.chart_data.datasets;
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].label, "Ivermectin");
        assert_eq!(datasets[1].label, "Oxytetracycline");
        assert_eq!(datasets[0].background_color, "#FF6384");
        assert_eq!(datasets[1].background_color, "#36A2EB");

        let march = buckets.iter().position(|m| m.label() == "Mar 2024").unwrap();
        assert_eq!(datasets[1].data[march], 2);
        assert_eq!(datasets[1].data.iter().sum::<u32>(), 3);
        assert_eq!(datasets[0].data.len(), 13);
    }

    #[test]
    fn records_without_drug_only_count_as_treatments() {
        let buckets = month_buckets(date(2024, 1, 1), date(2024, 2, 1));
        let rows = vec![row(date(2024, 1, 5), None), row(date(2024, 1, 6), Some((1, "Penicillin")))];

        let chart = amu_chart(&rows, &buckets);
        assert_eq!(chart.summary.total_treatments, 2);
        assert_eq!(chart.summary.unique_drugs, 1);
        assert_eq!(chart.chart_data.datasets.len(), 1);
        assert_eq!(chart.chart_data.datasets[0].data, vec![1, 0]);
    }

    #[test]
    fn empty_window_keeps_labels() {
        let buckets = month_buckets(date(2024, 1, 1), date(2024, 3, 1));
        let chart = amu_chart(&[], &buckets);
        assert_eq!(chart.chart_data.labels, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
        assert!(chart.chart_data.datasets.is_empty());
        assert_eq!(chart.summary.total_treatments, 0);
    }
}
