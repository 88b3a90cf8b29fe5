//! Monthly chart data for AMU, feed spend and yield.
//!
//! Bucketing and aggregation are pure functions over rows that the service has
//! already loaded; [`InsightsService`] only fetches and scopes.

pub mod amu;
pub mod feed;
pub mod yields;

use chrono::{Datelike, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    auth::Caller,
    db::DbPool,
    entities::{amu_record, drug, feed as feed_entity, feed_record, health_record, livestock, yield_record},
    errors::ServiceError,
};

/// Days covered by every chart, ending today.
pub const WINDOW_DAYS: u64 = 365;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Chart label, e.g. "Jan 2024".
    pub fn label(self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|first| first.format("%b %Y").to_string())
            .unwrap_or_default()
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Calendar months touched by `[start, end]`, oldest first.
///
/// Steps by jumping 32 days past the first of the month and truncating back to
/// day 1, which always lands in the next month.
pub fn month_buckets(start: NaiveDate, end: NaiveDate) -> Vec<Month> {
    let mut buckets = Vec::new();
    let mut current = start;
    while current <= end {
        buckets.push(Month::of(current));
        match first_of_month(current).checked_add_days(Days::new(32)) {
            Some(next) => current = first_of_month(next),
            None => break,
        }
    }
    buckets
}

/// `[today - 365 days, today]`.
pub fn trailing_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Days::new(WINDOW_DAYS), today)
}

/// "Jan 2024 to Jan 2025"; empty when there are no buckets.
pub fn time_period(buckets: &[Month]) -> String {
    match (buckets.first(), buckets.last()) {
        (Some(first), Some(last)) => format!("{} to {}", first.label(), last.label()),
        _ => String::new(),
    }
}

pub fn labels(buckets: &[Month]) -> Vec<String> {
    buckets.iter().map(|m| m.label()).collect()
}

/// Decimal to a chart number, rounded to cents.
pub(crate) fn to_chart_value(value: Decimal) -> f64 {
    value.round_dp(2).to_string().parse().unwrap_or(0.0)
}

/// One chart series; optional keys are omitted when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset<T> {
    pub label: String,
    pub data: Vec<T>,
    pub background_color: String,
    pub border_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl<T> Dataset<T> {
    pub fn new(label: impl Into<String>, data: Vec<T>, color: &str) -> Self {
        Self {
            label: label.into(),
            data,
            background_color: color.to_string(),
            border_color: color.to_string(),
            border_width: None,
            fill: None,
            stack: None,
        }
    }

    pub fn border_width(mut self, width: u32) -> Self {
        self.border_width = Some(width);
        self
    }

    pub fn fill(mut self, fill: bool) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn stack(mut self, stack: &str) -> Self {
        self.stack = Some(stack.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart<T> {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset<T>>,
}

/// Color for the `index`-th series, cycling through `palette`.
pub(crate) fn palette_color(palette: &[&str], index: usize) -> String {
    palette[index % palette.len()].to_string()
}

/// Loads chart rows for one livestock the caller can see.
#[derive(Clone)]
pub struct InsightsService {
    db_pool: Arc<DbPool>,
}

impl InsightsService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    fn window() -> (NaiveDate, NaiveDate) {
        trailing_window(Utc::now().date_naive())
    }

    async fn require_livestock(&self, caller: &Caller, livestock_id: i32) -> Result<livestock::Model, ServiceError> {
        crate::services::visible_livestock(&*self.db_pool, caller, livestock_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Livestock", livestock_id))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn amu_chart(&self, caller: &Caller, livestock_id: i32) -> Result<amu::AmuChartData, ServiceError> {
        self.require_livestock(caller, livestock_id).await?;
        let (start, end) = Self::window();

        let events: HashMap<i32, NaiveDate> = health_record::Entity::find()
            .filter(health_record::Column::LivestockId.eq(livestock_id))
            .filter(health_record::Column::EventDate.between(start, end))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|record| (record.id, record.event_date))
            .collect();

        let rows: Vec<amu::AmuRow> = if events.is_empty() {
            Vec::new()
        } else {
            amu_record::Entity::find()
                .filter(amu_record::Column::HealthRecordId.is_in(events.keys().copied()))
                .order_by_asc(amu_record::Column::Id)
                .find_also_related(drug::Entity)
                .all(&*self.db_pool)
                .await?
                .into_iter()
                .filter_map(|(record, drug)| {
                    events.get(&record.health_record_id).map(|event_date| amu::AmuRow {
                        event_date: *event_date,
                        drug: drug.map(|d| (d.id, d.name)),
                    })
                })
                .collect()
        };

        debug!(rows = rows.len(), "aggregating amu chart");
        Ok(amu::amu_chart(&rows, &month_buckets(start, end)))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn feed_chart(&self, caller: &Caller, livestock_id: i32) -> Result<feed::FeedChartData, ServiceError> {
        self.require_livestock(caller, livestock_id).await?;
        let (start, end) = Self::window();

        let rows = feed_record::Entity::find()
            .filter(feed_record::Column::LivestockId.eq(livestock_id))
            .filter(feed_record::Column::Date.between(start, end))
            .order_by_asc(feed_record::Column::Id)
            .find_also_related(feed_entity::Entity)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|(record, catalog)| feed::FeedRow {
                date: record.date,
                quantity_kg: record.quantity_kg,
                price_per_kg: record.price_per_kg,
                feed_type: record.feed_type,
                feed_name: catalog.as_ref().map(|f| f.name.clone()),
                catalog_cost_per_kg: catalog.and_then(|f| f.cost_per_kg),
            })
            .collect::<Vec<_>>();

        debug!(rows = rows.len(), "aggregating feed chart");
        Ok(feed::feed_chart(&rows, &month_buckets(start, end)))
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id()))]
    pub async fn yield_chart(
        &self,
        caller: &Caller,
        livestock_id: i32,
        yield_type: Option<&str>,
    ) -> Result<yields::YieldChartData, ServiceError> {
        self.require_livestock(caller, livestock_id).await?;
        let (start, end) = Self::window();

        let mut query = yield_record::Entity::find()
            .filter(yield_record::Column::LivestockId.eq(livestock_id))
            .filter(yield_record::Column::Date.between(start, end));
        if let Some(yield_type) = yield_type {
            query = query.filter(yield_record::Column::YieldType.eq(yield_type));
        }

        let rows = query
            .order_by_asc(yield_record::Column::Id)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|record| yields::YieldRow {
                date: record.date,
                yield_type: record.yield_type,
                quantity: record.quantity,
                unit: record.unit,
            })
            .collect::<Vec<_>>();

        debug!(rows = rows.len(), "aggregating yield chart");
        Ok(yields::yield_chart(&rows, &month_buckets(start, end), yield_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn trailing_year_spans_thirteen_months() {
        let (start, end) = trailing_window(date(2025, 1, 15));
        assert_eq!(start, date(2024, 1, 16));

        let buckets = month_buckets(start, end);
        assert_eq!(buckets.len(), 13);
        assert_eq!(buckets.first().unwrap().label(), "Jan 2024");
        assert_eq!(buckets.last().unwrap().label(), "Jan 2025");
        assert_eq!(time_period(&buckets), "Jan 2024 to Jan 2025");
    }

    #[test]
    fn month_end_start_does_not_skip_february() {
        let buckets = month_buckets(date(2023, 1, 31), date(2023, 3, 1));
        assert_eq!(
            buckets,
            vec![
                Month { year: 2023, month: 1 },
                Month { year: 2023, month: 2 },
                Month { year: 2023, month: 3 },
            ]
        );
    }

    #[test]
    fn single_day_window_has_one_bucket() {
        let buckets = month_buckets(date(2024, 6, 30), date(2024, 6, 30));
        assert_eq!(buckets, vec![Month { year: 2024, month: 6 }]);
        assert!(month_buckets(date(2024, 7, 1), date(2024, 6, 30)).is_empty());
    }

    #[test]
    fn datasets_omit_unset_keys() {
        let value = serde_json::to_value(Dataset::new("Milk (liters)", vec![1.0], "#36A2EB").fill(false)).unwrap();
        assert_eq!(value["backgroundColor"], "#36A2EB");
        assert_eq!(value["fill"], false);
        assert!(value.get("stack").is_none());
        assert!(value.get("borderWidth").is_none());
    }

    fn contains_leap_day(start: NaiveDate, end: NaiveDate) -> bool {
        (start.year()..=end.year()).any(|y| {
            NaiveDate::from_ymd_opt(y, 2, 29)
                .map(|leap| leap >= start && leap <= end)
                .unwrap_or(false)
        })
    }

    proptest! {
        #[test]
        fn year_window_yields_thirteen_ordered_months(offset in 0i64..20_000) {
            let today = date(1990, 1, 1) + chrono::Duration::days(offset);
            let (start, end) = trailing_window(today);
            prop_assume!(!contains_leap_day(start, end));

            let buckets = month_buckets(start, end);
            prop_assert_eq!(buckets.len(), 13);
            prop_assert!(buckets.windows(2).all(|pair| pair[0] < pair[1]));
            prop_assert_eq!(buckets[0], Month::of(start));
            prop_assert_eq!(buckets[12], Month::of(end));
        }
    }
}
