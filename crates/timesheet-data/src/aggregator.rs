//! Monthly aggregation of timesheet records.
//!
//! Groups records by `(developer, year, month)` and derives the developer ×
//! month pivot and the headline metrics shown above it.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use timesheet_core::models::{MonthlyBucket, PivotTable, Record, YearMonth};

// ── AggregateFilter ───────────────────────────────────────────────────────────

/// Record selection applied before grouping.  The default selects everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateFilter {
    /// Developers to keep; `None` keeps all.
    pub developers: Option<HashSet<String>>,
    /// Inclusive `(from, to)` date bounds.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl AggregateFilter {
    pub fn with_developers<I, S>(mut self, developers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.developers = Some(developers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_range = Some((from, to));
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(devs) = &self.developers {
            if !devs.contains(&record.developer) {
                return false;
            }
        }
        match self.date_range {
            Some((from, to)) => record.date >= from && record.date <= to,
            None => true,
        }
    }
}

// ── SummaryMetrics ────────────────────────────────────────────────────────────

/// Headline numbers for a set of buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_hours: f64,
    /// Mean of the bucket totals.
    pub average_monthly_hours: f64,
    pub active_developers: usize,
    pub months_covered: usize,
}

// ── MonthlyAggregator ─────────────────────────────────────────────────────────

/// Aggregates records into monthly buckets.
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    /// Group the records passing `filter` into buckets ordered by
    /// `(year, month, developer)` ascending.
    ///
    /// The result does not depend on the order of `records`.
    pub fn aggregate(records: &[Record], filter: &AggregateFilter) -> Vec<MonthlyBucket> {
        let mut map: BTreeMap<(YearMonth, String), MonthlyBucket> = BTreeMap::new();
        for record in records.iter().filter(|r| filter.matches(r)) {
            map.entry((record.year_month, record.developer.clone()))
                .or_insert_with(|| MonthlyBucket::new(record.developer.clone(), record.year_month))
                .add_record(record);
        }
        map.into_values().collect()
    }

    /// Developer × month matrix of `total_hours`.
    ///
    /// Rows are developers ascending, columns months in calendar order; a
    /// developer without a bucket in some month reads `0.0` there.
    pub fn pivot(buckets: &[MonthlyBucket]) -> PivotTable {
        let developers: Vec<String> = buckets
            .iter()
            .map(|b| b.developer.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let months: Vec<YearMonth> = buckets
            .iter()
            .map(|b| b.year_month)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut cells = vec![vec![0.0; months.len()]; developers.len()];
        for bucket in buckets {
            // Both keys come from `buckets`, so the lookups always succeed.
            let row = developers.binary_search(&bucket.developer);
            let col = months.binary_search(&bucket.year_month);
            if let (Ok(row), Ok(col)) = (row, col) {
                cells[row][col] += bucket.total_hours;
            }
        }

        let column_totals = (0..months.len())
            .map(|c| cells.iter().map(|row| row[c]).sum())
            .collect();

        PivotTable {
            labels: months.iter().map(YearMonth::label).collect(),
            developers,
            months,
            cells,
            column_totals,
        }
    }

    /// Totals and averages over `buckets`.
    pub fn summarize(buckets: &[MonthlyBucket]) -> SummaryMetrics {
        if buckets.is_empty() {
            return SummaryMetrics::default();
        }
        let total_hours: f64 = buckets.iter().map(|b| b.total_hours).sum();
        let active_developers = buckets
            .iter()
            .map(|b| b.developer.as_str())
            .collect::<HashSet<_>>()
            .len();
        let months_covered = buckets
            .iter()
            .map(|b| b.year_month)
            .collect::<HashSet<_>>()
            .len();

        SummaryMetrics {
            total_hours,
            average_monthly_hours: total_hours / buckets.len() as f64,
            active_developers,
            months_covered,
        }
    }

    /// Sorted, de-duplicated developer names.
    pub fn developers(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.developer.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest record date, `None` for an empty set.
    pub fn date_span(records: &[Record]) -> Option<(NaiveDate, NaiveDate)> {
        let min = records.iter().map(|r| r.date).min()?;
        let max = records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// Records passing `filter`, in their original order.
    pub fn filter_records(records: &[Record], filter: &AggregateFilter) -> Vec<Record> {
        records.iter().filter(|r| filter.matches(r)).cloned().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
