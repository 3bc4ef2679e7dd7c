// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Month grouping for the results view.
//!
//! Records are sorted by parsed issue date (newest first, stable) and then
//! bucketed by calendar (year, month). Records whose issue date is missing or
//! unparsable sort after every dated record and join no bucket; the results
//! view lists buckets only.

use chrono::Datelike;
use serde::Serialize;
use std::cmp::Ordering;

use crate::models::FitTestRecord;
use crate::time_utils::parse_mmddyyyy;

/// One calendar month of records.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthBucket {
    /// Human-readable header, e.g. "March 2024"
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub count: usize,
    /// Member records, already in newest-first order
    pub records: Vec<FitTestRecord>,
}

/// Group records into month buckets, newest month first.
pub fn group_by_month(records: &[FitTestRecord]) -> Vec<MonthBucket> {
    let mut dated: Vec<(Option<chrono::NaiveDate>, &FitTestRecord)> = records
        .iter()
        .map(|record| (parse_mmddyyyy(&record.issue_date), record))
        .collect();

    // Stable sort: ties and dateless records keep their source order
    dated.sort_by(|a, b| match (a.0, b.0) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut buckets: Vec<MonthBucket> = Vec::new();
    for (date, record) in dated {
        // Dateless records contribute to no bucket
        let Some(date) = date else { continue };
        let (year, month) = (date.year(), date.month());

        // Sorted input keeps each month contiguous
        let fits_last = buckets
            .last()
            .is_some_and(|bucket| bucket.year == year && bucket.month == month);
        if !fits_last {
            buckets.push(MonthBucket {
                label: date.format("%B %Y").to_string(),
                year,
                month,
                count: 0,
                records: Vec::new(),
            });
        }

        let bucket = buckets.last_mut().expect("bucket exists");
        bucket.records.push(record.clone());
        bucket.count += 1;
    }

    buckets
}
