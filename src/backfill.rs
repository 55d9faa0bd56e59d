//! Filling in time buckets that have no rows.
//!
//! Grouping by a truncated date only returns the periods that have data. A
//! [`TimeBuckets`] collaborator walks the whole series between the first and
//! last period (or an explicit range) and inserts the default value for every
//! period that is missing, once per combination of the other group parts.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};
use crate::expression::Sql;
use crate::relation::Relation;
use crate::value::{GroupKey, GroupValue, Scalar};

/// Post-processes decoded results before any transform runs.
pub trait Backfill {
    /// May insert keys carrying `default` and may reorder `results`.
    fn process_result(
        &self,
        relation: &dyn Relation,
        results: IndexMap<GroupKey, GroupValue>,
        default: GroupValue,
    ) -> CalcResult<IndexMap<GroupKey, GroupValue>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    fn keyword(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    /// Grouping expression putting `column` into its period, as a DATE.
    pub fn sql_expr(self, column: &str, week_start: Weekday) -> Sql {
        let shift = week_shift(week_start);
        if self == Period::Week && shift > 0 {
            // date_trunc weeks start on Monday; move the boundary
            return Sql::new(format!(
                "CAST(date_trunc('week', {column} + INTERVAL '{shift} days') - INTERVAL '{shift} days' AS DATE)"
            ));
        }
        Sql::new(format!(
            "CAST(date_trunc('{}', {column}) AS DATE)",
            self.keyword()
        ))
    }

    /// First day of the period containing `date`.
    pub fn truncate(self, date: NaiveDate, week_start: Weekday) -> NaiveDate {
        let first = match self {
            Period::Day => Some(date),
            Period::Week => {
                let back = (date.weekday().num_days_from_monday() + 7
                    - week_start.num_days_from_monday())
                    % 7;
                date.checked_sub_days(Days::new(u64::from(back)))
            }
            Period::Month => date.with_day(1),
            Period::Quarter => NaiveDate::from_ymd_opt(date.year(), (date.month0() / 3) * 3 + 1, 1),
            Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        };
        first.unwrap_or(date)
    }

    /// First day of the following period; `None` past the end of the calendar.
    pub fn succ(self, first: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::Day => first.succ_opt(),
            Period::Week => first.checked_add_days(Days::new(7)),
            Period::Month => first.checked_add_months(Months::new(1)),
            Period::Quarter => first.checked_add_months(Months::new(3)),
            Period::Year => first.checked_add_months(Months::new(12)),
        }
    }
}

fn week_shift(week_start: Weekday) -> u32 {
    (7 - week_start.num_days_from_monday()) % 7
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Period {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            other => Err(CalcError::config(format!("unknown period '{other}'"))),
        }
    }
}

/// Backfill for one date-bucket part of the group key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBuckets {
    period: Period,
    position: usize,
    week_start: Weekday,
    range: Option<(NaiveDate, NaiveDate)>,
}

impl TimeBuckets {
    /// `position` is the bucket's index among the grouping expressions.
    pub fn new(period: Period, position: usize) -> Self {
        TimeBuckets {
            period,
            position,
            week_start: Weekday::Mon,
            range: None,
        }
    }

    pub fn week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    /// Fill from `start` through `end` even where the data stops short.
    pub fn range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.range = Some((start, end));
        self
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn series_bounds<'a>(
        &self,
        keys: impl Iterator<Item = &'a GroupKey>,
        width: usize,
        others: &mut IndexSet<Vec<Scalar>>,
    ) -> Option<(NaiveDate, NaiveDate)> {
        let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
        for key in keys {
            let mut parts = key.clone().into_parts();
            if parts.len() != width {
                continue;
            }
            let Some(date) = parts[self.position].as_date() else {
                continue;
            };
            parts.remove(self.position);
            others.insert(parts);
            bounds = Some(match bounds {
                Some((first, last)) => (first.min(date), last.max(date)),
                None => (date, date),
            });
        }
        self.range.or(bounds)
    }
}

impl Backfill for TimeBuckets {
    fn process_result(
        &self,
        relation: &dyn Relation,
        mut results: IndexMap<GroupKey, GroupValue>,
        default: GroupValue,
    ) -> CalcResult<IndexMap<GroupKey, GroupValue>> {
        let width = relation.group_values().len();
        if self.position >= width {
            return Err(CalcError::Backfill {
                message: format!(
                    "time bucket is grouping expression #{} but only {width} are active",
                    self.position
                ),
            });
        }

        let mut others = IndexSet::new();
        let Some((start, end)) = self.series_bounds(results.keys(), width, &mut others) else {
            return Ok(results);
        };
        if width == 1 {
            others.insert(Vec::new());
        }

        let mut filled = IndexMap::with_capacity(results.len());
        let mut inserted = 0usize;
        let mut bucket = Some(self.period.truncate(start, self.week_start));
        while let Some(date) = bucket.filter(|d| *d <= end) {
            for other in &others {
                let mut parts = other.clone();
                parts.insert(self.position, Scalar::Date(date));
                let key = GroupKey::from_parts(parts);
                let value = results.shift_remove(&key).unwrap_or_else(|| {
                    inserted += 1;
                    default.clone()
                });
                filled.insert(key, value);
            }
            bucket = self.period.succ(date);
        }
        debug!(
            "backfilled {inserted} empty {} bucket(s) between {start} and {end}",
            self.period
        );

        // keys outside the series (NULL dates, out of range) keep trailing slots
        filled.extend(results);
        Ok(filled)
    }
}
