use chrono::NaiveDate;
use log::{debug, warn};

use crate::backfill::{Backfill, Period, TimeBuckets};
use crate::database::Database;
use crate::engine::Engine;
use crate::error::{CalcError, CalcResult};
use crate::expression::Sql;
use crate::relation::{Plucked, Relation};
use crate::request::Request;
use crate::value::{Calculated, GroupValue, Scalar};

/// Double-quotes an identifier for DuckDB.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A table, usable directly as its unfiltered, ungrouped queryset.
#[derive(Clone)]
pub struct Table<'db> {
    db: &'db Database,
    name: String,
}

impl<'db> Table<'db> {
    pub(crate) fn new(db: &'db Database, name: impl Into<String>) -> Self {
        Table {
            db,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn all(&self) -> QuerySet<'db> {
        QuerySet {
            db: self.db,
            from: quote_ident(&self.name),
            filters: Vec::new(),
            groups: Vec::new(),
            order: Vec::new(),
            buckets: None,
        }
    }

    pub fn calculate_all(&self, request: &Request) -> CalcResult<Calculated<GroupValue>> {
        self.all().calculate_all(request)
    }

    pub fn calculate_all_with<T, E, F>(
        &self,
        request: &Request,
        transform: F,
    ) -> Result<Calculated<T>, E>
    where
        F: FnMut(GroupValue) -> Result<T, E>,
        E: From<CalcError>,
    {
        self.all().calculate_all_with(request, transform)
    }
}

/// Filter, grouping and ordering state over one table.
///
/// Builder methods consume and return the queryset, so a chain reads like
/// `orders.all().filter("cents > 100").group("currency")`.
#[derive(Clone)]
pub struct QuerySet<'db> {
    db: &'db Database,
    from: String,
    filters: Vec<Sql>,
    groups: Vec<Sql>,
    order: Vec<Sql>,
    buckets: Option<TimeBuckets>,
}

impl<'db> QuerySet<'db> {
    pub fn filter(mut self, condition: impl Into<Sql>) -> Self {
        self.filters.push(condition.into());
        self
    }

    pub fn group(mut self, expr: impl Into<Sql>) -> Self {
        self.groups.push(expr.into());
        self
    }

    pub fn order(mut self, expr: impl Into<Sql>) -> Self {
        self.order.push(expr.into());
        self
    }

    /// Groups by the period `column` falls in. Unless series are disabled in
    /// the settings, periods without rows come back holding the default value.
    pub fn group_by_period(mut self, period: Period, column: &str) -> Self {
        let db = self.db;
        let settings = db.settings();
        if let Some(previous) = &self.buckets {
            warn!(
                "replacing time buckets by {} with {period}; the earlier bucket stays a plain group",
                previous.period()
            );
        }
        let position = self.groups.len();
        self.groups.push(period.sql_expr(column, settings.week_start));
        self.buckets = settings
            .series
            .then(|| TimeBuckets::new(period, position).week_start(settings.week_start));
        self
    }

    /// Restricts `column` to `[start, end]` and backfills that whole range.
    /// Call after [`QuerySet::group_by_period`]; without time buckets only the
    /// filter applies.
    pub fn bucket_range(mut self, column: &str, start: NaiveDate, end: NaiveDate) -> Self {
        self.filters.push(Sql::new(format!(
            "{column} >= DATE '{start}' AND {column} < DATE '{end}' + INTERVAL '1 day'"
        )));
        match self.buckets.take() {
            Some(buckets) => self.buckets = Some(buckets.range(start, end)),
            None => warn!(
                "bucket range {start}..={end} on {column} has no time buckets to fill; \
                 call group_by_period first"
            ),
        }
        self
    }

    pub fn time_buckets(&self) -> Option<&TimeBuckets> {
        self.buckets.as_ref()
    }

    /// The statement `pluck` runs for `columns`.
    pub fn to_sql(&self, columns: &[Sql]) -> String {
        let mut sql = format!("SELECT {} FROM {}", join(columns, ", "), self.from);
        if !self.filters.is_empty() {
            let conditions: Vec<String> = self.filters.iter().map(|f| format!("({f})")).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        if !self.groups.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&join(&self.groups, ", "));
        }
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&join(&self.order, ", "));
        }
        sql
    }

    fn engine(&self) -> Engine<'_> {
        let engine = Engine::new(self);
        match &self.buckets {
            Some(buckets) => engine.with_backfill(buckets as &dyn Backfill),
            None => engine,
        }
    }

    pub fn calculate_all(&self, request: &Request) -> CalcResult<Calculated<GroupValue>> {
        self.engine().calculate_all(request)
    }

    pub fn calculate_all_with<T, E, F>(
        &self,
        request: &Request,
        transform: F,
    ) -> Result<Calculated<T>, E>
    where
        F: FnMut(GroupValue) -> Result<T, E>,
        E: From<CalcError>,
    {
        self.engine().calculate_all_with(request, transform)
    }
}

fn join(parts: &[Sql], separator: &str) -> String {
    parts
        .iter()
        .map(Sql::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

impl Relation for QuerySet<'_> {
    fn group_values(&self) -> &[Sql] {
        &self.groups
    }

    fn pluck(&self, columns: &[Sql]) -> CalcResult<Vec<Plucked>> {
        let sql = self.to_sql(columns);
        debug!("pluck: {sql}");
        let rows = self.db.query(&sql)?.into_rows();
        if columns.len() == 1 {
            return Ok(rows
                .into_iter()
                .map(|mut row| Plucked::Scalar(row.pop().unwrap_or(Scalar::Null)))
                .collect());
        }
        Ok(rows.into_iter().map(Plucked::Row).collect())
    }
}
