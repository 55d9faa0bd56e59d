use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use duckdb::types::{TimeUnit, Value};
use indexmap::IndexMap;
use serde_json::{json, Value as Json};

/// DuckDB stores DATE as days since 1970-01-01; chrono counts from 0001-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One column value of a fetched row.
///
/// Integers of every width collapse into `Int`, so a `COUNT(*)` (BIGINT) and a
/// `SUM(cents)` (HUGEINT) compare the same way. Array aggregates come back as
/// `List`: that is still a single value for one group.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    /// Exact decimal, kept as its textual form.
    Decimal(String),
    Text(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    List(Vec<Scalar>),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => i64::try_from(*i).ok(),
            Scalar::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Decimal(d) => d.parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Scalar::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Scalar::Null => Json::Null,
            Scalar::Bool(b) => json!(b),
            Scalar::Int(i) => match i64::try_from(*i) {
                Ok(small) => json!(small),
                Err(_) => json!(i.to_string()),
            },
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Scalar::Decimal(d) => json!(d),
            Scalar::Text(s) => json!(s),
            Scalar::Blob(b) => json!(hex::encode(b)),
            Scalar::Date(_) | Scalar::Timestamp(_) => json!(self.to_string()),
            Scalar::List(items) => Json::Array(items.iter().map(Scalar::to_json).collect()),
        }
    }
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn timestamp_from(unit: TimeUnit, raw: i64) -> Option<NaiveDateTime> {
    let micros = match unit {
        TimeUnit::Second => raw.checked_mul(1_000_000)?,
        TimeUnit::Millisecond => raw.checked_mul(1_000)?,
        TimeUnit::Microsecond => raw,
        // floor, so pre-1970 instants stay in their own microsecond
        TimeUnit::Nanosecond => raw.div_euclid(1_000),
    };
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

impl From<Value> for Scalar {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Scalar::Null,
            Value::Boolean(b) => Scalar::Bool(b),
            Value::TinyInt(i) => Scalar::Int(i.into()),
            Value::SmallInt(i) => Scalar::Int(i.into()),
            Value::Int(i) => Scalar::Int(i.into()),
            Value::BigInt(i) => Scalar::Int(i.into()),
            Value::HugeInt(i) => Scalar::Int(i),
            Value::UTinyInt(i) => Scalar::Int(i.into()),
            Value::USmallInt(i) => Scalar::Int(i.into()),
            Value::UInt(i) => Scalar::Int(i.into()),
            Value::UBigInt(i) => Scalar::Int(i.into()),
            Value::Float(f) => Scalar::Float(f.into()),
            Value::Double(f) => Scalar::Float(f),
            Value::Decimal(d) => Scalar::Decimal(d.to_string()),
            Value::Text(s) | Value::Enum(s) => Scalar::Text(s),
            Value::Blob(b) => Scalar::Blob(b),
            Value::Date32(days) => date_from_days(days)
                .map(Scalar::Date)
                .unwrap_or_else(|| Scalar::Text(days.to_string())),
            Value::Timestamp(unit, raw) => timestamp_from(unit, raw)
                .map(Scalar::Timestamp)
                .unwrap_or_else(|| Scalar::Text(raw.to_string())),
            Value::List(items) | Value::Array(items) => {
                Scalar::List(items.into_iter().map(Scalar::from).collect())
            }
            other => Scalar::Text(format!("{other:?}")),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Decimal(s) | Scalar::Text(s) => f.write_str(s),
            Scalar::Blob(b) => f.write_str(&hex::encode(b)),
            Scalar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Scalar::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Scalar::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// Floats compare by bit pattern so scalars can be part of a hashed group key.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Decimal(a), Scalar::Decimal(b)) => a == b,
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Blob(a), Scalar::Blob(b)) => a == b,
            (Scalar::Date(a), Scalar::Date(b)) => a == b,
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a == b,
            (Scalar::List(a), Scalar::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Bool(b) => b.hash(state),
            Scalar::Int(i) => i.hash(state),
            Scalar::Float(f) => f.to_bits().hash(state),
            Scalar::Decimal(s) | Scalar::Text(s) => s.hash(state),
            Scalar::Blob(b) => b.hash(state),
            Scalar::Date(d) => d.hash(state),
            Scalar::Timestamp(ts) => ts.hash(state),
            Scalar::List(items) => items.hash(state),
        }
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Scalar::Int(i.into())
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i.into())
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(d: NaiveDate) -> Self {
        Scalar::Date(d)
    }
}

/// Key of one result group, shaped by the number of grouping expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// No grouping: the whole queryset is one implicit group.
    All,
    Single(Scalar),
    Tuple(Vec<Scalar>),
}

impl GroupKey {
    /// Builds the key for the given grouping values, in grouping order.
    pub fn from_parts(mut parts: Vec<Scalar>) -> Self {
        match parts.len() {
            0 => GroupKey::All,
            1 => GroupKey::Single(parts.remove(0)),
            _ => GroupKey::Tuple(parts),
        }
    }

    pub fn into_parts(self) -> Vec<Scalar> {
        match self {
            GroupKey::All => Vec::new(),
            GroupKey::Single(s) => vec![s],
            GroupKey::Tuple(parts) => parts,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            GroupKey::All => json!("ALL"),
            GroupKey::Single(s) => s.to_json(),
            GroupKey::Tuple(parts) => Json::Array(parts.iter().map(Scalar::to_json).collect()),
        }
    }
}

impl From<Scalar> for GroupKey {
    fn from(s: Scalar) -> Self {
        GroupKey::Single(s)
    }
}

/// What one group computed: a lone value, or every requested key in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupValue {
    Bare(Scalar),
    Named(IndexMap<String, Scalar>),
}

impl GroupValue {
    /// Looks up a named aggregate. Always `None` for bare values.
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        match self {
            GroupValue::Named(values) => values.get(name),
            GroupValue::Bare(_) => None,
        }
    }

    pub fn as_bare(&self) -> Option<&Scalar> {
        match self {
            GroupValue::Bare(s) => Some(s),
            GroupValue::Named(_) => None,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            GroupValue::Bare(s) => s.to_json(),
            GroupValue::Named(values) => Json::Object(
                values
                    .iter()
                    .map(|(name, v)| (name.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Final outcome of `calculate_all`.
#[derive(Debug, Clone, PartialEq)]
pub enum Calculated<T> {
    /// Ungrouped queryset: the value of the single implicit group.
    /// `None` only when the data store returned no row at all.
    Total(Option<T>),
    /// Grouped queryset, in the order rows came back (or as backfill reordered them).
    Grouped(IndexMap<GroupKey, T>),
}

impl<T> Calculated<T> {
    /// The ungrouped value; `None` for grouped results as well.
    pub fn total(self) -> Option<T> {
        match self {
            Calculated::Total(value) => value,
            Calculated::Grouped(_) => None,
        }
    }

    pub fn grouped(self) -> Option<IndexMap<GroupKey, T>> {
        match self {
            Calculated::Grouped(groups) => Some(groups),
            Calculated::Total(_) => None,
        }
    }
}

impl Calculated<GroupValue> {
    pub fn to_json(&self) -> Json {
        match self {
            Calculated::Total(value) => value.as_ref().map_or(Json::Null, GroupValue::to_json),
            Calculated::Grouped(groups) => Json::Array(
                groups
                    .iter()
                    .map(|(key, value)| json!({ "key": key.to_json(), "value": value.to_json() }))
                    .collect(),
            ),
        }
    }
}
