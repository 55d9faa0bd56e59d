//! # calculate-all
//!
//! Several aggregates over a filtered, grouped DuckDB queryset in a single
//! query, decoded into a map keyed by group.
//!
//! ```no_run
//! use calculate_all::{Database, GroupKey, Request};
//!
//! let db = Database::open_in_memory()?;
//! db.execute("CREATE TABLE orders (currency VARCHAR, cents INTEGER)")?;
//!
//! let per_currency = db
//!     .table("orders")
//!     .all()
//!     .group("currency")
//!     .calculate_all(&Request::new().shortcut("count").shortcut("cents_sum"))?
//!     .grouped()
//!     .unwrap_or_default();
//!
//! if let Some(usd) = per_currency.get(&GroupKey::Single("USD".into())) {
//!     println!("{:?} orders", usd.get("count"));
//! }
//! # Ok::<(), calculate_all::CalcError>(())
//! ```
//!
//! Shortcuts (`count`, `cents_sum`, `count_distinct_currency`, ...) are
//! expanded by [`decode_shortcut`]; raw SQL goes through [`Request::sql`].
//! A single positional expression yields bare values instead of mappings.

pub mod backfill;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod expression;
pub mod plan;
pub mod queryset;
pub mod relation;
pub mod request;
pub mod result;
pub mod value;

pub use backfill::{Backfill, Period, TimeBuckets};
pub use config::Settings;
pub use database::Database;
pub use engine::Engine;
pub use error::{CalcError, CalcResult};
pub use expression::{decode_shortcut, resolve, Source, Sql};
pub use plan::ColumnPlan;
pub use queryset::{QuerySet, Table};
pub use relation::{Plucked, Relation};
pub use request::Request;
pub use result::ResultSet;
pub use value::{Calculated, GroupKey, GroupValue, Scalar};
