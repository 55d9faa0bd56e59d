#![allow(dead_code)]

use std::sync::Once;

use calculate_all::{Database, GroupKey, GroupValue, Scalar, Settings};
use chrono::NaiveDate;

static INIT: Once = Once::new();

/// Initialize logging once per test binary; `RUST_LOG` picks the level.
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

const SCHEMA: &str = "
    CREATE TABLE departments (id INTEGER PRIMARY KEY, name VARCHAR);
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        kind VARCHAR,
        currency VARCHAR,
        department_id INTEGER,
        cents INTEGER,
        created_at TIMESTAMP
    );
";

/// Empty orders/departments schema in a fresh in-memory database.
pub fn orders_db() -> Database {
    orders_db_with(Settings::default())
}

pub fn orders_db_with(settings: Settings) -> Database {
    init_test_env();
    let db = Database::open(settings).expect("Failed to open database");
    db.execute(SCHEMA).expect("Failed to create schema");
    db
}

pub fn create_orders(db: &Database) {
    db.execute(
        "
        INSERT INTO departments VALUES (1, 'First'), (2, 'Second');
        INSERT INTO orders VALUES
            (1, 'card', 'USD', 1, 100, TIMESTAMP '2014-01-03 00:00:00'),
            (2, 'card', 'RUB', 2, 200, TIMESTAMP '2016-01-05 00:00:00'),
            (3, 'cash', 'USD', 2, 300, TIMESTAMP '2014-01-10 00:00:00'),
            (4, 'cash', 'USD', 1, 400, TIMESTAMP '2016-05-10 00:00:00'),
            (5, 'cash', 'RUB', 2, 500, TIMESTAMP '2016-10-10 00:00:00');
        ",
    )
    .expect("Failed to insert orders");
}

pub fn date(y: i32, m: u32, d: u32) -> Scalar {
    Scalar::Date(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

pub fn key(parts: Vec<Scalar>) -> GroupKey {
    GroupKey::from_parts(parts)
}

pub fn named(pairs: &[(&str, Scalar)]) -> GroupValue {
    GroupValue::Named(
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
    )
}

pub fn bare(value: impl Into<Scalar>) -> GroupValue {
    GroupValue::Bare(value.into())
}
