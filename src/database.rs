use std::sync::{Mutex, MutexGuard};

use duckdb::{Config, Connection};
use log::info;

use crate::config::Settings;
use crate::error::{CalcError, CalcResult};
use crate::queryset::Table;
use crate::result::ResultSet;

/// An open DuckDB database. Statements are serialized over one connection.
pub struct Database {
    conn: Mutex<Connection>,
    settings: Settings,
}

impl Database {
    pub fn open(settings: Settings) -> CalcResult<Self> {
        settings.validate()?;
        info!("Opening database: {}", settings.database_path);
        let conn = Connection::open_with_flags(&settings.database_path, Config::default())?;
        Ok(Database {
            conn: Mutex::new(conn),
            settings,
        })
    }

    pub fn open_in_memory() -> CalcResult<Self> {
        Self::open(Settings::default())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn lock(&self) -> CalcResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CalcError::ConnectionPoisoned)
    }

    pub fn execute(&self, sql: &str) -> CalcResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn query(&self, sql: &str) -> CalcResult<ResultSet> {
        let conn = self.lock()?;
        ResultSet::from_query(&conn, sql)
    }

    pub fn table(&self, name: impl Into<String>) -> Table<'_> {
        Table::new(self, name)
    }
}
