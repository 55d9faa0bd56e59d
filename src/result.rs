use duckdb::types::Value;
use duckdb::Connection;

use crate::error::CalcResult;
use crate::value::Scalar;

/// A fully materialized query result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    column_names: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl ResultSet {
    /// Execute a query and materialize all rows into memory.
    pub fn from_query(conn: &Connection, sql: &str) -> CalcResult<Self> {
        let mut stmt = conn.prepare(sql)?;
        let mut rows_iter = stmt.query([])?;

        // column info is only available once the statement has run
        let column_names = rows_iter
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();
        let column_count = column_names.len();

        let mut rows = Vec::new();
        while let Some(row) = rows_iter.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let val = row
                    .get_ref(i)
                    .map(|v| v.to_owned())
                    .unwrap_or(Value::Null);
                values.push(Scalar::from(val));
            }
            rows.push(values);
        }

        Ok(ResultSet { column_names, rows })
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Scalar>> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER, name VARCHAR)").unwrap();
        conn.execute_batch("INSERT INTO t VALUES (1, 'hello'), (2, 'world')").unwrap();

        let result = ResultSet::from_query(&conn, "SELECT id, name FROM t ORDER BY id").unwrap();
        assert_eq!(result.column_count(), 2);
        assert_eq!(result.column_names(), ["id", "name"]);
        assert_eq!(
            result.rows(),
            [
                vec![Scalar::Int(1), Scalar::from("hello")],
                vec![Scalar::Int(2), Scalar::from("world")],
            ]
        );
    }

    #[test]
    fn test_null_handling() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        conn.execute_batch("INSERT INTO t VALUES (NULL)").unwrap();

        let result = ResultSet::from_query(&conn, "SELECT x FROM t").unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.rows()[0][0].is_null());
    }

    #[test]
    fn test_empty_result_keeps_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER, y INTEGER)").unwrap();

        let result = ResultSet::from_query(&conn, "SELECT x, y FROM t").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.column_count(), 2);
    }
}
