use indexmap::IndexMap;

use crate::error::{CalcError, CalcResult};
use crate::expression::Sql;
use crate::value::{GroupKey, GroupValue, Scalar};

/// The column list sent to the single fetch, plus where each group part and
/// each requested value sits in a fetched row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    columns: Vec<Sql>,
    group_index: Vec<usize>,
    value_index: IndexMap<String, usize>,
}

impl ColumnPlan {
    /// Grouping expressions first, then the resolved aggregates. Identical SQL
    /// text is selected once and shared by every key that resolved to it.
    pub fn build(group_values: &[Sql], resolved: &IndexMap<String, Sql>) -> Self {
        let mut columns: Vec<Sql> = Vec::with_capacity(group_values.len() + resolved.len());
        let mut position = |sql: &Sql| match columns.iter().position(|c| c == sql) {
            Some(index) => index,
            None => {
                columns.push(sql.clone());
                columns.len() - 1
            }
        };

        let group_index = group_values.iter().map(&mut position).collect();
        let value_index = resolved
            .iter()
            .map(|(key, sql)| (key.clone(), position(sql)))
            .collect();

        ColumnPlan {
            columns,
            group_index,
            value_index,
        }
    }

    pub fn columns(&self) -> &[Sql] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn value_index(&self, key: &str) -> Option<usize> {
        self.value_index.get(key).copied()
    }

    pub fn check_row(&self, row: &[Scalar]) -> CalcResult<()> {
        if row.len() < self.width() {
            return Err(CalcError::MalformedRow {
                expected: self.width(),
                found: row.len(),
            });
        }
        Ok(())
    }

    pub fn decode_key(&self, row: &[Scalar]) -> GroupKey {
        GroupKey::from_parts(self.group_index.iter().map(|&i| row[i].clone()).collect())
    }

    /// In bare mode the value of the last (and only) requested key.
    pub fn decode_value(&self, row: &[Scalar], bare: bool) -> GroupValue {
        if bare {
            let value = self
                .value_index
                .values()
                .last()
                .map_or(Scalar::Null, |&i| row[i].clone());
            return GroupValue::Bare(value);
        }
        GroupValue::Named(
            self.value_index
                .iter()
                .map(|(key, &i)| (key.clone(), row[i].clone()))
                .collect(),
        )
    }
}
