use crate::error::CalcResult;
use crate::expression::Sql;
use crate::value::Scalar;

/// One fetched group. Plucking a single column yields bare scalars rather
/// than one-element rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Plucked {
    Row(Vec<Scalar>),
    Scalar(Scalar),
}

impl Plucked {
    pub fn into_row(self) -> Vec<Scalar> {
        match self {
            Plucked::Row(row) => row,
            Plucked::Scalar(value) => vec![value],
        }
    }
}

/// A filtered and grouped query over some table, as the engine sees it.
pub trait Relation {
    /// Active grouping expressions, in grouping order.
    fn group_values(&self) -> &[Sql];

    /// Runs `SELECT <columns>` under the current filter and grouping,
    /// one entry per result group.
    fn pluck(&self, columns: &[Sql]) -> CalcResult<Vec<Plucked>>;
}
