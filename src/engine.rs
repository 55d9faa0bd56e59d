use indexmap::IndexMap;
use log::debug;

use crate::backfill::Backfill;
use crate::error::{CalcError, CalcResult};
use crate::expression::{resolve, Sql};
use crate::plan::ColumnPlan;
use crate::relation::Relation;
use crate::request::Request;
use crate::value::{Calculated, GroupKey, GroupValue, Scalar};

/// Computes several aggregates over a relation with a single fetch.
pub struct Engine<'a> {
    relation: &'a dyn Relation,
    backfill: Option<&'a dyn Backfill>,
}

impl<'a> Engine<'a> {
    pub fn new(relation: &'a dyn Relation) -> Self {
        Engine {
            relation,
            backfill: None,
        }
    }

    pub fn with_backfill(mut self, backfill: &'a dyn Backfill) -> Self {
        self.backfill = Some(backfill);
        self
    }

    pub fn calculate_all(&self, request: &Request) -> CalcResult<Calculated<GroupValue>> {
        self.calculate_all_with(request, Ok::<_, CalcError>)
    }

    /// Like [`Engine::calculate_all`], passing every group's value (backfilled
    /// ones included) through `transform`. The first transform error aborts
    /// the call and is returned as is.
    pub fn calculate_all_with<T, E, F>(
        &self,
        request: &Request,
        mut transform: F,
    ) -> Result<Calculated<T>, E>
    where
        F: FnMut(GroupValue) -> Result<T, E>,
        E: From<CalcError>,
    {
        let bare = request.is_bare();
        let group_values = self.relation.group_values();

        let resolved = request
            .merged()?
            .iter()
            .map(|(key, source)| Ok((key.clone(), resolve(source, group_values)?)))
            .collect::<CalcResult<IndexMap<String, Sql>>>()?;

        let plan = ColumnPlan::build(group_values, &resolved);
        debug!(
            "calculate_all plucking {} column(s) for {} expression(s): {:?}",
            plan.width(),
            resolved.len(),
            plan.columns()
        );

        let rows = self.relation.pluck(plan.columns())?;
        debug!("calculate_all decoding {} row(s)", rows.len());

        let mut results = IndexMap::with_capacity(rows.len());
        for plucked in rows {
            let row = plucked.into_row();
            plan.check_row(&row)?;
            results.insert(plan.decode_key(&row), plan.decode_value(&row, bare));
        }

        if let Some(backfill) = self.backfill {
            let default = if bare {
                GroupValue::Bare(Scalar::Null)
            } else {
                GroupValue::Named(IndexMap::new())
            };
            results = backfill.process_result(self.relation, results, default)?;
        }

        let mut transformed = results
            .into_iter()
            .map(|(key, value)| Ok((key, transform(value)?)))
            .collect::<Result<IndexMap<GroupKey, T>, E>>()?;

        if group_values.is_empty() {
            Ok(Calculated::Total(transformed.swap_remove(&GroupKey::All)))
        } else {
            Ok(Calculated::Grouped(transformed))
        }
    }
}
