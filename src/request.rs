use indexmap::IndexMap;

use crate::error::{CalcError, CalcResult};
use crate::expression::{Source, Sql};

/// The aggregates one `calculate_all` call asks for.
///
/// Positional entries are keyed by their own shortcut name or SQL text; named
/// entries carry an explicit key. A lone positional entry with nothing named
/// makes every group's value the bare scalar instead of a one-entry mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    positional: Vec<Source>,
    named: Vec<(String, Source)>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shortcut(mut self, name: impl Into<String>) -> Self {
        self.positional.push(Source::Shortcut(name.into()));
        self
    }

    pub fn sql(mut self, sql: impl Into<Sql>) -> Self {
        self.positional.push(Source::Sql(sql.into()));
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.positional.push(source);
        self
    }

    pub fn named(mut self, key: impl Into<String>, source: impl Into<Source>) -> Self {
        self.named.push((key.into(), source.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    pub fn is_bare(&self) -> bool {
        self.positional.len() == 1 && self.named.is_empty()
    }

    /// All entries keyed by result name, in first-occurrence order. A named
    /// entry replaces a positional one with the same key but keeps its slot.
    pub fn merged(&self) -> CalcResult<IndexMap<String, Source>> {
        let mut merged = IndexMap::with_capacity(self.positional.len() + self.named.len());
        for source in &self.positional {
            merged.insert(source.key().to_string(), source.clone());
        }
        for (key, source) in &self.named {
            if key.is_empty() {
                return Err(CalcError::invalid_request("expression name must not be empty"));
            }
            merged.insert(key.clone(), source.clone());
        }

        if merged.is_empty() {
            return Err(CalcError::invalid_request(
                "provide at least one expression to calculate",
            ));
        }
        Ok(merged)
    }
}
