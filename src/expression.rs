//! Aggregate expression sources and the shortcut resolver.
//!
//! A shortcut such as `cents_sum` or `count_distinct_currency` expands to the
//! SQL aggregate it stands for:
//!
//! | Shortcut                                   | SQL                       |
//! |--------------------------------------------|---------------------------|
//! | `count`                                    | `COUNT(*)`                |
//! | `<f>_distinct_count`, `count_distinct_<f>` | `COUNT(DISTINCT <f>)`     |
//! | `<f>_<fn>`, `<fn>_<f>` (count/sum/max/min/avg) | `<FN>(<f>)`           |
//! | `<f>_average`, `average_<f>`               | `AVG(<f>)`                |
//! | `<f>_maximum`, `maximum_<f>`               | `MAX(<f>)`                |
//! | `<f>_minimum`, `minimum_<f>`               | `MIN(<f>)`                |
//!
//! Rules are tried top to bottom and the first match wins.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{CalcError, CalcResult};

/// A fragment that is already valid SQL and goes to the query layer verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sql(String);

impl Sql {
    pub fn new(sql: impl Into<String>) -> Self {
        Sql(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sql {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Sql {
    fn from(s: &str) -> Self {
        Sql(s.to_string())
    }
}

impl From<String> for Sql {
    fn from(s: String) -> Self {
        Sql(s)
    }
}

/// Where one requested value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Symbolic name expanded by [`decode_shortcut`].
    Shortcut(String),
    /// Raw SQL, never inspected.
    Sql(Sql),
}

impl Source {
    pub fn shortcut(name: impl Into<String>) -> Self {
        Source::Shortcut(name.into())
    }

    pub fn sql(sql: impl Into<Sql>) -> Self {
        Source::Sql(sql.into())
    }

    /// The result key a positional request gets: its name or its SQL text.
    pub fn key(&self) -> &str {
        match self {
            Source::Shortcut(name) => name,
            Source::Sql(sql) => sql.as_str(),
        }
    }
}

impl From<Sql> for Source {
    fn from(sql: Sql) -> Self {
        Source::Sql(sql)
    }
}

struct Rule {
    pattern: Regex,
    render: fn(&Captures<'_>) -> String,
}

impl Rule {
    fn new(pattern: &str, render: fn(&Captures<'_>) -> String) -> Self {
        Rule {
            pattern: Regex::new(pattern).expect("shortcut pattern must compile"),
            render,
        }
    }
}

const FIELD: &str = "[A-Za-z0-9_]+";
const FUNCTIONS: &str = "count|sum|max|min|avg";

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("^count$", |_| "COUNT(*)".to_string()),
        Rule::new(&format!("^({FIELD})_distinct_count$"), |c| {
            format!("COUNT(DISTINCT {})", &c[1])
        }),
        Rule::new(&format!("^count_distinct_({FIELD})$"), |c| {
            format!("COUNT(DISTINCT {})", &c[1])
        }),
        Rule::new(&format!("^({FIELD})_({FUNCTIONS})$"), |c| {
            format!("{}({})", c[2].to_uppercase(), &c[1])
        }),
        Rule::new(&format!("^({FUNCTIONS})_({FIELD})$"), |c| {
            format!("{}({})", c[1].to_uppercase(), &c[2])
        }),
        Rule::new(&format!("^({FIELD})_average$"), |c| format!("AVG({})", &c[1])),
        Rule::new(&format!("^average_({FIELD})$"), |c| format!("AVG({})", &c[1])),
        Rule::new(&format!("^({FIELD})_maximum$"), |c| format!("MAX({})", &c[1])),
        Rule::new(&format!("^maximum_({FIELD})$"), |c| format!("MAX({})", &c[1])),
        Rule::new(&format!("^({FIELD})_minimum$"), |c| format!("MIN({})", &c[1])),
        Rule::new(&format!("^minimum_({FIELD})$"), |c| format!("MIN({})", &c[1])),
    ]
});

/// Expands a shortcut into SQL. A shortcut naming one of the active grouping
/// expressions is returned unchanged so the group's own value can be selected.
pub fn decode_shortcut(shortcut: &str, group_values: &[Sql]) -> CalcResult<Sql> {
    if group_values.iter().any(|g| g.as_str() == shortcut) {
        return Ok(Sql::new(shortcut));
    }

    RULES
        .iter()
        .find_map(|rule| {
            rule.pattern
                .captures(shortcut)
                .map(|caps| Sql::new((rule.render)(&caps)))
        })
        .ok_or_else(|| CalcError::UnrecognizedExpression {
            shortcut: shortcut.to_string(),
        })
}

pub fn resolve(source: &Source, group_values: &[Sql]) -> CalcResult<Sql> {
    match source {
        Source::Sql(sql) => Ok(sql.clone()),
        Source::Shortcut(name) => decode_shortcut(name, group_values),
    }
}
