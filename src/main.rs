use std::process;

use calculate_all::{CalcError, Database, Period, Request, Settings, Source};
use clap::Parser;
use log::error;

/// Compute several aggregates over a DuckDB table in one query.
///
/// Expressions that look like identifiers (`count`, `cents_sum`) are
/// shortcuts; anything else is passed through as SQL.
#[derive(Parser, Debug)]
#[command(name = "calculate-all", version)]
struct Cli {
    /// Table to aggregate
    #[arg(long)]
    table: String,

    /// Statement to run first, e.g. to load data into an in-memory database
    #[arg(long = "execute", value_name = "SQL")]
    execute: Vec<String>,

    /// WHERE condition (repeatable, joined with AND)
    #[arg(long = "filter", value_name = "SQL")]
    filters: Vec<String>,

    /// Grouping expression (repeatable)
    #[arg(long = "group", value_name = "EXPR")]
    groups: Vec<String>,

    /// Group by a time bucket: day, week, month, quarter or year
    #[arg(long, requires = "period_column")]
    period: Option<String>,

    /// Column bucketed by --period
    #[arg(long)]
    period_column: Option<String>,

    /// Named expression as NAME=EXPR (repeatable)
    #[arg(long = "named", value_name = "NAME=EXPR")]
    named: Vec<String>,

    /// Positional expressions
    expressions: Vec<String>,
}

fn source_for(expr: &str) -> Source {
    let is_identifier = expr
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && expr.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_identifier {
        Source::shortcut(expr)
    } else {
        Source::sql(expr)
    }
}

fn build_request(cli: &Cli) -> Result<Request, CalcError> {
    let mut request = Request::new();
    for expr in &cli.expressions {
        request = request.source(source_for(expr));
    }
    for pair in &cli.named {
        let (name, expr) = pair.split_once('=').ok_or_else(|| {
            CalcError::invalid_request(format!("named expression '{pair}' is not NAME=EXPR"))
        })?;
        request = request.named(name.trim(), source_for(expr.trim()));
    }
    Ok(request)
}

fn run(cli: &Cli) -> Result<serde_json::Value, CalcError> {
    let settings = Settings::from_env()?;
    let db = Database::open(settings)?;
    for sql in &cli.execute {
        db.execute(sql)?;
    }

    let mut queryset = db.table(cli.table.as_str()).all();
    for filter in &cli.filters {
        queryset = queryset.filter(filter.as_str());
    }
    for group in &cli.groups {
        queryset = queryset.group(group.as_str());
    }
    if let (Some(period), Some(column)) = (&cli.period, &cli.period_column) {
        queryset = queryset.group_by_period(period.parse::<Period>()?, column);
    }

    let request = build_request(cli)?;
    Ok(queryset.calculate_all(&request)?.to_json())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(json) => match serde_json::to_string_pretty(&json) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                error!("could not render result: {e}");
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("calculate-all: {e}");
            process::exit(1);
        }
    }
}
