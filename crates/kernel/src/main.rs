//! Gridline command-line front end.
//!
//! Loads a table configuration, runs the `init` pipeline, applies filters,
//! sorts and a page, then prints the visible page as JSON.
//!
//! Usage:
//!   gridline table.toml --data rows.json --filter status=open --sort date --page 2

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gridline_kernel::{DataTable, HttpDataSource, LogNotifier, Operator, TableConfig};

/// Filter, sort and page a table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Table configuration (.json or .toml).
    config: PathBuf,

    /// JSON file with the initial rows (local mode).
    #[arg(long)]
    data: Option<PathBuf>,

    /// Base URL for relative request URLs.
    #[arg(long)]
    base_url: Option<String>,

    /// Filter as `field=value`; the value is parsed as JSON when it can be.
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,

    /// Sort column; repeat to toggle direction.
    #[arg(long = "sort", value_name = "FIELD")]
    sorts: Vec<String>,

    /// Page to show.
    #[arg(long, default_value = "1")]
    page: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();

    let mut config =
        TableConfig::from_file(&args.config).context("failed to load configuration")?;
    config
        .apply_env_overrides()
        .context("invalid environment override")?;
    info!(
        remote = config.is_remote(),
        columns = config.columns.len(),
        "Configuration loaded"
    );

    let mut source = HttpDataSource::new();
    if let Some(base) = &args.base_url {
        source = source.with_base_url(base)?;
    }

    let mut table = DataTable::new(config, Arc::new(source), Arc::new(LogNotifier));
    if !table.is_valid() {
        bail!("table configuration is invalid; see log for details");
    }

    if let Some(path) = &args.data {
        let input = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let data: Value = serde_json::from_str(&input)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        table.set_data(data).await?;
    }

    table.init().await.context("init pipeline failed")?;

    for filter in &args.filters {
        let (field, value) = parse_filter(filter)?;
        let controlled = table
            .set_filter_input(field, value.clone())
            .await
            .context("filter failed")?;
        if !controlled {
            table
                .set_filter(field, value, Operator::Equals)
                .await
                .with_context(|| format!("filter on {field} failed"))?;
        }
    }
    table.apply_filters().await.context("render failed")?;

    for field in &args.sorts {
        if !table.sort_by(field).await.context("render failed")? {
            bail!("unknown sort column: {field}");
        }
    }

    if args.page != 1 {
        table.go_to_page(args.page).await.context("render failed")?;
    }

    let output = json!({
        "rows": table.page_rows(),
        "navigation": table.navigation(),
        "sort": table.sort_state(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Split `field=value`, reading the value as JSON when possible.
fn parse_filter(input: &str) -> Result<(&str, Value)> {
    let Some((field, raw)) = input.split_once('=') else {
        bail!("filter must be FIELD=VALUE, got '{input}'");
    };
    let field = field.trim();
    if field.is_empty() {
        bail!("filter has an empty field name: '{input}'");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field, value))
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridline=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
