use crate::adapters::BigQueryClient;
use crate::config::{Cli, Settings};
use crate::core::pipeline::TopClientsReport;
use crate::core::query::build_ranking_query;
use crate::core::report::write_report;
use crate::utils::error::Result;
use std::io::Write;

/// Runs the report and turns the outcome into a process exit code.
///
/// Failures leave exactly one line on `err`: 2 for configuration problems, 1 for
/// everything else.
pub async fn execute<O: Write, E: Write>(cli: &Cli, out: O, err: E) -> u8 {
    execute_with(cli, |name| std::env::var(name).ok(), out, err).await
}

pub async fn execute_with<F, O, E>(cli: &Cli, lookup: F, out: O, mut err: E) -> u8
where
    F: Fn(&str) -> Option<String>,
    O: Write,
    E: Write,
{
    match run(cli, lookup, out).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::debug!("Report failed: {:?} (Category: {:?})", e, e.category());
            let message = e.user_friendly_message().replace(['\r', '\n'], " ");
            let _ = writeln!(err, "❌ {}", message);
            let _ = err.flush();
            e.exit_code()
        }
    }
}

async fn run<F, O>(cli: &Cli, lookup: F, mut out: O) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    O: Write,
{
    let settings = Settings::resolve(cli, lookup)?;
    tracing::debug!(
        "Table: {}, policy: {:?}, format: {:?}",
        settings.table,
        settings.policy,
        settings.format
    );

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the query is printed, nothing is executed");
        writeln!(out, "{}", build_ranking_query(&settings.table))?;
        out.flush()?;
        return Ok(());
    }

    tracing::info!("🚀 Starting top customers report");
    let warehouse = BigQueryClient::connect(&settings.warehouse).await?;
    tracing::info!(
        "✅ Connected to BigQuery project {}",
        settings.warehouse.project_id
    );

    let report = TopClientsReport::new(warehouse, settings.table.clone(), settings.policy);
    let rows = report.run().await?;
    write_report(&rows, settings.format, out)?;

    tracing::info!("✅ Report delivered with {} rows", rows.len());
    Ok(())
}
