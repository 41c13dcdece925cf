use crate::core::query::{build_ranking_query, TOP_N};
use crate::core::redact::{to_report_rows, RedactionPolicy};
use crate::domain::model::ReportRow;
use crate::domain::ports::Warehouse;
use crate::utils::error::Result;

/// Query, classify and redact the top customers of one table.
pub struct TopClientsReport<W: Warehouse> {
    warehouse: W,
    table: String,
    policy: RedactionPolicy,
}

impl<W: Warehouse> TopClientsReport<W> {
    pub fn new(warehouse: W, table: impl Into<String>, policy: RedactionPolicy) -> Self {
        Self {
            warehouse,
            table: table.into(),
            policy,
        }
    }

    pub fn query(&self) -> String {
        build_ranking_query(&self.table)
    }

    pub async fn run(&self) -> Result<Vec<ReportRow>> {
        let sql = self.query();
        tracing::info!("🔎 Fetching top {} customers from {}", TOP_N, self.table);
        tracing::debug!("SQL: {}", sql);

        let records = self.warehouse.query(&sql).await?;
        tracing::info!("📥 Received {} rows", records.len());
        if records.len() > TOP_N {
            tracing::warn!(
                "Warehouse returned {} rows, more than the {} requested",
                records.len(),
                TOP_N
            );
        }

        tracing::debug!("Redaction policy: {:?}", self.policy);
        Ok(to_report_rows(&records, self.policy))
    }
}
