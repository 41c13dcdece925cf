// Adapters layer: the BigQuery warehouse and its credential sources.

pub mod auth;
pub mod bigquery;

pub use bigquery::BigQueryClient;
