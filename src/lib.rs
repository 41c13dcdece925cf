pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::BigQueryClient;
pub use config::{Cli, Settings, WarehouseSettings};
pub use core::pipeline::TopClientsReport;
pub use core::redact::{mask_name, RedactionPolicy};
pub use core::report::OutputFormat;
pub use domain::model::{CustomerRecord, NetBalance, ReportRow, Segment};
pub use domain::ports::Warehouse;
pub use utils::error::{ReportError, Result};
