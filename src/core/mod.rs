pub mod pipeline;
pub mod query;
pub mod redact;
pub mod report;

pub use crate::domain::model::{CustomerRecord, NetBalance, ReportRow, Segment};
pub use crate::domain::ports::Warehouse;
pub use crate::utils::error::Result;
