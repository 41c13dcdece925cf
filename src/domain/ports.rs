use crate::domain::model::CustomerRecord;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Executes query text against the analytical store.
///
/// Rows come back in the order the store produced them; implementors must not
/// re-sort or truncate.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn query(&self, sql: &str) -> Result<Vec<CustomerRecord>>;
}
