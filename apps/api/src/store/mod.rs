//! Persistence for customers and estimate jobs.
//!
//! Handlers and the estimate pipeline see only `JobStore`; `PgJobStore` is the
//! production backend and `MemoryJobStore` backs the HTTP tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::customer::{CustomerRow, NewCustomer};
use crate::models::job::{JobRow, NewJob};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgJobStore;

/// Status written for freshly generated estimates.
pub const ESTIMATE_STATUS: &str = "estimate";

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Finds a customer by email, then by phone, and creates one if neither matches.
    /// Contact details missing on the stored row are filled in from `customer`.
    async fn upsert_customer(&self, customer: &NewCustomer) -> Result<CustomerRow, sqlx::Error>;

    async fn insert_job(&self, job: &NewJob) -> Result<JobRow, sqlx::Error>;

    /// Most recent jobs first.
    async fn recent_jobs(&self, limit: i64) -> Result<Vec<JobRow>, sqlx::Error>;

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, sqlx::Error>;
}
