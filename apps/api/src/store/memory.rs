//! In-memory `JobStore` for handler tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::customer::{CustomerRow, NewCustomer};
use crate::models::job::{JobRow, NewJob};
use crate::store::{JobStore, ESTIMATE_STATUS};

#[derive(Default)]
pub struct MemoryJobStore {
    customers: Mutex<Vec<CustomerRow>>,
    jobs: Mutex<Vec<JobRow>>,
    fail_writes: AtomicBool,
}

impl MemoryJobStore {
    /// Makes every later write fail like a rejected insert.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn customers(&self) -> Vec<CustomerRow> {
        self.customers.lock().unwrap().clone()
    }

    pub fn jobs(&self) -> Vec<JobRow> {
        self.jobs.lock().unwrap().clone()
    }

    fn check_writable(&self) -> Result<(), sqlx::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn upsert_customer(&self, customer: &NewCustomer) -> Result<CustomerRow, sqlx::Error> {
        self.check_writable()?;
        let mut customers = self.customers.lock().unwrap();

        let by_email = customer
            .email
            .as_ref()
            .and_then(|e| customers.iter().position(|c| c.email.as_ref() == Some(e)));
        let found = by_email.or_else(|| {
            customer
                .phone
                .as_ref()
                .and_then(|p| customers.iter().position(|c| c.phone.as_ref() == Some(p)))
        });

        if let Some(index) = found {
            let row = &mut customers[index];
            if row.phone.is_none() {
                row.phone = customer.phone.clone();
            }
            if row.email.is_none() {
                row.email = customer.email.clone();
            }
            return Ok(row.clone());
        }

        let row = CustomerRow {
            id: Uuid::new_v4(),
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
            created_at: Utc::now(),
        };
        customers.push(row.clone());
        Ok(row)
    }

    async fn insert_job(&self, job: &NewJob) -> Result<JobRow, sqlx::Error> {
        self.check_writable()?;
        let mut jobs = self.jobs.lock().unwrap();
        let priced = &job.estimate;
        // Distinct, increasing timestamps keep ordering deterministic.
        let created_at = Utc::now() + Duration::milliseconds(jobs.len() as i64);
        let row = JobRow {
            id: Uuid::new_v4(),
            customer_id: job.customer_id,
            description: job.description.clone(),
            vehicle: job.vehicle.clone(),
            flat_rate_label: job.flat_rate_label.clone(),
            labor_hours: priced.estimate.labor_hours,
            labor_rate: priced.estimate.labor_rate,
            labor_cost: priced.labor_cost,
            parts_cost: priced.parts_cost,
            shop_supplies_cost: priced.shop_supplies_cost,
            subtotal: priced.subtotal,
            tax_set_aside: priced.tax_set_aside,
            net_after_tax: priced.net_after_tax,
            estimate: job.estimate_json(),
            status: ESTIMATE_STATUS.to_string(),
            created_at,
        };
        jobs.push(row.clone());
        Ok(row)
    }

    async fn recent_jobs(&self, limit: i64) -> Result<Vec<JobRow>, sqlx::Error> {
        let mut jobs = self.jobs();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit.max(0) as usize);
        Ok(jobs)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
        Ok(self.jobs().into_iter().find(|j| j.id == id))
    }
}
