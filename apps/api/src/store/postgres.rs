use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::customer::{CustomerRow, NewCustomer};
use crate::models::job::{JobRow, NewJob};
use crate::store::{JobStore, ESTIMATE_STATUS};

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_customer(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<CustomerRow>, sqlx::Error> {
        let query = format!(
            "SELECT * FROM customers WHERE {column} = $1 ORDER BY created_at ASC LIMIT 1"
        );
        sqlx::query_as::<_, CustomerRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn upsert_customer(&self, customer: &NewCustomer) -> Result<CustomerRow, sqlx::Error> {
        let mut existing = None;
        if let Some(email) = &customer.email {
            existing = self.find_customer("email", email).await?;
        }
        if existing.is_none() {
            if let Some(phone) = &customer.phone {
                existing = self.find_customer("phone", phone).await?;
            }
        }

        if let Some(found) = existing {
            debug!("Matched existing customer {}", found.id);
            return sqlx::query_as::<_, CustomerRow>(
                r#"
                UPDATE customers
                SET phone = COALESCE(phone, $2),
                    email = COALESCE(email, $3)
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(found.id)
            .bind(&customer.phone)
            .bind(&customer.email)
            .fetch_one(&self.pool)
            .await;
        }

        sqlx::query_as::<_, CustomerRow>(
            r#"
            INSERT INTO customers (id, name, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .fetch_one(&self.pool)
        .await
    }

    async fn insert_job(&self, job: &NewJob) -> Result<JobRow, sqlx::Error> {
        let priced = &job.estimate;
        sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs
                (id, customer_id, description, vehicle, flat_rate_label,
                 labor_hours, labor_rate, labor_cost, parts_cost, shop_supplies_cost,
                 subtotal, tax_set_aside, net_after_tax, estimate, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job.customer_id)
        .bind(&job.description)
        .bind(&job.vehicle)
        .bind(&job.flat_rate_label)
        .bind(priced.estimate.labor_hours)
        .bind(priced.estimate.labor_rate)
        .bind(priced.labor_cost)
        .bind(priced.parts_cost)
        .bind(priced.shop_supplies_cost)
        .bind(priced.subtotal)
        .bind(priced.tax_set_aside)
        .bind(priced.net_after_tax)
        .bind(job.estimate_json())
        .bind(ESTIMATE_STATUS)
        .fetch_one(&self.pool)
        .await
    }

    async fn recent_jobs(&self, limit: i64) -> Result<Vec<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
