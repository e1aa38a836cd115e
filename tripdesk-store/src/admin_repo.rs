use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tripdesk_core::repository::AdminRepository;
use tripdesk_core::{Admin, CoreResult};

use crate::booking_repo::bounded;

pub struct PgAdminRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgAdminRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i64,
    email: String,
    password: String,
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Admin>> {
        let row: Option<AdminRow> = bounded(
            self.query_timeout,
            "find admin",
            sqlx::query_as::<_, AdminRow>("SELECT id, email, password FROM admins WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| Admin { id: r.id, email: r.email, password_hash: r.password }))
    }
}
