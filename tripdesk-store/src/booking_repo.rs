use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::warn;
use tripdesk_core::repository::BookingRepository;
use tripdesk_core::{Booking, BookingDraft, BookingPatch, CoreError, CoreResult};

const BOOKING_COLUMNS: &str =
    "id, name, email, phone, location, travel_date, people, place_name, price, created_at";

pub struct PgBookingRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    location: String,
    travel_date: NaiveDate,
    people: i32,
    place_name: String,
    price: f64,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            location: row.location,
            travel_date: row.travel_date,
            people: row.people,
            place_name: row.place_name,
            price: row.price,
            created_at: row.created_at,
        }
    }
}

/// Runs a query under `limit`, turning both driver errors and expiry into
/// `CoreError::Persistence`.
pub(crate) async fn bounded<T, F>(limit: Duration, op: &str, fut: F) -> CoreResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(CoreError::Persistence(format!("{} failed: {}", op, e))),
        Err(_) => {
            warn!("{} timed out after {:?}", op, limit);
            Err(CoreError::Persistence(format!("{} timed out", op)))
        }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert(&self, draft: &BookingDraft) -> CoreResult<Booking> {
        let sql = format!(
            r#"
            INSERT INTO bookings (name, email, phone, location, travel_date, people, place_name, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );
        let row: BookingRow = bounded(
            self.query_timeout,
            "insert booking",
            sqlx::query_as::<_, BookingRow>(&sql)
                .bind(&draft.name)
                .bind(&draft.email)
                .bind(&draft.phone)
                .bind(&draft.location)
                .bind(draft.travel_date)
                .bind(draft.people)
                .bind(&draft.place_name)
                .bind(draft.price)
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.into())
    }

    async fn list_all(&self) -> CoreResult<Vec<Booking>> {
        let sql = format!("SELECT {} FROM bookings ORDER BY created_at DESC, id DESC", BOOKING_COLUMNS);
        let rows: Vec<BookingRow> = bounded(
            self.query_timeout,
            "list bookings",
            sqlx::query_as::<_, BookingRow>(&sql).fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn update(&self, id: i64, patch: &BookingPatch) -> CoreResult<Booking> {
        let sql = format!(
            r#"
            UPDATE bookings
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                people = COALESCE($4, people),
                price = COALESCE($5, price)
            WHERE id = $1
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );
        let row: Option<BookingRow> = bounded(
            self.query_timeout,
            "update booking",
            sqlx::query_as::<_, BookingRow>(&sql)
                .bind(id)
                .bind(&patch.name)
                .bind(&patch.email)
                .bind(patch.people)
                .bind(patch.price)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.map(Booking::from).ok_or(CoreError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        let result = bounded(
            self.query_timeout,
            "delete booking",
            sqlx::query("DELETE FROM bookings WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id));
        }
        Ok(())
    }
}
