//! Recurring booking template persistence

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::booking::RecurringBookingTemplate;
use crate::domain::pricing::Frequency;

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    client_id: Uuid,
    service_type: String,
    address: String,
    day_of_week: i16,
    booking_time: NaiveTime,
    service_frequency: String,
    final_price: Decimal,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    last_materialized_date: Option<NaiveDate>,
    special_instructions: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TemplateRow> for RecurringBookingTemplate {
    fn from(row: TemplateRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            service_type: row.service_type,
            address: row.address,
            day_of_week: row.day_of_week,
            booking_time: row.booking_time,
            service_frequency: Frequency::parse(&row.service_frequency).unwrap_or_default(),
            final_price: row.final_price,
            start_date: row.start_date,
            end_date: row.end_date,
            last_materialized_date: row.last_materialized_date,
            special_instructions: row.special_instructions,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub client_id: Uuid,
    pub service_type: String,
    pub address: String,
    pub day_of_week: i16,
    pub booking_time: NaiveTime,
    pub service_frequency: Frequency,
    pub final_price: Decimal,
    pub start_date: NaiveDate,
    pub special_instructions: Option<String>,
}

const SELECT_COLUMNS: &str = "id, client_id, service_type, address, day_of_week, booking_time, \
     service_frequency, final_price, start_date, end_date, last_materialized_date, \
     special_instructions, created_at";

pub async fn insert(
    pool: &PgPool,
    new: &NewTemplate,
) -> Result<RecurringBookingTemplate, sqlx::Error> {
    let row = sqlx::query_as::<_, TemplateRow>(&format!(
        "INSERT INTO recurring_templates \
             (client_id, service_type, address, day_of_week, booking_time, \
              service_frequency, final_price, start_date, special_instructions) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(new.client_id)
    .bind(&new.service_type)
    .bind(&new.address)
    .bind(new.day_of_week)
    .bind(new.booking_time)
    .bind(new.service_frequency.as_str())
    .bind(new.final_price)
    .bind(new.start_date)
    .bind(&new.special_instructions)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Templates whose `[start_date, end_date ?? +inf)` window contains `today`.
pub async fn list_active(
    pool: &PgPool,
    today: NaiveDate,
) -> Result<Vec<RecurringBookingTemplate>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TemplateRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM recurring_templates \
         WHERE start_date <= $1 AND (end_date IS NULL OR end_date >= $1) \
         ORDER BY created_at, id"
    ))
    .bind(today)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn find(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<RecurringBookingTemplate>, sqlx::Error> {
    let row = sqlx::query_as::<_, TemplateRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM recurring_templates WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

/// End a template. Ending is the only removal path; rows stay because
/// historical bookings reference them.
pub async fn set_end_date(
    pool: &PgPool,
    id: Uuid,
    end_date: NaiveDate,
) -> Result<Option<RecurringBookingTemplate>, sqlx::Error> {
    let row = sqlx::query_as::<_, TemplateRow>(&format!(
        "UPDATE recurring_templates SET end_date = $2 \
         WHERE id = $1 \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(id)
    .bind(end_date)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

/// Advance the materialization high-water mark, never moving it backwards.
pub async fn advance_last_materialized(
    pool: &PgPool,
    id: Uuid,
    date: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE recurring_templates \
         SET last_materialized_date = GREATEST(COALESCE(last_materialized_date, $2), $2) \
         WHERE id = $1",
    )
    .bind(id)
    .bind(date)
    .execute(pool)
    .await?;

    Ok(())
}
