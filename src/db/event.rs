use uuid::Uuid;

use crate::models::{Attendance, Event, EventStatus};
use crate::PGPool;

const EVENT_COLUMNS: &str = "id, title, subtitle, description, image, country, city, address, \
     start_date, end_date, website, attendees_capacity, status, created_at";

/// Inserts the event together with its organizer attendance row. Both rows
/// land in one transaction; any failure rolls both back.
pub async fn create_with_organizer(
    event: &Event,
    organizer: &Attendance,
    pool: &PGPool,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO events (id, title, subtitle, description, image, country, city, address,
                             start_date, end_date, website, attendees_capacity, status, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(event.id)
    .bind(&event.title)
    .bind(&event.subtitle)
    .bind(&event.description)
    .bind(&event.image)
    .bind(&event.country)
    .bind(&event.city)
    .bind(&event.address)
    .bind(event.start_date)
    .bind(event.end_date)
    .bind(&event.website)
    .bind(event.attendees_capacity)
    .bind(event.status)
    .bind(event.created_at)
    .execute(&mut *tx)
    .await?;
    sqlx::query("INSERT INTO attendances (id, user_id, event_id, role) VALUES ($1, $2, $3, $4)")
        .bind(organizer.id)
        .bind(organizer.user_id)
        .bind(organizer.event_id)
        .bind(organizer.role)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_all_newest_first(pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events ORDER BY created_at DESC",
        EVENT_COLUMNS
    ))
    .fetch_all(pool)
    .await
}

const PREFIXED_EVENT_COLUMNS: &str =
    "e.id, e.title, e.subtitle, e.description, e.image, e.country, e.city, e.address, \
     e.start_date, e.end_date, e.website, e.attendees_capacity, e.status, e.created_at";

/// Events the user attends as attendee or speaker, oldest first.
pub async fn get_attending(user_id: Uuid, pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events e
         JOIN attendances a ON a.event_id = e.id
         WHERE a.user_id = $1 AND a.role IN ('ATTENDEE', 'SPEAKER')
         ORDER BY e.created_at",
        PREFIXED_EVENT_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Events the user organizes, newest first.
pub async fn get_created(user_id: Uuid, pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events e
         JOIN attendances a ON a.event_id = e.id
         WHERE a.user_id = $1 AND a.role = 'ORGANIZER'
         ORDER BY e.created_at DESC",
        PREFIXED_EVENT_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn set_status(id: Uuid, status: EventStatus, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE events SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Two-phase delete inside one transaction: dependents first, then the
/// event. The schema's FK cascade would also cover this; the explicit order
/// keeps the invariant visible here.
pub async fn delete(id: Uuid, pool: &PGPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM attendances WHERE event_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
