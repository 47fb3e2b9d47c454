use uuid::Uuid;

use crate::models::{Attendance, AttendeeRow, RoleCount};
use crate::PGPool;

pub async fn find(
    user_id: Uuid,
    event_id: Uuid,
    pool: &PGPool,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(
        "SELECT id, user_id, event_id, role FROM attendances WHERE user_id = $1 AND event_id = $2",
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_organizer(
    user_id: Uuid,
    event_id: Uuid,
    pool: &PGPool,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(
        "SELECT id, user_id, event_id, role FROM attendances
         WHERE user_id = $1 AND event_id = $2 AND role = 'ORGANIZER'",
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert(attendance: &Attendance, pool: &PGPool) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO attendances (id, user_id, event_id, role) VALUES ($1, $2, $3, $4)")
        .bind(attendance.id)
        .bind(attendance.user_id)
        .bind(attendance.event_id)
        .bind(attendance.role)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes the user's attendee or speaker row. Organizer rows are only
/// removed together with their event.
pub async fn remove(user_id: Uuid, event_id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "DELETE FROM attendances
         WHERE user_id = $1 AND event_id = $2 AND role IN ('ATTENDEE', 'SPEAKER')",
    )
    .bind(user_id)
    .bind(event_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn attendee_count(event_id: Uuid, pool: &PGPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendances WHERE event_id = $1 AND role = 'ATTENDEE'",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await
}

/// Grouped attendee/speaker counts for a batch of events. The result is
/// sparse; events with no rows simply don't appear and the caller fills in
/// zeros.
pub async fn role_counts(event_ids: &[Uuid], pool: &PGPool) -> Result<Vec<RoleCount>, sqlx::Error> {
    sqlx::query_as::<_, RoleCount>(
        "SELECT event_id, role, COUNT(*) AS count FROM attendances
         WHERE event_id = ANY($1) AND role IN ('ATTENDEE', 'SPEAKER')
         GROUP BY event_id, role",
    )
    .bind(event_ids)
    .fetch_all(pool)
    .await
}

pub async fn list_with_users(event_id: Uuid, pool: &PGPool) -> Result<Vec<AttendeeRow>, sqlx::Error> {
    sqlx::query_as::<_, AttendeeRow>(
        "SELECT a.user_id, u.first_name, u.last_name, u.email, u.pfp, a.role
         FROM attendances a JOIN users u ON u.id = a.user_id
         WHERE a.event_id = $1",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}

pub async fn host_with_user(event_id: Uuid, pool: &PGPool) -> Result<Option<AttendeeRow>, sqlx::Error> {
    sqlx::query_as::<_, AttendeeRow>(
        "SELECT a.user_id, u.first_name, u.last_name, u.email, u.pfp, a.role
         FROM attendances a JOIN users u ON u.id = a.user_id
         WHERE a.event_id = $1 AND a.role = 'ORGANIZER'",
    )
    .bind(event_id)
    .fetch_optional(pool)
    .await
}

/// Subset of the candidate ids the user attends (attendee or speaker).
pub async fn attending_ids(
    user_id: Uuid,
    event_ids: &[Uuid],
    pool: &PGPool,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT event_id FROM attendances
         WHERE user_id = $1 AND event_id = ANY($2) AND role IN ('ATTENDEE', 'SPEAKER')",
    )
    .bind(user_id)
    .bind(event_ids)
    .fetch_all(pool)
    .await
}

/// True when the insert failed on the (user_id, event_id) uniqueness
/// constraint, i.e. a concurrent request registered the same user first.
pub fn is_duplicate_registration(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
