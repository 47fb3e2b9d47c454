use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db;
use crate::dto::{
    AttendeeDetail, CreateEventDto, CreateEventResponse, DeleteEventResponse, EventDetailResponse,
    EventListResponse, EventSummary, HostResponse, MessageResponse, PaginationMetadata,
};
use crate::errors::ApiError;
use crate::models::{Attendance, AttendanceRole, Event, EventStatus, RoleCount};
use crate::service::auth::AuthUser;
use crate::service::files::{self, ImageUpload};
use crate::PGPool;

/// Attendee registrations stop once the ceiling is hit; speakers and the
/// organizer are exempt.
fn capacity_reached(taken: i64, capacity: i32) -> bool {
    taken >= i64::from(capacity)
}

/// Only incoming events can be completed; anything else is an explicit
/// conflict, not a silent no-op.
fn completable(status: EventStatus) -> Result<(), ApiError> {
    match status {
        EventStatus::Incoming => Ok(()),
        EventStatus::Completed | EventStatus::Cancelled => Err(ApiError::AlreadyCompleted),
    }
}

/// The organizer row is created with the event and only ever removed with
/// it; unregister touches attendee and speaker rows alone.
fn deregistrable(role: AttendanceRole) -> bool {
    matches!(role, AttendanceRole::Attendee | AttendanceRole::Speaker)
}

/// A unique-violation on insert means a concurrent request won the
/// check-then-insert race; everything else is a store failure.
fn map_registration_error(err: sqlx::Error) -> ApiError {
    if db::attendance::is_duplicate_registration(&err) {
        ApiError::AlreadyRegistered
    } else {
        err.into()
    }
}

/// Collapses the sparse grouped-count rows into a per-event
/// (attendees, speakers) map. Events absent from `rows` stay absent here;
/// the caller defaults them to (0, 0).
fn role_count_map(rows: Vec<RoleCount>) -> HashMap<Uuid, (i64, i64)> {
    let mut map: HashMap<Uuid, (i64, i64)> = HashMap::new();
    for row in rows {
        let entry = map.entry(row.event_id).or_insert((0, 0));
        match row.role {
            AttendanceRole::Attendee => entry.0 = row.count,
            AttendanceRole::Speaker => entry.1 = row.count,
            AttendanceRole::Organizer => {}
        }
    }
    map
}

async fn summarize(events: Vec<Event>, pool: &PGPool) -> Result<EventListResponse, ApiError> {
    if events.is_empty() {
        return Ok(EventListResponse {
            events: Vec::new(),
            metadata: PaginationMetadata::single_page(0),
        });
    }
    let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
    let counts = role_count_map(db::attendance::role_counts(&ids, pool).await?);
    let total = events.len();
    let summaries = events
        .into_iter()
        .map(|event| {
            let (attendees, speakers) = counts.get(&event.id).copied().unwrap_or((0, 0));
            EventSummary::from_event(event, attendees, speakers)
        })
        .collect();
    Ok(EventListResponse {
        events: summaries,
        metadata: PaginationMetadata::single_page(total),
    })
}

pub async fn list(pool: &PGPool) -> Result<EventListResponse, ApiError> {
    let events = db::event::get_all_newest_first(pool).await?;
    summarize(events, pool).await
}

pub async fn retrieve(id: Uuid, pool: &PGPool) -> Result<EventDetailResponse, ApiError> {
    let event = db::event::get_by_id(id, pool)
        .await?
        .ok_or(ApiError::EventNotFound)?;
    let host = db::attendance::host_with_user(id, pool)
        .await?
        .ok_or(ApiError::HostNotFound)?;
    let attendee_rows = db::attendance::list_with_users(id, pool).await?;
    let counts = role_count_map(db::attendance::role_counts(&[id], pool).await?);
    let (attendees, speakers) = counts.get(&id).copied().unwrap_or((0, 0));
    Ok(EventDetailResponse {
        id: event.id,
        title: event.title,
        subtitle: event.subtitle,
        description: event.description,
        image: event.image,
        country: event.country,
        city: event.city,
        address: event.address,
        start_date: event.start_date,
        end_date: event.end_date,
        website: event.website,
        attendees_capacity: event.attendees_capacity,
        attendees,
        speakers,
        attendees_list: attendee_rows.iter().map(AttendeeDetail::from).collect(),
        host: HostResponse::from(&host),
        status: event.status,
        created_at: event.created_at,
    })
}

/// Persists the event and the creator's organizer attendance in one
/// transaction, after materializing the uploaded image.
pub async fn create(
    auth: &AuthUser,
    dto: CreateEventDto,
    image: ImageUpload,
    config: &AppConfig,
    pool: &PGPool,
) -> Result<CreateEventResponse, ApiError> {
    let event_id = Uuid::new_v4();
    let image_ref = files::save(&config.upload_dir, event_id, &image).await?;
    let event = Event {
        id: event_id,
        title: dto.title,
        subtitle: dto.subtitle,
        description: dto.description,
        image: image_ref,
        country: dto.country,
        city: dto.city,
        address: dto.address,
        start_date: dto.start_date,
        end_date: dto.end_date,
        website: dto.website,
        attendees_capacity: dto.attendees_capacity,
        status: EventStatus::Incoming,
        created_at: Utc::now(),
    };
    let organizer = Attendance {
        id: Uuid::new_v4(),
        user_id: auth.id,
        event_id,
        role: AttendanceRole::Organizer,
    };
    if let Err(err) = db::event::create_with_organizer(&event, &organizer, pool).await {
        // The rows rolled back together; don't leave the image behind.
        files::discard(&config.upload_dir, event_id).await;
        return Err(err.into());
    }
    Ok(CreateEventResponse { id: event_id })
}

/// Organizer attendance or an elevated global role; everyone else is
/// forbidden.
pub async fn delete(auth: &AuthUser, id: Uuid, pool: &PGPool) -> Result<DeleteEventResponse, ApiError> {
    db::event::get_by_id(id, pool)
        .await?
        .ok_or(ApiError::EventNotFound)?;
    let is_organizer = db::attendance::find_organizer(auth.id, id, pool).await?.is_some();
    if !is_organizer && !auth.role.is_elevated() {
        return Err(ApiError::DeleteForbidden);
    }
    db::event::delete(id, pool).await?;
    Ok(DeleteEventResponse {
        id,
        message: "Event deleted successfully.".to_string(),
    })
}

/// Only the organizer may complete, regardless of global role. Completing
/// an event that is no longer incoming is an explicit conflict, not a
/// silent no-op.
pub async fn complete(auth: &AuthUser, id: Uuid, pool: &PGPool) -> Result<MessageResponse, ApiError> {
    let event = db::event::get_by_id(id, pool)
        .await?
        .ok_or(ApiError::EventNotFound)?;
    db::attendance::find_organizer(auth.id, id, pool)
        .await?
        .ok_or(ApiError::CompleteForbidden)?;
    completable(event.status)?;
    db::event::set_status(id, EventStatus::Completed, pool).await?;
    Ok(MessageResponse {
        message: "Event marked as completed.".to_string(),
    })
}

pub async fn register(
    auth: &AuthUser,
    event_id: Uuid,
    role: AttendanceRole,
    pool: &PGPool,
) -> Result<MessageResponse, ApiError> {
    let event = db::event::get_by_id(event_id, pool)
        .await?
        .ok_or(ApiError::EventNotFound)?;
    if db::attendance::find(auth.id, event_id, pool).await?.is_some() {
        return Err(ApiError::AlreadyRegistered);
    }
    // Speakers don't count against the attendee capacity.
    if role == AttendanceRole::Attendee {
        let taken = db::attendance::attendee_count(event_id, pool).await?;
        if capacity_reached(taken, event.attendees_capacity) {
            return Err(ApiError::EventFull);
        }
    }
    let attendance = Attendance {
        id: Uuid::new_v4(),
        user_id: auth.id,
        event_id,
        role,
    };
    // The (user, event) uniqueness constraint closes the window between the
    // pre-check and this insert under concurrent requests.
    db::attendance::insert(&attendance, pool)
        .await
        .map_err(map_registration_error)?;
    Ok(MessageResponse {
        message: "Successfully registered to event.".to_string(),
    })
}

/// Removes the caller's attendee or speaker row. The organizer row never
/// goes through here; it lives and dies with the event itself.
pub async fn unregister(auth: &AuthUser, event_id: Uuid, pool: &PGPool) -> Result<MessageResponse, ApiError> {
    let attendance = db::attendance::find(auth.id, event_id, pool)
        .await?
        .ok_or(ApiError::NotRegistered)?;
    if !deregistrable(attendance.role) {
        return Err(ApiError::NotRegistered);
    }
    let removed = db::attendance::remove(auth.id, event_id, pool).await?;
    if removed == 0 {
        return Err(ApiError::NotRegistered);
    }
    Ok(MessageResponse {
        message: "Successfully unregistered from event.".to_string(),
    })
}

pub async fn attending(auth: &AuthUser, pool: &PGPool) -> Result<EventListResponse, ApiError> {
    let events = db::event::get_attending(auth.id, pool).await?;
    summarize(events, pool).await
}

pub async fn created(auth: &AuthUser, pool: &PGPool) -> Result<EventListResponse, ApiError> {
    let events = db::event::get_created(auth.id, pool).await?;
    summarize(events, pool).await
}

pub async fn attending_ids(
    auth: &AuthUser,
    candidate_ids: &[Uuid],
    pool: &PGPool,
) -> Result<Vec<Uuid>, ApiError> {
    if candidate_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(db::attendance::attending_ids(auth.id, candidate_ids, pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_row(event_id: Uuid, role: AttendanceRole, count: i64) -> RoleCount {
        RoleCount {
            event_id,
            role,
            count,
        }
    }

    #[test]
    fn sparse_counts_default_to_zero() {
        let with_rows = Uuid::new_v4();
        let without_rows = Uuid::new_v4();
        let map = role_count_map(vec![
            count_row(with_rows, AttendanceRole::Attendee, 3),
            count_row(with_rows, AttendanceRole::Speaker, 2),
        ]);
        assert_eq!(map.get(&with_rows), Some(&(3, 2)));
        assert_eq!(map.get(&without_rows).copied().unwrap_or((0, 0)), (0, 0));
    }

    #[test]
    fn counts_keep_roles_apart() {
        let event = Uuid::new_v4();
        let map = role_count_map(vec![count_row(event, AttendanceRole::Speaker, 5)]);
        assert_eq!(map.get(&event), Some(&(0, 5)));
    }

    #[test]
    fn organizer_rows_never_reach_the_counts() {
        let event = Uuid::new_v4();
        let map = role_count_map(vec![count_row(event, AttendanceRole::Organizer, 1)]);
        assert_eq!(map.get(&event), Some(&(0, 0)));
    }

    #[test]
    fn capacity_stops_registration_at_the_ceiling() {
        assert!(!capacity_reached(99, 100));
        assert!(capacity_reached(100, 100));
        assert!(capacity_reached(101, 100));
    }

    #[test]
    fn zero_capacity_events_are_always_full() {
        assert!(capacity_reached(0, 0));
    }

    #[test]
    fn only_incoming_events_can_be_completed() {
        assert!(completable(EventStatus::Incoming).is_ok());
        assert!(matches!(
            completable(EventStatus::Completed),
            Err(ApiError::AlreadyCompleted)
        ));
        assert!(matches!(
            completable(EventStatus::Cancelled),
            Err(ApiError::AlreadyCompleted)
        ));
    }

    #[test]
    fn organizers_cannot_unregister_from_their_own_event() {
        assert!(!deregistrable(AttendanceRole::Organizer));
        assert!(deregistrable(AttendanceRole::Attendee));
        assert!(deregistrable(AttendanceRole::Speaker));
    }

    #[test]
    fn non_duplicate_insert_failures_stay_internal() {
        assert!(matches!(
            map_registration_error(sqlx::Error::RowNotFound),
            ApiError::Internal
        ));
        assert!(matches!(
            map_registration_error(sqlx::Error::PoolClosed),
            ApiError::Internal
        ));
    }
}
