use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AttendanceRole, AttendeeRow, Event, EventStatus, User, UserRole};

#[derive(Debug, Deserialize, Clone)]
pub struct RegisterDto {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

/// Parsed create-event form. The multipart handler assembles this from the
/// raw text fields before handing it to the service layer.
#[derive(Debug, Clone)]
pub struct CreateEventDto {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub website: Option<String>,
    pub attendees_capacity: i32,
}

/// Form dates arrive as MM/DD/YYYY, midnight UTC.
pub fn parse_event_date(value: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(value, "%m/%d/%Y")
        .map_err(|_| format!("date '{}' must have the format MM/DD/YYYY", value))?;
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("date '{}' is out of range", value))?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub pfp: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.full_name(),
            email: user.email.clone(),
            pfp: user.pfp.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: TokenResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: UserResponse,
}

/// Fixed single-page envelope; the listings never split pages.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMetadata {
    pub items_per_page: usize,
    pub total_items: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

impl PaginationMetadata {
    pub fn single_page(total_items: usize) -> Self {
        Self {
            items_per_page: total_items,
            total_items,
            current_page: 1,
            total_pages: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub website: Option<String>,
    pub attendees_capacity: i32,
    pub attendees: i64,
    pub speakers: i64,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

impl EventSummary {
    pub fn from_event(event: Event, attendees: i64, speakers: i64) -> Self {
        Self {
            id: event.id,
            title: event.title,
            subtitle: event.subtitle,
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
            status: event.status,
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttendeeDetail {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub pfp: String,
    pub attendee_role: AttendanceRole,
}

impl From<&AttendeeRow> for AttendeeDetail {
    fn from(row: &AttendeeRow) -> Self {
        Self {
            id: row.user_id,
            name: format!("{} {}", row.first_name, row.last_name),
            email: row.email.clone(),
            pfp: row.pfp.clone(),
            attendee_role: row.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HostResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub pfp: String,
}

impl From<&AttendeeRow> for HostResponse {
    fn from(row: &AttendeeRow) -> Self {
        Self {
            id: row.user_id,
            name: format!("{} {}", row.first_name, row.last_name),
            email: row.email.clone(),
            pfp: row.pfp.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub image: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub website: Option<String>,
    pub attendees_capacity: i32,
    pub attendees: i64,
    pub speakers: i64,
    pub attendees_list: Vec<AttendeeDetail>,
    pub host: HostResponse,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventListResponse {
    pub events: Vec<EventSummary>,
    pub metadata: PaginationMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEventResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEventResponse {
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_dates_parse_from_us_format() {
        let dt = parse_event_date("03/14/2026").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-14T00:00:00+00:00");
    }

    #[test]
    fn bad_event_dates_are_rejected() {
        assert!(parse_event_date("2026-03-14").is_err());
        assert!(parse_event_date("14/03/2026").is_err());
        assert!(parse_event_date("").is_err());
    }

    #[test]
    fn pagination_is_always_one_page() {
        let meta = PaginationMetadata::single_page(7);
        assert_eq!(meta.items_per_page, 7);
        assert_eq!(meta.total_items, 7);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.total_pages, 1);

        let empty = PaginationMetadata::single_page(0);
        assert_eq!(empty.items_per_page, 0);
        assert_eq!(empty.total_pages, 1);
    }

    #[test]
    fn user_response_hides_the_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            pfp: "https://picsum.photos/id/237/200".to_string(),
            role: UserRole::User,
            created_at: Utc::now(),
        };
        let response = UserResponse::from(&user);
        assert_eq!(response.name, "Ada Lovelace");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
    }
}
