use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Global account role. Closed set, checked with exhaustive matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Admin,
    SuperAdmin,
}

impl UserRole {
    pub fn is_elevated(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Incoming,
    Completed,
    Cancelled,
}

/// Role a user holds inside a single event. Exactly one organizer row
/// exists per event, created together with the event itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceRole {
    Organizer,
    Speaker,
    Attendee,
}

#[derive(Debug, FromRow, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub pfp: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Event {
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
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

/// Join row between users and events. At most one row per (user, event),
/// enforced by a uniqueness constraint in the schema.
#[derive(Debug, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Attendance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub role: AttendanceRole,
}

/// One row of the grouped (event, role) -> count aggregate.
#[derive(Debug, FromRow)]
pub struct RoleCount {
    pub event_id: Uuid,
    pub role: AttendanceRole,
    pub count: i64,
}

/// Attendance row joined with the user it belongs to.
#[derive(Debug, FromRow)]
pub struct AttendeeRow {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pfp: String,
    pub role: AttendanceRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_as_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&UserRole::SuperAdmin).unwrap(), "\"SUPER_ADMIN\"");
        assert_eq!(serde_json::to_string(&EventStatus::Incoming).unwrap(), "\"INCOMING\"");
        assert_eq!(serde_json::to_string(&AttendanceRole::Organizer).unwrap(), "\"ORGANIZER\"");
    }

    #[test]
    fn roles_deserialize_back() {
        let role: UserRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, UserRole::Admin);
        let status: EventStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(status, EventStatus::Cancelled);
    }

    #[test]
    fn only_admin_roles_are_elevated() {
        assert!(!UserRole::User.is_elevated());
        assert!(UserRole::Admin.is_elevated());
        assert!(UserRole::SuperAdmin.is_elevated());
    }
}
