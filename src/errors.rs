use actix_web::{
    error,
    http::StatusCode,
    HttpResponse,
};
use derive_more::{Display, Error};
use log::error;

/// Crate-wide error taxonomy. Every variant maps to one HTTP status and a
/// stable machine-readable code; the Display string becomes the message.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display(fmt = "user with this email already exists")]
    EmailTaken,

    #[display(fmt = "you are already registered for this event")]
    AlreadyRegistered,

    #[display(fmt = "the event has reached its attendee capacity")]
    EventFull,

    #[display(fmt = "the event is no longer incoming")]
    AlreadyCompleted,

    #[display(fmt = "invalid email or password")]
    InvalidCredentials,

    #[display(fmt = "user not authenticated")]
    Unauthenticated,

    #[display(fmt = "user does not have the required role")]
    Forbidden,

    #[display(fmt = "you do not have permission to complete this event")]
    CompleteForbidden,

    #[display(fmt = "you do not have permission to delete this event")]
    DeleteForbidden,

    #[display(fmt = "event not found")]
    EventNotFound,

    #[display(fmt = "event host not found")]
    HostNotFound,

    #[display(fmt = "user not found")]
    UserNotFound,

    #[display(fmt = "you are not registered for this event")]
    NotRegistered,

    #[display(fmt = "file not found")]
    FileNotFound,

    #[display(fmt = "{}", _0)]
    Validation(#[error(not(source))] String),

    #[display(fmt = "internal error")]
    Internal,
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match *self {
            ApiError::EmailTaken => "409__AUTH__USER_EXISTS",
            ApiError::AlreadyRegistered => "409__ALREADY_REGISTERED",
            ApiError::EventFull => "409__EVENT_FULL",
            ApiError::AlreadyCompleted => "409__EVENT__ALREADY_COMPLETED",
            ApiError::InvalidCredentials => "401__AUTH__INVALID_CREDENTIALS",
            ApiError::Unauthenticated => "401__UNAUTHORIZED",
            ApiError::Forbidden => "403__ACCESS_DENIED",
            ApiError::CompleteForbidden => "403__FORBIDDEN__COMPLETE_EVENT",
            ApiError::DeleteForbidden => "403__EVENT__DELETE__FORBIDDEN",
            ApiError::EventNotFound => "404__EVENT__NOT_FOUND",
            ApiError::HostNotFound => "404__EVENT__HOST__NOT_FOUND",
            ApiError::UserNotFound => "404__USER__NOT_FOUND",
            ApiError::NotRegistered => "404__NOT_REGISTERED",
            ApiError::FileNotFound => "404__FILE__NOT_FOUND",
            ApiError::Validation(_) => "422__VALIDATION",
            ApiError::Internal => "500__INTERNAL",
        }
    }
}

impl error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            code: self.code(),
            message: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::EmailTaken
            | ApiError::AlreadyRegistered
            | ApiError::EventFull
            | ApiError::AlreadyCompleted => StatusCode::CONFLICT,
            ApiError::InvalidCredentials | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden | ApiError::CompleteForbidden | ApiError::DeleteForbidden => {
                StatusCode::FORBIDDEN
            }
            ApiError::EventNotFound
            | ApiError::HostNotFound
            | ApiError::UserNotFound
            | ApiError::NotRegistered
            | ApiError::FileNotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Store failures surface as a generic 500; the sqlx transaction guard has
/// already rolled back by the time the error propagates here.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        error!("database error: {:?}", err);
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::error::ResponseError;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(ApiError::EmailTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::AlreadyRegistered.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::CompleteForbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::EventNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Validation("bad date".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::Internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn codes_are_stable_strings() {
        assert_eq!(ApiError::EmailTaken.code(), "409__AUTH__USER_EXISTS");
        assert_eq!(ApiError::CompleteForbidden.code(), "403__FORBIDDEN__COMPLETE_EVENT");
        assert_eq!(ApiError::DeleteForbidden.code(), "403__EVENT__DELETE__FORBIDDEN");
        assert_eq!(ApiError::HostNotFound.code(), "404__EVENT__HOST__NOT_FOUND");
    }

    #[test]
    fn validation_message_passes_through() {
        let err = ApiError::Validation("start_date must be MM/DD/YYYY".to_string());
        assert_eq!(err.to_string(), "start_date must be MM/DD/YYYY");
    }
}
