use actix_web::{get, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::service::{self, auth::current_user, auth::require_authenticated};
use crate::PGPool;

#[get("/attending")]
pub async fn attending(
    req: HttpRequest,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let response = service::event::attending(&auth, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Deserialize)]
pub struct AttendingIdsQuery {
    /// Comma-separated event ids.
    pub ids: Option<String>,
}

#[get("/attending/ids")]
pub async fn attending_ids(
    req: HttpRequest,
    query: web::Query<AttendingIdsQuery>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let candidate_ids = parse_ids(query.ids.as_deref())?;
    let response =
        service::event::attending_ids(&auth, &candidate_ids, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/created")]
pub async fn created(
    req: HttpRequest,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let response = service::event::created(&auth, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

fn parse_ids(raw: Option<&str>) -> Result<Vec<Uuid>, ApiError> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(Vec::new()),
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part)
                .map_err(|_| ApiError::Validation(format!("'{}' is not a valid event id", part)))
        })
        .collect()
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(attending).service(attending_ids).service(created);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_lists_parse_with_whitespace() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let parsed = parse_ids(Some(&format!("{}, {} ,", a, b))).unwrap();
        assert_eq!(parsed, vec![a, b]);
    }

    #[test]
    fn absent_or_empty_query_yields_no_ids() {
        assert!(parse_ids(None).unwrap().is_empty());
        assert!(parse_ids(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn junk_ids_are_validation_errors() {
        assert!(matches!(parse_ids(Some("not-a-uuid")), Err(ApiError::Validation(_))));
    }
}
