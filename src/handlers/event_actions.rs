use actix_web::{delete, post, web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::AttendanceRole;
use crate::service::{self, auth::current_user, auth::require_authenticated};
use crate::PGPool;

#[post("/{id}/register")]
pub async fn register(
    req: HttpRequest,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let response = service::event::register(
        &auth,
        id.into_inner(),
        AttendanceRole::Attendee,
        pool_state.get_ref(),
    )
    .await?;
    Ok(HttpResponse::Created().json(response))
}

#[post("/{id}/register-as-speaker")]
pub async fn register_as_speaker(
    req: HttpRequest,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let response = service::event::register(
        &auth,
        id.into_inner(),
        AttendanceRole::Speaker,
        pool_state.get_ref(),
    )
    .await?;
    Ok(HttpResponse::Created().json(response))
}

#[delete("/{id}/unregister")]
pub async fn unregister(
    req: HttpRequest,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let response = service::event::unregister(&auth, id.into_inner(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/{id}/complete")]
pub async fn complete(
    req: HttpRequest,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let response = service::event::complete(&auth, id.into_inner(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(register_as_speaker)
        .service(unregister)
        .service(complete);
}
