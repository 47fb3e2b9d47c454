use actix_web::{get, web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::UserRole;
use crate::service::{self, auth::current_user, auth::require_roles};
use crate::PGPool;

#[get("/list")]
pub async fn list(req: HttpRequest, pool_state: web::Data<PGPool>) -> Result<HttpResponse, ApiError> {
    require_roles(current_user(&req), &[UserRole::Admin, UserRole::SuperAdmin])?;
    let response = service::user::list(pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/retrieve/{id}")]
pub async fn retrieve(
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let response = service::user::retrieve(id.into_inner(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list).service(retrieve);
}
