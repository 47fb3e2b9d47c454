use actix_web::{get, post, web, HttpRequest, HttpResponse};
use log::info;

use crate::config::AppConfig;
use crate::dto::{LoginDto, RegisterDto};
use crate::errors::ApiError;
use crate::service::{self, auth::current_user, auth::require_authenticated};
use crate::PGPool;

#[post("/register")]
pub async fn register(
    dto: web::Json<RegisterDto>,
    config: web::Data<AppConfig>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let response = service::user::register(dto.into_inner(), &config, pool_state.get_ref()).await?;
    info!("registered user {}", response.user.id);
    Ok(HttpResponse::Ok().json(response))
}

#[post("/login")]
pub async fn login(
    dto: web::Json<LoginDto>,
    config: web::Data<AppConfig>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let response = service::user::login(dto.into_inner(), &config, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/session")]
pub async fn session(
    req: HttpRequest,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let response = service::user::session(&auth, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(login).service(session);
}
