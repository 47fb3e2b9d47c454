use actix_web::{get, web, HttpResponse};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::service::files;

#[get("/{event_id}/{filename}")]
pub async fn serve(
    path: web::Path<(Uuid, String)>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let (event_id, filename) = path.into_inner();
    let bytes = files::load(&config.upload_dir, event_id, &filename).await?;
    Ok(HttpResponse::Ok().content_type("image/png").body(bytes))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(serve);
}
