use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dto::{parse_event_date, CreateEventDto};
use crate::errors::ApiError;
use crate::service::files::ImageUpload;
use crate::service::{self, auth::current_user, auth::require_authenticated};
use crate::PGPool;

#[get("/list")]
pub async fn list(pool_state: web::Data<PGPool>) -> Result<HttpResponse, ApiError> {
    let response = service::event::list(pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/retrieve/{id}")]
pub async fn retrieve(
    req: HttpRequest,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    require_authenticated(current_user(&req))?;
    let response = service::event::retrieve(id.into_inner(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/create")]
pub async fn create(
    req: HttpRequest,
    payload: Multipart,
    config: web::Data<AppConfig>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let (dto, image) = read_create_form(payload, config.max_upload_bytes).await?;
    let response =
        service::event::create(&auth, dto, image, &config, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[delete("/delete/{id}")]
pub async fn delete(
    req: HttpRequest,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = require_authenticated(current_user(&req))?;
    let response = service::event::delete(&auth, id.into_inner(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Drains the multipart stream into the form fields and the image upload.
/// Any chunk pushing a part past `max_bytes` aborts with a validation error.
async fn read_create_form(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<(CreateEventDto, ImageUpload), ApiError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image: Option<ImageUpload> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart payload".to_string()))?
    {
        let name = field.name().to_string();
        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|_| ApiError::Validation("malformed multipart payload".to_string()))?
        {
            if data.len() + chunk.len() > max_bytes {
                return Err(ApiError::Validation(format!(
                    "field '{}' exceeds the {} byte upload limit",
                    name, max_bytes
                )));
            }
            data.extend_from_slice(&chunk);
        }
        if name == "image" {
            let filename = field
                .content_disposition()
                .get_filename()
                .unwrap_or("image.png")
                .to_string();
            image = Some(ImageUpload {
                filename,
                bytes: data,
            });
        } else {
            let value = String::from_utf8(data)
                .map_err(|_| ApiError::Validation(format!("field '{}' is not valid utf-8", name)))?;
            fields.insert(name, value);
        }
    }

    let image = image.ok_or_else(|| ApiError::Validation("missing image file".to_string()))?;
    let dto = build_create_dto(&fields)?;
    Ok((dto, image))
}

fn required<'a>(fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str, ApiError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| ApiError::Validation(format!("missing form field '{}'", name)))
}

fn build_create_dto(fields: &HashMap<String, String>) -> Result<CreateEventDto, ApiError> {
    let start_date = parse_event_date(required(fields, "start_date")?).map_err(ApiError::Validation)?;
    let end_date = parse_event_date(required(fields, "end_date")?).map_err(ApiError::Validation)?;
    let attendees_capacity: i32 = required(fields, "attendees_capacity")?
        .parse()
        .map_err(|_| ApiError::Validation("attendees_capacity must be an integer".to_string()))?;
    if attendees_capacity < 0 {
        return Err(ApiError::Validation(
            "attendees_capacity must not be negative".to_string(),
        ));
    }
    Ok(CreateEventDto {
        title: required(fields, "title")?.to_string(),
        subtitle: required(fields, "subtitle")?.to_string(),
        description: required(fields, "description")?.to_string(),
        country: required(fields, "country")?.to_string(),
        city: required(fields, "city")?.to_string(),
        address: required(fields, "address")?.to_string(),
        start_date,
        end_date,
        website: fields.get("website").cloned().filter(|v| !v.is_empty()),
        attendees_capacity,
    })
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(retrieve)
        .service(create)
        .service(delete);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_form() -> HashMap<String, String> {
        form(&[
            ("title", "RustConf"),
            ("subtitle", "The Rust conference"),
            ("description", "Talks and workshops"),
            ("country", "Portugal"),
            ("city", "Lisbon"),
            ("address", "Av. da Liberdade 1"),
            ("start_date", "09/01/2026"),
            ("end_date", "09/03/2026"),
            ("attendees_capacity", "250"),
            ("website", "https://rustconf.example"),
        ])
    }

    #[test]
    fn full_form_builds_the_dto() {
        let dto = build_create_dto(&full_form()).unwrap();
        assert_eq!(dto.title, "RustConf");
        assert_eq!(dto.attendees_capacity, 250);
        assert_eq!(dto.website.as_deref(), Some("https://rustconf.example"));
        assert!(dto.start_date < dto.end_date);
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let mut fields = full_form();
        fields.remove("city");
        assert!(matches!(build_create_dto(&fields), Err(ApiError::Validation(_))));
    }

    #[test]
    fn malformed_dates_are_validation_errors() {
        let mut fields = full_form();
        fields.insert("start_date".to_string(), "2026-09-01".to_string());
        assert!(matches!(build_create_dto(&fields), Err(ApiError::Validation(_))));
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let mut fields = full_form();
        fields.insert("attendees_capacity".to_string(), "-1".to_string());
        assert!(matches!(build_create_dto(&fields), Err(ApiError::Validation(_))));
    }

    #[test]
    fn empty_website_reads_as_absent() {
        let mut fields = full_form();
        fields.insert("website".to_string(), String::new());
        let dto = build_create_dto(&fields).unwrap();
        assert!(dto.website.is_none());
    }
}
