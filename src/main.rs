pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;

use actix_web::{web, App, HttpServer};
use config::AppConfig;
use db::init_db_pool;
use dotenv::dotenv;
use log::info;
use sqlx::{postgres::Postgres, Pool};

pub type PGPool = Pool<Postgres>;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    service::log::init_logger();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        panic!("Failed to read configuration from env: {:?}", e);
    });
    let pool: PGPool = init_db_pool(&config.database_url).await.unwrap_or_else(|e| {
        panic!("Failed to connect to database: {:?}", e);
    });
    std::fs::create_dir_all(&config.upload_dir)?;

    info!("starting server on {}", config.bind_addr);
    let bind_addr = config.bind_addr.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(service::auth::AuthMiddleware {
                db_pool: pool.clone(),
                jwt_secret: config.jwt_secret.clone(),
            })
            .wrap(service::log::LoggerMiddleware)
            .service(web::scope("/auth").configure(handlers::auth::init_routes))
            .service(web::scope("/events").configure(handlers::event::init_routes))
            .service(web::scope("/event-actions").configure(handlers::event_actions::init_routes))
            .service(web::scope("/user-events").configure(handlers::user_events::init_routes))
            .service(web::scope("/users").configure(handlers::user::init_routes))
            .service(web::scope("/files").configure(handlers::files::init_routes))
    })
    .bind(bind_addr.as_str())?
    .run()
    .await
}
