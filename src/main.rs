// Lifeboard/backend-api/src/main.rs
mod auth_utils;
mod config;
mod db;
mod diet_lifecycle;
mod error_handler;
mod export;
mod handlers;
mod models;
mod recurrence;
pub mod schema;
mod stats;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpResponse, HttpServer};
use config::AppConfig;
use db::DbPool;
use std::time::Duration;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

async fn health_check_handler(
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, error_handler::ServiceError> {
    match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, pool.get()).await {
        Ok(Ok(_conn)) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "message": "Backend is running and DB pool accessible"
        }))),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => {
            log::error!(
                "Timed out after {:?} waiting for a pooled connection",
                HEALTH_CHECK_TIMEOUT
            );
            Err(error_handler::ServiceError::PoolError(
                "Database pool did not answer in time".to_string(),
            ))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if cfg!(debug_assertions) {
        match dotenvy::dotenv() {
            Ok(path) => log::info!(".env file loaded from path: {}", path.display()),
            Err(e) => log::warn!(
                "Could not load .env file: {}, using environment variables.",
                e
            ),
        }
    }

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let pool = db::create_pool(&config.database_url, config.db_pool_size)
        .await
        .map_err(|e| {
            log::error!("Failed to create database connection pool: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;

    log::info!("🚀 Lifeboard Backend Service starting...");
    log::info!("Server will start at http://{}", config.bind_address());

    let frontend_url_prod = config.frontend_url_prod.clone();
    let frontend_url_dev = config.frontend_url_dev.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url_prod)
            .allowed_origin(&frontend_url_dev)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-user-id"),
                header::HeaderName::from_static("x-auth-error"),
            ])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(pool.clone()))
            .service(web::resource("/health").route(web::get().to(health_check_handler)))
            .service(
                web::scope("/users")
                    .service(handlers::user_handlers::get_profile_handler)
                    .service(handlers::user_handlers::upsert_profile_handler)
                    .service(handlers::user_handlers::delete_account_handler),
            )
            .service(
                web::scope("/tasks")
                    .service(handlers::task_handlers::create_task_handler)
                    .service(handlers::task_handlers::list_tasks_handler)
                    .service(handlers::task_handlers::get_task_handler)
                    .service(handlers::task_handlers::update_task_handler)
                    .service(handlers::task_handlers::toggle_task_completion_handler)
                    .service(handlers::task_handlers::delete_task_handler),
            )
            .service(
                web::scope("/transactions")
                    .service(handlers::transaction_handlers::create_transaction_handler)
                    .service(handlers::transaction_handlers::list_transactions_handler)
                    .service(handlers::transaction_handlers::get_transaction_handler)
                    .service(handlers::transaction_handlers::update_transaction_handler)
                    .service(handlers::transaction_handlers::delete_transaction_handler),
            )
            .service(
                web::scope("/diet")
                    .service(handlers::diet_handlers::list_diet_history_handler)
                    .service(handlers::diet_handlers::get_active_diet_handler)
                    .service(handlers::diet_handlers::create_diet_handler)
                    .service(handlers::diet_handlers::delete_diet_handler),
            )
            .service(
                web::scope("/meal-progress")
                    .service(handlers::meal_progress_handlers::get_meal_progress_handler)
                    .service(handlers::meal_progress_handlers::toggle_meal_handler),
            )
            .service(
                web::scope("/stats")
                    .service(handlers::stats_handlers::get_task_stats_handler)
                    .service(handlers::stats_handlers::get_transaction_stats_handler)
                    .service(handlers::stats_handlers::get_overview_handler),
            )
            .service(
                web::scope("/export")
                    .service(handlers::export_handlers::export_tasks_handler)
                    .service(handlers::export_handlers::export_transactions_handler),
            )
    })
    .bind(config.bind_address())?
    .run()
    .await
}
