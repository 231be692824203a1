// Lifeboard/backend-api/src/handlers/export_handlers.rs
use crate::auth_utils::AuthenticatedUser;
use crate::db::DbPool;
use crate::error_handler::ServiceError;
use crate::export::{self, ExportFormat, ExportQuery};
use crate::handlers::task_handlers::load_all_tasks;
use crate::handlers::transaction_handlers::load_all_transactions;
use actix_web::http::header;
use actix_web::{get, web, HttpResponse};
use chrono::Utc;

fn download(collection: &str, format: ExportFormat, body: String) -> HttpResponse {
    let filename = export::export_filename(collection, format, Utc::now().date_naive());
    HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body)
}

fn serialization_failed(e: serde_json::Error) -> ServiceError {
    log::error!("Export serialization failed: {}", e);
    ServiceError::InternalServerError("Could not serialize export".to_string())
}

// === GET /export/tasks ===
#[get("/tasks")]
pub async fn export_tasks_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;
    let tasks = load_all_tasks(&mut conn, authenticated_user.id).await?;

    let body = match query.format {
        ExportFormat::Json => {
            export::tasks_to_json(&tasks, Utc::now()).map_err(serialization_failed)?
        }
        ExportFormat::Csv => export::tasks_to_csv(&tasks),
    };

    log::info!(
        "User {} exported {} tasks as {}",
        authenticated_user.id,
        tasks.len(),
        query.format.extension()
    );
    Ok(download("tasks", query.format, body))
}

// === GET /export/transactions ===
#[get("/transactions")]
pub async fn export_transactions_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;
    let transactions = load_all_transactions(&mut conn, authenticated_user.id).await?;

    let body = match query.format {
        ExportFormat::Json => export::transactions_to_json(&transactions, Utc::now())
            .map_err(serialization_failed)?,
        ExportFormat::Csv => export::transactions_to_csv(&transactions),
    };

    log::info!(
        "User {} exported {} transactions as {}",
        authenticated_user.id,
        transactions.len(),
        query.format.extension()
    );
    Ok(download("transactions", query.format, body))
}
