// Lifeboard/backend-api/src/handlers/stats_handlers.rs
use crate::auth_utils::AuthenticatedUser;
use crate::db::DbPool;
use crate::error_handler::ServiceError;
use crate::handlers::diet_handlers::load_active_diet;
use crate::handlers::meal_progress_handlers::load_day_progress;
use crate::handlers::task_handlers::load_all_tasks;
use crate::handlers::transaction_handlers::load_all_transactions;
use crate::stats::{self, StatsQuery};
use actix_web::{get, web, HttpResponse, Result as ActixResult};
use chrono::Utc;
use serde_json::json;

// === GET /stats/tasks ===
#[get("/tasks")]
pub async fn get_task_stats_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<StatsQuery>,
) -> ActixResult<HttpResponse, ServiceError> {
    log::info!(
        "User {} fetching task stats with params: {:?}",
        authenticated_user.id,
        query.0
    );

    let mut conn = pool.get().await?;
    let tasks = load_all_tasks(&mut conn, authenticated_user.id).await?;

    let today = Utc::now().date_naive();
    Ok(HttpResponse::Ok().json(stats::task_stats(&tasks, query.period, today)))
}

// === GET /stats/transactions ===
#[get("/transactions")]
pub async fn get_transaction_stats_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<StatsQuery>,
) -> ActixResult<HttpResponse, ServiceError> {
    log::info!(
        "User {} fetching transaction stats with params: {:?}",
        authenticated_user.id,
        query.0
    );

    let mut conn = pool.get().await?;
    let transactions = load_all_transactions(&mut conn, authenticated_user.id).await?;

    let today = Utc::now().date_naive();
    Ok(HttpResponse::Ok().json(stats::transaction_stats(
        &transactions,
        query.period,
        today,
    )))
}

// === GET /stats/overview ===
#[get("/overview")]
pub async fn get_overview_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<StatsQuery>,
) -> ActixResult<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let today = Utc::now().date_naive();

    let mut conn = pool.get().await?;
    let tasks = load_all_tasks(&mut conn, user_uuid).await?;
    let transactions = load_all_transactions(&mut conn, user_uuid).await?;

    // Meals are only summarised while a readable diet is active.
    let meals = match load_active_diet(&mut conn, user_uuid).await? {
        Some(diet) => match diet.meal_plan() {
            Ok(plan) => {
                let progress = load_day_progress(&mut conn, user_uuid, today).await?;
                Some(stats::meal_day_summary(&plan, &progress, today))
            }
            Err(e) => {
                log::warn!("Skipping meal summary for diet {}: {}", diet.id, e);
                None
            }
        },
        None => None,
    };

    Ok(HttpResponse::Ok().json(json!({
        "tasks": stats::task_stats(&tasks, query.period, today),
        "transactions": stats::transaction_stats(&transactions, query.period, today),
        "meals": meals
    })))
}
