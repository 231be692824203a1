// Lifeboard/backend-api/src/handlers/diet_handlers.rs
use crate::auth_utils::AuthenticatedUser;
use crate::db::DbPool;
use crate::diet_lifecycle::{self, DietRemoval, DietReplacement};
use crate::error_handler::ServiceError;
use crate::models::{CreateDietPayload, Diet, DietHistoryEntry, Task};
use crate::schema::{diet_history, meal_progress, tasks, user_diets};
use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Serialize, Debug)]
pub struct DietInstalledResponse {
    pub diet: Diet,
    pub meal_tasks: Vec<Task>,
    pub archived_diet_id: Option<Uuid>,
}

pub(crate) async fn load_active_diet(
    conn: &mut AsyncPgConnection,
    user_uuid: Uuid,
) -> Result<Option<Diet>, ServiceError> {
    user_diets::table
        .filter(user_diets::user_id.eq(user_uuid))
        .filter(user_diets::active.eq(true))
        .select(Diet::as_select())
        .first::<Diet>(conn)
        .await
        .optional()
        .map_err(ServiceError::from)
}

// Best-effort: a failure here leaves stale meal tasks behind but never fails the request.
async fn remove_meal_tasks(conn: &mut AsyncPgConnection, user_uuid: Uuid, diet_uuid: Uuid) {
    let result = diesel::delete(
        tasks::table
            .filter(tasks::user_id.eq(user_uuid))
            .filter(tasks::diet_id.eq(diet_uuid))
            .filter(tasks::completed.eq(false)),
    )
    .execute(conn)
    .await;

    match result {
        Ok(0) => log::debug!("No pending meal tasks left for diet {}", diet_uuid),
        Ok(n) => log::info!("Removed {} pending meal tasks of diet {}", n, diet_uuid),
        Err(e) => log::warn!(
            "Could not remove meal tasks of diet {} for user {}: {}",
            diet_uuid,
            user_uuid,
            e
        ),
    }
}

// === GET /diet ===
#[get("")]
pub async fn get_active_diet_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;
    let diet = load_active_diet(&mut conn, authenticated_user.id).await?;
    // `null` when the user has no diet yet
    Ok(HttpResponse::Ok().json(diet))
}

// === POST /diet ===
#[post("")]
pub async fn create_diet_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    payload: web::Json<CreateDietPayload>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    log::info!("User {} installing diet '{}'", user_uuid, payload.name);

    let mut conn = pool.get().await?;
    let current = load_active_diet(&mut conn, user_uuid).await?;

    let DietReplacement {
        archive,
        retired_diet_id,
        diet: new_diet,
        meal_tasks,
        reset_progress_on,
    } = diet_lifecycle::plan_replacement(current.as_ref(), &payload, user_uuid, Utc::now())?;

    // Archive, retire, progress reset and install commit together or not at all.
    let (diet, created_tasks) = conn
        .transaction::<_, ServiceError, _>(move |conn| {
            async move {
                if let Some(entry) = &archive {
                    diesel::insert_into(diet_history::table)
                        .values(entry)
                        .execute(conn)
                        .await?;
                }
                if let Some(old_id) = retired_diet_id {
                    diesel::delete(
                        user_diets::table
                            .filter(user_diets::id.eq(old_id))
                            .filter(user_diets::user_id.eq(user_uuid)),
                    )
                    .execute(conn)
                    .await?;
                }
                diesel::delete(
                    meal_progress::table
                        .filter(meal_progress::user_id.eq(user_uuid))
                        .filter(meal_progress::progress_date.eq(reset_progress_on)),
                )
                .execute(conn)
                .await?;
                let diet = diesel::insert_into(user_diets::table)
                    .values(&new_diet)
                    .get_result::<Diet>(conn)
                    .await?;
                let created_tasks = diesel::insert_into(tasks::table)
                    .values(&meal_tasks)
                    .get_results::<Task>(conn)
                    .await?;
                Ok((diet, created_tasks))
            }
            .scope_boxed()
        })
        .await?;

    if let Some(old_id) = retired_diet_id {
        log::info!("Diet {} archived for user {}", old_id, user_uuid);
        remove_meal_tasks(&mut conn, user_uuid, old_id).await;
    }

    Ok(HttpResponse::Created().json(DietInstalledResponse {
        diet,
        meal_tasks: created_tasks,
        archived_diet_id: retired_diet_id,
    }))
}

// === DELETE /diet ===
#[delete("")]
pub async fn delete_diet_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;

    let mut conn = pool.get().await?;
    let current = load_active_diet(&mut conn, user_uuid).await?;

    let DietRemoval {
        archive,
        retired_diet_id,
    } = diet_lifecycle::plan_removal(current.as_ref(), Utc::now())?;

    conn.transaction::<_, ServiceError, _>(move |conn| {
        async move {
            diesel::insert_into(diet_history::table)
                .values(&archive)
                .execute(conn)
                .await?;
            diesel::delete(
                user_diets::table
                    .filter(user_diets::id.eq(retired_diet_id))
                    .filter(user_diets::user_id.eq(user_uuid)),
            )
            .execute(conn)
            .await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await?;

    remove_meal_tasks(&mut conn, user_uuid, retired_diet_id).await;

    log::info!("User {} removed diet {}", user_uuid, retired_diet_id);
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("Diet {} archived and removed", retired_diet_id)
    })))
}

// === GET /diet/history ===
#[get("/history")]
pub async fn list_diet_history_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let history = diet_history::table
        .filter(diet_history::user_id.eq(authenticated_user.id))
        .order(diet_history::ended_at.desc())
        .select(DietHistoryEntry::as_select())
        .load::<DietHistoryEntry>(&mut conn)
        .await
        .map_err(ServiceError::from)?;

    Ok(HttpResponse::Ok().json(history))
}
