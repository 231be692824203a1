// Lifeboard/backend-api/src/handlers/meal_progress_handlers.rs
use crate::auth_utils::AuthenticatedUser;
use crate::db::DbPool;
use crate::diet_lifecycle::{self, DietLifecycleError};
use crate::error_handler::ServiceError;
use crate::handlers::diet_handlers::load_active_diet;
use crate::models::{MealProgress, NewMealProgress};
use crate::schema::meal_progress;
use crate::stats::meal_day_summary;
use actix_web::{get, put, web, HttpResponse};
use chrono::{NaiveDate, Utc};
use diesel::dsl::not;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct MealDayQuery {
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

pub(crate) async fn load_day_progress(
    conn: &mut AsyncPgConnection,
    user_uuid: Uuid,
    day: NaiveDate,
) -> Result<Vec<MealProgress>, ServiceError> {
    meal_progress::table
        .filter(meal_progress::user_id.eq(user_uuid))
        .filter(meal_progress::progress_date.eq(day))
        .select(MealProgress::as_select())
        .load::<MealProgress>(conn)
        .await
        .map_err(ServiceError::from)
}

// === GET /meal-progress ===
#[get("")]
pub async fn get_meal_progress_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<MealDayQuery>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let day = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let mut conn = pool.get().await?;
    let diet = load_active_diet(&mut conn, user_uuid)
        .await?
        .ok_or(DietLifecycleError::NoActiveDiet)?;
    let plan = diet
        .meal_plan()
        .map_err(|e| DietLifecycleError::CorruptMealPlan(e.to_string()))?;

    let progress = load_day_progress(&mut conn, user_uuid, day).await?;
    let summary = meal_day_summary(&plan, &progress, day);

    Ok(HttpResponse::Ok().json(json!({
        "progress": progress,
        "summary": summary
    })))
}

// === PUT /meal-progress/{slot}/toggle ===
#[put("/{slot}/toggle")]
pub async fn toggle_meal_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    slot: web::Path<String>,
    query: web::Query<MealDayQuery>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let slot = slot.into_inner();
    let day = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let mut conn = pool.get().await?;
    let diet = load_active_diet(&mut conn, user_uuid)
        .await?
        .ok_or(DietLifecycleError::NoActiveDiet)?;
    diet_lifecycle::ensure_slot(&diet, &slot)?;

    // One record per (user, slot, day). The upsert flips an existing row under its
    // row lock, so concurrent first toggles never collide on the unique key.
    let now = Utc::now();
    let (completed, completed_at) = diet_lifecycle::toggled_progress(None, now);
    let record = conn
        .transaction::<_, ServiceError, _>(move |conn| {
            async move {
                let toggled = diesel::insert_into(meal_progress::table)
                    .values(&NewMealProgress {
                        user_id: user_uuid,
                        meal_slot: slot,
                        progress_date: day,
                        completed,
                        completed_at,
                    })
                    .on_conflict((
                        meal_progress::user_id,
                        meal_progress::meal_slot,
                        meal_progress::progress_date,
                    ))
                    .do_update()
                    .set(meal_progress::completed.eq(not(meal_progress::completed)))
                    .get_result::<MealProgress>(conn)
                    .await?;

                match diet_lifecycle::restamped_progress(&toggled, now) {
                    Some(stamp) => diesel::update(
                        meal_progress::table.filter(meal_progress::id.eq(toggled.id)),
                    )
                    .set(meal_progress::completed_at.eq(stamp))
                    .get_result::<MealProgress>(conn)
                    .await
                    .map_err(ServiceError::from),
                    None => Ok(toggled),
                }
            }
            .scope_boxed()
        })
        .await?;

    log::info!(
        "User {} marked meal '{}' on {} as completed={}",
        user_uuid,
        record.meal_slot,
        record.progress_date,
        record.completed
    );
    Ok(HttpResponse::Ok().json(record))
}
