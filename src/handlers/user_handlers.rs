// Lifeboard/backend-api/src/handlers/user_handlers.rs
use crate::auth_utils::AuthenticatedUser;
use crate::db::DbPool;
use crate::error_handler::ServiceError;
use crate::models::{NewUserProfile, UpdateUserProfileChangeset, UpsertUserPayload, UserProfile};
use crate::schema::{diet_history, meal_progress, tasks, transactions, user_diets, users};
use actix_web::{delete, get, put, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde_json::json;

fn validate_email(email: &str) -> Result<(), ServiceError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ServiceError::BadRequest(format!(
            "'{}' is not a valid email address",
            email
        ))),
    }
}

// === GET /users/me ===
#[get("/me")]
pub async fn get_profile_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let profile = users::table
        .filter(users::id.eq(authenticated_user.id))
        .select(UserProfile::as_select())
        .first::<UserProfile>(&mut conn)
        .await
        .optional()
        .map_err(ServiceError::from)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("No profile for user {}", authenticated_user.id))
        })?;

    Ok(HttpResponse::Ok().json(profile))
}

// === PUT /users/me ===
#[put("/me")]
pub async fn upsert_profile_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    payload: web::Json<UpsertUserPayload>,
) -> Result<HttpResponse, ServiceError> {
    validate_email(&payload.email)?;

    let new_profile = NewUserProfile {
        id: authenticated_user.id,
        email: payload.email.trim().to_string(),
        display_name: payload.display_name.clone(),
    };
    let changes = UpdateUserProfileChangeset {
        email: new_profile.email.clone(),
        display_name: new_profile.display_name.clone(),
        updated_at: Utc::now(),
    };

    let mut conn = pool.get().await?;

    let profile = diesel::insert_into(users::table)
        .values(&new_profile)
        .on_conflict(users::id)
        .do_update()
        .set(&changes)
        .get_result::<UserProfile>(&mut conn)
        .await
        .map_err(ServiceError::from)?;

    log::info!("Profile saved for user {}", profile.id);
    Ok(HttpResponse::Ok().json(profile))
}

// === DELETE /users/me ===
#[delete("/me")]
pub async fn delete_account_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let mut conn = pool.get().await?;

    let removed = conn
        .transaction::<_, ServiceError, _>(move |conn| {
            async move {
                let mut removed = 0;
                removed += diesel::delete(meal_progress::table.filter(meal_progress::user_id.eq(user_uuid)))
                    .execute(conn)
                    .await?;
                removed += diesel::delete(tasks::table.filter(tasks::user_id.eq(user_uuid)))
                    .execute(conn)
                    .await?;
                removed += diesel::delete(
                    transactions::table.filter(transactions::user_id.eq(user_uuid)),
                )
                .execute(conn)
                .await?;
                removed += diesel::delete(user_diets::table.filter(user_diets::user_id.eq(user_uuid)))
                    .execute(conn)
                    .await?;
                removed += diesel::delete(
                    diet_history::table.filter(diet_history::user_id.eq(user_uuid)),
                )
                .execute(conn)
                .await?;
                removed += diesel::delete(users::table.filter(users::id.eq(user_uuid)))
                    .execute(conn)
                    .await?;
                Ok(removed)
            }
            .scope_boxed()
        })
        .await?;

    log::info!("Deleted account {} ({} records)", user_uuid, removed);
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("Account {} and {} records deleted", user_uuid, removed)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_needs_local_part_and_dotted_domain() {
        assert!(validate_email("ana@example.org").is_ok());
        assert!(validate_email(" ana@example.org ").is_ok());
        assert!(validate_email("ana@localhost").is_err());
        assert!(validate_email("@example.org").is_err());
        assert!(validate_email("ana.example.org").is_err());
    }
}
