// Lifeboard/backend-api/src/handlers/task_handlers.rs
use crate::auth_utils::AuthenticatedUser;
use crate::db::DbPool;
use crate::error_handler::ServiceError;
use crate::handlers::page_bounds;
use crate::models::{
    CreateTaskPayload, NewTask, PaginatedResponse, Priority, Task, TaskCategory, TaskType,
    UpdateTaskChangeset, UpdateTaskPayload,
};
use crate::recurrence;
use crate::schema::tasks;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct TaskQueryParams {
    pub category: Option<TaskCategory>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub task_type: Option<TaskType>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct TaskCompletionResponse {
    pub task: Task,
    /// Copy scheduled when a recurring task was completed.
    pub next_occurrence: Option<Task>,
}

fn validate_title(title: &str) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        return Err(ServiceError::BadRequest("Task title cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_time_estimate(estimate: Option<i32>) -> Result<(), ServiceError> {
    match estimate {
        Some(minutes) if minutes < 0 => Err(ServiceError::BadRequest(
            "time_estimate cannot be negative".to_string(),
        )),
        _ => Ok(()),
    }
}

/// `(completed, completed_at)` to write when completion changes; `None` when it doesn't.
fn completion_transition(
    was_completed: bool,
    completed: Option<bool>,
    now: DateTime<Utc>,
) -> Option<(bool, Option<DateTime<Utc>>)> {
    match completed {
        Some(c) if c != was_completed => Some((c, c.then_some(now))),
        _ => None,
    }
}

pub(crate) async fn load_owned_task(
    conn: &mut AsyncPgConnection,
    user_uuid: Uuid,
    task_uuid: Uuid,
) -> Result<Task, ServiceError> {
    tasks::table
        .filter(tasks::user_id.eq(user_uuid))
        .filter(tasks::id.eq(task_uuid))
        .select(Task::as_select())
        .first::<Task>(conn)
        .await
        .optional()
        .map_err(ServiceError::from)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Task with id {} not found or not owned by user",
                task_uuid
            ))
        })
}

pub(crate) async fn load_all_tasks(
    conn: &mut AsyncPgConnection,
    user_uuid: Uuid,
) -> Result<Vec<Task>, ServiceError> {
    tasks::table
        .filter(tasks::user_id.eq(user_uuid))
        .order(tasks::created_at.desc())
        .select(Task::as_select())
        .load::<Task>(conn)
        .await
        .map_err(ServiceError::from)
}

// Inserts the next copy of a completed recurring task, unless it already exists.
async fn schedule_next_occurrence(
    conn: &mut AsyncPgConnection,
    completed_task: &Task,
) -> Result<Option<Task>, ServiceError> {
    let today = Utc::now().date_naive();
    let Some(next) = recurrence::next_occurrence(completed_task, today) else {
        return Ok(None);
    };
    let Some(next_due) = next.due_date else {
        return Ok(None);
    };

    let candidates = tasks::table
        .filter(tasks::user_id.eq(next.user_id))
        .filter(tasks::due_date.eq(next_due))
        .filter(tasks::task_type.eq(&next.task_type))
        .select(Task::as_select())
        .load::<Task>(conn)
        .await
        .map_err(ServiceError::from)?;
    if recurrence::already_scheduled(&next, &candidates) {
        log::debug!(
            "Next occurrence of task {} on {} already exists",
            completed_task.id,
            next_due
        );
        return Ok(None);
    }

    let created = diesel::insert_into(tasks::table)
        .values(&next)
        .get_result::<Task>(conn)
        .await
        .map_err(ServiceError::from)?;
    log::info!(
        "Scheduled {} task {} for {} (from {})",
        created.task_type,
        created.id,
        next_due,
        completed_task.id
    );
    Ok(Some(created))
}

// === POST /tasks ===
#[post("")]
pub async fn create_task_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    payload: web::Json<CreateTaskPayload>,
) -> Result<HttpResponse, ServiceError> {
    validate_title(&payload.title)?;
    validate_time_estimate(payload.time_estimate)?;

    let new_task_data = NewTask {
        user_id: authenticated_user.id,
        title: payload.title.trim().to_string(),
        description: payload.description.clone(),
        category: payload
            .category
            .unwrap_or(TaskCategory::Other)
            .as_str()
            .to_string(),
        priority: payload
            .priority
            .unwrap_or(Priority::Medium)
            .as_str()
            .to_string(),
        completed: false,
        due_date: payload.due_date,
        time_estimate: payload.time_estimate,
        task_type: payload
            .task_type
            .unwrap_or(TaskType::Normal)
            .as_str()
            .to_string(),
        diet_id: None,
        meal_slot: None,
        recurrence_end: payload.recurrence_end,
    };

    let mut conn = pool.get().await?;

    let task = diesel::insert_into(tasks::table)
        .values(&new_task_data)
        .get_result::<Task>(&mut conn)
        .await
        .map_err(ServiceError::from)?;

    log::info!("User {} created task {}", authenticated_user.id, task.id);
    Ok(HttpResponse::Created().json(task))
}

// === GET /tasks ===
#[get("")]
pub async fn list_tasks_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<TaskQueryParams>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let (page, per_page, offset) = page_bounds(query.page, query.per_page);

    let mut conn = pool.get().await?;

    let mut count_query = tasks::table
        .filter(tasks::user_id.eq(user_uuid))
        .into_boxed();
    let mut query_builder = tasks::table
        .filter(tasks::user_id.eq(user_uuid))
        .into_boxed();

    if let Some(category) = query.category {
        query_builder = query_builder.filter(tasks::category.eq(category.as_str()));
        count_query = count_query.filter(tasks::category.eq(category.as_str()));
    }
    if let Some(priority) = query.priority {
        query_builder = query_builder.filter(tasks::priority.eq(priority.as_str()));
        count_query = count_query.filter(tasks::priority.eq(priority.as_str()));
    }
    if let Some(completed) = query.completed {
        query_builder = query_builder.filter(tasks::completed.eq(completed));
        count_query = count_query.filter(tasks::completed.eq(completed));
    }
    if let Some(task_type) = query.task_type {
        query_builder = query_builder.filter(tasks::task_type.eq(task_type.as_str()));
        count_query = count_query.filter(tasks::task_type.eq(task_type.as_str()));
    }

    let total_items = count_query
        .count()
        .get_result::<i64>(&mut conn)
        .await
        .map_err(ServiceError::from)?;

    let task_list = query_builder
        .order(tasks::created_at.desc())
        .limit(per_page)
        .offset(offset)
        .select(Task::as_select())
        .load::<Task>(&mut conn)
        .await
        .map_err(ServiceError::from)?;

    Ok(HttpResponse::Ok().json(PaginatedResponse::new(
        task_list,
        total_items,
        page,
        per_page,
    )))
}

// === GET /tasks/{id} ===
#[get("/{task_id_path}")]
pub async fn get_task_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    task_id_path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;
    let task = load_owned_task(&mut conn, authenticated_user.id, task_id_path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

// === PUT /tasks/{id} ===
#[put("/{task_id_path}")]
pub async fn update_task_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    task_id_path: web::Path<Uuid>,
    payload: web::Json<UpdateTaskPayload>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let task_to_update_id = task_id_path.into_inner();

    if let Some(new_title) = &payload.title {
        validate_title(new_title)?;
    }
    if let Some(estimate) = payload.time_estimate {
        validate_time_estimate(estimate)?;
    }

    let mut conn = pool.get().await?;
    let current = load_owned_task(&mut conn, user_uuid, task_to_update_id).await?;

    let now = Utc::now();
    let transition = completion_transition(current.completed, payload.completed, now);

    let task_changes = UpdateTaskChangeset {
        title: payload.title.as_ref().map(|t| t.trim().to_string()),
        description: payload.description.clone(),
        category: payload.category.map(|c| c.as_str().to_string()),
        priority: payload.priority.map(|p| p.as_str().to_string()),
        completed: transition.map(|(c, _)| c),
        due_date: payload.due_date,
        time_estimate: payload.time_estimate,
        task_type: payload.task_type.map(|t| t.as_str().to_string()),
        recurrence_end: payload.recurrence_end,
        updated_at: Some(now),
        completed_at: transition.map(|(_, at)| at),
    };

    let updated_task = diesel::update(
        tasks::table
            .filter(tasks::id.eq(task_to_update_id))
            .filter(tasks::user_id.eq(user_uuid)),
    )
    .set(&task_changes)
    .get_result::<Task>(&mut conn)
    .await
    .map_err(ServiceError::from)?;

    let next_occurrence = match transition {
        Some((true, _)) => schedule_next_occurrence(&mut conn, &updated_task).await?,
        _ => None,
    };

    Ok(HttpResponse::Ok().json(TaskCompletionResponse {
        task: updated_task,
        next_occurrence,
    }))
}

// === PUT /tasks/{id}/toggle-completion ===
#[put("/{task_id_path}/toggle-completion")]
pub async fn toggle_task_completion_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    task_id_path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let task_to_toggle_id = task_id_path.into_inner();

    let mut conn = pool.get().await?;
    let task = load_owned_task(&mut conn, user_uuid, task_to_toggle_id).await?;

    let now = Utc::now();
    let transition = completion_transition(task.completed, Some(!task.completed), now);

    let task_changes = UpdateTaskChangeset {
        completed: transition.map(|(c, _)| c),
        completed_at: transition.map(|(_, at)| at),
        updated_at: Some(now),
        ..Default::default()
    };

    let updated_task = diesel::update(
        tasks::table
            .filter(tasks::id.eq(task_to_toggle_id))
            .filter(tasks::user_id.eq(user_uuid)),
    )
    .set(&task_changes)
    .get_result::<Task>(&mut conn)
    .await
    .map_err(ServiceError::from)?;

    let next_occurrence = if updated_task.completed {
        schedule_next_occurrence(&mut conn, &updated_task).await?
    } else {
        None
    };

    log::info!(
        "User {} toggled task {} to completed={}",
        user_uuid,
        updated_task.id,
        updated_task.completed
    );
    Ok(HttpResponse::Ok().json(TaskCompletionResponse {
        task: updated_task,
        next_occurrence,
    }))
}

// === DELETE /tasks/{id} ===
#[delete("/{task_id_path}")]
pub async fn delete_task_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    task_id_path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let task_to_delete_id = task_id_path.into_inner();

    let mut conn = pool.get().await?;

    let num_deleted = diesel::delete(
        tasks::table
            .filter(tasks::user_id.eq(user_uuid))
            .filter(tasks::id.eq(task_to_delete_id)),
    )
    .execute(&mut conn)
    .await
    .map_err(ServiceError::from)?;

    if num_deleted > 0 {
        Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": format!("Task with id {} deleted successfully", task_to_delete_id)
        })))
    } else {
        Err(ServiceError::NotFound(format!(
            "Task with id {} not found or not owned by user to delete",
            task_to_delete_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 18, 30, 0).unwrap()
    }

    #[test]
    fn completing_stamps_time_and_reopening_clears_it() {
        assert_eq!(
            completion_transition(false, Some(true), now()),
            Some((true, Some(now())))
        );
        assert_eq!(completion_transition(true, Some(false), now()), Some((false, None)));
    }

    #[test]
    fn unchanged_completion_writes_nothing() {
        assert_eq!(completion_transition(true, Some(true), now()), None);
        assert_eq!(completion_transition(false, None, now()), None);
    }

    #[test]
    fn blank_titles_and_negative_estimates_are_rejected() {
        assert!(validate_title("  ").is_err());
        assert!(validate_title("Write report").is_ok());
        assert!(validate_time_estimate(Some(-5)).is_err());
        assert!(validate_time_estimate(None).is_ok());
    }
}
