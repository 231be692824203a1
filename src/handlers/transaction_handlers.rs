// Lifeboard/backend-api/src/handlers/transaction_handlers.rs
use crate::auth_utils::AuthenticatedUser;
use crate::db::DbPool;
use crate::error_handler::ServiceError;
use crate::handlers::page_bounds;
use crate::models::{
    CreateTransactionPayload, NewTransaction, PaginatedResponse, Transaction, TransactionKind,
    UpdateTransactionChangeset, UpdateTransactionPayload,
};
use crate::schema::transactions;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct TransactionQueryParams {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// Matches the NUMERIC(14, 2) column: 12 integer digits, 2 decimals.
const AMOUNT_SCALE: u32 = 2;
const AMOUNT_LIMIT: i64 = 1_000_000_000_000;

fn validate_amount(amount: Decimal) -> Result<(), ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::BadRequest(
            "amount must be greater than zero".to_string(),
        ));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(ServiceError::BadRequest(format!(
            "amount cannot have more than {} decimal places",
            AMOUNT_SCALE
        )));
    }
    if amount >= Decimal::from(AMOUNT_LIMIT) {
        return Err(ServiceError::BadRequest(format!(
            "amount must be less than {}",
            AMOUNT_LIMIT
        )));
    }
    Ok(())
}

/// Checks the category against the kind the record has after an update.
fn validate_updated_category(
    current: &Transaction,
    kind: Option<TransactionKind>,
    category: Option<&str>,
) -> Result<(), ServiceError> {
    let kind = match kind {
        Some(kind) => kind,
        None => current.kind.parse::<TransactionKind>().map_err(|e| {
            log::error!("Stored transaction {} is corrupt: {}", current.id, e);
            ServiceError::InternalServerError(e.to_string())
        })?,
    };
    validate_category(kind, category.unwrap_or(&current.category))
}

fn validate_category(kind: TransactionKind, category: &str) -> Result<(), ServiceError> {
    if kind.accepts_category(category) {
        return Ok(());
    }
    Err(ServiceError::BadRequest(format!(
        "Category '{}' is not valid for {} transactions. Expected one of: {}",
        category,
        kind.as_str(),
        kind.categories().join(", ")
    )))
}

pub(crate) async fn load_all_transactions(
    conn: &mut AsyncPgConnection,
    user_uuid: Uuid,
) -> Result<Vec<Transaction>, ServiceError> {
    transactions::table
        .filter(transactions::user_id.eq(user_uuid))
        .order((
            transactions::transaction_date.desc(),
            transactions::created_at.desc(),
        ))
        .select(Transaction::as_select())
        .load::<Transaction>(conn)
        .await
        .map_err(ServiceError::from)
}

async fn load_owned_transaction(
    conn: &mut AsyncPgConnection,
    user_uuid: Uuid,
    transaction_uuid: Uuid,
) -> Result<Transaction, ServiceError> {
    transactions::table
        .filter(transactions::user_id.eq(user_uuid))
        .filter(transactions::id.eq(transaction_uuid))
        .select(Transaction::as_select())
        .first::<Transaction>(conn)
        .await
        .optional()
        .map_err(ServiceError::from)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Transaction with id {} not found or not owned by user",
                transaction_uuid
            ))
        })
}

// === POST /transactions ===
#[post("")]
pub async fn create_transaction_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    payload: web::Json<CreateTransactionPayload>,
) -> Result<HttpResponse, ServiceError> {
    validate_amount(payload.amount)?;
    validate_category(payload.kind, &payload.category)?;
    if payload.description.trim().is_empty() {
        return Err(ServiceError::BadRequest(
            "description cannot be empty".to_string(),
        ));
    }

    let new_transaction = NewTransaction {
        user_id: authenticated_user.id,
        kind: payload.kind.as_str().to_string(),
        amount: payload.amount,
        description: payload.description.trim().to_string(),
        category: payload.category.clone(),
        transaction_date: payload
            .transaction_date
            .unwrap_or_else(|| Utc::now().date_naive()),
        recurring: payload.recurring.unwrap_or(false),
    };

    let mut conn = pool.get().await?;

    let created = diesel::insert_into(transactions::table)
        .values(&new_transaction)
        .get_result::<Transaction>(&mut conn)
        .await
        .map_err(ServiceError::from)?;

    log::info!(
        "User {} recorded {} {} ({})",
        authenticated_user.id,
        created.kind,
        created.amount,
        created.id
    );
    Ok(HttpResponse::Created().json(created))
}

// === GET /transactions ===
#[get("")]
pub async fn list_transactions_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<TransactionQueryParams>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let (page, per_page, offset) = page_bounds(query.page, query.per_page);

    if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
        if from > to {
            return Err(ServiceError::BadRequest(
                "date_from cannot be after date_to".to_string(),
            ));
        }
    }

    let mut conn = pool.get().await?;

    let mut count_query = transactions::table
        .filter(transactions::user_id.eq(user_uuid))
        .into_boxed();
    let mut query_builder = transactions::table
        .filter(transactions::user_id.eq(user_uuid))
        .into_boxed();

    if let Some(kind) = query.kind {
        query_builder = query_builder.filter(transactions::kind.eq(kind.as_str()));
        count_query = count_query.filter(transactions::kind.eq(kind.as_str()));
    }
    if let Some(category) = &query.category {
        query_builder = query_builder.filter(transactions::category.eq(category.clone()));
        count_query = count_query.filter(transactions::category.eq(category.clone()));
    }
    if let Some(from) = query.date_from {
        query_builder = query_builder.filter(transactions::transaction_date.ge(from));
        count_query = count_query.filter(transactions::transaction_date.ge(from));
    }
    if let Some(to) = query.date_to {
        query_builder = query_builder.filter(transactions::transaction_date.le(to));
        count_query = count_query.filter(transactions::transaction_date.le(to));
    }

    let total_items = count_query
        .count()
        .get_result::<i64>(&mut conn)
        .await
        .map_err(ServiceError::from)?;

    let items = query_builder
        .order((
            transactions::transaction_date.desc(),
            transactions::created_at.desc(),
        ))
        .limit(per_page)
        .offset(offset)
        .select(Transaction::as_select())
        .load::<Transaction>(&mut conn)
        .await
        .map_err(ServiceError::from)?;

    Ok(HttpResponse::Ok().json(PaginatedResponse::new(
        items,
        total_items,
        page,
        per_page,
    )))
}

// === GET /transactions/{id} ===
#[get("/{transaction_id_path}")]
pub async fn get_transaction_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    transaction_id_path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;
    let transaction = load_owned_transaction(
        &mut conn,
        authenticated_user.id,
        transaction_id_path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(transaction))
}

// === PUT /transactions/{id} ===
#[put("/{transaction_id_path}")]
pub async fn update_transaction_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    transaction_id_path: web::Path<Uuid>,
    payload: web::Json<UpdateTransactionPayload>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let transaction_uuid = transaction_id_path.into_inner();

    if let Some(amount) = payload.amount {
        validate_amount(amount)?;
    }
    if let Some(description) = &payload.description {
        if description.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "description cannot be empty".to_string(),
            ));
        }
    }

    let mut conn = pool.get().await?;
    let current = load_owned_transaction(&mut conn, user_uuid, transaction_uuid).await?;

    validate_updated_category(&current, payload.kind, payload.category.as_deref())?;

    let changes = UpdateTransactionChangeset {
        kind: payload.kind.map(|k| k.as_str().to_string()),
        amount: payload.amount,
        description: payload.description.as_ref().map(|d| d.trim().to_string()),
        category: payload.category.clone(),
        transaction_date: payload.transaction_date,
        recurring: payload.recurring,
        updated_at: Some(Utc::now()),
    };

    let updated = diesel::update(
        transactions::table
            .filter(transactions::id.eq(transaction_uuid))
            .filter(transactions::user_id.eq(user_uuid)),
    )
    .set(&changes)
    .get_result::<Transaction>(&mut conn)
    .await
    .map_err(ServiceError::from)?;

    Ok(HttpResponse::Ok().json(updated))
}

// === DELETE /transactions/{id} ===
#[delete("/{transaction_id_path}")]
pub async fn delete_transaction_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    transaction_id_path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let user_uuid = authenticated_user.id;
    let transaction_uuid = transaction_id_path.into_inner();

    let mut conn = pool.get().await?;

    let num_deleted = diesel::delete(
        transactions::table
            .filter(transactions::user_id.eq(user_uuid))
            .filter(transactions::id.eq(transaction_uuid)),
    )
    .execute(&mut conn)
    .await
    .map_err(ServiceError::from)?;

    if num_deleted > 0 {
        Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": format!("Transaction with id {} deleted successfully", transaction_uuid)
        })))
    } else {
        Err(ServiceError::NotFound(format!(
            "Transaction with id {} not found or not owned by user to delete",
            transaction_uuid
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_must_be_positive() {
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(Decimal::new(-100, 2)).is_err());
        assert!(validate_amount(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn amount_must_fit_the_stored_precision() {
        // 0.001 would be stored as 0.00
        assert!(validate_amount(Decimal::new(1, 3)).is_err());
        assert!(validate_amount(Decimal::new(12345, 3)).is_err());
        // trailing zeros are not extra precision
        assert!(validate_amount(Decimal::new(1500, 3)).is_ok());

        assert!(validate_amount(Decimal::new(99_999_999_999_999, 2)).is_ok());
        assert!(validate_amount(Decimal::new(1_000_000_000_000, 0)).is_err());
        assert!(validate_amount(Decimal::new(i64::MAX, 0)).is_err());
    }

    fn stored(kind: &str, category: &str) -> Transaction {
        let at = Utc::now();
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            kind: kind.to_string(),
            amount: Decimal::new(250_000, 2),
            description: "October pay".to_string(),
            category: category.to_string(),
            transaction_date: at.date_naive(),
            recurring: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn kind_change_must_bring_a_fitting_category() {
        let salary = stored("income", "salary");

        let err =
            validate_updated_category(&salary, Some(TransactionKind::Expense), None).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        assert!(
            validate_updated_category(&salary, Some(TransactionKind::Expense), Some("food"))
                .is_ok()
        );
        assert!(validate_updated_category(&salary, None, None).is_ok());
    }

    #[test]
    fn category_change_is_checked_against_stored_kind() {
        let salary = stored("income", "salary");
        assert!(validate_updated_category(&salary, None, Some("freelance")).is_ok());
        assert!(validate_updated_category(&salary, None, Some("food")).is_err());
    }

    #[test]
    fn corrupt_stored_kind_is_a_server_error() {
        let broken = stored("gift", "salary");
        let err = validate_updated_category(&broken, None, None).unwrap_err();
        assert!(matches!(err, ServiceError::InternalServerError(_)));
    }

    #[test]
    fn category_must_match_kind_vocabulary() {
        assert!(validate_category(TransactionKind::Income, "freelance").is_ok());
        let err = validate_category(TransactionKind::Income, "food").unwrap_err();
        assert!(err.to_string().contains("salary"));
    }
}
