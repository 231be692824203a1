// Lifeboard/backend-api/src/error_handler.rs
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::bb8::RunError as BB8RunError;
use diesel_async::pooled_connection::PoolError;
use serde_json::json;
use std::fmt;

pub const MSG_NOT_FOUND: &str = "The requested item could not be found.";
pub const MSG_PERMISSION_DENIED: &str = "You do not have permission to perform this action.";
pub const MSG_NETWORK: &str = "Connection problem. Check your network and try again.";
pub const MSG_GENERIC: &str = "Something went wrong. Please try again.";

#[derive(Debug)]
pub enum ServiceError {
    InternalServerError(String),
    BadRequest(String),
    Unauthorized(String),
    PermissionDenied(String),
    NotFound(String),
    Conflict(String),
    DatabaseError(String), // already user-safe
    PoolError(String),     // already user-safe
}

impl ServiceError {
    fn from_diesel_error(error: DieselError) -> ServiceError {
        match error {
            DieselError::NotFound => ServiceError::NotFound(MSG_NOT_FOUND.to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                log::warn!("Unique violation: {}", info.message());
                ServiceError::Conflict("A record with the same key already exists.".to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                log::error!("Database connection closed: {}", info.message());
                ServiceError::PoolError("The database connection was lost.".to_string())
            }
            DieselError::DatabaseError(kind, info) => {
                log::error!(
                    "Internal Database Error: {:?} - Info: {}",
                    kind,
                    info.message()
                );
                ServiceError::DatabaseError("A database operation failed.".to_string())
            }
            err => {
                log::error!("Unexpected Diesel error: {}", err);
                ServiceError::DatabaseError("An unexpected database error occurred.".to_string())
            }
        }
    }

    /// Toast-level message for the client. Only four outcomes are exposed.
    pub fn user_message(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => MSG_NOT_FOUND,
            ServiceError::PermissionDenied(_) | ServiceError::Unauthorized(_) => {
                MSG_PERMISSION_DENIED
            }
            ServiceError::PoolError(_) => MSG_NETWORK,
            _ => MSG_GENERIC,
        }
    }
}

impl From<DieselError> for ServiceError {
    fn from(error: DieselError) -> ServiceError {
        ServiceError::from_diesel_error(error)
    }
}

impl From<PoolError> for ServiceError {
    fn from(error: PoolError) -> ServiceError {
        log::error!("Pool error: {:?}", error);
        ServiceError::PoolError("Could not connect to the database pool.".to_string())
    }
}

impl From<BB8RunError> for ServiceError {
    fn from(error: BB8RunError) -> ServiceError {
        log::error!("BB8 connection pool error: {:?}", error);
        ServiceError::PoolError("Could not obtain connection from database pool.".to_string())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ServiceError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ServiceError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServiceError::PermissionDenied(msg) => write!(f, "Permission Denied: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            ServiceError::PoolError(msg) => write!(f, "Pool Error: {}", msg),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match *self {
            ServiceError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::PoolError(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        // Details of server errors were logged where the error was built.
        let message = if status_code.is_server_error() {
            "An internal server error occurred. Please try again later.".to_string()
        } else {
            self.to_string()
        };

        if status_code.is_server_error() {
            log::error!("Responding with server error ({}): {}", status_code, self);
        } else {
            log::warn!("Responding with client error ({}): {}", status_code, message);
        }

        HttpResponse::build(status_code).json(json!({
            "status": "error",
            "statusCode": status_code.as_u16(),
            "message": message,
            "userMessage": self.user_message()
        }))
    }
}
