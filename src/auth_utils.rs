// Lifeboard/backend-api/src/auth_utils.rs
use crate::error_handler::ServiceError;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{err, ok, Ready};
use serde::Deserialize;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const AUTH_ERROR_HEADER: &str = "X-Auth-Error";

/// Caller identity, as verified and forwarded by the identity gateway.
#[derive(Debug, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

/// Maps an identity-provider error code to the message shown to the user.
///
/// Codes may arrive with or without the `auth/` namespace.
pub fn provider_error_message(code: &str) -> &'static str {
    let code = code.trim();
    let code = code.strip_prefix("auth/").unwrap_or(code);
    match code {
        "user-not-found" => "No account exists for this email.",
        "wrong-password" | "invalid-credential" | "invalid-login-credentials" => {
            "Incorrect email or password."
        }
        "email-already-in-use" => "An account already exists with this email.",
        "weak-password" => "Password is too weak. Use at least 6 characters.",
        "invalid-email" => "The email address is not valid.",
        "too-many-requests" => "Too many attempts. Please wait a moment and try again.",
        "network-request-failed" => "Connection problem. Check your network and try again.",
        "user-disabled" => "This account has been disabled.",
        "permission-denied" | "insufficient-permission" => {
            "You do not have permission to perform this action."
        }
        "popup-closed-by-user" | "cancelled-popup-request" => "Sign-in was cancelled.",
        "popup-blocked" => "The sign-in popup was blocked by the browser.",
        "expired-action-code" | "invalid-action-code" => {
            "This link has expired or was already used."
        }
        "requires-recent-login" => "Please sign in again to continue.",
        "account-exists-with-different-credential" => {
            "An account already exists with a different sign-in method."
        }
        _ => "Authentication failed. Please try again.",
    }
}

/// Identity-level failures forwarded by the gateway.
///
/// Disabled accounts and denied permissions are 403; everything else is 401.
pub fn provider_error(code: &str) -> ServiceError {
    let message = provider_error_message(code).to_string();
    let code = code.trim();
    match code.strip_prefix("auth/").unwrap_or(code) {
        "user-disabled" | "permission-denied" | "insufficient-permission" => {
            ServiceError::PermissionDenied(message)
        }
        _ => ServiceError::Unauthorized(message),
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // A provider failure forwarded by the gateway wins over any identity header.
        if let Some(code) = req.headers().get(AUTH_ERROR_HEADER) {
            let code = code.to_str().unwrap_or_default();
            log::warn!("Identity gateway reported provider error '{}'", code);
            return err(provider_error(code));
        }

        let Some(user_id_header_value) = req.headers().get(USER_ID_HEADER) else {
            log::warn!("{} header was NOT found in request headers.", USER_ID_HEADER);
            return err(ServiceError::Unauthorized(
                "Missing X-User-Id header. Authentication required.".to_string(),
            ));
        };

        let Ok(user_id_str) = user_id_header_value.to_str() else {
            log::warn!("{} header is not valid UTF-8.", USER_ID_HEADER);
            return err(ServiceError::BadRequest(
                "X-User-Id header contains invalid characters.".to_string(),
            ));
        };

        if user_id_str.is_empty() {
            log::warn!("{} header is present but empty.", USER_ID_HEADER);
            return err(ServiceError::BadRequest(
                "X-User-Id header cannot be empty.".to_string(),
            ));
        }

        match Uuid::parse_str(user_id_str) {
            Ok(user_id_uuid) => {
                log::debug!("Authenticated request for user {}", user_id_uuid);
                ok(AuthenticatedUser { id: user_id_uuid })
            }
            Err(parse_err) => {
                log::warn!(
                    "Failed to parse {} '{}' to UUID: {}",
                    USER_ID_HEADER,
                    user_id_str,
                    parse_err
                );
                err(ServiceError::BadRequest(
                    "Invalid X-User-Id header format (not a valid UUID).".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::{MSG_GENERIC, MSG_PERMISSION_DENIED};
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::ResponseError;

    async fn extract(req: TestRequest) -> Result<AuthenticatedUser, ServiceError> {
        let req = req.to_http_request();
        AuthenticatedUser::from_request(&req, &mut Payload::None).await
    }

    #[actix_web::test]
    async fn valid_header_yields_user() {
        let id = Uuid::new_v4();
        let user = extract(TestRequest::default().insert_header((USER_ID_HEADER, id.to_string())))
            .await
            .unwrap();
        assert_eq!(user.id, id);
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let e = extract(TestRequest::default()).await.unwrap_err();
        assert_eq!(e.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn malformed_header_is_bad_request() {
        let e = extract(TestRequest::default().insert_header((USER_ID_HEADER, "not-a-uuid")))
            .await
            .unwrap_err();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);

        let e = extract(TestRequest::default().insert_header((USER_ID_HEADER, "")))
            .await
            .unwrap_err();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
    }

    async fn json_body(e: ServiceError) -> serde_json::Value {
        let body = to_bytes(e.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[actix_web::test]
    async fn forwarded_provider_error_wins_over_identity_header() {
        let e = extract(
            TestRequest::default()
                .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
                .insert_header((AUTH_ERROR_HEADER, "auth/wrong-password")),
        )
        .await
        .unwrap_err();
        assert_eq!(e.status_code(), StatusCode::UNAUTHORIZED);

        let body = json_body(e).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["message"], "Unauthorized: Incorrect email or password.");
        assert_eq!(body["userMessage"], MSG_PERMISSION_DENIED);
    }

    #[actix_web::test]
    async fn disabled_account_is_permission_denied() {
        let req = TestRequest::default().insert_header((AUTH_ERROR_HEADER, "auth/user-disabled"));
        let e = extract(req).await.unwrap_err();
        assert!(matches!(e, ServiceError::PermissionDenied(_)));

        let body = json_body(e).await;
        assert_eq!(body["statusCode"], 403);
        assert_eq!(
            body["message"],
            "Permission Denied: This account has been disabled."
        );
        assert_eq!(body["userMessage"], MSG_PERMISSION_DENIED);
    }

    #[actix_web::test]
    async fn header_errors_use_the_json_error_body() {
        let body = json_body(extract(TestRequest::default()).await.unwrap_err()).await;
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["userMessage"], MSG_PERMISSION_DENIED);

        let e = extract(TestRequest::default().insert_header((USER_ID_HEADER, "42")))
            .await
            .unwrap_err();
        let body = json_body(e).await;
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["userMessage"], MSG_GENERIC);
    }

    #[test]
    fn provider_codes_map_with_or_without_namespace() {
        assert_eq!(
            provider_error_message("auth/wrong-password"),
            provider_error_message("invalid-credential")
        );
        assert_eq!(
            provider_error_message("email-already-in-use"),
            "An account already exists with this email."
        );
        assert_eq!(
            provider_error_message("auth/something-new"),
            "Authentication failed. Please try again."
        );
        assert!(matches!(
            provider_error("permission-denied"),
            ServiceError::PermissionDenied(_)
        ));
        assert!(matches!(
            provider_error("auth/too-many-requests"),
            ServiceError::Unauthorized(_)
        ));
    }
}
