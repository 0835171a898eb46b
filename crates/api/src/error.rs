use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use persistence::repositories::BookingError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<ValidationDetail>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A validation failure with a single message and no per-field
    /// breakdown.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Conflicts render as 422 like validation failures, so clients
        // handle every rejected write the same way.
        let (status, message, errors) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            ApiError::Validation { message, errors } => {
                let errors = if errors.is_empty() { None } else { Some(errors) };
                (StatusCode::UNPROCESSABLE_ENTITY, message, errors)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".into(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
                })
            })
            .collect();

        // The top-level message echoes the first failure; the full
        // per-field breakdown travels in `errors`.
        let message = details
            .first()
            .map(|d| d.message.clone())
            .unwrap_or_else(|| "Validation failed".into());

        ApiError::Validation {
            message,
            errors: details,
        }
    }
}

impl From<shared::jwt::JwtError> for ApiError {
    fn from(err: shared::jwt::JwtError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Unavailable(reason) => ApiError::Conflict(reason.to_string()),
            BookingError::MissingReference(what) => {
                ApiError::validation(format!("The selected {} does not exist", what))
            }
            BookingError::NotACoach => {
                ApiError::validation("The selected user is not a coach")
            }
            BookingError::TerminalState(status) => ApiError::Conflict(format!(
                "Reservation is already {} and cannot change",
                status
            )),
            BookingError::Database(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::EquipmentStatus;
    use domain::services::availability::AvailabilityError;

    #[test]
    fn test_unauthorized_status() {
        let response = ApiError::Unauthorized("no token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_status() {
        let response = ApiError::Forbidden("admins only".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_not_found_status() {
        let response = ApiError::NotFound("no such member".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_renders_as_unprocessable() {
        let response = ApiError::Conflict("slot taken".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_validation_status() {
        let response = ApiError::validation("bad input").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_validation_body_carries_field_errors() {
        use validator::Validate;

        #[derive(Validate)]
        struct Payload {
            #[validate(email(message = "Must be a valid email address"))]
            email: String,
            #[validate(length(min = 8, message = "Must be at least 8 characters"))]
            password: String,
        }

        let payload = Payload {
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let error: ApiError = payload.validate().unwrap_err().into();

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], serde_json::json!(false));
        let errors = body["errors"].as_array().expect("errors array");
        assert_eq!(errors.len(), 2);

        let fields: Vec<&str> = errors
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));

        // The headline message is one of the field messages, not a count.
        let message = body["message"].as_str().unwrap();
        assert!(
            errors.iter().any(|e| e["message"] == message),
            "message {:?} should match a field error",
            message
        );
    }

    #[test]
    fn test_plain_validation_body_omits_errors_key() {
        let error = ApiError::validation("End time must be after start time");
        match &error {
            ApiError::Validation { errors, .. } => assert!(errors.is_empty()),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_internal_hides_details() {
        let response = ApiError::Internal("pool exhausted".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, ApiError::NotFound(_)));
    }

    #[test]
    fn test_from_booking_conflict() {
        let error: ApiError = BookingError::Unavailable(AvailabilityError::CoachBusy {
            conflicting_reservation_id: 3,
        })
        .into();
        match error {
            ApiError::Conflict(msg) => assert!(msg.contains("Coach")),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_from_booking_equipment_unavailable() {
        let error: ApiError = BookingError::Unavailable(AvailabilityError::EquipmentNotAvailable {
            status: EquipmentStatus::Maintenance,
        })
        .into();
        assert!(matches!(error, ApiError::Conflict(_)));
    }

    #[test]
    fn test_from_booking_missing_reference() {
        let error: ApiError = BookingError::MissingReference("member").into();
        match error {
            ApiError::Validation { message, .. } => assert!(message.contains("member")),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }
}
