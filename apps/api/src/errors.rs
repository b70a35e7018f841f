use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Text generation failed: {message}")]
    TextGeneration {
        message: String,
        /// Upstream text, echoed to the caller for debugging.
        raw: Option<String>,
    },

    #[error("Text generation timed out")]
    TextGenerationTimeout,

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout => AppError::TextGenerationTimeout,
            other => AppError::TextGeneration {
                message: other.to_string(),
                raw: other.raw_text().map(String::from),
            },
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                describe_fields(fields),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::TextGeneration { message, .. } => {
                tracing::error!("Text generation error: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TEXT_GENERATION_ERROR",
                    format!("Estimate generation failed: {message}"),
                )
            }
            AppError::TextGenerationTimeout => {
                tracing::error!("Text generation timed out");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "TEXT_GENERATION_TIMEOUT",
                    "Estimate generation timed out".to_string(),
                )
            }
            AppError::Persistence(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "ok": false,
            "error": message,
            "code": code,
        });
        match self {
            AppError::Validation(fields) => body["fields"] = json!(fields),
            AppError::TextGeneration { raw: Some(raw), .. } => body["raw"] = json!(raw),
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let response = AppError::Validation(vec![
            FieldError::new("customer.name", "is required"),
            FieldError::new("description", "is required"),
        ])
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"],
            "customer.name: is required; description: is required"
        );
        assert_eq!(body["fields"][1]["field"], "description");
    }

    #[tokio::test]
    async fn test_text_generation_error_echoes_raw_text() {
        let response = AppError::TextGeneration {
            message: "no JSON object in response".to_string(),
            raw: Some("Sorry, I can't help".to_string()),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["raw"], "Sorry, I can't help");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_504() {
        let response = AppError::TextGenerationTimeout.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let response = AppError::Persistence(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "A database error occurred");
    }
}
