//! Error handling for the Divino Alimento server
//!
//! Provides consistent error responses in English and Portuguese

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{MigrationError, PublishBlocked, StageClosed};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_pt: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Publishing blocked: {0}")]
    PublishBlocked(#[from] PublishBlocked),

    #[error("Stage closed: {0}")]
    StageClosed(#[from] StageClosed),

    #[error("Migration unavailable: {0}")]
    Migration(#[from] MigrationError),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|f| f.to_string())
            .unwrap_or_default();
        AppError::Validation {
            message: errors.to_string(),
            message_pt: format!("campo inválido: {}", field),
            field,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_pt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Validation {
                field,
                message,
                message_pt,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_pt: message_pt.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_pt: format!("dados inválidos: {}", msg),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_pt: format!("{} não encontrado", resource),
                    field: None,
                },
            ),
            AppError::PublishBlocked(blocked) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: blocked.code().to_string(),
                    message_en: blocked.to_string(),
                    message_pt: blocked.message_pt().to_string(),
                    field: None,
                },
            ),
            AppError::StageClosed(closed) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: closed.code().to_string(),
                    message_en: closed.to_string(),
                    message_pt: closed.message_pt().to_string(),
                    field: None,
                },
            ),
            AppError::Migration(MigrationError::NoSourceCycles) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "NO_SOURCE_CYCLES".to_string(),
                    message_en: "Select at least one source cycle".to_string(),
                    message_pt: "Selecione pelo menos um ciclo de origem".to_string(),
                    field: Some("source_cycle_ids".to_string()),
                },
            ),
            AppError::Migration(MigrationError::SourceCycleActive(cycle_id)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "SOURCE_CYCLE_ACTIVE".to_string(),
                    message_en: format!("Cycle {} is still active; only finished cycles have leftovers", cycle_id),
                    message_pt: format!("O ciclo {} ainda está ativo; só ciclos encerrados têm sobras", cycle_id),
                    field: Some("source_cycle_ids".to_string()),
                },
            ),
            AppError::Migration(MigrationError::NothingToMigrate) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "NOTHING_TO_MIGRATE".to_string(),
                    message_en: "Nothing available to migrate from the selected cycles"
                        .to_string(),
                    message_pt: "Não há sobras disponíveis para migrar dos ciclos selecionados"
                        .to_string(),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_pt: "Ocorreu um erro no banco de dados".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_pt: "Erro interno do servidor".to_string(),
                    field: None,
                },
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
