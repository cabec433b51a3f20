use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::models::api_response::ApiResponse;

#[derive(Error, Debug)]
pub enum CustomError {
    #[error("No wallet provider detected")]
    NoProviderDetected,

    #[error("Connection rejected: {0}")]
    UserRejectedConnection(String),

    #[error("Balance fetch failed: {0}")]
    FetchFailed(String),

    #[error("Token not found: {0}")]
    TokenNotFoundError(String),

    #[error("Unsupported decimals: {0}")]
    InvalidDecimals(u8),

    #[error("Invalid address: {0}")]
    InvalidAddressError(String),

    #[error("Invalid token registry: {0}")]
    InvalidRegistry(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Provider error: {0}")]
    StringifiedProviderError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CustomError {
    fn code(&self) -> u16 {
        match self {
            CustomError::NoProviderDetected => 503,
            CustomError::UserRejectedConnection(_) => 403,
            CustomError::FetchFailed(_) => 502,
            CustomError::TokenNotFoundError(_) => 404,
            CustomError::InvalidDecimals(_) => 500,
            CustomError::InvalidAddressError(_) => 400,
            CustomError::InvalidRegistry(_) => 500,
            CustomError::InvalidStateTransition(_) => 409,
            CustomError::StringifiedProviderError(_) => 502,
            CustomError::ConfigError(_) => 500,
            CustomError::InternalError(_) => 500,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    code: u16,
    message: String,
}

impl ResponseError for CustomError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(self.code())
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.code();
        let response = ApiResponse {
            status: "FAILURE".to_string(),
            code,
            result: None::<()>,
            error: Some(ApiError {
                code,
                message: self.to_string(),
            }),
        };

        HttpResponse::build(self.status_code()).json(response)
    }
}
