// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::custody::CustodyError;
use crate::ledger::LedgerError;
use crate::signing::SigningError;
use crate::storage::DbError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// 500 with a generic message; the detail goes to the log only.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        let message = e.to_string();
        match e {
            e if e.is_validation() => Self::bad_request(message),
            LedgerError::OperationDisabled { .. } => Self::forbidden(message),
            LedgerError::Unavailable(_) => Self::service_unavailable(message),
            LedgerError::Rpc(_) | LedgerError::Faucet(_) => Self::bad_gateway(message),
            other => Self::internal(other),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(_) => Self::not_found(e.to_string()),
            DbError::Conflict(_) => Self::conflict(e.to_string()),
            other => Self::internal(other),
        }
    }
}

impl From<CustodyError> for ApiError {
    fn from(e: CustodyError) -> Self {
        match e {
            CustodyError::Ledger(e) => e.into(),
            CustodyError::Storage(e) => e.into(),
            CustodyError::TokenNotFound(_) => Self::not_found(e.to_string()),
            CustodyError::SignerMismatch { .. } | CustodyError::IssuerNotInitialized => {
                Self::bad_request(e.to_string())
            }
            CustodyError::SetupFailed { .. } => Self::bad_gateway(e.to_string()),
        }
    }
}

impl From<SigningError> for ApiError {
    fn from(e: SigningError) -> Self {
        match e {
            SigningError::Ledger(e) => e.into(),
            SigningError::Custody(e) => e.into(),
            SigningError::Storage(e) => e.into(),
            SigningError::NotConfigured => Self::service_unavailable(e.to_string()),
            SigningError::PayloadNotFound(_) => Self::not_found(e.to_string()),
            SigningError::AlreadyResolved(_) => Self::conflict(e.to_string()),
            SigningError::Provider(_) | SigningError::InvalidResponse(_) => {
                Self::bad_gateway(e.to_string())
            }
        }
    }
}
