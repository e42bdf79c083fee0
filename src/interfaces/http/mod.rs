//! JSON/HTTP surface of the service.
//!
//! Request bodies are explicit serde structs, so missing or ill-typed fields
//! are rejected at deserialization, before any application code runs. Every
//! error response carries a stable machine code next to the human message.

pub mod accounts;
pub mod payments;

use crate::application::accounts::AccountService;
use crate::application::engine::TransferEngine;
use crate::domain::account::{Account, AccountId};
use crate::error::{AccountError, TransferError};
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use axum::routing::{get, post, put};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub engine: TransferEngine,
    pub accounts: AccountService,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/accounts", post(accounts::register))
        .route("/api/accounts/login", post(accounts::login))
        .route("/api/accounts/{account_id}", get(accounts::find))
        .route(
            "/api/accounts/{account_id}/balance",
            put(accounts::set_balance),
        )
        .route("/api/transfers", post(payments::transfer))
        .route("/api/payments", get(payments::list))
        .route("/api/payments/{id}", get(payments::find))
        .layer(Extension(state))
        // The demo front-end is served from another origin.
        .layer(CorsLayer::permissive())
}

/// Account representation returned by the API; the password hash stays
/// internal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: u64,
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
    pub balance: Decimal,
    pub date_joined: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            account_id: account.account_id,
            username: account.username,
            email: account.email,
            balance: account.balance.value(),
            date_joined: account.date_joined,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: &'static str,
    message: String,
}

pub(crate) fn error_response(
    status: StatusCode,
    code: &'static str,
    message: impl ToString,
) -> Response {
    (
        status,
        Json(ApiError {
            error: code,
            message: message.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for TransferError {
    fn into_response(self) -> Response {
        let status = match self {
            TransferError::CommitFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        error_response(status, self.code(), self)
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = match self {
            AccountError::UnknownAccount => StatusCode::NOT_FOUND,
            AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AccountError::PasswordHash(_) | AccountError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        error_response(status, self.code(), self)
    }
}
