use super::{AccountView, AppState};
use crate::domain::account::AccountId;
use crate::error::AccountError;
use axum::Json;
use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBalanceRequest {
    pub balance: Decimal,
}

/// POST /api/accounts
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AccountError> {
    let account = state
        .accounts
        .register(&req.username, &req.email, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(AccountView::from(account))))
}

/// POST /api/accounts/login
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AccountView>, AccountError> {
    let account = state
        .accounts
        .authenticate(&req.username, &req.password)
        .await?;
    Ok(Json(account.into()))
}

/// GET /api/accounts/{account_id}
///
/// The recipient-verify read; malformed ids cannot name an account, so they
/// report as unknown.
pub async fn find(
    Extension(state): Extension<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountView>, AccountError> {
    let account_id: AccountId = account_id
        .parse()
        .map_err(|_| AccountError::UnknownAccount)?;
    let account = state.accounts.find_by_account_id(&account_id).await?;
    Ok(Json(account.into()))
}

/// PUT /api/accounts/{account_id}/balance
pub async fn set_balance(
    Extension(state): Extension<Arc<AppState>>,
    Path(account_id): Path<String>,
    Json(req): Json<UpdateBalanceRequest>,
) -> Result<Json<AccountView>, AccountError> {
    let account_id: AccountId = account_id
        .parse()
        .map_err(|_| AccountError::UnknownAccount)?;
    let account = state.accounts.set_balance(&account_id, req.balance).await?;
    Ok(Json(account.into()))
}
