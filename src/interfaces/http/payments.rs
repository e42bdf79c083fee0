use super::{AppState, error_response};
use crate::domain::account::AccountId;
use crate::domain::payment::Payment;
use crate::error::TransferError;
use axum::Json;
use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_account_id: String,
    pub receiver_account_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentsQuery {
    pub account_id: String,
    pub from_year: Option<i32>,
}

/// POST /api/transfers
///
/// A malformed id cannot resolve to an account, so it reports as unknown
/// before the engine is invoked.
pub async fn transfer(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<TransferRequest>,
) -> Result<Json<Payment>, TransferError> {
    let sender: AccountId = req
        .sender_account_id
        .parse()
        .map_err(|_| TransferError::UnknownSender)?;
    let receiver: AccountId = req
        .receiver_account_id
        .parse()
        .map_err(|_| TransferError::UnknownReceiver)?;
    let payment = state.engine.transfer(&sender, &receiver, req.amount).await?;
    Ok(Json(payment))
}

/// GET /api/payments?accountId=&fromYear=
pub async fn list(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<PaymentsQuery>,
) -> Response {
    let Ok(account_id) = query.account_id.parse::<AccountId>() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_field",
            "accountId must be a well-formed account id",
        );
    };
    match state.engine.payments_for(&account_id, query.from_year).await {
        Ok(payments) => Json(payments).into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /api/payments/{id}
pub async fn find(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Response {
    match state.engine.payment(id).await {
        Ok(Some(payment)) => Json(payment).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "payment_not_found",
            "no payment with that id",
        ),
        Err(err) => err.into_response(),
    }
}
