use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::{ApiError, ServiceError},
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    services::{entry_validator::parse_amount, CreateEntryOutcome, RawEntrySubmission},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub entry_id: Option<String>,
    #[serde(default)]
    pub amount: Value,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PayPendingRequest {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub name: Option<String>,
    pub party_to: Option<String>,
    #[serde(default)]
    pub amount: Value,
}

/// `null` or absent means no amount was sent; anything else is read as a
/// number, with unreadable values counting as zero.
fn requested_amount(amount: &Value) -> Option<Decimal> {
    match amount {
        Value::Null => None,
        other => Some(parse_amount(other)),
    }
}

async fn create_entry(
    State(state): State<AppState>,
    Json(payload): Json<RawEntrySubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .work_entries
        .create_entry(payload, Utc::now())
        .await
        .map_err(map_service_error)?;

    Ok(match outcome {
        CreateEntryOutcome::Created { entry, is_new_user } => created_response(json!({
            "work": entry,
            "isNewUser": is_new_user,
        })),
        CreateEntryOutcome::ConfirmationRequired => success_response(json!({
            "isNewUser": true,
            "confirmationRequired": true,
            "message": "User does not exist",
        })),
    })
}

async fn search_names(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let names = state
        .services
        .work_entries
        .search_names(query.name.as_deref().unwrap_or_default())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(names))
}

async fn pay(
    State(state): State<AppState>,
    Json(payload): Json<PayRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let raw_id = payload
        .entry_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("entryId is required"))?;
    let entry_id = Uuid::parse_str(raw_id).map_err(|_| {
        ApiError::ServiceError(ServiceError::NotFound(format!(
            "work entry {} not found",
            raw_id
        )))
    })?;

    let entry = state
        .services
        .work_entries
        .apply_payment(entry_id, requested_amount(&payload.amount))
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entry))
}

async fn pay_pending(
    State(state): State<AppState>,
    Json(payload): Json<PayPendingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let receipt = state
        .services
        .work_entries
        .pay_pending_balance(
            payload.name.as_deref().unwrap_or_default(),
            payload.party_to.as_deref(),
            requested_amount(&payload.amount),
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(receipt))
}

pub fn work_entry_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_entry))
        .route("/search", get(search_names))
        .route("/pay", post(pay))
        .route("/pay-pending", post(pay_pending))
}
