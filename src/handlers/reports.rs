use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, optional_day, required_day, required_param, success_response},
    services::ReportRange,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct WeeklyReportQuery {
    pub name: Option<String>,
    pub sunday: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReferenceDateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuery {
    pub name: Option<String>,
    pub party_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SundayQuery {
    pub sunday: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleQuery {
    pub vehicle_no: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginQuery {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub origin: Option<String>,
}

/// `?name=&sunday=` for a week, or `?name=&from=&to=` for a day range.
async fn weekly_report_by_name(
    State(state): State<AppState>,
    Query(query): Query<WeeklyReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let calendar = state.services.calendar();
    let name = required_param(query.name.as_deref(), "name")?;

    let range = match optional_day(calendar, query.sunday.as_deref(), "sunday")? {
        Some(sunday) => ReportRange::WeekEnding(sunday),
        None if query.from.is_some() || query.to.is_some() => ReportRange::Days {
            from: required_day(calendar, query.from.as_deref(), "from")?,
            to: required_day(calendar, query.to.as_deref(), "to")?,
        },
        None => {
            return Err(ApiError::bad_request(
                "Name and either sunday or from/to dates are required",
            ))
        }
    };

    let report = state
        .services
        .reports
        .by_name(name, range)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(report))
}

async fn all_users_weekly(
    State(state): State<AppState>,
    Query(query): Query<ReferenceDateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let calendar = state.services.calendar();
    let reference = optional_day(calendar, query.date.as_deref(), "date")?
        .unwrap_or_else(|| calendar.local_date(Utc::now()));

    let lines = state
        .services
        .reports
        .all_users_weekly(reference)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lines))
}

async fn day_wise_weekly(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let buckets = state
        .services
        .reports
        .day_wise_weekly(Utc::now())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(buckets))
}

async fn pending_by_user(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let name = required_param(query.name.as_deref(), "name")?;
    let lines = state
        .services
        .reports
        .pending_by_user(name, query.party_to.as_deref())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lines))
}

async fn global_pending(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .services
        .reports
        .global_pending()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(users))
}

async fn sunday_report(
    State(state): State<AppState>,
    Query(query): Query<SundayQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sunday = required_day(state.services.calendar(), query.sunday.as_deref(), "sunday")?;
    let lines = state
        .services
        .reports
        .sunday_aggregate(sunday)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lines))
}

async fn sunday_report_by_user(
    State(state): State<AppState>,
    Query(query): Query<SundayQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sunday = required_day(state.services.calendar(), query.sunday.as_deref(), "sunday")?;
    let users = state
        .services
        .reports
        .sunday_remaining_by_user(sunday)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(users))
}

async fn vehicle_report(
    State(state): State<AppState>,
    Query(query): Query<VehicleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = state
        .services
        .reports
        .vehicle_report(query.vehicle_no.as_deref())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lines))
}

async fn origin_report(
    State(state): State<AppState>,
    Query(query): Query<OriginQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let calendar = state.services.calendar();
    let from = required_day(calendar, query.from_date.as_deref(), "fromDate")?;
    let to = required_day(calendar, query.to_date.as_deref(), "toDate")?;

    let lines = state
        .services
        .reports
        .origin_report(from, to, query.origin.as_deref())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lines))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/weekly-report", get(weekly_report_by_name))
        .route("/weekly-report/all-users", get(all_users_weekly))
        .route("/weekly-report/day-wise", get(day_wise_weekly))
        .route("/pending", get(pending_by_user))
        .route("/pending/all", get(global_pending))
        .route("/sunday-report", get(sunday_report))
        .route("/sunday-report/by-user", get(sunday_report_by_user))
        .route("/vehicle-report", get(vehicle_report))
        .route("/origin-report", get(origin_report))
}
