use crate::errors::{ApiError, ServiceError};
use crate::services::Calendar;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Non-blank query parameter, or a 400 naming the parameter.
pub fn required_param<'a>(value: Option<&'a str>, param: &str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", param)))
}

/// Required query parameter holding a day (`YYYY-MM-DD` or RFC 3339).
pub fn required_day(
    calendar: &Calendar,
    value: Option<&str>,
    param: &str,
) -> Result<NaiveDate, ApiError> {
    let raw = required_param(value, param)?;
    parse_day(calendar, raw, param)
}

/// Optional day parameter; blank counts as absent.
pub fn optional_day(
    calendar: &Calendar,
    value: Option<&str>,
    param: &str,
) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => parse_day(calendar, raw, param).map(Some),
        None => Ok(None),
    }
}

fn parse_day(calendar: &Calendar, raw: &str, param: &str) -> Result<NaiveDate, ApiError> {
    calendar.parse_day(raw).ok_or_else(|| ApiError::BadRequest {
        message: format!("{} must be a date, got {:?}", param, raw),
        error_code: Some("invalid_date".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn blank_params_are_missing() {
        assert_matches!(required_param(Some("  "), "name"), Err(ApiError::BadRequest { .. }));
        assert_matches!(required_param(None, "name"), Err(ApiError::BadRequest { .. }));
        assert_eq!(required_param(Some(" Ramesh "), "name").unwrap(), "Ramesh");
    }

    #[test]
    fn day_params_are_parsed_or_rejected() {
        let calendar = Calendar::utc();
        assert_eq!(
            required_day(&calendar, Some("2024-06-16"), "sunday").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 16).unwrap()
        );
        assert_matches!(
            required_day(&calendar, Some("16-06-2024"), "sunday"),
            Err(ApiError::BadRequest { error_code: Some(code), .. }) if code == "invalid_date"
        );
        assert_eq!(optional_day(&calendar, Some(""), "date").unwrap(), None);
    }
}
