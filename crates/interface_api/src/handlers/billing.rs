//! Billing report handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use tracing::debug;

use core_kernel::StudentId;

use crate::auth::{require_staff, require_statement_access, Claims};
use crate::dto::billing::{BillingSummaryResponse, ReportQuery, StatementResponse};
use crate::{error::ApiError, AppState};

/// Billing summary for a date range
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<BillingSummaryResponse>, ApiError> {
    require_staff(&claims)?;
    let range = query.into_range(state.config.default_timezone)?;
    debug!(start = %range.start, end = %range.end, "Billing summary requested");

    let summary = state.billing.billing_summary(range).await?;
    Ok(Json(summary.into()))
}

/// Statement for one student and a date range
pub async fn get_statement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<StatementResponse>, ApiError> {
    let student_id: StudentId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid student id: {}", id)))?;
    require_statement_access(&claims, student_id)?;
    let range = query.into_range(state.config.default_timezone)?;

    let statement = state.billing.statement(student_id, range).await?;
    Ok(Json(statement.into()))
}
