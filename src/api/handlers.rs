//! REST API handlers for the call-center report
//!
//! These handlers use the shared ReportService.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;

use super::service::ReportService;
use crate::error::Error;
use crate::indicators::{IndicatorDef, IndicatorKind};
use crate::models::{parse_date, Dimension, DimensionKey, IndicatorRow};
use crate::report::{DashboardReport, FilterOptions, GroupValue, RankedGroup, ReportFilter, Rollup};

// ============================================================================
// Response Types
// ============================================================================

/// Wide row: key fields and one field per indicator, `null` when absent
#[derive(Serialize)]
pub struct RowResponse {
    #[serde(flatten)]
    pub key: DimensionKey,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl RowResponse {
    fn from_row(row: IndicatorRow, indicators: &[String]) -> Self {
        let values = indicators
            .iter()
            .map(|name| (name.clone(), row.value(name)))
            .collect();
        Self { key: row.key, values }
    }
}

#[derive(Serialize)]
pub struct TableResponse {
    pub indicators: Vec<String>,
    pub total_rows: usize,
    pub rows: Vec<RowResponse>,
}

#[derive(Serialize)]
pub struct IndicatorResponse {
    pub name: String,
    pub kind: IndicatorKind,
    pub aliases: Vec<String>,
}

impl From<&IndicatorDef> for IndicatorResponse {
    fn from(d: &IndicatorDef) -> Self {
        Self {
            name: d.name.clone(),
            kind: d.kind,
            aliases: d.aliases.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct BreakdownResponse {
    pub dimension: Dimension,
    pub indicator: String,
    pub op: Rollup,
    pub groups: Vec<GroupValue>,
}

#[derive(Serialize)]
pub struct TopResponse {
    pub dimension: Dimension,
    pub indicator: String,
    pub groups: Vec<RankedGroup>,
}

#[derive(Serialize)]
pub struct InvalidateResponse {
    pub invalidated: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Deserialize, Default)]
pub struct FilterQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub business_line: Option<String>,
    pub state: Option<String>,
}

impl FilterQuery {
    fn into_filter(self) -> Result<ReportFilter, Error> {
        let date = |s: Option<String>| s.filter(|v| !v.is_empty()).map(|v| parse_date(&v)).transpose();
        let text = |s: Option<String>| s.filter(|v| !v.is_empty());
        Ok(ReportFilter {
            start: date(self.start)?,
            end: date(self.end)?,
            business_line: text(self.business_line),
            state: text(self.state),
        })
    }
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub top: Option<usize>,
}

#[derive(Deserialize)]
pub struct BreakdownQuery {
    pub indicator: String,
    pub op: Option<String>,
}

#[derive(Deserialize)]
pub struct TopQuery {
    pub indicator: Option<String>,
    pub limit: Option<usize>,
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = Arc<ReportService>;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: Error) -> ApiError {
    let status = match e {
        Error::UnknownDimension(_)
        | Error::UnknownIndicator(_)
        | Error::UnknownRollup(_)
        | Error::InvalidDate(_) => StatusCode::BAD_REQUEST,
        _ => {
            error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/indicators
pub async fn get_indicators(State(service): State<AppState>) -> Json<Vec<IndicatorResponse>> {
    Json(service.registry().iter().map(IndicatorResponse::from).collect())
}

/// GET /api/v1/filters
pub async fn get_filters(State(service): State<AppState>) -> Result<Json<FilterOptions>, ApiError> {
    let options = service.filter_options().await.map_err(api_error)?;
    Ok(Json(options))
}

/// GET /api/v1/table
pub async fn get_table(
    State(service): State<AppState>,
    Query(filter): Query<FilterQuery>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<TableResponse>, ApiError> {
    let filter = filter.into_filter().map_err(api_error)?;
    let limit = params.limit.unwrap_or(100);
    let indicators = service.registry().names();
    let (rows, total_rows) = service.rows(&filter, limit).await.map_err(api_error)?;

    Ok(Json(TableResponse {
        rows: rows
            .into_iter()
            .map(|r| RowResponse::from_row(r, &indicators))
            .collect(),
        indicators,
        total_rows,
    }))
}

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(service): State<AppState>,
    Query(filter): Query<FilterQuery>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardReport>, ApiError> {
    let filter = filter.into_filter().map_err(api_error)?;
    let report = service
        .dashboard(&filter, params.top.unwrap_or(10))
        .await
        .map_err(api_error)?;
    Ok(Json(report))
}

/// GET /api/v1/breakdown/:dimension?indicator=X
pub async fn get_breakdown(
    State(service): State<AppState>,
    Path(dimension): Path<String>,
    Query(filter): Query<FilterQuery>,
    Query(params): Query<BreakdownQuery>,
) -> Result<Json<BreakdownResponse>, ApiError> {
    let dimension: Dimension = dimension.parse().map_err(api_error)?;
    let filter = filter.into_filter().map_err(api_error)?;
    let op = params
        .op
        .as_deref()
        .map(str::parse::<Rollup>)
        .transpose()
        .map_err(api_error)?;

    let (def, op, groups) = service
        .breakdown(&filter, dimension, &params.indicator, op)
        .await
        .map_err(api_error)?;

    Ok(Json(BreakdownResponse {
        dimension,
        indicator: def.name,
        op,
        groups,
    }))
}

/// GET /api/v1/top/:dimension
pub async fn get_top(
    State(service): State<AppState>,
    Path(dimension): Path<String>,
    Query(filter): Query<FilterQuery>,
    Query(params): Query<TopQuery>,
) -> Result<Json<TopResponse>, ApiError> {
    let dimension: Dimension = dimension.parse().map_err(api_error)?;
    let filter = filter.into_filter().map_err(api_error)?;
    let (indicator, groups) = service
        .top(&filter, dimension, params.indicator.as_deref(), params.limit.unwrap_or(10))
        .await
        .map_err(api_error)?;

    Ok(Json(TopResponse {
        dimension,
        indicator,
        groups,
    }))
}

/// POST /api/v1/cache/invalidate
pub async fn invalidate_cache(State(service): State<AppState>) -> Json<InvalidateResponse> {
    Json(InvalidateResponse {
        invalidated: service.invalidate().await,
    })
}
