//! REST handlers for the dashboard
//!
//! These handlers use the shared DashboardService.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};

use super::page::render_page;
use super::service::{ChartKind, DashboardBundle, DashboardService, Selection};
use crate::charts::Figure;
use crate::error::MetricError;
use crate::metrics::comparison::ComparisonCells;
use crate::metrics::kpi::{KpiBundle, KpiDisplay};
use crate::metrics::resample::{AggregatedPeriod, Granularity};
use crate::metrics::summary::MetricsSummary;
use crate::models::Service;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct KpiResponse {
    pub values: KpiBundle,
    pub display: KpiDisplay,
}

#[derive(Serialize)]
pub struct PeriodResponse {
    pub date: NaiveDate,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub counts: BTreeMap<&'static str, i64>,
    pub pcts: BTreeMap<&'static str, i64>,
}

impl From<AggregatedPeriod> for PeriodResponse {
    fn from(p: AggregatedPeriod) -> Self {
        let by_service = |values: &[i64]| -> BTreeMap<&'static str, i64> {
            Service::ALL.iter().map(|s| (s.name(), values[s.index()])).collect()
        };
        Self {
            counts: by_service(&p.counts),
            pcts: by_service(&p.pcts),
            date: p.date,
            label: p.label,
            year: p.year,
        }
    }
}

#[derive(Serialize)]
pub struct PeriodsResponse {
    pub granularity: Granularity,
    pub periods: Vec<PeriodResponse>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Bad selections are the caller's fault; anything else the metric engine
/// raises is a server error
fn metric_error(e: MetricError) -> ApiError {
    let status = match e {
        MetricError::UnknownService(_) | MetricError::UnknownGranularity(_) => {
            warn!(error = %e, "Rejected selection");
            StatusCode::BAD_REQUEST
        }
        _ => {
            error!(error = %e, "Metric computation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Deserialize)]
pub struct SelectionQuery {
    pub granularity: Option<String>,
    pub services: Option<String>,
}

impl SelectionQuery {
    fn selection(&self) -> Result<Selection, ApiError> {
        Selection::parse(self.granularity.as_deref(), self.services.as_deref()).map_err(metric_error)
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = Arc<DashboardService>;

/// GET /
pub async fn index() -> Html<String> {
    Html(render_page())
}

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(service): State<AppState>,
    Query(params): Query<SelectionQuery>,
) -> Result<Json<DashboardBundle>, ApiError> {
    let selection = params.selection()?;
    service.dashboard(&selection).await.map(Json).map_err(metric_error)
}

/// GET /api/v1/kpis
pub async fn get_kpis(State(service): State<AppState>) -> Result<Json<KpiResponse>, ApiError> {
    match service.kpis().await {
        Ok(values) => Ok(Json(KpiResponse {
            display: values.display(),
            values,
        })),
        Err(e) => Err(metric_error(e)),
    }
}

/// GET /api/v1/metrics
pub async fn get_metrics(
    State(service): State<AppState>,
    Query(params): Query<SelectionQuery>,
) -> Result<Json<MetricsSummary>, ApiError> {
    let selection = params.selection()?;
    service.metrics(&selection).map(Json).map_err(metric_error)
}

/// GET /api/v1/periods
pub async fn get_periods(
    State(service): State<AppState>,
    Query(params): Query<SelectionQuery>,
) -> Result<Json<PeriodsResponse>, ApiError> {
    let granularity = params.selection()?.granularity;
    let periods = service.periods(granularity);
    if periods.is_empty() {
        return Err(metric_error(MetricError::NoPeriods));
    }
    Ok(Json(PeriodsResponse {
        granularity,
        periods: periods.into_iter().map(PeriodResponse::from).collect(),
    }))
}

/// GET /api/v1/charts/:chart
pub async fn get_chart(
    State(service): State<AppState>,
    Path(chart): Path<String>,
    Query(params): Query<SelectionQuery>,
) -> Result<Json<Figure>, ApiError> {
    let Some(kind) = ChartKind::from_slug(&chart) else {
        let known: Vec<&str> = ChartKind::ALL.iter().map(|k| k.slug()).collect();
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Chart not found: {}. Valid charts: {}", chart, known.join(", ")),
            }),
        ));
    };
    let selection = params.selection()?;
    service.chart(kind, &selection).map(Json).map_err(metric_error)
}

/// GET /api/v1/comparison
pub async fn get_comparison(State(service): State<AppState>) -> Json<Vec<ComparisonCells>> {
    Json(service.comparison().iter().map(|row| row.cells()).collect())
}

#[cfg(test)]
mod tests {
    use super::super::router;
    use super::super::service::test_support::{pre_pandemic_service, sample_service};
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get(uri: &str) -> (StatusCode, Value) {
        get_from(sample_service(), uri).await
    }

    async fn get_from(service: DashboardService, uri: &str) -> (StatusCode, Value) {
        let app = router(Arc::new(service));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_dashboard_served_without_kpis() {
        let (status, body) = get_from(pre_pandemic_service(), "/api/v1/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["kpis"].is_null());
        assert_eq!(body["charts"]["service_line"]["data"].as_array().unwrap().len(), 7);
        assert_eq!(body["cards"].as_array().unwrap().len(), 5);

        let (status, body) = get_from(pre_pandemic_service(), "/api/v1/kpis").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_index_serves_page() {
        let app = router(Arc::new(sample_service()));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("Tracking MTA Recovery"));
    }

    #[tokio::test]
    async fn test_dashboard_defaults() {
        let (status, body) = get("/api/v1/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selection"]["granularity"], "Month");
        assert_eq!(body["selection"]["services"].as_array().unwrap().len(), 7);
        assert_eq!(body["cards"].as_array().unwrap().len(), 5);
        assert!(body["kpis"]["total_recovery"].is_string());
        assert!(body["charts"]["recovery_heatmap"]["data"].is_array());
    }

    #[tokio::test]
    async fn test_unknown_service_is_bad_request() {
        let (status, body) = get("/api/v1/dashboard?services=Subways,Ferries").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown service: Ferries");

        let (status, _) = get("/api/v1/metrics?granularity=Week").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metrics_for_selection() {
        let (status, body) = get("/api/v1/metrics?granularity=Year&services=LIRR").await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["service"], "LIRR");
    }

    #[tokio::test]
    async fn test_yearly_periods() {
        let (status, body) = get("/api/v1/periods?granularity=Year").await;
        assert_eq!(status, StatusCode::OK);
        let periods = body["periods"].as_array().unwrap();
        assert_eq!(periods.len(), 6);
        assert_eq!(periods[0]["year"], 2019);
        assert!(periods[0]["counts"]["Subways"].is_i64());
    }

    #[tokio::test]
    async fn test_chart_lookup() {
        let (status, body) = get("/api/v1/charts/service_line?services=Buses").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = get("/api/v1/charts/radar").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().starts_with("Chart not found: radar"));
    }

    #[tokio::test]
    async fn test_kpis_and_comparison() {
        let (status, body) = get("/api/v1/kpis").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["values"]["total_recovery"].is_number());
        assert!(body["display"]["highest_ridership_day"].is_string());

        let (status, body) = get("/api/v1/comparison").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 7);
    }
}
