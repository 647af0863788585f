//! REST API for the call-center report
//!
//! Serves the filtered indicator table and the dashboard rollups as JSON.

pub mod handlers;
pub mod service;

pub use service::ReportService;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cache::TableCache;
use crate::config::ServerConfig;
use crate::error::Result;

pub fn router(service: Arc<ReportService>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/indicators", get(handlers::get_indicators))
        .route("/api/v1/filters", get(handlers::get_filters))
        .route("/api/v1/table", get(handlers::get_table))
        .route("/api/v1/dashboard", get(handlers::get_dashboard))
        .route("/api/v1/breakdown/:dimension", get(handlers::get_breakdown))
        .route("/api/v1/top/:dimension", get(handlers::get_top))
        .route("/api/v1/cache/invalidate", post(handlers::invalidate_cache))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind and serve until the process is stopped
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let aggregator = config.aggregation.aggregator()?;
    let service = Arc::new(ReportService::new(TableCache::new(&config.data, aggregator)));
    let addr = config.addr()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving call-center report on http://{} from {:?}", addr, config.data);
    axum::serve(listener, router(service)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::path::PathBuf;
    use tower::ServiceExt;

    const DATA: &str = "\
date,agent,supervisor,coordinator,business_line,city,state,indicator_name,numerator,denominator
2024-01-03,Agent_1,Supervisor_1,Coordinator_1,Sales,Curitiba,PR,Attended-Calls,10,1
2024-01-03,Agent_1,Supervisor_1,Coordinator_1,Sales,Curitiba,PR,Attended-Calls,5,1
2024-01-03,Agent_1,Supervisor_1,Coordinator_1,Sales,Curitiba,PR,Average-Handling-Time,300,15
2024-01-04,Agent_2,Supervisor_1,Coordinator_2,Collections,Recife,PE,Satisfaction-Score,12,3
2024-01-05,Agent_2,Supervisor_1,Coordinator_2,Collections,Recife,PE,Attended-Calls,20,1
";

    fn test_router(name: &str) -> (Router, PathBuf) {
        let path = std::env::temp_dir().join(format!("ccbi-api-{}-{}.csv", name, std::process::id()));
        std::fs::write(&path, DATA).unwrap();
        let service = ReportService::new(TableCache::new(&path, Aggregator::default()));
        (router(Arc::new(service)), path)
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, path) = test_router("health");
        let (status, body) = call(app, "GET", "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_table_rows_carry_nulls_for_absent_indicators() {
        let (app, path) = test_router("table");
        let (status, body) = call(app, "GET", "/api/v1/table").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_rows"], 3);

        let first = &body["rows"][0];
        assert_eq!(first["agent"], "Agent_1");
        assert_eq!(first["Attended-Calls"], 15.0);
        assert_eq!(first["Average-Handling-Time"], 20.0);
        assert!(first["Satisfaction-Score"].is_null());

        let second = &body["rows"][1];
        assert_eq!(second["Satisfaction-Score"], 4.0);
        assert!(second["Attended-Calls"].is_null());
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_table_filter_and_limit() {
        let (app, path) = test_router("filter");
        let (status, body) = call(app, "GET", "/api/v1/table?state=PE&start=2024-01-05&limit=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_rows"], 1);
        assert_eq!(body["rows"][0]["date"], "2024-01-05");
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_bad_date_is_bad_request() {
        let (app, path) = test_router("baddate");
        let (status, body) = call(app, "GET", "/api/v1/table?start=yesterday").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("yesterday"));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_dashboard() {
        let (app, path) = test_router("dashboard");
        let (status, body) = call(app, "GET", "/api/v1/dashboard?top=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["headline"]["total_attended_calls"], 35.0);
        assert_eq!(body["headline"]["agents"], 2);
        assert_eq!(body["top_agents"].as_array().unwrap().len(), 1);
        assert_eq!(body["top_agents"][0]["group"], "Agent_2");
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_breakdown_defaults_rollup_from_kind() {
        let (app, path) = test_router("breakdown");
        let (status, body) = call(app.clone(), "GET", "/api/v1/breakdown/business_line?indicator=TMA").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["indicator"], "Average-Handling-Time");
        assert_eq!(body["op"], "mean");

        let (status, body) = call(app, "GET", "/api/v1/breakdown/state?indicator=Attended-Calls").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["op"], "sum");
        assert_eq!(body["groups"][0]["group"], "PE");
        assert_eq!(body["groups"][0]["value"], 20.0);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_unknown_dimension_and_indicator() {
        let (app, path) = test_router("unknown");
        let (status, _) = call(app.clone(), "GET", "/api/v1/top/region").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(app, "GET", "/api/v1/breakdown/agent?indicator=NPS").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_top_and_invalidate() {
        let (app, path) = test_router("top");
        let (status, body) = call(app.clone(), "GET", "/api/v1/top/supervisor").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["indicator"], "Attended-Calls");
        assert_eq!(body["groups"][0]["values"]["Attended-Calls"], 35.0);

        let (status, body) = call(app.clone(), "POST", "/api/v1/cache/invalidate").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["invalidated"], true);

        let (_, body) = call(app, "POST", "/api/v1/cache/invalidate").await;
        assert_eq!(body["invalidated"], false);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_data_file_is_server_error() {
        let service = ReportService::new(TableCache::new("/nonexistent/ccbi.csv", Aggregator::default()));
        let (status, body) = call(router(Arc::new(service)), "GET", "/api/v1/dashboard").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }
}
