use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use peerscout::recommend::{recommendation_router, RecommendationService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_recommendation_routes(service: Arc<RecommendationService>) -> axum::Router {
    recommendation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "loading snapshot" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use peerscout::recommend::{
        RecommendPolicy, RecommendReviewers, RecommendationContext, SearchTypes,
    };
    use peerscout::similarity::NoSimilarity;
    use peerscout::snapshot::Snapshot;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn empty_service() -> Arc<RecommendationService> {
        let today = chrono::NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date");
        let context =
            RecommendationContext::build(&Snapshot::default(), &Default::default(), today);
        let engine = RecommendReviewers::new(
            Arc::new(context),
            Arc::new(NoSimilarity),
            RecommendPolicy::default(),
        );
        Arc::new(RecommendationService::new(
            Arc::new(engine),
            SearchTypes::default(),
            0,
        ))
    }

    fn app(ready: bool) -> axum::Router {
        let recorder = PrometheusBuilder::new().build_recorder();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        };
        with_recommendation_routes(empty_service()).layer(Extension(state))
    }

    async fn status_of(router: axum::Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        assert_eq!(
            status_of(app(false), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(app(true), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn recommendation_routes_are_mounted() {
        let router = app(true);
        assert_eq!(
            status_of(router.clone(), "/api/v1/subject-areas").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(router.clone(), "/api/v1/recommend-reviewers").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(router, "/api/v1/recommend-reviewers?manuscript_no=1").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn readiness_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let recorder = PrometheusBuilder::new().build_recorder();
        let state = AppState {
            readiness: flag.clone(),
            metrics: Arc::new(recorder.handle()),
        };
        let router = with_recommendation_routes(empty_service()).layer(Extension(state));

        flag.store(true, Ordering::Release);

        assert_eq!(status_of(router, "/ready").await, StatusCode::OK);
    }
}
