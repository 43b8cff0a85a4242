use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use peerscout::config::{RecommendationConfig, SimilarityBackend};
use peerscout::error::AppError;
use peerscout::recommend::{
    RecommendPolicy, RecommendReviewers, RecommendationContext, RecommendationService, SearchTypes,
};
use peerscout::similarity::{NoSimilarity, SimilarityOracle, TermSimilarity};
use peerscout::snapshot::SnapshotLoader;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Load the snapshot in `data_dir` and assemble the recommendation service around it.
pub(crate) fn build_recommendation_service(
    data_dir: &Path,
    config: &RecommendationConfig,
    today: NaiveDate,
) -> Result<RecommendationService, AppError> {
    let snapshot = SnapshotLoader::from_dir(data_dir)?;
    let model = &config.manuscript_model;

    let context = RecommendationContext::build(&snapshot, model, today);
    let similarity: Arc<dyn SimilarityOracle> = match config.similarity {
        SimilarityBackend::Terms => Arc::new(TermSimilarity::from_snapshot(&snapshot, model)),
        SimilarityBackend::None => Arc::new(NoSimilarity),
    };
    let search_types = SearchTypes::from_rows(&snapshot.search_types);

    info!(
        data_dir = %data_dir.display(),
        manuscripts = snapshot.manuscript_versions.len(),
        persons = snapshot.persons.len(),
        search_types = search_types.all().len(),
        similarity = ?config.similarity,
        "recommendation snapshot loaded"
    );

    let engine = RecommendReviewers::new(
        Arc::new(context),
        similarity,
        RecommendPolicy::from(config),
    );

    Ok(RecommendationService::new(
        Arc::new(engine),
        search_types,
        config.cache_capacity,
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
