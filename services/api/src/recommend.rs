use crate::infra::{build_recommendation_service, parse_date};
use chrono::{Local, NaiveDate};
use clap::Args;
use peerscout::config::AppConfig;
use peerscout::error::AppError;
use peerscout::recommend::{RecommendRequest, RecommendationService};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct RecommendArgs {
    /// Manuscript number; takes precedence over the free-text criteria
    #[arg(long)]
    pub(crate) manuscript_no: Option<String>,
    /// Restrict matching manuscripts to this subject area
    #[arg(long)]
    pub(crate) subject_area: Option<String>,
    /// Comma separated keywords
    #[arg(long)]
    pub(crate) keywords: Option<String>,
    /// Abstract text for similarity search
    #[arg(long = "abstract")]
    pub(crate) abstract_text: Option<String>,
    /// Only recommend people holding this role
    #[arg(long)]
    pub(crate) role: Option<String>,
    /// Maximum number of reviewers to print
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Snapshot directory (defaults to PEERSCOUT_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Reference date for availability filtering (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

impl RecommendArgs {
    fn request(&self) -> RecommendRequest {
        RecommendRequest {
            manuscript_no: self.manuscript_no.clone(),
            subject_area: self.subject_area.clone(),
            keywords: self.keywords.clone(),
            abstract_text: self.abstract_text.clone(),
            role: self.role.clone(),
            limit: self.limit,
            relationship_types: None,
            stage_names: None,
        }
    }
}

pub(crate) fn run_recommend(mut args: RecommendArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(data_dir) = args.data_dir.take() {
        config.data.dir = data_dir;
    }

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let service = build_recommendation_service(&config.data.dir, &config.recommendation, today)?;

    println!("{}", render_recommendation(&service, &args)?);
    Ok(())
}

pub(crate) fn render_recommendation(
    service: &RecommendationService,
    args: &RecommendArgs,
) -> Result<String, AppError> {
    let response = service.recommend(args.request())?;
    let rendered = serde_json::to_string_pretty(response.as_ref()).map_err(std::io::Error::from)?;
    Ok(rendered)
}
