//! Reviewer recommendation: context, engine, service, and HTTP routes.
//!
//! The [`RecommendationContext`] is built once from a snapshot and shared read-only.
//! [`RecommendReviewers`] scores and ranks candidates against it, and
//! [`RecommendationService`] adds search types and request caching for the router.

mod context;
mod engine;
mod manuscripts;
mod policy;
mod ranking;
mod request;
mod response;
pub mod router;
mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use context::{ManuscriptRecord, RecommendationContext};
pub use engine::{RecommendError, RecommendReviewers};
pub use policy::RecommendPolicy;
pub use request::RecommendRequest;
pub use response::{
    Assignment, ManuscriptScore, ManuscriptView, PotentialReviewer, RecommendResponse,
    ReviewerScores, SearchEcho,
};
pub use router::{recommendation_router, RecommendQuery, USER_EMAIL_HEADER};
pub use scoring::combined_score;
pub use service::{RecommendationService, SearchAccess, SearchType, SearchTypes, ServiceError};
