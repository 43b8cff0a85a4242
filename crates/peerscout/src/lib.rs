//! Reviewer recommendation over an in-memory editorial snapshot.
//!
//! A [`snapshot::Snapshot`] is loaded once, indexed into a
//! [`recommend::RecommendationContext`], and queried through
//! [`recommend::RecommendReviewers`].

pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod recommend;
pub mod similarity;
pub mod snapshot;
pub mod telemetry;
