//! Composite fund scoring: percentile ranking against category peers,
//! quartile assignment, and recommendations.

pub mod percentile_scorer;
pub mod scoring_constants;
pub mod scoring_model;
pub mod scoring_service;
pub mod scoring_traits;

pub use percentile_scorer::*;
pub use scoring_model::*;
pub use scoring_service::*;
pub use scoring_traits::*;

#[cfg(test)]
mod percentile_scorer_tests;
