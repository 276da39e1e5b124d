//! Recommendation Service
//!
//! Long-lived wrapper around the [`Pipeline`](crate::pipeline::Pipeline):
//! owns the current snapshot, serves concurrent requests against it and
//! memoizes reports per snapshot version.

mod cache;
mod insight;

pub use cache::RecommendationCache;
pub use insight::InsightService;
