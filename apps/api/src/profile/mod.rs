// Vocational profile: scoring, catalog lookup, course aggregation and the
// quiz submission pipeline built on top of them.

pub mod catalog;
pub mod category;
pub mod courses;
pub mod scoring;
pub mod submission;
