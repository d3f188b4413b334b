//! Repository implementations on [`crate::service::SiftService`].
//!
//! Each module adds an `impl SiftService` block for one aggregate. Functions
//! suffixed `_in` run against an open write unit's connection.

pub mod article;
pub mod audit;
pub mod criterion;
pub mod decision;
pub mod project;
pub mod queue;
pub mod stats;
