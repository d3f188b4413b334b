//! Entity structs for all Sift domain objects.
//!
//! Each entity maps to a table in the libSQL database. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip and schema
//! validation.

mod article;
mod audit;
mod criterion;
mod decision;
mod project;

pub use article::Article;
pub use audit::AuditEntry;
pub use criterion::Criterion;
pub use decision::ScreeningDecision;
pub use project::Project;
