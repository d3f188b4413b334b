mod article;
mod criterion;
mod import;
mod project;
mod screen;

pub use article::ArticleCommands;
pub use criterion::CriterionCommands;
pub use import::ImportCommands;
pub use project::ProjectCommands;
pub use screen::ScreenCommands;
