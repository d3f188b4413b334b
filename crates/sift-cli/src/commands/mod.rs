pub mod article;
pub mod audit;
pub mod criterion;
pub mod dispatch;
pub mod import;
pub mod init;
pub mod project;
pub mod screen;
pub mod shared;
pub mod stats;
