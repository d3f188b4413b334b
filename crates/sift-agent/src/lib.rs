//! # sift-agent
//!
//! AI screening for Sift.
//!
//! - [`evaluator::ScreeningEvaluator`]: the contract an evaluator implements
//! - [`anthropic::AnthropicEvaluator`]: evaluator backed by the Anthropic Messages API
//! - [`prompt`]: system prompt and article text assembly
//! - [`screening::AiScreener`]: single-article and batch orchestration
//! - [`notify`]: delivery of per-article batch events

pub mod anthropic;
pub mod evaluator;
pub mod notify;
pub mod prompt;
pub mod screening;

mod error;
mod http;

pub use anthropic::AnthropicEvaluator;
pub use error::AgentError;
pub use evaluator::{EvaluationRequest, ScreeningEvaluator, ScreeningResult};
pub use notify::{EventSink, NullSink, SessionRegistry};
pub use screening::{AiScreener, BatchOptions, BatchReport};
