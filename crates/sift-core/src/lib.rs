//! # sift-core
//!
//! Core types, the screening phase machine, and error types for Sift.
//!
//! This crate provides the foundational types shared across all Sift crates:
//! - Entity structs for projects, articles, criteria, decisions, and audit entries
//! - Status, stage, and decision enums with `snake_case` storage strings
//! - [`phase::ScreeningPhase`], the single source of truth for an article's
//!   position in the two-stage screening workflow
//! - Input types validated before they reach storage
//! - Screening statistics and realtime event payloads
//! - Cross-cutting error types

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod evaluation;
pub mod events;
pub mod inputs;
pub mod phase;
pub mod stats;
