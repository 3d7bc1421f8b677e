//! Load core
//!
//! This module contains the parts that drive pagination:
//! - Strategy descriptors and the shared load protocol
//! - Post-load reconciliation
//! - Session lifecycle effects
//! - Collaborator traits, reporting and tunables

pub mod client;
pub mod config;
pub mod env;
pub mod lifecycle;
pub mod processing;
pub mod reconcile;
pub mod report;
pub mod strategy;
