//! Infrastructure layer
//!
//! Everything the replay binary needs around the load core:
//! - CLI argument processing
//! - Layered configuration
//! - In-memory conversation, message window and scroll view
//! - The script runner

pub mod cli;
pub mod config;
pub mod memory;
pub mod replay;
