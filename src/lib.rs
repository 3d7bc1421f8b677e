//! # chatstream
//!
//! The pagination and consistency core of a paged chat message stream.
//!
//! A chat session loads its messages in pages, in both directions, while new
//! messages keep arriving. This crate decides which page to fetch next, keeps
//! concurrent fetches from corrupting each other, and tells the message list
//! whether to merge a page or replace what it shows.
//!
//! ## Architecture Overview
//!
//! - **Model** ([`model`]): the pagination state, changed only through
//!   [`model::pagination::PaginationState::update`], plus the lock table
//! - **Core** ([`core`]): the load strategies and the one protocol they share,
//!   reconciliation of fetched pages, and session lifecycle effects
//! - **Collaborators** ([`core::env`]): the transport, message list, scroll
//!   view and reporter, injected as trait objects
//! - **Infrastructure** ([`infrastructure`]): in-memory collaborators and the
//!   replay driver behind the `chatstream` binary
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chatstream::{
//!     infrastructure::memory::{InMemoryConversation, MessageWindow},
//!     LoadMoreClient, LoadMoreConfig, LoadMoreEnvBuilder, SequenceIndex,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> chatstream::Result<()> {
//! let conversation = Arc::new(InMemoryConversation::new("demo", SequenceIndex::from(1), 50));
//! let window = Arc::new(MessageWindow::new());
//! let env = LoadMoreEnvBuilder::new()
//!     .source(conversation.clone())
//!     .sink(window.clone())
//!     .build()?;
//! let client = LoadMoreClient::new(env, LoadMoreConfig::default())?;
//!
//! let page = conversation.initial_page(20);
//! window.replace(page.message_list.clone());
//! client.handle_initial_load(&page).await;
//!
//! client.load_by_scroll_prev().await;
//! assert_eq!(window.len(), 35);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod model;
pub mod utils;

pub use crate::core::{
    client::{LoadMoreClient, LoadOutcome},
    config::LoadMoreConfig,
    env::LoadMoreEnvBuilder,
};
pub use domain::sequence_index::SequenceIndex;
pub use error::Error;

/// Result type used throughout the library
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
