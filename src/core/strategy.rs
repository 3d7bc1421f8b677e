//! The four load triggers as one closed set of strategy descriptors
//!
//! Every strategy runs the same guard → lock → fetch → verify → reconcile →
//! insert → unlock protocol (see `client.rs`). The descriptor only answers the
//! questions on which they differ.

use crate::{
    domain::{
        message::{LoadDirection, LoadRequest},
        sequence_index::SequenceIndex,
    },
    model::{load_lock::LoadAction, pagination::PaginationState},
};

use super::{config::LoadMoreConfig, env::InsertOptions, reconcile::ReconcileScope};

const LATEST_CURSOR: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Older history, triggered by scrolling to the top
    ScrollPrev,
    /// Newer pages, triggered by scrolling to the bottom of a partial window
    ScrollNext,
    /// Jump to the latest page; `unconditional` skips the "is there more" check
    Eagerly { unconditional: bool },
    /// Load the latest page because the conversation moved to `to_index`,
    /// without moving the viewport
    Passively { to_index: SequenceIndex },
    /// Merge pushed messages in the background
    Silently,
}

impl LoadStrategy {
    pub fn action(&self) -> LoadAction {
        match self {
            LoadStrategy::ScrollPrev => LoadAction::LoadPrev,
            LoadStrategy::ScrollNext => LoadAction::LoadNext,
            LoadStrategy::Eagerly { .. } | LoadStrategy::Passively { .. } => {
                LoadAction::LoadEagerly
            }
            LoadStrategy::Silently => LoadAction::LoadSilently,
        }
    }

    /// Whether a fetch should start now
    pub fn guard(&self, state: &PaginationState, config: &LoadMoreConfig) -> bool {
        if state.is_locked(self.action()) {
            return false;
        }
        match self {
            LoadStrategy::ScrollPrev => state.prev_has_more(),
            LoadStrategy::ScrollNext => state.next_has_more(),
            LoadStrategy::Eagerly { unconditional } => {
                *unconditional || (config.enable_two_way_load && state.next_has_more())
            }
            LoadStrategy::Passively { to_index } => to_index > state.max_load_index(),
            LoadStrategy::Silently => true,
        }
    }

    pub fn request(&self, state: &PaginationState, config: &LoadMoreConfig) -> LoadRequest {
        match self {
            LoadStrategy::ScrollPrev => LoadRequest::new(state.cursor(), LoadDirection::Prev)
                .count(config.prev_page_size),
            LoadStrategy::ScrollNext | LoadStrategy::Silently => {
                LoadRequest::new(state.next_cursor(), LoadDirection::Next)
                    .count(config.next_page_size)
            }
            LoadStrategy::Eagerly { .. } | LoadStrategy::Passively { .. } => {
                LoadRequest::new(LATEST_CURSOR, LoadDirection::Prev).count(config.eager_page_size)
            }
        }
    }

    /// Whether the fetched page is the latest page and must go through the
    /// contiguity check before it is inserted
    pub fn fetches_latest(&self) -> bool {
        matches!(
            self,
            LoadStrategy::Eagerly { .. } | LoadStrategy::Passively { .. }
        )
    }

    /// Which cursors and flags of the response are trusted
    pub fn scope(&self, replaced: bool) -> ReconcileScope {
        match self {
            LoadStrategy::ScrollPrev => ReconcileScope::Prev,
            LoadStrategy::ScrollNext | LoadStrategy::Silently => ReconcileScope::Next,
            LoadStrategy::Eagerly { .. } | LoadStrategy::Passively { .. } => {
                ReconcileScope::Latest { replaced }
            }
        }
    }

    pub fn insert_options(&self, clear_first: bool) -> InsertOptions {
        InsertOptions {
            to_latest: !matches!(self, LoadStrategy::ScrollPrev),
            clear_first,
        }
    }

    /// Whether the lock is kept for the scroll-settle window after inserting
    pub fn holds_lock_to_settle(&self) -> bool {
        matches!(
            self,
            LoadStrategy::ScrollNext | LoadStrategy::Eagerly { .. }
        )
    }
}
