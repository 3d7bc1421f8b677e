//! Pagination state of one chat session
//!
//! This module follows the Elm Architecture pattern:
//! - Plain field changes happen only through the `update` function
//! - All state transitions are explicitly defined as `Message` variants
//! - Lock bookkeeping goes through the coordinator methods, which also return
//!   the token of the attempt they started
//!
//! Watermarks (`read_index`, `end_index`, `max_load_index`) only move up.

use serde::Serialize;

use crate::domain::sequence_index::SequenceIndex;

use super::load_lock::{LoadAction, LoadErrors, LoadLock, LockToken};

/// New watermark candidates; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPatch {
    pub read_index: Option<SequenceIndex>,
    pub end_index: Option<SequenceIndex>,
}

/// `hasMore` flags to overwrite; absent fields are left alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HasMorePatch {
    pub prev: Option<bool>,
    pub next: Option<bool>,
}

/// Cursors to overwrite; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorPatch {
    pub cursor: Option<String>,
    pub next_cursor: Option<String>,
}

/// Messages that can be sent to update the pagination state
///
/// Following Elm conventions, messages are named in past tense
/// to indicate "what happened" rather than "what to do"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// New read/end positions were observed
    IndexUpdated(IndexPatch),
    /// The loaded message collection changed and its maximum index was recomputed
    MaxLoadIndexObserved(SequenceIndex),
    /// A page reported whether more data exists
    HasMoreUpdated(HasMorePatch),
    /// A page returned continuation tokens
    CursorUpdated(CursorPatch),
    CursorsReset,
    HasMoreReset,
    LoadLockAndErrorReset,
    /// Everything went back to defaults, except the lock token counter
    Cleared,
    /// Read and end positions were pulled up to the larger of the two
    IndexesAligned,
}

const DEFAULT_CURSOR: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    cursor: String,
    next_cursor: String,
    prev_has_more: bool,
    next_has_more: bool,
    read_index: SequenceIndex,
    end_index: SequenceIndex,
    max_load_index: SequenceIndex,
    load_lock: LoadLock,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    pub fn new() -> Self {
        Self {
            cursor: String::from(DEFAULT_CURSOR),
            next_cursor: String::from(DEFAULT_CURSOR),
            prev_has_more: false,
            next_has_more: false,
            read_index: SequenceIndex::zero(),
            end_index: SequenceIndex::zero(),
            max_load_index: SequenceIndex::zero(),
            load_lock: LoadLock::new(),
        }
    }

    /// Cursor for fetching older history
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Cursor for fetching newer messages
    pub fn next_cursor(&self) -> &str {
        &self.next_cursor
    }

    pub fn prev_has_more(&self) -> bool {
        self.prev_has_more
    }

    pub fn next_has_more(&self) -> bool {
        self.next_has_more
    }

    pub fn read_index(&self) -> &SequenceIndex {
        &self.read_index
    }

    pub fn end_index(&self) -> &SequenceIndex {
        &self.end_index
    }

    /// Largest index ever seen among loaded messages
    pub fn max_load_index(&self) -> &SequenceIndex {
        &self.max_load_index
    }

    pub fn load_lock(&self) -> &LoadLock {
        &self.load_lock
    }

    pub fn load_errors(&self) -> &LoadErrors {
        self.load_lock.errors()
    }

    /// Update the pagination state based on a message
    ///
    /// This is the only way to modify cursors, flags and watermarks.
    pub fn update(&mut self, message: Message) {
        match message {
            Message::IndexUpdated(IndexPatch {
                read_index,
                end_index,
            }) => {
                if let Some(read_index) = read_index {
                    if read_index > self.read_index {
                        self.read_index = read_index;
                    }
                }
                if let Some(end_index) = end_index {
                    if end_index > self.end_index {
                        self.end_index = end_index;
                    }
                }
            }
            Message::MaxLoadIndexObserved(candidate) => {
                if candidate > self.max_load_index {
                    self.max_load_index = candidate;
                }
            }
            Message::HasMoreUpdated(HasMorePatch { prev, next }) => {
                if let Some(prev) = prev {
                    self.prev_has_more = prev;
                }
                if let Some(next) = next {
                    self.next_has_more = next;
                }
            }
            Message::CursorUpdated(CursorPatch {
                cursor,
                next_cursor,
            }) => {
                if let Some(cursor) = cursor {
                    self.cursor = cursor;
                }
                if let Some(next_cursor) = next_cursor {
                    self.next_cursor = next_cursor;
                }
            }
            Message::CursorsReset => {
                self.cursor = String::from(DEFAULT_CURSOR);
                self.next_cursor = String::from(DEFAULT_CURSOR);
            }
            Message::HasMoreReset => {
                self.prev_has_more = false;
                self.next_has_more = false;
            }
            Message::LoadLockAndErrorReset => {
                self.load_lock.reset();
            }
            Message::Cleared => {
                let mut load_lock = std::mem::take(&mut self.load_lock);
                load_lock.reset();
                *self = Self {
                    load_lock,
                    ..Self::new()
                };
            }
            Message::IndexesAligned => {
                let aligned = self.read_index.clone().max_of(self.end_index.clone());
                self.read_index = aligned.clone();
                self.end_index = aligned;
            }
        }
    }

    /// Whether `action` may not start now
    pub fn is_locked(&self, action: LoadAction) -> bool {
        self.load_lock.is_locked(action)
    }

    /// Start an attempt of `action` and return its token
    pub fn acquire(&mut self, action: LoadAction) -> LockToken {
        self.load_lock.acquire(action)
    }

    /// Whether the attempt holding `token` is still the live one
    pub fn verify(&self, action: LoadAction, token: LockToken) -> bool {
        self.load_lock.verify(action, token)
    }

    pub fn succeed(&mut self, action: LoadAction, remain_lock: bool) {
        self.load_lock.succeed(action, remain_lock);
    }

    pub fn fail(&mut self, action: LoadAction) {
        self.load_lock.fail(action);
    }

    pub fn release_if_current(&mut self, action: LoadAction, token: LockToken) -> bool {
        self.load_lock.release_if_current(action, token)
    }
}
