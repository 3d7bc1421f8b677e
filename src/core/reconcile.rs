//! Applying a fetched page to the pagination state
//!
//! Backends compute `hasmore` and `next_has_more` for the direction that was
//! requested and fill the other one incidentally. Only the fields of the
//! fetched direction are applied.

use crate::{
    domain::{
        message::{LoadResponse, ReadIndexResponse},
        sequence_index::SequenceIndex,
    },
    model::{
        index_range::MessageIndexRange,
        pagination::{CursorPatch, HasMorePatch, IndexPatch, Message, PaginationState},
    },
};

/// Which part of a response is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileScope {
    /// Older page: history cursor and flag
    Prev,
    /// Newer page: forward cursor and flag
    Next,
    /// Latest page: nothing newer exists any more; the history cursor and flag
    /// only apply when the page replaced the loaded window
    Latest { replaced: bool },
}

/// The state messages that record `response` for a page fetched in `scope`
pub fn messages_after_load(scope: ReconcileScope, response: &LoadResponse) -> Vec<Message> {
    let mut messages = Vec::with_capacity(4);

    if let Some(read_index) = SequenceIndex::parse(&response.read_message_index) {
        messages.push(Message::IndexUpdated(IndexPatch {
            read_index: Some(read_index),
            end_index: None,
        }));
    } else {
        log::warn!(
            "ignoring malformed read_message_index {:?}",
            response.read_message_index
        );
    }

    let (has_more, cursor) = match scope {
        ReconcileScope::Prev => (
            HasMorePatch {
                prev: Some(response.hasmore),
                next: None,
            },
            CursorPatch {
                cursor: Some(response.cursor.clone()),
                next_cursor: None,
            },
        ),
        ReconcileScope::Next => (
            HasMorePatch {
                prev: None,
                next: Some(response.next_has_more),
            },
            CursorPatch {
                cursor: None,
                next_cursor: Some(response.next_cursor.clone()),
            },
        ),
        ReconcileScope::Latest { replaced } => (
            HasMorePatch {
                prev: replaced.then_some(response.hasmore),
                next: Some(false),
            },
            CursorPatch {
                cursor: replaced.then(|| response.cursor.clone()),
                next_cursor: Some(response.next_cursor.clone()),
            },
        ),
    };
    messages.push(Message::HasMoreUpdated(has_more));
    messages.push(Message::CursorUpdated(cursor));

    if let Some(max) = MessageIndexRange::of(&response.message_list).max {
        messages.push(Message::MaxLoadIndexObserved(max));
    }

    messages
}

/// Record `response` in `state`
pub fn update_index_and_has_more_after_load(
    state: &mut PaginationState,
    scope: ReconcileScope,
    response: &LoadResponse,
) {
    for message in messages_after_load(scope, response) {
        state.update(message);
    }
}

/// The watermark update carried by a read-position response
///
/// Malformed values are dropped; the ratchet in the state takes care of
/// anything lower than what is already known.
pub fn index_patch_from_verification(response: &ReadIndexResponse) -> IndexPatch {
    IndexPatch {
        read_index: SequenceIndex::parse(&response.read_message_index),
        end_index: SequenceIndex::parse(&response.end_message_index),
    }
}
