//! Session lifecycle: recording the first page and clearing history

use strum::IntoEnumIterator;
use tokio::sync::watch;

use crate::{
    domain::{
        message::{ChatMessage, LoadResponse},
        sequence_index::SequenceIndex,
    },
    model::{
        index_range::MessageIndexRange,
        pagination::{CursorPatch, HasMorePatch, IndexPatch, Message},
    },
};

use super::{
    client::LoadMoreClient,
    report::{ClearHistoryStep, ReportEvent},
};

impl ClearHistoryStep {
    fn message(self) -> Message {
        match self {
            ClearHistoryStep::ResetHasMore => Message::HasMoreReset,
            ClearHistoryStep::ResetCursors => Message::CursorsReset,
            ClearHistoryStep::ResetLoadLockAndError => Message::LoadLockAndErrorReset,
            ClearHistoryStep::AlignIndexes => Message::IndexesAligned,
        }
    }
}

/// The state messages that record the first page of a session
///
/// Unlike later pages, the first page comes from the session bootstrap and
/// both of its flags and cursors are authoritative.
pub fn initial_load_messages(data: &LoadResponse) -> Vec<Message> {
    let mut messages = vec![
        Message::IndexUpdated(IndexPatch {
            read_index: SequenceIndex::parse(&data.read_message_index),
            end_index: data
                .end_message_index
                .as_deref()
                .and_then(SequenceIndex::parse),
        }),
        Message::HasMoreUpdated(HasMorePatch {
            prev: Some(data.hasmore),
            next: Some(data.next_has_more),
        }),
        Message::CursorUpdated(CursorPatch {
            cursor: Some(data.cursor.clone()),
            next_cursor: Some(data.next_cursor.clone()),
        }),
    ];
    if let Some(max) = MessageIndexRange::of(&data.message_list).max {
        messages.push(Message::MaxLoadIndexObserved(max));
    }
    messages
}

/// The message to scroll to when a session opens
///
/// Prefers the message right after the last read one, and falls back to the
/// last read message itself.
pub fn find_unread_target<'a>(
    messages: &'a [ChatMessage],
    read_index: &SequenceIndex,
) -> Option<&'a ChatMessage> {
    let first_unread = read_index.successor();
    let find = move |target: &SequenceIndex| {
        messages
            .iter()
            .find(|message| message.sequence_index().as_ref() == Some(target))
    };
    find(&first_unread).or_else(|| find(read_index))
}

impl LoadMoreClient {
    /// Record the bootstrap page of a session and scroll to the first unread message
    ///
    /// The page itself is inserted into the message list by the caller, before
    /// or after this call. Locating waits until the target message is
    /// rendered, bounded by `locate_timeout_ms`; whatever the list showed
    /// before does not count.
    pub async fn handle_initial_load(&self, data: &LoadResponse) {
        // Subscribe first so a render racing with this call is not missed.
        let mut len = self.env.sink.subscribe_len();
        len.borrow_and_update();

        let read_index = {
            let mut state = self.state.lock().await;
            for message in initial_load_messages(data) {
                state.update(message);
            }
            state.read_index().clone()
        };
        self.report(ReportEvent::InitialLoadRecorded {
            message_count: data.message_list.len(),
        });

        self.verify_read_index().await;

        if data.message_list.is_empty() {
            self.report(ReportEvent::UnreadLocateFailed {
                reason: String::from("initial page is empty"),
            });
            return;
        }
        let Some(target) = find_unread_target(&data.message_list, &read_index) else {
            self.report(ReportEvent::UnreadLocateFailed {
                reason: format!("no message at or after read index {read_index}"),
            });
            return;
        };

        let sink = &self.env.sink;
        let rendered = tokio::time::timeout(self.config.locate_timeout(), async {
            while !sink.contains_message(&target.message_id) {
                len.changed().await?;
            }
            Ok::<(), watch::error::RecvError>(())
        })
        .await;
        if !matches!(rendered, Ok(Ok(()))) {
            self.report(ReportEvent::UnreadLocateFailed {
                reason: String::from("message list was not rendered in time"),
            });
            return;
        }

        self.locate_unread(&target.message_id);
    }

    fn locate_unread(&self, message_id: &str) {
        let Some(scroll) = &self.env.scroll else {
            self.report(ReportEvent::IntegrityViolation {
                reason: String::from("no scroll view to locate the first unread message"),
            });
            return;
        };

        if scroll.scroll_into_view(message_id) {
            self.report(ReportEvent::UnreadLocated {
                message_id: message_id.to_owned(),
            });
        } else {
            self.report(ReportEvent::UnreadLocateFailed {
                reason: format!("message {message_id} is not rendered"),
            });
        }
    }

    /// Reset flags, cursors and locks after the conversation history was cleared
    ///
    /// In-flight loads lose their locks here, so their responses are dropped
    /// as stale when they arrive.
    pub async fn on_clear_history(&self) {
        let mut state = self.state.lock().await;
        for step in ClearHistoryStep::iter() {
            state.update(step.message());
            self.report(ReportEvent::ClearHistoryStepDone { step });
        }
    }
}
