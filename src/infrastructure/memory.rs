//! In-memory collaborators
//!
//! A scripted conversation backend, a message window and recording scroll /
//! report sinks. The replay binary and the integration tests drive the load
//! core through these.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use color_eyre::eyre::{eyre, Result};
use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::{
    core::{
        env::{InsertOptions, MessageSink, MessageSource, ReadIndexSource, ScrollView},
        report::{ReportEvent, Reporter},
    },
    domain::{
        message::{
            ChatMessage, LoadDirection, LoadRequest, LoadResponse, ReadIndexRequest,
            ReadIndexResponse,
        },
        sequence_index::SequenceIndex,
    },
};

const DEFAULT_PAGE_SIZE: usize = 20;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct ConversationLog {
    /// Ascending by index
    messages: Vec<ChatMessage>,
    read_index: SequenceIndex,
    next_index: SequenceIndex,
    next_id: u64,
}

impl ConversationLog {
    fn append(&mut self, content: String) -> SequenceIndex {
        let index = self.next_index.clone();
        self.next_id += 1;
        self.messages.push(
            ChatMessage::new(format!("msg-{}", self.next_id), index.to_string())
                .with_content(content),
        );
        self.next_index = index.successor();
        index
    }

    fn end_index(&self) -> SequenceIndex {
        self.messages
            .last()
            .and_then(ChatMessage::sequence_index)
            .unwrap_or_default()
    }
}

/// A conversation backend kept in memory
///
/// Pages follow the usual backend contract: `hasmore` is only filled for
/// `Prev` requests and `next_has_more` only for `Next` requests. Tests can
/// hold requests of one direction, inject failures and inspect the requests
/// that were made.
pub struct InMemoryConversation {
    conversation_id: String,
    log: Mutex<ConversationLog>,
    held: watch::Sender<HashSet<LoadDirection>>,
    failing_fetches: AtomicUsize,
    failing_read_index: AtomicBool,
    requests: Mutex<Vec<LoadRequest>>,
}

impl InMemoryConversation {
    /// A conversation of `count` messages indexed from `first_index` upwards
    pub fn new(conversation_id: impl Into<String>, first_index: SequenceIndex, count: usize) -> Self {
        let mut log = ConversationLog {
            messages: Vec::with_capacity(count),
            read_index: SequenceIndex::zero(),
            next_index: first_index,
            next_id: 0,
        };
        for i in 0..count {
            log.append(format!("history #{i}"));
        }

        let (held, _rx) = watch::channel(HashSet::new());
        Self {
            conversation_id: conversation_id.into(),
            log: Mutex::new(log),
            held,
            failing_fetches: AtomicUsize::new(0),
            failing_read_index: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Append `count` new messages and return the new end index
    pub fn push(&self, count: usize) -> SequenceIndex {
        let mut log = lock(&self.log);
        for i in 0..count {
            log.append(format!("live #{i}"));
        }
        log.end_index()
    }

    pub fn end_index(&self) -> SequenceIndex {
        lock(&self.log).end_index()
    }

    pub fn mark_read(&self, index: SequenceIndex) {
        lock(&self.log).read_index = index;
    }

    /// Drop every message; indices keep counting from where they were
    pub fn clear(&self) {
        lock(&self.log).messages.clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.log).messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bootstrap page a session opens with: the latest `count` messages,
    /// with both flags and cursors filled in
    pub fn initial_page(&self, count: u32) -> LoadResponse {
        let log = lock(&self.log);
        let start = log.messages.len().saturating_sub(count as usize);
        let page = log.messages[start..].to_vec();

        LoadResponse {
            cursor: cursor_of(page.first()),
            next_cursor: cursor_of(page.last()),
            hasmore: start > 0,
            next_has_more: false,
            read_message_index: log.read_index.to_string(),
            end_message_index: Some(log.end_index().to_string()),
            conversation_id: Some(self.conversation_id.clone()),
            message_list: page,
        }
    }

    /// Keep every fetch in `direction` pending until [`Self::release`]
    pub fn hold(&self, direction: LoadDirection) {
        self.held.send_modify(|held| {
            held.insert(direction);
        });
    }

    pub fn release(&self, direction: LoadDirection) {
        self.held.send_modify(|held| {
            held.remove(&direction);
        });
    }

    /// Make the next `count` fetches fail
    pub fn fail_next_fetches(&self, count: usize) {
        self.failing_fetches.store(count, Ordering::SeqCst);
    }

    pub fn fail_read_index(&self, failing: bool) {
        self.failing_read_index.store(failing, Ordering::SeqCst);
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<LoadRequest> {
        lock(&self.requests).clone()
    }

    fn page(&self, request: &LoadRequest) -> LoadResponse {
        let log = lock(&self.log);
        let count = request.count.map_or(DEFAULT_PAGE_SIZE, |count| count as usize);
        let cursor = SequenceIndex::parse(&request.cursor).unwrap_or_default();

        let mut response = LoadResponse {
            read_message_index: log.read_index.to_string(),
            end_message_index: Some(log.end_index().to_string()),
            conversation_id: Some(self.conversation_id.clone()),
            ..LoadResponse::default()
        };

        let page: Vec<ChatMessage> = match request.direction {
            LoadDirection::Prev => {
                let older: Vec<&ChatMessage> = log
                    .messages
                    .iter()
                    .filter(|message| {
                        cursor.is_sentinel()
                            || message.sequence_index().is_some_and(|index| index < cursor)
                    })
                    .collect();
                let start = older.len().saturating_sub(count);
                response.hasmore = start > 0;
                older[start..].iter().map(|message| (*message).clone()).collect()
            }
            LoadDirection::Next => {
                let newer: Vec<&ChatMessage> = log
                    .messages
                    .iter()
                    .filter(|message| message.sequence_index().is_some_and(|index| index > cursor))
                    .collect();
                response.next_has_more = newer.len() > count;
                newer.iter().take(count).map(|message| (*message).clone()).collect()
            }
        };

        response.cursor = page
            .first()
            .map_or_else(|| request.cursor.clone(), |message| cursor_of(Some(message)));
        response.next_cursor = page
            .last()
            .map_or_else(|| request.cursor.clone(), |message| cursor_of(Some(message)));
        response.message_list = page;
        response
    }
}

fn cursor_of(message: Option<&ChatMessage>) -> String {
    message
        .and_then(ChatMessage::sequence_index)
        .unwrap_or_default()
        .to_string()
}

impl MessageSource for InMemoryConversation {
    fn fetch(&self, request: LoadRequest) -> BoxFuture<'_, Result<LoadResponse>> {
        Box::pin(async move {
            lock(&self.requests).push(request.clone());

            let mut held = self.held.subscribe();
            held.wait_for(|held| !held.contains(&request.direction))
                .await?;

            let failing = self
                .failing_fetches
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(eyre!(
                    "connection reset while fetching {} page at cursor {}",
                    request.direction,
                    request.cursor
                ));
            }

            Ok(self.page(&request))
        })
    }
}

impl ReadIndexSource for InMemoryConversation {
    fn fetch_read_index(
        &self,
        request: ReadIndexRequest,
    ) -> BoxFuture<'_, Result<ReadIndexResponse>> {
        Box::pin(async move {
            if self.failing_read_index.load(Ordering::SeqCst) {
                return Err(eyre!("read index endpoint unavailable"));
            }
            if let Some(conversation_id) = &request.conversation_id {
                if *conversation_id != self.conversation_id {
                    return Err(eyre!("unknown conversation {conversation_id}"));
                }
            }
            let log = lock(&self.log);
            Ok(ReadIndexResponse {
                read_message_index: log.read_index.to_string(),
                end_message_index: log.end_index().to_string(),
            })
        })
    }
}

/// The rendered message list, oldest first, de-duplicated by message id
pub struct MessageWindow {
    messages: Mutex<Vec<ChatMessage>>,
    len: watch::Sender<usize>,
}

impl Default for MessageWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageWindow {
    pub fn new() -> Self {
        let (len, _rx) = watch::channel(0);
        Self {
            messages: Mutex::new(Vec::new()),
            len,
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.messages).clone()
    }

    pub fn message_ids(&self) -> Vec<String> {
        lock(&self.messages)
            .iter()
            .map(|message| message.message_id.clone())
            .collect()
    }

    pub fn contains(&self, message_id: &str) -> bool {
        lock(&self.messages)
            .iter()
            .any(|message| message.message_id == message_id)
    }

    pub fn len(&self) -> usize {
        lock(&self.messages).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render a page the way the chat layer does when a session opens
    pub fn replace(&self, messages: Vec<ChatMessage>) {
        let mut current = lock(&self.messages);
        *current = messages;
        self.len.send_replace(current.len());
    }
}

impl MessageSink for MessageWindow {
    fn insert_messages(&self, response: &LoadResponse, options: InsertOptions) {
        let mut messages = lock(&self.messages);
        if options.clear_first {
            messages.clear();
        }

        let known: HashSet<&str> = messages
            .iter()
            .map(|message| message.message_id.as_str())
            .collect();
        let fresh: Vec<ChatMessage> = response
            .message_list
            .iter()
            .filter(|message| !known.contains(message.message_id.as_str()))
            .cloned()
            .collect();

        if options.to_latest {
            messages.extend(fresh);
        } else {
            messages.splice(0..0, fresh);
        }
        self.len.send_replace(messages.len());
    }

    fn contains_message(&self, message_id: &str) -> bool {
        self.contains(message_id)
    }

    fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.len.subscribe()
    }
}

/// What a [`RecordingScroll`] was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollCall {
    Bottom,
    IntoView(String),
    CompensateAnchor,
}

/// A scroll view over a [`MessageWindow`] that records every call
pub struct RecordingScroll {
    window: Arc<MessageWindow>,
    calls: Mutex<Vec<ScrollCall>>,
}

impl RecordingScroll {
    pub fn new(window: Arc<MessageWindow>) -> Self {
        Self {
            window,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ScrollCall> {
        lock(&self.calls).clone()
    }
}

impl ScrollView for RecordingScroll {
    fn scroll_to_bottom(&self) {
        log::debug!("scroll to bottom");
        lock(&self.calls).push(ScrollCall::Bottom);
    }

    fn scroll_into_view(&self, message_id: &str) -> bool {
        log::debug!("scroll {message_id} into view");
        lock(&self.calls).push(ScrollCall::IntoView(message_id.to_owned()));
        self.window.contains(message_id)
    }

    fn compensate_anchor(&self) {
        lock(&self.calls).push(ScrollCall::CompensateAnchor);
    }
}

/// Keeps every reported event
#[derive(Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        lock(&self.events).clone()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &ReportEvent) {
        lock(&self.events).push(event.clone());
    }
}
