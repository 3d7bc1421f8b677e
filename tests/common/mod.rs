#![allow(dead_code)]

use std::sync::Arc;

use chatstream::{
    core::{
        client::LoadMoreClient,
        config::LoadMoreConfig,
        env::{LoadMoreEnvBuilder, MessageSource},
        processing::ChatProcessing,
        report::ReportEvent,
    },
    domain::message::{LoadDirection, LoadRequest, LoadResponse},
    infrastructure::memory::{
        InMemoryConversation, MemoryReporter, MessageWindow, RecordingScroll,
    },
    SequenceIndex,
};

pub struct Harness {
    pub conversation: Arc<InMemoryConversation>,
    pub window: Arc<MessageWindow>,
    pub scroll: Arc<RecordingScroll>,
    pub reporter: Arc<MemoryReporter>,
    pub processing: ChatProcessing,
    pub client: LoadMoreClient,
}

/// Settling is instant so tests never sleep
pub fn config() -> LoadMoreConfig {
    LoadMoreConfig {
        scroll_settle_ms: 0,
        ..LoadMoreConfig::default()
    }
}

/// A conversation of `count` messages indexed `1..=count`
pub fn harness(count: usize, config: LoadMoreConfig) -> Harness {
    harness_from(SequenceIndex::from(1), count, config)
}

pub fn harness_from(first_index: SequenceIndex, count: usize, config: LoadMoreConfig) -> Harness {
    build(first_index, count, config, true)
}

/// Like [`harness`], but the client is built without a scroll view; the
/// recording scroll is still created and never called
pub fn harness_without_scroll(count: usize, config: LoadMoreConfig) -> Harness {
    build(SequenceIndex::from(1), count, config, false)
}

fn build(
    first_index: SequenceIndex,
    count: usize,
    config: LoadMoreConfig,
    with_scroll: bool,
) -> Harness {
    let conversation = Arc::new(InMemoryConversation::new("conv", first_index, count));
    let window = Arc::new(MessageWindow::new());
    let scroll = Arc::new(RecordingScroll::new(Arc::clone(&window)));
    let reporter = Arc::new(MemoryReporter::new());
    let processing = ChatProcessing::new();

    let mut builder = LoadMoreEnvBuilder::new()
        .source(conversation.clone())
        .read_index(conversation.clone())
        .sink(window.clone())
        .reporter(reporter.clone())
        .processing(processing.clone())
        .conversation_id("conv");
    if with_scroll {
        builder = builder.scroll(scroll.clone());
    }
    let env = builder.build().unwrap();
    let client = LoadMoreClient::new(env, config).unwrap();

    Harness {
        conversation,
        window,
        scroll,
        reporter,
        processing,
        client,
    }
}

impl Harness {
    /// Open the session on the latest `page` messages
    pub async fn open_latest(&self, page: u32) -> LoadResponse {
        let response = self.conversation.initial_page(page);
        self.open_with(response.clone()).await;
        response
    }

    /// Open the session on the `page` messages after `cursor`, with history
    /// above and newer messages below
    pub async fn open_after(&self, cursor: &str, page: u32) -> LoadResponse {
        let mut response = self
            .conversation
            .fetch(LoadRequest::new(cursor, LoadDirection::Next).count(page))
            .await
            .unwrap();
        response.hasmore = true;
        self.open_with(response.clone()).await;
        response
    }

    async fn open_with(&self, response: LoadResponse) {
        self.window.replace(response.message_list.clone());
        self.client.handle_initial_load(&response).await;
    }

    pub fn window_indices(&self) -> Vec<String> {
        self.window
            .messages()
            .into_iter()
            .filter_map(|message| message.message_index)
            .collect()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.reporter.events()
    }

    pub fn requests_in(&self, direction: LoadDirection) -> usize {
        self.conversation
            .requests()
            .iter()
            .filter(|request| request.direction == direction)
            .count()
    }

    /// Resolve once `count` fetches have reached the backend, bootstrap
    /// fetches included
    pub async fn fetches_reached(&self, count: usize) {
        while self.conversation.requests().len() < count {
            tokio::task::yield_now().await;
        }
    }
}

pub fn idx(raw: &str) -> SequenceIndex {
    SequenceIndex::parse(raw).unwrap()
}

pub fn range(first: u64, last: u64) -> Vec<String> {
    (first..=last).map(|i| i.to_string()).collect()
}
