//! Collaborators the load core calls out to
//!
//! The transport, the message store and the scroll container live outside
//! this crate. They are injected as trait objects through [`LoadMoreEnvBuilder`].

use std::sync::Arc;

use color_eyre::eyre::Result;
use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::{
    domain::message::{LoadRequest, LoadResponse, ReadIndexRequest, ReadIndexResponse},
    error::Error,
};

use super::{
    processing::ChatProcessing,
    report::{Reporter, TracingReporter},
};

/// Paged access to a conversation's messages
pub trait MessageSource: Send + Sync {
    fn fetch(&self, request: LoadRequest) -> BoxFuture<'_, Result<LoadResponse>>;
}

/// The separate read-position endpoint used to double-check watermarks
pub trait ReadIndexSource: Send + Sync {
    fn fetch_read_index(&self, request: ReadIndexRequest)
        -> BoxFuture<'_, Result<ReadIndexResponse>>;
}

/// Where a fetched page goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Append after the newest message instead of prepending before the oldest
    pub to_latest: bool,
    /// Drop the rendered window before inserting
    pub clear_first: bool,
}

/// The message collection that renders loaded pages
pub trait MessageSink: Send + Sync {
    fn insert_messages(&self, response: &LoadResponse, options: InsertOptions);

    /// Whether the collection currently renders `message_id`
    fn contains_message(&self, message_id: &str) -> bool;

    /// Number of messages in the collection, updated on every change
    fn subscribe_len(&self) -> watch::Receiver<usize>;
}

/// The scroll container of the message list
pub trait ScrollView: Send + Sync {
    fn scroll_to_bottom(&self);

    /// Scroll the element rendering `message_id` into view; `false` if there is none
    fn scroll_into_view(&self, message_id: &str) -> bool;

    /// Keep the visible message in place after messages were added around it
    fn compensate_anchor(&self) {}
}

pub struct LoadMoreEnv {
    pub(crate) source: Arc<dyn MessageSource>,
    pub(crate) sink: Arc<dyn MessageSink>,
    pub(crate) read_index: Option<Arc<dyn ReadIndexSource>>,
    pub(crate) scroll: Option<Arc<dyn ScrollView>>,
    pub(crate) reporter: Arc<dyn Reporter>,
    pub(crate) processing: ChatProcessing,
    pub(crate) conversation_id: Option<String>,
}

#[derive(Default)]
pub struct LoadMoreEnvBuilder {
    source: Option<Arc<dyn MessageSource>>,
    sink: Option<Arc<dyn MessageSink>>,
    read_index: Option<Arc<dyn ReadIndexSource>>,
    scroll: Option<Arc<dyn ScrollView>>,
    reporter: Option<Arc<dyn Reporter>>,
    processing: Option<ChatProcessing>,
    conversation_id: Option<String>,
}

impl LoadMoreEnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(self, source: Arc<dyn MessageSource>) -> Self {
        Self {
            source: Some(source),
            ..self
        }
    }

    pub fn sink(self, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sink: Some(sink),
            ..self
        }
    }

    pub fn read_index(self, read_index: Arc<dyn ReadIndexSource>) -> Self {
        Self {
            read_index: Some(read_index),
            ..self
        }
    }

    pub fn scroll(self, scroll: Arc<dyn ScrollView>) -> Self {
        Self {
            scroll: Some(scroll),
            ..self
        }
    }

    pub fn reporter(self, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            reporter: Some(reporter),
            ..self
        }
    }

    pub fn processing(self, processing: ChatProcessing) -> Self {
        Self {
            processing: Some(processing),
            ..self
        }
    }

    pub fn conversation_id(self, conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            ..self
        }
    }

    /// Fails if the message source or the message sink is missing
    pub fn build(self) -> Result<LoadMoreEnv, Error> {
        let source = self
            .source
            .ok_or(Error::MissingCollaborator("message source"))?;
        let sink = self.sink.ok_or(Error::MissingCollaborator("message sink"))?;

        Ok(LoadMoreEnv {
            source,
            sink,
            read_index: self.read_index,
            scroll: self.scroll,
            reporter: self
                .reporter
                .unwrap_or_else(|| Arc::new(TracingReporter)),
            processing: self.processing.unwrap_or_default(),
            conversation_id: self.conversation_id,
        })
    }
}
