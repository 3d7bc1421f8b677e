//! Runs a replay script against an in-memory conversation

use std::sync::Arc;

use serde::Serialize;

use crate::{
    core::{
        client::LoadMoreClient,
        config::LoadMoreConfig,
        env::{LoadMoreEnvBuilder, MessageSink, MessageSource, ReadIndexSource},
    },
    domain::message::ChatMessage,
    error::Error,
    model::pagination::PaginationState,
};

use super::{
    cli::{Cli, ScriptStep},
    memory::{InMemoryConversation, MessageWindow, RecordingScroll},
};

const CONVERSATION_ID: &str = "replay";

/// What one step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: String,
    pub outcome: String,
}

/// The rendered window at the end of a replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    pub len: usize,
    pub first_index: Option<String>,
    pub last_index: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub steps: Vec<StepRecord>,
    pub state: PaginationState,
    pub window: WindowSummary,
}

pub struct Replay {
    conversation: Arc<InMemoryConversation>,
    window: Arc<MessageWindow>,
    client: LoadMoreClient,
    initial_page: u32,
}

impl Replay {
    pub fn new(cli: &Cli, config: LoadMoreConfig) -> Result<Self, Error> {
        let conversation = Arc::new(InMemoryConversation::new(
            CONVERSATION_ID,
            cli.base_index.clone(),
            cli.messages,
        ));
        if let Some(read_index) = &cli.read_index {
            conversation.mark_read(read_index.clone());
        }
        let window = Arc::new(MessageWindow::new());
        let scroll = Arc::new(RecordingScroll::new(Arc::clone(&window)));

        let env = LoadMoreEnvBuilder::new()
            .source(Arc::clone(&conversation) as Arc<dyn MessageSource>)
            .read_index(Arc::clone(&conversation) as Arc<dyn ReadIndexSource>)
            .sink(Arc::clone(&window) as Arc<dyn MessageSink>)
            .scroll(scroll)
            .conversation_id(CONVERSATION_ID)
            .build()?;

        Ok(Self {
            conversation,
            window,
            client: LoadMoreClient::new(env, config)?,
            initial_page: cli.initial_page,
        })
    }

    /// Open the session, then run every step in order
    pub async fn run(&self, script: &[ScriptStep]) -> ReplaySummary {
        let mut steps = Vec::with_capacity(script.len() + 1);

        let page = self.conversation.initial_page(self.initial_page);
        self.window.replace(page.message_list.clone());
        self.client.handle_initial_load(&page).await;
        steps.push(StepRecord {
            step: String::from("open"),
            outcome: format!("{} messages", page.message_list.len()),
        });

        for step in script {
            let outcome = self.step(step).await;
            log::info!("{step}: {outcome}");
            steps.push(StepRecord {
                step: step.to_string(),
                outcome,
            });
        }

        ReplaySummary {
            steps,
            state: self.client.state().await,
            window: self.window_summary(),
        }
    }

    async fn step(&self, step: &ScriptStep) -> String {
        match step {
            ScriptStep::Prev => self.client.load_by_scroll_prev().await.to_string(),
            ScriptStep::Next => self.client.load_by_scroll_next().await.to_string(),
            ScriptStep::Eager => self.client.load_eagerly().await.to_string(),
            ScriptStep::EagerForce => self.client.load_eagerly_unconditionally().await.to_string(),
            ScriptStep::Silent => self.client.load_silently().await.to_string(),
            ScriptStep::Passive(index) => self.client.load_passively(index.clone()).await.to_string(),
            ScriptStep::Push(count) => {
                let end = self.conversation.push(*count);
                let (route, outcome) = self.client.on_message_index_change(end.clone()).await;
                format!("{route} to {end}: {outcome}")
            }
            ScriptStep::Read(index) => {
                self.conversation.mark_read(index.clone());
                format!("read up to {index}")
            }
            ScriptStep::Fail(count) => {
                self.conversation.fail_next_fetches(*count);
                format!("next {count} fetches fail")
            }
            ScriptStep::Clear => {
                self.conversation.clear();
                self.window.replace(Vec::new());
                self.client.on_clear_history().await;
                String::from("history cleared")
            }
        }
    }

    fn window_summary(&self) -> WindowSummary {
        let messages = self.window.messages();
        let index_of = |message: Option<&ChatMessage>| {
            message
                .and_then(ChatMessage::sequence_index)
                .map(|index| index.to_string())
        };
        WindowSummary {
            len: messages.len(),
            first_index: index_of(messages.first()),
            last_index: index_of(messages.last()),
        }
    }
}

impl ReplaySummary {
    /// Human readable rendering for the terminal
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = self
            .steps
            .iter()
            .map(|record| format!("{:<16} {}", record.step, record.outcome))
            .collect();

        let state = &self.state;
        lines.push(String::new());
        lines.push(format!(
            "cursor {} / next cursor {}",
            state.cursor(),
            state.next_cursor()
        ));
        lines.push(format!(
            "has more: prev {} / next {}",
            state.prev_has_more(),
            state.next_has_more()
        ));
        lines.push(format!(
            "read {} / end {} / max loaded {}",
            state.read_index(),
            state.end_index(),
            state.max_load_index()
        ));
        let errors: Vec<String> = state.load_errors().iter().map(ToString::to_string).collect();
        if !errors.is_empty() {
            lines.push(format!("failed: {}", errors.join(", ")));
        }
        lines.push(format!(
            "window: {} messages ({} ..= {})",
            self.window.len,
            self.window.first_index.as_deref().unwrap_or("-"),
            self.window.last_index.as_deref().unwrap_or("-")
        ));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    fn replay(args: &[&str]) -> (Replay, Vec<ScriptStep>) {
        let cli = Cli::try_parse_from(std::iter::once("chatstream").chain(args.iter().copied()))
            .unwrap();
        let config = LoadMoreConfig {
            scroll_settle_ms: 0,
            ..LoadMoreConfig::default()
        };
        (Replay::new(&cli, config).unwrap(), cli.script)
    }

    #[tokio::test]
    async fn test_history_walk() {
        let (replay, script) = replay(&[
            "--messages",
            "40",
            "--base-index",
            "1000",
            "--initial-page",
            "10",
            "--script",
            "prev,prev",
        ]);
        let summary = replay.run(&script).await;

        assert_eq!(
            summary.window,
            WindowSummary {
                len: 40,
                first_index: Some(String::from("1000")),
                last_index: Some(String::from("1039")),
            }
        );
        assert!(!summary.state.prev_has_more());
        assert_eq!(summary.steps[1].outcome, "loaded");
    }

    #[tokio::test]
    async fn test_push_routes_by_distance() {
        let (replay, script) = replay(&[
            "--messages",
            "10",
            "--script",
            "push:2,push:30",
        ]);
        let summary = replay.run(&script).await;

        assert_eq!(summary.steps[1].outcome, "silent to 12: loaded");
        assert_eq!(summary.steps[2].outcome, "passive to 42: loaded");
        assert_eq!(summary.state.end_index().as_str(), "42");
        assert_eq!(summary.window.last_index.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_failure_is_rendered() {
        let (replay, script) = replay(&["--messages", "30", "--script", "fail,prev"]);
        let summary = replay.run(&script).await;

        assert_eq!(summary.steps[2].outcome, "failed");
        assert!(summary.render().contains("failed: load-prev"));
    }
}
