//! The load protocol and the command surface used by the UI layer
//!
//! All strategies share one runner:
//!
//! 1. check the strategy's guard and take the action's lock (one critical section)
//! 2. fetch, the only suspension point of the attempt
//! 3. re-check the lock token; a mismatch means the attempt was superseded
//!    and its response is dropped without touching anything
//! 4. reconcile cursors, flags and watermarks, then hand the page to the sink
//! 5. release the lock, or keep it for the scroll-settle window
//!
//! Failures release the lock and land in the error set. Nothing is retried here.

use std::sync::Arc;

use color_eyre::eyre::Report;
use strum::Display;
use tokio::sync::Mutex;

use crate::{
    domain::{
        message::{ChatMessage, ReadIndexRequest},
        sequence_index::SequenceIndex,
    },
    error::Error,
    model::{
        index_range::{should_abort_loaded_messages, MessageIndexRange},
        load_lock::{LoadAction, LockToken},
        pagination::{IndexPatch, Message, PaginationState},
    },
};

use super::{
    config::LoadMoreConfig,
    env::LoadMoreEnv,
    reconcile::{index_patch_from_verification, update_index_and_has_more_after_load},
    report::{IndexChangeRoute, ReportEvent},
    strategy::LoadStrategy,
};

/// The pagination state shared by every in-flight attempt of a session
pub type SharedPagination = Arc<Mutex<PaginationState>>;

/// How one command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum LoadOutcome {
    /// The guard refused to start a fetch
    Skipped,
    /// An eager load only scrolled to the bottom, which is a success
    Scrolled,
    Loaded,
    /// The attempt was superseded while fetching; its response was dropped
    Stale,
    /// The fetch failed; the action is recorded in the error set
    Failed,
}

#[derive(Clone)]
pub struct LoadMoreClient {
    pub(super) state: SharedPagination,
    pub(super) env: Arc<LoadMoreEnv>,
    pub(super) config: Arc<LoadMoreConfig>,
}

impl LoadMoreClient {
    pub fn new(env: LoadMoreEnv, config: LoadMoreConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            state: Arc::new(Mutex::new(PaginationState::new())),
            env: Arc::new(env),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &LoadMoreConfig {
        &self.config
    }

    /// A copy of the current pagination state
    pub async fn state(&self) -> PaginationState {
        self.state.lock().await.clone()
    }

    pub async fn load_by_scroll_prev(&self) -> LoadOutcome {
        self.run(LoadStrategy::ScrollPrev).await
    }

    pub async fn load_by_scroll_next(&self) -> LoadOutcome {
        self.run(LoadStrategy::ScrollNext).await
    }

    /// Jump to the latest messages, fetching only if newer pages exist
    pub async fn load_eagerly(&self) -> LoadOutcome {
        self.load_eagerly_with(false).await
    }

    /// Jump to the latest messages and always refetch the latest page
    pub async fn load_eagerly_unconditionally(&self) -> LoadOutcome {
        self.load_eagerly_with(true).await
    }

    async fn load_eagerly_with(&self, unconditional: bool) -> LoadOutcome {
        self.scroll_to_bottom();
        match self.run(LoadStrategy::Eagerly { unconditional }).await {
            LoadOutcome::Skipped => LoadOutcome::Scrolled,
            outcome => outcome,
        }
    }

    /// Load the latest page because the conversation reached `to_index`
    pub async fn load_passively(&self, to_index: SequenceIndex) -> LoadOutcome {
        self.run(LoadStrategy::Passively { to_index }).await
    }

    /// Merge newer pages in the background until caught up
    pub async fn load_silently(&self) -> LoadOutcome {
        self.run(LoadStrategy::Silently).await
    }

    /// React to a pushed "conversation now ends at `new_index`" notification
    ///
    /// Small jumps past the loaded window are merged silently; anything larger
    /// loads the latest page passively. There is deliberately no early return
    /// for indices that are already loaded: pushes are not debounced upstream,
    /// so every notification is followed through.
    pub async fn on_message_index_change(
        &self,
        new_index: SequenceIndex,
    ) -> (IndexChangeRoute, LoadOutcome) {
        let route = {
            let mut state = self.state.lock().await;
            state.update(Message::IndexUpdated(IndexPatch {
                read_index: None,
                end_index: Some(new_index.clone()),
            }));
            if new_index.exceeds_by(state.max_load_index(), self.config.silent_merge_threshold) {
                IndexChangeRoute::Passive
            } else {
                IndexChangeRoute::Silent
            }
        };
        self.report(ReportEvent::MessageIndexChanged {
            index: new_index.clone(),
            route,
        });

        let outcome = match route {
            IndexChangeRoute::Silent => self.load_silently().await,
            IndexChangeRoute::Passive => self.load_passively(new_index).await,
        };
        (route, outcome)
    }

    /// Recompute the loaded maximum after the message collection changed
    /// outside of a load (a sent message got its index, a message was pushed)
    pub async fn on_messages_changed(&self, messages: &[ChatMessage]) {
        if let Some(max) = MessageIndexRange::of(messages).max {
            self.state
                .lock()
                .await
                .update(Message::MaxLoadIndexObserved(max));
        }
    }

    async fn run(&self, strategy: LoadStrategy) -> LoadOutcome {
        let action = strategy.action();
        let (token, mut request) = {
            let mut state = self.state.lock().await;
            if !strategy.guard(&state, &self.config) {
                log::debug!("{action} skipped by guard");
                return LoadOutcome::Skipped;
            }
            let request = strategy.request(&state, &self.config);
            (state.acquire(action), request)
        };
        self.report(ReportEvent::LoadStarted { action });

        let mut message_count = 0;
        let mut cleared = false;
        let mut rounds = 0;
        loop {
            rounds += 1;
            let response = match self.env.source.fetch(request).await {
                Ok(response) => response,
                Err(error) => return self.fail(action, token, &error).await,
            };
            if strategy == LoadStrategy::Silently {
                self.env.processing.idle().await;
            }

            let mut state = self.state.lock().await;
            if !state.verify(action, token) {
                drop(state);
                self.report(ReportEvent::LoadStale { action });
                return LoadOutcome::Stale;
            }

            let clear_first = strategy.fetches_latest()
                && should_abort_loaded_messages(
                    state.max_load_index(),
                    &MessageIndexRange::of(&response.message_list),
                    self.config.eager_page_size,
                );
            update_index_and_has_more_after_load(
                &mut state,
                strategy.scope(clear_first),
                &response,
            );
            self.env
                .sink
                .insert_messages(&response, strategy.insert_options(clear_first));
            message_count += response.message_list.len();
            cleared |= clear_first;

            let catching_up = strategy == LoadStrategy::Silently
                && !response.message_list.is_empty()
                && state.next_has_more()
                && rounds < self.config.silent_max_rounds;
            if catching_up {
                request = strategy.request(&state, &self.config);
                continue;
            }

            state.succeed(action, strategy.holds_lock_to_settle());
            break;
        }
        self.report(ReportEvent::LoadSucceeded {
            action,
            message_count,
            cleared,
        });

        if strategy.holds_lock_to_settle() {
            self.settle(&strategy, action, token).await;
        }
        self.verify_read_index().await;

        LoadOutcome::Loaded
    }

    async fn fail(&self, action: LoadAction, token: LockToken, error: &Report) -> LoadOutcome {
        let mut state = self.state.lock().await;
        if !state.verify(action, token) {
            drop(state);
            log::debug!("{action} failed after being superseded: {error}");
            self.report(ReportEvent::LoadStale { action });
            return LoadOutcome::Stale;
        }
        state.fail(action);
        drop(state);

        self.report(ReportEvent::LoadFailed {
            action,
            error: format!("{error:#}"),
        });
        LoadOutcome::Failed
    }

    /// Let the view settle with the lock still held, then release it if no
    /// newer attempt has taken it meanwhile
    async fn settle(&self, strategy: &LoadStrategy, action: LoadAction, token: LockToken) {
        match strategy {
            LoadStrategy::ScrollNext => match &self.env.scroll {
                Some(scroll) => scroll.compensate_anchor(),
                None => self.report(ReportEvent::IntegrityViolation {
                    reason: String::from("no scroll view to compensate the scroll anchor"),
                }),
            },
            _ => self.scroll_to_bottom(),
        }

        tokio::time::sleep(self.config.scroll_settle()).await;

        if !self.state.lock().await.release_if_current(action, token) {
            log::debug!("{action} lock was taken over before the settle window ended");
        }
    }

    pub(super) fn scroll_to_bottom(&self) {
        match &self.env.scroll {
            Some(scroll) => scroll.scroll_to_bottom(),
            None => self.report(ReportEvent::IntegrityViolation {
                reason: String::from("no scroll view to scroll to bottom"),
            }),
        }
    }

    /// Cross-check the watermarks against the read-position endpoint
    ///
    /// Only runs with mark-as-read tracking enabled. A failure is reported and
    /// otherwise ignored.
    pub(super) async fn verify_read_index(&self) {
        if !self.config.enable_mark_read {
            return;
        }
        let Some(source) = &self.env.read_index else {
            return;
        };

        let request = ReadIndexRequest {
            conversation_id: self.env.conversation_id.clone(),
        };
        match source.fetch_read_index(request).await {
            Ok(response) => {
                self.state
                    .lock()
                    .await
                    .update(Message::IndexUpdated(index_patch_from_verification(
                        &response,
                    )));
            }
            Err(error) => self.report(ReportEvent::ReadIndexVerifyFailed {
                error: format!("{error:#}"),
            }),
        }
    }

    pub(super) fn report(&self, event: ReportEvent) {
        self.env.reporter.report(&event);
    }
}
