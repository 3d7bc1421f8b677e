//! Structured report events
//!
//! Reports are fire-and-forget. Nothing a reporter does can change the
//! outcome of a load.

use strum::Display;

use crate::{
    domain::sequence_index::SequenceIndex, model::load_lock::LoadAction,
};

/// How an externally pushed index change was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum IndexChangeRoute {
    /// Close enough to the loaded window to merge in the background
    Silent,
    /// Too far ahead; the latest page is loaded passively
    Passive,
}

/// One step of the clear-history effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ClearHistoryStep {
    ResetHasMore,
    ResetCursors,
    ResetLoadLockAndError,
    AlignIndexes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    LoadStarted {
        action: LoadAction,
    },
    LoadSucceeded {
        action: LoadAction,
        message_count: usize,
        cleared: bool,
    },
    /// A response arrived for an attempt that was superseded and was dropped
    LoadStale {
        action: LoadAction,
    },
    LoadFailed {
        action: LoadAction,
        error: String,
    },
    ReadIndexVerifyFailed {
        error: String,
    },
    InitialLoadRecorded {
        message_count: usize,
    },
    UnreadLocated {
        message_id: String,
    },
    UnreadLocateFailed {
        reason: String,
    },
    ClearHistoryStepDone {
        step: ClearHistoryStep,
    },
    MessageIndexChanged {
        index: SequenceIndex,
        route: IndexChangeRoute,
    },
    /// A required collaborator or target was missing; the operation became a no-op
    IntegrityViolation {
        reason: String,
    },
}

pub trait Reporter: Send + Sync {
    fn report(&self, event: &ReportEvent);
}

/// Writes every event as a `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &ReportEvent) {
        match event {
            ReportEvent::LoadStarted { action } => {
                tracing::debug!(%action, "load started");
            }
            ReportEvent::LoadSucceeded {
                action,
                message_count,
                cleared,
            } => {
                tracing::info!(%action, message_count, cleared, "load succeeded");
            }
            ReportEvent::LoadStale { action } => {
                tracing::debug!(%action, "stale response dropped");
            }
            ReportEvent::LoadFailed { action, error } => {
                tracing::error!(%action, error = %error, "load failed");
            }
            ReportEvent::ReadIndexVerifyFailed { error } => {
                tracing::warn!(error = %error, "read index verification failed");
            }
            ReportEvent::InitialLoadRecorded { message_count } => {
                tracing::info!(message_count, "initial page recorded");
            }
            ReportEvent::UnreadLocated { message_id } => {
                tracing::debug!(message_id = %message_id, "scrolled to first unread message");
            }
            ReportEvent::UnreadLocateFailed { reason } => {
                tracing::warn!(reason = %reason, "could not locate first unread message");
            }
            ReportEvent::ClearHistoryStepDone { step } => {
                tracing::debug!(%step, "clear history step done");
            }
            ReportEvent::MessageIndexChanged { index, route } => {
                tracing::debug!(%index, %route, "message index changed");
            }
            ReportEvent::IntegrityViolation { reason } => {
                tracing::error!(reason = %reason, "integrity violation");
            }
        }
    }
}
