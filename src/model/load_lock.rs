//! Per-action load locks and failure tracking
//!
//! Every load action owns at most one lock. A lock holds the token of the
//! attempt that took it, and an async completion only applies its result if
//! its token is still the live one. Superseded attempts are dropped silently.
//!
//! `LoadEagerly` outranks `LoadNext`: while it holds its lock, `LoadNext` is
//! treated as locked, and taking it clears any in-flight `LoadNext` attempt.

use std::collections::{BTreeMap, BTreeSet};

use derive_deref::Deref;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// The closed set of load triggers
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LoadAction {
    /// Scrolling up into history
    LoadPrev,
    /// Scrolling down towards newer pages
    LoadNext,
    /// Jumping to the latest page
    LoadEagerly,
    /// Merging pushed messages in the background
    LoadSilently,
}

impl LoadAction {
    /// Actions whose in-flight attempts are cancelled when this one starts
    pub fn preempts(self) -> &'static [LoadAction] {
        match self {
            LoadAction::LoadEagerly => &[LoadAction::LoadNext],
            _ => &[],
        }
    }

    /// Actions that block this one while they hold their own lock
    pub fn outranked_by(self) -> impl Iterator<Item = LoadAction> {
        LoadAction::iter().filter(move |other| other.preempts().contains(&self))
    }
}

/// Identifies one acquisition of a lock
///
/// Tokens come from a counter that only grows, so two attempts never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LockToken(u64);

/// Actions whose latest attempt failed
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize)]
pub struct LoadErrors(BTreeSet<LoadAction>);

/// The lock table plus the error set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadLock {
    locks: BTreeMap<LoadAction, LockToken>,
    errors: LoadErrors,
    #[serde(skip)]
    generation: u64,
}

impl LoadLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live token of `action`, if it is held
    pub fn token(&self, action: LoadAction) -> Option<LockToken> {
        self.locks.get(&action).copied()
    }

    pub fn errors(&self) -> &LoadErrors {
        &self.errors
    }

    pub fn has_error(&self, action: LoadAction) -> bool {
        self.errors.0.contains(&action)
    }

    /// Whether `action` is held, or blocked by a higher-priority action
    pub fn is_locked(&self, action: LoadAction) -> bool {
        self.locks.contains_key(&action)
            || action
                .outranked_by()
                .any(|higher| self.locks.contains_key(&higher))
    }

    /// Take the lock for `action`, clearing its previous error and cancelling
    /// the actions it preempts
    pub fn acquire(&mut self, action: LoadAction) -> LockToken {
        self.generation += 1;
        let token = LockToken(self.generation);

        for preempted in action.preempts() {
            self.locks.remove(preempted);
            self.errors.0.remove(preempted);
        }
        self.locks.insert(action, token);
        self.errors.0.remove(&action);

        token
    }

    /// Whether `token` is still the live lock of `action`
    pub fn verify(&self, action: LoadAction, token: LockToken) -> bool {
        self.token(action) == Some(token)
    }

    /// Mark the current attempt of `action` as successful
    ///
    /// With `remain_lock` the lock stays held until [`LoadLock::release_if_current`].
    pub fn succeed(&mut self, action: LoadAction, remain_lock: bool) {
        self.errors.0.remove(&action);
        if !remain_lock {
            self.locks.remove(&action);
        }
    }

    /// Mark the current attempt of `action` as failed
    pub fn fail(&mut self, action: LoadAction) {
        self.locks.remove(&action);
        self.errors.0.insert(action);
    }

    /// Release a lock kept after success, unless a newer attempt owns it by now
    pub fn release_if_current(&mut self, action: LoadAction, token: LockToken) -> bool {
        if self.verify(action, token) {
            self.locks.remove(&action);
            true
        } else {
            false
        }
    }

    /// Free every lock and forget every error
    ///
    /// The token counter survives so that responses of attempts started before
    /// the reset can never match a lock taken after it.
    pub fn reset(&mut self) {
        self.locks.clear();
        self.errors.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_acquire_issues_unique_tokens() {
        let mut lock = LoadLock::new();
        let first = lock.acquire(LoadAction::LoadPrev);
        let second = lock.acquire(LoadAction::LoadPrev);

        assert_ne!(first, second);
        assert!(!lock.verify(LoadAction::LoadPrev, first));
        assert!(lock.verify(LoadAction::LoadPrev, second));
    }

    #[test]
    fn test_eager_preempts_next() {
        let mut lock = LoadLock::new();
        let next_token = lock.acquire(LoadAction::LoadNext);
        lock.fail(LoadAction::LoadNext);
        let next_token_retry = lock.acquire(LoadAction::LoadNext);
        assert_ne!(next_token, next_token_retry);

        lock.errors.0.insert(LoadAction::LoadNext);
        lock.acquire(LoadAction::LoadEagerly);

        assert_eq!(lock.token(LoadAction::LoadNext), None);
        assert!(!lock.has_error(LoadAction::LoadNext));
        assert!(!lock.verify(LoadAction::LoadNext, next_token_retry));
    }

    #[rstest]
    #[case(LoadAction::LoadNext, true)]
    #[case(LoadAction::LoadPrev, false)]
    #[case(LoadAction::LoadSilently, false)]
    #[case(LoadAction::LoadEagerly, true)]
    fn test_is_locked_while_eager_holds(#[case] action: LoadAction, #[case] expected: bool) {
        let mut lock = LoadLock::new();
        lock.acquire(LoadAction::LoadEagerly);
        assert_eq!(lock.is_locked(action), expected);
    }

    #[test]
    fn test_next_does_not_block_eager() {
        let mut lock = LoadLock::new();
        lock.acquire(LoadAction::LoadNext);
        assert!(!lock.is_locked(LoadAction::LoadEagerly));
    }

    #[test]
    fn test_succeed_and_fail() {
        let mut lock = LoadLock::new();

        lock.acquire(LoadAction::LoadPrev);
        lock.fail(LoadAction::LoadPrev);
        assert!(!lock.is_locked(LoadAction::LoadPrev));
        assert!(lock.has_error(LoadAction::LoadPrev));

        let token = lock.acquire(LoadAction::LoadPrev);
        assert!(!lock.has_error(LoadAction::LoadPrev));

        lock.succeed(LoadAction::LoadPrev, true);
        assert!(lock.verify(LoadAction::LoadPrev, token));
        assert!(lock.release_if_current(LoadAction::LoadPrev, token));
        assert!(!lock.is_locked(LoadAction::LoadPrev));
    }

    #[test]
    fn test_release_if_current_keeps_newer_attempt() {
        let mut lock = LoadLock::new();
        let old = lock.acquire(LoadAction::LoadNext);
        lock.succeed(LoadAction::LoadNext, true);
        let newer = lock.acquire(LoadAction::LoadNext);

        assert!(!lock.release_if_current(LoadAction::LoadNext, old));
        assert!(lock.verify(LoadAction::LoadNext, newer));
    }

    #[test]
    fn test_reset_is_idempotent_and_keeps_counter() {
        let mut lock = LoadLock::new();
        let before = lock.acquire(LoadAction::LoadSilently);
        lock.fail(LoadAction::LoadPrev);

        lock.reset();
        let once = lock.clone();
        lock.reset();
        assert_eq!(lock, once);

        let after = lock.acquire(LoadAction::LoadSilently);
        assert!(after > before);
    }

    #[test]
    fn test_display_is_kebab_case() {
        assert_eq!(LoadAction::LoadEagerly.to_string(), "load-eagerly");
        assert_eq!(
            LoadAction::LoadEagerly.outranked_by().collect::<Vec<_>>(),
            Vec::<LoadAction>::new()
        );
        assert_eq!(
            LoadAction::LoadNext.outranked_by().collect::<Vec<_>>(),
            vec![LoadAction::LoadEagerly]
        );
    }
}
