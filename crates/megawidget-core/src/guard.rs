//! Reentrancy guard for state mutation.
//!
//! A runtime megawidget is either [`GuardState::Idle`] or
//! [`GuardState::SettingState`]. While a state change is being applied, the
//! megawidget synchronises its renderer, and the renderer may report that
//! change back as if the user had made it. Those echoes, and any nested
//! programmatic change attempted from inside a listener, must be dropped
//! rather than applied, or the notify→set→notify cycle never ends.
//!
//! The guard is entered with [`ReentrancyGuard::try_enter`], which returns a
//! [`GuardToken`] only when the guard was idle. Dropping the token returns the
//! guard to idle, so every exit path (including `?` on an error) releases it.

use std::sync::atomic::{AtomicBool, Ordering};

/// Observable state of a [`ReentrancyGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardState {
    /// No state mutation is in flight.
    Idle,
    /// A state mutation is in flight; nested mutations are suppressed.
    SettingState,
}

/// A non-reentrant flag held across one logical state mutation.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    engaged: AtomicBool,
}

impl ReentrancyGuard {
    /// Create an idle guard.
    pub const fn new() -> Self {
        Self {
            engaged: AtomicBool::new(false),
        }
    }

    /// Engage the guard if it is idle.
    ///
    /// Returns `None` when a mutation is already in flight.
    #[must_use = "the guard is released as soon as the token is dropped"]
    pub fn try_enter(&self) -> Option<GuardToken<'_>> {
        let token = self
            .engaged
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GuardToken { guard: self });
        if token.is_none() {
            crate::megawidget_trace!("reentrancy guard already engaged");
        }
        token
    }

    /// Whether a mutation is in flight.
    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }

    /// The current state.
    pub fn state(&self) -> GuardState {
        if self.is_engaged() {
            GuardState::SettingState
        } else {
            GuardState::Idle
        }
    }
}

/// Proof that the guard is engaged; releases it when dropped.
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.engaged.store(false, Ordering::Release);
    }
}
