// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::pin::pin;
use std::time::{Duration, Instant};

use futures_util::future::{Either, select};
use tick::Clock;
use tokio_util::sync::CancellationToken;

/// Why a [`Scope`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum CancelReason {
    /// The scope was cancelled explicitly.
    #[error("operation cancelled")]
    Cancelled,

    /// The deadline of the scope has passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// The overall deadline and cancellation signal of a dispatch.
///
/// A scope combines a [`CancellationToken`] with an optional deadline measured on a
/// [`Clock`]. The dispatcher checks the scope at every scheduling decision and returns as soon
/// as it fires. The same scope is handed to every attempt so that transports can stop their own
/// work when the dispatch is over.
///
/// Explicit cancellation wins over an elapsed deadline when both are observed at once.
///
/// Cloning a scope is cheap and every clone observes the same token and deadline.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use hedgerow::{CancelReason, Scope};
/// use tick::Clock;
///
/// # fn example(clock: &Clock) {
/// let scope = Scope::with_timeout(clock, Duration::from_secs(1));
/// assert_eq!(scope.check(), Ok(()));
///
/// scope.cancel();
/// assert_eq!(scope.check(), Err(CancelReason::Cancelled));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
    clock: Clock,
}

impl Scope {
    /// Creates a scope without a deadline. It only stops when cancelled.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self::from_token(clock, CancellationToken::new())
    }

    /// Creates a scope that stops once `timeout` has elapsed on `clock`.
    ///
    /// A timeout too large to be represented is treated as no deadline at all.
    #[must_use]
    pub fn with_timeout(clock: &Clock, timeout: Duration) -> Self {
        Self {
            deadline: clock.instant().checked_add(timeout),
            ..Self::new(clock)
        }
    }

    /// Creates a scope that stops at `deadline`, as measured by `clock`.
    #[must_use]
    pub fn with_deadline(clock: &Clock, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new(clock)
        }
    }

    /// Creates a scope driven by an existing cancellation token.
    #[must_use]
    pub fn from_token(clock: &Clock, token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
            clock: clock.clone(),
        }
    }

    /// Derives a narrower scope.
    ///
    /// The child is cancelled whenever this scope is cancelled, can be cancelled on its own without
    /// affecting this scope, and its deadline is the earlier of this scope's deadline and
    /// `timeout` from now.
    #[must_use]
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let own = timeout.and_then(|t| self.clock.instant().checked_add(t));
        let deadline = match (self.deadline, own) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };

        Self {
            token: self.token.child_token(),
            deadline,
            clock: self.clock.clone(),
        }
    }

    /// Cancels the scope and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the cancellation token of this scope.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the clock this scope measures its deadline on.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left until the deadline, or `None` when the scope has no deadline.
    ///
    /// Once the deadline has passed, this returns [`Duration::ZERO`].
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(self.clock.instant()))
    }

    /// Checks whether the scope has stopped, without waiting.
    ///
    /// # Errors
    ///
    /// Returns the [`CancelReason`] when the scope was cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), CancelReason> {
        if self.token.is_cancelled() {
            return Err(CancelReason::Cancelled);
        }

        match self.remaining() {
            Some(Duration::ZERO) => Err(CancelReason::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Waits until the scope stops and returns why.
    ///
    /// A scope without a deadline that is never cancelled never completes.
    pub async fn done(&self) -> CancelReason {
        if let Err(reason) = self.check() {
            return reason;
        }

        let cancelled = pin!(self.token.cancelled());

        let Some(remaining) = self.remaining() else {
            cancelled.await;
            return CancelReason::Cancelled;
        };

        let expired = pin!(self.clock.delay(remaining));
        match select(cancelled, expired).await {
            Either::Left(((), _)) => CancelReason::Cancelled,
            Either::Right(((), _)) => self.check().err().unwrap_or(CancelReason::DeadlineExceeded),
        }
    }
}
