// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::sync::Arc;

use anyspawn::Spawner;
use futures_channel::mpsc;
use layered::Service;

use crate::aggregate::CandidateFailure;
use crate::arbiter::Arbiter;
use crate::{Candidate, Scope};

/// Identifies one attempt of a dispatch.
///
/// The index is 0-based and follows the launch order, which is the priority order of the
/// candidates. The last attempt is the one made against the lowest-priority candidate.
///
/// # Examples
///
/// ```
/// use hedgerow::Attempt;
///
/// let attempt = Attempt::new(0, false);
/// assert!(attempt.is_first());
/// assert!(!attempt.is_last());
/// assert_eq!(attempt.index(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attempt {
    index: u32,
    is_last: bool,
}

impl Default for Attempt {
    fn default() -> Self {
        Self::new(0, true)
    }
}

impl Attempt {
    /// Creates an attempt with the given index.
    #[must_use]
    pub fn new(index: u32, is_last: bool) -> Self {
        Self { index, is_last }
    }

    /// Returns true if this is the first attempt (index 0).
    #[must_use]
    pub fn is_first(self) -> bool {
        self.index == 0
    }

    /// Returns true if no candidate remains after this one.
    #[must_use]
    pub fn is_last(self) -> bool {
        self.is_last
    }

    /// Returns the attempt index (0-based).
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    pub(crate) fn at(position: usize, total: usize) -> Self {
        Self::new(
            u32::try_from(position).unwrap_or(u32::MAX),
            position.saturating_add(1) >= total,
        )
    }
}

impl Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.index.fmt(f)
    }
}

/// Where an attempt stands. A hedge interval elapsing never changes the state of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AttemptState {
    /// The transport call is still outstanding.
    Running,

    /// The transport call returned a result.
    Succeeded,

    /// The transport call returned an error.
    Failed,
}

/// The input handed to the transport for a single attempt.
///
/// Carries the candidate to talk to, a clone of the request, the overall [`Scope`] of the
/// dispatch and the [`Attempt`] descriptor. The transport should stop its work once the scope
/// fires: the dispatcher never aborts an attempt.
#[derive(Debug, Clone)]
pub struct AttemptInput<Id, Req> {
    candidate: Candidate<Id>,
    request: Req,
    scope: Scope,
    attempt: Attempt,
}

impl<Id, Req> AttemptInput<Id, Req> {
    /// Creates an attempt input.
    ///
    /// The dispatcher builds these itself; this constructor exists for exercising transports in
    /// isolation.
    #[must_use]
    pub fn new(candidate: Candidate<Id>, request: Req, scope: Scope, attempt: Attempt) -> Self {
        Self {
            candidate,
            request,
            scope,
            attempt,
        }
    }

    /// Returns the candidate this attempt targets.
    #[must_use]
    pub fn candidate(&self) -> &Candidate<Id> {
        &self.candidate
    }

    /// Returns the request payload.
    #[must_use]
    pub fn request(&self) -> &Req {
        &self.request
    }

    /// Returns the overall scope of the dispatch.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the attempt descriptor.
    #[must_use]
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// Consumes the input and returns the candidate, the request and the scope.
    #[must_use]
    pub fn into_parts(self) -> (Candidate<Id>, Req, Scope) {
        (self.candidate, self.request, self.scope)
    }
}

/// Runs one attempt as a detached task.
///
/// A success is offered to the arbiter, a failure is pushed to the failure channel. Both
/// deliveries are non-blocking and are silently dropped once the dispatch has resolved.
pub(crate) fn spawn_attempt<Id, Req, S, T, E>(
    spawner: &Spawner,
    transport: &Arc<S>,
    input: AttemptInput<Id, Req>,
    arbiter: Arbiter<(Attempt, T)>,
    mut failures: mpsc::Sender<CandidateFailure<Id, E>>,
) where
    Id: Clone + Send + 'static,
    Req: Send + 'static,
    S: Service<AttemptInput<Id, Req>, Out = Result<T, E>> + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let transport = Arc::clone(transport);
    let attempt = input.attempt();
    let candidate = input.candidate().id().clone();
    let priority = input.candidate().priority();

    drop(spawner.spawn(async move {
        match transport.execute(input).await {
            Ok(value) => {
                let _won = arbiter.offer((attempt, value));
            }
            Err(error) => {
                let _delivered = failures
                    .try_send(CandidateFailure::new(candidate, priority, attempt, error))
                    .is_ok();
            }
        }
    }));
}
