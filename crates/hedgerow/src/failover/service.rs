// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::pin::pin;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

use anyspawn::Spawner;
use futures_channel::mpsc;
use futures_util::future::poll_fn;
use futures_util::{FutureExt, StreamExt};
use layered::Service;
use tick::{Clock, Delay};

use super::args::{CascadeReason, OnLaunchArgs};
use super::callbacks::OnLaunch;
use super::layer::FailoverLayer;
use crate::aggregate::{CandidateFailure, ErrorAggregator};
use crate::arbiter::Arbiter;
use crate::attempt::spawn_attempt;
use crate::utils::EnableIf;
use crate::{
    Attempt, AttemptInput, AttemptState, CancelReason, Candidate, DispatchError, FailoverContext, NotSet, Scope,
    order_candidates,
};

/// Dispatches one request over a ranked set of candidates with hedged failover.
///
/// `Failover` wraps a transport [`Service`] that performs a single attempt against a single
/// candidate. A dispatch launches the highest-priority candidate first and cascades to the next
/// one when the current attempt fails or outlives the hedge interval. Attempts that outlive the
/// hedge interval keep running and may still win. The first success is returned; if every
/// candidate fails, the failures are returned together.
///
/// `Failover` is configured by calling [`Failover::layer`] and using the builder methods on the
/// returned [`FailoverLayer`] instance.
///
/// For comprehensive examples, see the [crate] documentation.
#[derive(Debug)]
pub struct Failover<Id, Req, S> {
    pub(super) shared: Arc<FailoverShared<Req>>,
    pub(super) transport: Arc<S>,
    pub(super) _ids: PhantomData<fn() -> Id>,
}

/// Shared configuration for [`Failover`].
#[derive(Debug)]
pub(crate) struct FailoverShared<Req> {
    pub(crate) clock: Clock,
    pub(crate) spawner: Spawner,
    pub(crate) hedge_delay: Duration,
    pub(crate) on_launch: Option<OnLaunch>,
    pub(crate) enable_if: EnableIf<Req>,
    pub(crate) telemetry: crate::utils::TelemetryHelper,
}

impl<Id, Req, S> Clone for Failover<Id, Req, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
            _ids: PhantomData,
        }
    }
}

impl<Id, Req> Failover<Id, Req, ()> {
    /// Creates a failover layer with the specified name and context.
    ///
    /// Returns a [`FailoverLayer`] that must be given a [`Spawner`] before it can be used to
    /// build a dispatcher.
    pub fn layer(name: impl Into<Cow<'static, str>>, context: &FailoverContext) -> FailoverLayer<Id, Req, NotSet> {
        FailoverLayer::new(name.into(), context)
    }
}

/// Lifecycle of a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum DispatchState {
    /// No attempt has been launched yet.
    Idle,

    /// At least one attempt has been launched and no outcome is known.
    Dispatching,

    /// An attempt succeeded.
    ResolvedSuccess,

    /// The dispatch failed, either because there was nothing to attempt or because every
    /// candidate failed.
    ResolvedFailure,

    /// The scope stopped before an outcome was known.
    Cancelled,
}

impl DispatchState {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dispatching => "dispatching",
            Self::ResolvedSuccess => "resolved_success",
            Self::ResolvedFailure => "resolved_failure",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One dispatch, used as the input of [`Failover`] when it is composed as a [`Service`].
#[derive(Debug, Clone)]
pub struct DispatchRequest<Id, Req> {
    candidates: Vec<Candidate<Id>>,
    request: Req,
    scope: Scope,
}

impl<Id, Req> DispatchRequest<Id, Req> {
    /// Creates a dispatch request.
    #[must_use]
    pub fn new(candidates: impl IntoIterator<Item = Candidate<Id>>, request: Req, scope: Scope) -> Self {
        Self {
            candidates: candidates.into_iter().collect(),
            request,
            scope,
        }
    }

    /// Returns the candidates, in the order they were supplied.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate<Id>] {
        &self.candidates
    }

    /// Returns the request payload.
    #[must_use]
    pub fn request(&self) -> &Req {
        &self.request
    }

    /// Returns the scope of the dispatch.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

enum LoopEvent<Id, T, E> {
    Stopped(CancelReason),
    Succeeded(Attempt, T),
    Failed(CandidateFailure<Id, E>),
    HedgeElapsed,
}

impl<Id, Req, S, T, E> Failover<Id, Req, S>
where
    Id: Clone + Send + 'static,
    Req: Clone + Send + 'static,
    S: Service<AttemptInput<Id, Req>, Out = Result<T, E>> + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Dispatches `request` over `candidates` within `scope`.
    ///
    /// Candidates are tried in ascending priority order; candidates with equal priority keep the
    /// order in which they were supplied. The dispatch returns as soon as:
    ///
    /// - an attempt succeeds, with its result
    /// - every candidate has failed, with [`DispatchError::AllCandidatesFailed`]
    /// - `scope` is cancelled or its deadline passes, with [`DispatchError::Cancelled`]
    ///
    /// An empty candidate set yields [`DispatchError::NoCandidatesAvailable`] without attempting
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when no attempt succeeded.
    pub async fn dispatch(
        &self,
        candidates: impl IntoIterator<Item = Candidate<Id>>,
        request: Req,
        scope: &Scope,
    ) -> Result<T, DispatchError<Id, E>> {
        let candidates: Vec<_> = candidates.into_iter().collect();
        if candidates.is_empty() {
            return Err(DispatchError::NoCandidatesAvailable);
        }

        let mut candidates = order_candidates(candidates);

        if !self.shared.enable_if.call(&request) {
            candidates.truncate(1);
        }

        let (arbiter, mut wins) = Arbiter::new();
        let (failure_sender, mut failures) = mpsc::channel(candidates.len());
        let mut run = DispatchRun::new(self, candidates, request, scope, arbiter, failure_sender);

        if let Err(reason) = run.launch_next(CascadeReason::Initial) {
            return Err(run.cancel(reason));
        }

        let mut done = pin!(scope.done());
        let mut hedge = run.hedge_timer();

        loop {
            let event = poll_fn(|cx| {
                if let Poll::Ready(reason) = done.as_mut().poll(cx) {
                    return Poll::Ready(LoopEvent::Stopped(reason));
                }

                if let Poll::Ready(Ok((attempt, value))) = wins.poll_unpin(cx) {
                    return Poll::Ready(LoopEvent::Succeeded(attempt, value));
                }

                if let Poll::Ready(Some(failure)) = failures.poll_next_unpin(cx) {
                    return Poll::Ready(LoopEvent::Failed(failure));
                }

                match hedge.as_mut().map(|timer| timer.poll_unpin(cx)) {
                    Some(Poll::Ready(())) => Poll::Ready(LoopEvent::HedgeElapsed),
                    _ => Poll::Pending,
                }
            })
            .await;

            let reason = match event {
                LoopEvent::Stopped(reason) => return Err(run.cancel(reason)),
                LoopEvent::Succeeded(attempt, value) => {
                    // A success that races with the scope stopping does not count.
                    if let Err(reason) = scope.check() {
                        return Err(run.cancel(reason));
                    }

                    run.succeed(attempt);
                    return Ok(value);
                }
                LoopEvent::Failed(failure) => {
                    run.record_failure(failure);

                    if !run.has_next() {
                        if run.is_exhausted() {
                            return Err(run.exhaust());
                        }

                        continue;
                    }

                    CascadeReason::Failure
                }
                LoopEvent::HedgeElapsed => {
                    if !run.has_next() {
                        hedge = None;
                        continue;
                    }

                    CascadeReason::HedgeElapsed
                }
            };

            if let Err(reason) = run.launch_next(reason) {
                return Err(run.cancel(reason));
            }

            hedge = run.hedge_timer();
        }
    }
}

impl<Id, Req, S, T, E> Service<DispatchRequest<Id, Req>> for Failover<Id, Req, S>
where
    Id: Clone + Send + 'static,
    Req: Clone + Send + 'static,
    S: Service<AttemptInput<Id, Req>, Out = Result<T, E>> + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Out = Result<T, DispatchError<Id, E>>;

    async fn execute(&self, input: DispatchRequest<Id, Req>) -> Self::Out {
        let DispatchRequest {
            candidates,
            request,
            scope,
        } = input;

        self.dispatch(candidates, request, &scope).await
    }
}

/// Bookkeeping of one dispatch: the ordered candidates, the launch cursor and the attempts.
struct DispatchRun<'a, Id, Req, S, T, E> {
    failover: &'a Failover<Id, Req, S>,
    candidates: Vec<Candidate<Id>>,
    request: Req,
    scope: &'a Scope,
    arbiter: Arbiter<(Attempt, T)>,
    failure_sender: mpsc::Sender<CandidateFailure<Id, E>>,
    attempts: Vec<AttemptState>,
    aggregator: ErrorAggregator<Id, E>,
    state: DispatchState,
}

impl<'a, Id, Req, S, T, E> DispatchRun<'a, Id, Req, S, T, E>
where
    Id: Clone + Send + 'static,
    Req: Clone + Send + 'static,
    S: Service<AttemptInput<Id, Req>, Out = Result<T, E>> + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn new(
        failover: &'a Failover<Id, Req, S>,
        candidates: Vec<Candidate<Id>>,
        request: Req,
        scope: &'a Scope,
        arbiter: Arbiter<(Attempt, T)>,
        failure_sender: mpsc::Sender<CandidateFailure<Id, E>>,
    ) -> Self {
        let expected = candidates.len();

        Self {
            failover,
            candidates,
            request,
            scope,
            arbiter,
            failure_sender,
            attempts: Vec::with_capacity(expected),
            aggregator: ErrorAggregator::new(expected),
            state: DispatchState::Idle,
        }
    }

    fn has_next(&self) -> bool {
        self.attempts.len() < self.candidates.len()
    }

    fn is_exhausted(&self) -> bool {
        self.aggregator.is_exhausted()
    }

    /// Launches the candidate at the cursor. The scope is checked first.
    fn launch_next(&mut self, reason: CascadeReason) -> Result<(), CancelReason> {
        self.scope.check()?;

        let position = self.attempts.len();
        let Some(candidate) = self.candidates.get(position) else {
            return Ok(());
        };

        let attempt = Attempt::at(position, self.candidates.len());
        let priority = candidate.priority();
        let shared = &self.failover.shared;

        if let Some(on_launch) = &shared.on_launch {
            on_launch.call(OnLaunchArgs {
                attempt,
                priority,
                reason,
            });
        }
        shared.emit_launch(attempt, priority, reason);

        let input = AttemptInput::new(candidate.clone(), self.request.clone(), self.scope.clone(), attempt);
        spawn_attempt(
            &shared.spawner,
            &self.failover.transport,
            input,
            self.arbiter.clone(),
            self.failure_sender.clone(),
        );

        self.attempts.push(AttemptState::Running);
        self.state = DispatchState::Dispatching;
        Ok(())
    }

    /// The hedge window of the most recently launched attempt, capped by the scope deadline.
    ///
    /// There is no window once the last candidate has been launched.
    #[cfg_attr(test, mutants::skip)] // causes test timeouts
    fn hedge_timer(&self) -> Option<Delay> {
        if !self.has_next() {
            return None;
        }

        let shared = &self.failover.shared;
        let window = self
            .scope
            .remaining()
            .map_or(shared.hedge_delay, |remaining| remaining.min(shared.hedge_delay));

        Some(shared.clock.delay(window))
    }

    fn record_failure(&mut self, failure: CandidateFailure<Id, E>) {
        self.mark(failure.attempt(), AttemptState::Failed);
        self.aggregator.record(failure);
    }

    fn succeed(&mut self, attempt: Attempt) {
        self.mark(attempt, AttemptState::Succeeded);
        self.state = DispatchState::ResolvedSuccess;
    }

    fn exhaust(&mut self) -> DispatchError<Id, E> {
        self.state = DispatchState::ResolvedFailure;
        self.failover.shared.emit_exhausted(self.attempts.len());

        let aggregator = std::mem::replace(&mut self.aggregator, ErrorAggregator::new(0));
        DispatchError::AllCandidatesFailed(aggregator.finish())
    }

    fn cancel(&mut self, reason: CancelReason) -> DispatchError<Id, E> {
        let interrupted = std::mem::replace(&mut self.state, DispatchState::Cancelled);
        self.failover.shared.emit_cancelled(reason, interrupted, self.running());

        DispatchError::Cancelled(reason)
    }

    fn running(&self) -> usize {
        self.attempts.iter().filter(|state| **state == AttemptState::Running).count()
    }

    fn mark(&mut self, attempt: Attempt, state: AttemptState) {
        let slot = usize::try_from(attempt.index())
            .ok()
            .and_then(|index| self.attempts.get_mut(index));

        if let Some(slot) = slot {
            *slot = state;
        }
    }
}

impl<Req> FailoverShared<Req> {
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_launch(&self, attempt: Attempt, priority: i64, reason: CascadeReason) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "hedgerow.launch",
                tracing::Level::INFO,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                attempt.index = attempt.index(),
                attempt.is_last = attempt.is_last(),
                candidate.priority = priority,
                cascade.reason = reason.as_str(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        if self.telemetry.metrics_enabled() {
            use crate::telemetry::{ATTEMPT_INDEX, EVENT_NAME, LAUNCH_EVENT, PIPELINE_NAME, STRATEGY_NAME};

            self.telemetry.report_metrics(&[
                opentelemetry::KeyValue::new(PIPELINE_NAME, self.telemetry.pipeline_name.clone()),
                opentelemetry::KeyValue::new(STRATEGY_NAME, self.telemetry.strategy_name.clone()),
                opentelemetry::KeyValue::new(EVENT_NAME, LAUNCH_EVENT),
                opentelemetry::KeyValue::new(ATTEMPT_INDEX, i64::from(attempt.index())),
            ]);
        }
    }

    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_exhausted(&self, attempts: usize) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "hedgerow.failed",
                tracing::Level::WARN,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                dispatch.attempts = attempts,
            );
        }

        #[cfg(any(feature = "metrics", test))]
        if self.telemetry.metrics_enabled() {
            use crate::telemetry::{EVENT_NAME, EXHAUSTED_EVENT, PIPELINE_NAME, STRATEGY_NAME};

            self.telemetry.report_metrics(&[
                opentelemetry::KeyValue::new(PIPELINE_NAME, self.telemetry.pipeline_name.clone()),
                opentelemetry::KeyValue::new(STRATEGY_NAME, self.telemetry.strategy_name.clone()),
                opentelemetry::KeyValue::new(EVENT_NAME, EXHAUSTED_EVENT),
            ]);
        }
    }

    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_cancelled(&self, reason: CancelReason, interrupted: DispatchState, running: usize) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "hedgerow.cancelled",
                tracing::Level::WARN,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                cancel.reason = %reason,
                dispatch.state = interrupted.as_str(),
                dispatch.running = running,
            );
        }

        #[cfg(any(feature = "metrics", test))]
        if self.telemetry.metrics_enabled() {
            use crate::telemetry::{CANCELLED_EVENT, EVENT_NAME, PIPELINE_NAME, STRATEGY_NAME};

            self.telemetry.report_metrics(&[
                opentelemetry::KeyValue::new(PIPELINE_NAME, self.telemetry.pipeline_name.clone()),
                opentelemetry::KeyValue::new(STRATEGY_NAME, self.telemetry.strategy_name.clone()),
                opentelemetry::KeyValue::new(EVENT_NAME, CANCELLED_EVENT),
            ]);
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use layered::{Execute, Stack};
    use opentelemetry::KeyValue;

    use super::*;
    use crate::testing::{LogCapture, MetricTester};

    type Input = AttemptInput<&'static str, String>;

    fn frozen_context() -> FailoverContext {
        FailoverContext::new(Clock::new_frozen()).name("test_pipeline")
    }

    fn echo() -> Execute<impl Fn(Input) -> std::future::Ready<Result<String, String>> + Send + Sync + 'static> {
        Execute::new(|input: Input| std::future::ready(Ok(format!("{} from {}", input.request(), input.candidate().id()))))
    }

    fn refuse() -> Execute<impl Fn(Input) -> std::future::Ready<Result<String, String>> + Send + Sync + 'static> {
        Execute::new(|input: Input| std::future::ready(Err(format!("{} refused", input.candidate().id()))))
    }

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Failover<String, String, ()>: Send, Sync, Clone, std::fmt::Debug);
        static_assertions::assert_impl_all!(DispatchRequest<String, String>: Send, Sync, Clone, std::fmt::Debug);
    }

    #[test]
    fn dispatch_state_names() {
        assert_eq!(DispatchState::Idle.as_str(), "idle");
        assert_eq!(DispatchState::Dispatching.as_str(), "dispatching");
        assert_eq!(DispatchState::ResolvedSuccess.as_str(), "resolved_success");
        assert_eq!(DispatchState::ResolvedFailure.as_str(), "resolved_failure");
        assert_eq!(DispatchState::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn dispatch_request_accessors() {
        let scope = Scope::new(&Clock::new_frozen());
        let request = DispatchRequest::new([Candidate::new("b", 2), Candidate::new("a", 1)], "GET", scope);

        assert_eq!(request.candidates().len(), 2);
        assert_eq!(*request.candidates()[0].id(), "b");
        assert_eq!(*request.request(), "GET");
        assert_eq!(request.scope().check(), Ok(()));
    }

    #[tokio::test]
    async fn first_candidate_success_is_returned() {
        let failover = (
            Failover::layer("test_failover", &frozen_context()).spawner(Spawner::new_tokio()),
            echo(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());

        let result = failover
            .dispatch([Candidate::new("b", 2), Candidate::new("a", 1)], "GET".to_string(), &scope)
            .await;

        assert_eq!(result.unwrap(), "GET from a");
    }

    #[tokio::test]
    async fn every_failure_is_collected() {
        let failover = (
            Failover::layer("test_failover", &frozen_context()).spawner(Spawner::new_tokio()),
            refuse(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());

        let error = failover
            .dispatch(Candidate::ranked(["a", "b", "c"]), "GET".to_string(), &scope)
            .await
            .unwrap_err();

        let failures = error.failures().unwrap();
        assert_eq!(failures.len(), 3);
        let mut ids: Vec<_> = failures.candidates().copied().collect();
        ids.sort_unstable();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_candidates_are_rejected_before_scope() {
        let failover = (
            Failover::layer("test_failover", &frozen_context()).spawner(Spawner::new_tokio()),
            echo(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());
        scope.cancel();

        let error = failover
            .dispatch(Vec::<Candidate<&'static str>>::new(), "GET".to_string(), &scope)
            .await
            .unwrap_err();

        assert!(matches!(error, DispatchError::NoCandidatesAvailable));
    }

    #[tokio::test]
    async fn stopped_scope_launches_nothing() {
        let launches = Arc::new(Mutex::new(Vec::new()));
        let launches_clone = Arc::clone(&launches);
        let failover = (
            Failover::layer("test_failover", &frozen_context())
                .spawner(Spawner::new_tokio())
                .on_launch(move |args| launches_clone.lock().unwrap().push(args.attempt().index())),
            echo(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());
        scope.cancel();

        let error = failover
            .dispatch(Candidate::ranked(["a"]), "GET".to_string(), &scope)
            .await
            .unwrap_err();

        assert_eq!(error.cancel_reason(), Some(CancelReason::Cancelled));
        assert!(launches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn on_launch_reports_failure_cascade() {
        let launches = Arc::new(Mutex::new(Vec::new()));
        let launches_clone = Arc::clone(&launches);
        let failover = (
            Failover::layer("test_failover", &frozen_context())
                .spawner(Spawner::new_tokio())
                .on_launch(move |args| {
                    launches_clone
                        .lock()
                        .unwrap()
                        .push((args.attempt().index(), args.priority(), args.reason()));
                }),
            refuse(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());

        let _error = failover
            .dispatch([Candidate::new("a", 10), Candidate::new("b", 20)], "GET".to_string(), &scope)
            .await
            .unwrap_err();

        assert_eq!(
            *launches.lock().unwrap(),
            [(0, 10, CascadeReason::Initial), (1, 20, CascadeReason::Failure)]
        );
    }

    #[tokio::test]
    async fn disabled_tries_only_first_candidate() {
        let failover = (
            Failover::layer("test_failover", &frozen_context())
                .spawner(Spawner::new_tokio())
                .enable_if(|request: &String| request != "PUT"),
            refuse(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());

        let error = failover
            .dispatch(Candidate::ranked(["a", "b"]), "PUT".to_string(), &scope)
            .await
            .unwrap_err();

        assert_eq!(error.failures().unwrap().candidates().copied().collect::<Vec<_>>(), ["a"]);
    }

    #[tokio::test]
    async fn execute_dispatches_request() {
        let failover = (
            Failover::layer("test_failover", &frozen_context()).spawner(Spawner::new_tokio()),
            echo(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());

        let result = failover
            .execute(DispatchRequest::new(Candidate::ranked(["x", "y"]), "HEAD".to_string(), scope))
            .await;

        assert_eq!(result.unwrap(), "HEAD from x");
    }

    #[cfg(not(miri))]
    #[tokio::test]
    async fn launch_and_exhaustion_emit_metrics() {
        let tester = MetricTester::new();
        let context = frozen_context().enable_metrics(tester.meter_provider());
        let failover = (
            Failover::layer("test_failover", &context).spawner(Spawner::new_tokio()),
            refuse(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());

        let _error = failover
            .dispatch(Candidate::ranked(["a", "b"]), "GET".to_string(), &scope)
            .await
            .unwrap_err();

        tester.assert_attributes_contain(&[
            KeyValue::new("resilience.pipeline.name", "test_pipeline"),
            KeyValue::new("resilience.strategy.name", "test_failover"),
            KeyValue::new("resilience.event.name", "launch"),
            KeyValue::new("resilience.attempt.index", 1i64),
            KeyValue::new("resilience.event.name", "exhausted"),
        ]);
    }

    #[cfg(not(miri))]
    #[tokio::test]
    async fn cancellation_emits_metrics() {
        let tester = MetricTester::new();
        let context = frozen_context().enable_metrics(tester.meter_provider());
        let failover = (
            Failover::layer("test_failover", &context).spawner(Spawner::new_tokio()),
            echo(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());
        scope.cancel();

        let _error = failover
            .dispatch(Candidate::ranked(["a"]), "GET".to_string(), &scope)
            .await
            .unwrap_err();

        tester.assert_attributes_contain(&[KeyValue::new("resilience.event.name", "cancelled")]);
    }

    #[tokio::test]
    async fn launch_and_exhaustion_emit_logs() {
        use tracing_subscriber::util::SubscriberInitExt;

        let log_capture = LogCapture::new();
        let _guard = log_capture.subscriber().set_default();

        let context = frozen_context().enable_logs();
        let failover = (
            Failover::layer("log_failover", &context).spawner(Spawner::new_tokio()),
            refuse(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());

        let _error = failover
            .dispatch(Candidate::ranked(["a", "b"]), "GET".to_string(), &scope)
            .await
            .unwrap_err();

        log_capture.assert_contains("hedgerow::failover");
        log_capture.assert_contains("test_pipeline");
        log_capture.assert_contains("log_failover");
        log_capture.assert_contains("cascade.reason=\"failure\"");
        log_capture.assert_contains("dispatch.attempts=2");
    }

    #[tokio::test]
    async fn cancellation_emits_log() {
        use tracing_subscriber::util::SubscriberInitExt;

        let log_capture = LogCapture::new();
        let _guard = log_capture.subscriber().set_default();

        let context = frozen_context().enable_logs();
        let failover = (
            Failover::layer("log_failover", &context).spawner(Spawner::new_tokio()),
            echo(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());
        scope.cancel();

        let _error = failover
            .dispatch(Candidate::ranked(["a"]), "GET".to_string(), &scope)
            .await
            .unwrap_err();

        log_capture.assert_contains("cancel.reason=operation cancelled");
        log_capture.assert_contains("dispatch.state=\"idle\"");
        log_capture.assert_contains("dispatch.running=0");
    }

    #[tokio::test]
    async fn cancellation_while_dispatching_emits_log() {
        use tracing_subscriber::util::SubscriberInitExt;

        let log_capture = LogCapture::new();
        let _guard = log_capture.subscriber().set_default();

        let context = frozen_context().enable_logs();
        let failover = (
            Failover::layer("log_failover", &context).spawner(Spawner::new_tokio()),
            Execute::new(|input: Input| async move {
                input.scope().done().await;
                Err::<String, String>("abandoned".to_string())
            }),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());
        let canceller = scope.clone();

        let (result, ()) = futures_util::future::join(
            failover.dispatch(Candidate::ranked(["a", "b"]), "GET".to_string(), &scope),
            async move {
                tokio::task::yield_now().await;
                canceller.cancel();
            },
        )
        .await;

        assert_eq!(result.unwrap_err().cancel_reason(), Some(CancelReason::Cancelled));
        log_capture.assert_contains("dispatch.state=\"dispatching\"");
        log_capture.assert_contains("dispatch.running=1");
    }

    #[tokio::test]
    async fn logs_disabled_by_default() {
        use tracing_subscriber::util::SubscriberInitExt;

        let log_capture = LogCapture::new();
        let _guard = log_capture.subscriber().set_default();

        let failover = (
            Failover::layer("quiet_failover", &frozen_context()).spawner(Spawner::new_tokio()),
            echo(),
        )
            .into_service();
        let scope = Scope::new(&Clock::new_frozen());

        let _result = failover.dispatch(Candidate::ranked(["a"]), "GET".to_string(), &scope).await;

        assert!(log_capture.output().is_empty());
    }
}
