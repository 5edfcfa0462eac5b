// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(html_logo_url = "https://media.githubusercontent.com/media/microsoft/oxidizer/refs/heads/main/crates/hedgerow/logo.png")]
#![doc(html_favicon_url = "https://media.githubusercontent.com/media/microsoft/oxidizer/refs/heads/main/crates/hedgerow/favicon.ico")]

//! Hedged failover dispatch over a ranked set of candidate targets.
//!
//! This crate issues one logical request against an ordered set of candidates (remote nodes,
//! endpoints, replicas) and cascades to the next candidate when the current one fails or is slow.
//! Slow attempts are not abandoned when the next candidate is launched: they keep running in the
//! background and may still win. The first successful result is returned; if every candidate
//! fails, the failures are returned together in the order they were reported.
//!
//! # Core Types
//!
//! - [`Failover`]: The dispatcher. Wraps a transport [`Service`] that performs a single attempt.
//! - [`FailoverLayer`]: Builder used to configure the dispatcher.
//! - [`Candidate`]: An opaque identifier plus a priority; lower priorities are tried first.
//! - [`Scope`]: The overall deadline and cancellation signal of one dispatch call.
//! - [`DispatchError`]: Why a dispatch did not produce a result.
//!
//! # Quick Start
//!
//! ```rust
//! # use std::time::Duration;
//! # use anyspawn::Spawner;
//! # use layered::{Execute, Stack};
//! # use tick::Clock;
//! use hedgerow::{AttemptInput, Candidate, Failover, FailoverContext, Scope};
//!
//! # async fn example(clock: Clock, spawner: Spawner) {
//! let context = FailoverContext::new(&clock).name("replica_reads");
//!
//! let failover = (
//!     Failover::layer("read", &context)
//!         .spawner(spawner)
//!         .hedge_delay(Duration::from_millis(500)),
//!     Execute::new(|input: AttemptInput<&'static str, String>| async move {
//!         // Talk to `input.candidate().id()` here.
//!         Ok::<_, String>(format!("{} from {}", input.request(), input.candidate().id()))
//!     }),
//! )
//!     .into_service();
//!
//! let candidates = [Candidate::new("replica-b", 2), Candidate::new("replica-a", 1)];
//! let scope = Scope::with_timeout(&clock, Duration::from_secs(2));
//!
//! let result = failover.dispatch(candidates, "GET /key".to_string(), &scope).await;
//! # let _result = result;
//! # }
//! ```
//!
//! # How It Works
//!
//! 1. Candidates are stably sorted by ascending priority.
//! 2. The highest-priority candidate is launched and a hedge timer is armed.
//! 3. When an attempt fails, the next candidate is launched immediately.
//! 4. When the hedge timer of the most recently launched attempt elapses, the next candidate is
//!    launched while the slow attempt keeps running.
//! 5. The first success wins. When every candidate has failed,
//!    [`DispatchError::AllCandidatesFailed`] is returned.
//! 6. When the [`Scope`] is cancelled or its deadline passes, the dispatch returns
//!    [`DispatchError::Cancelled`] right away, regardless of in-flight attempts.
//!
//! Attempts run as detached tasks on the configured [`Spawner`][anyspawn::Spawner]. The dispatcher
//! never aborts them; each attempt receives the overall [`Scope`] and is expected to stop on its own
//! once the scope fires.
//!
//! # Features
//!
//! - `tokio`: Enables the Tokio constructors of the spawner and clock.
//! - `logs`: Emits structured `tracing` events for launches, exhaustion and cancellation.
//! - `metrics`: Reports launches, exhaustion and cancellation through OpenTelemetry.
//! - `serde`: Enables serialization of [`FailoverConfig`].

#[doc(inline)]
pub use recoverable::{Recovery, RecoveryInfo, RecoveryKind};

#[doc(inline)]
pub use layered::{Layer, Service, Stack};

mod aggregate;
mod arbiter;
mod attempt;
mod candidate;
mod context;
mod error;
mod failover;
mod scope;
mod shared;
mod utils;

#[cfg(any(feature = "metrics", test))]
mod metrics;

pub mod telemetry;

pub use aggregate::{CandidateFailure, CandidateFailures};
pub use attempt::{Attempt, AttemptInput, AttemptState};
pub use candidate::{Candidate, order_candidates};
pub use context::FailoverContext;
pub use error::DispatchError;
pub use failover::{CascadeReason, DispatchRequest, Failover, FailoverConfig, FailoverLayer, OnLaunchArgs};
pub use scope::{CancelReason, Scope};
pub use shared::NotSet;

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
pub(crate) mod testing;
