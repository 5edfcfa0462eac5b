// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Well-known telemetry keys and event names reported by the dispatcher.
//!
//! The keys are attached to the `resilience.event` counter when metrics are enabled through
//! [`FailoverContext::enable_metrics`][crate::FailoverContext], and mirror the fields of the
//! structured `tracing` events emitted when logs are enabled.
//!
//! Names follow the [OpenTelemetry naming guidelines](https://opentelemetry.io/docs/specs/semconv/general/naming/#general-naming-considerations).

/// Key used to annotate the name of the pipeline a dispatcher belongs to.
///
/// Examples: `replica_reads`, `leader_writes`.
pub const PIPELINE_NAME: &str = "resilience.pipeline.name";

/// Key used to annotate the name of the dispatcher within its pipeline.
pub const STRATEGY_NAME: &str = "resilience.strategy.name";

/// Key used to annotate which event is being reported.
///
/// Values are one of [`LAUNCH_EVENT`], [`EXHAUSTED_EVENT`] and [`CANCELLED_EVENT`].
pub const EVENT_NAME: &str = "resilience.event.name";

/// Key used to annotate the 0-based index of a launched attempt.
pub const ATTEMPT_INDEX: &str = "resilience.attempt.index";

/// Reported whenever an attempt is launched against a candidate.
pub const LAUNCH_EVENT: &str = "launch";

/// Reported when every candidate has failed.
pub const EXHAUSTED_EVENT: &str = "exhausted";

/// Reported when the scope of a dispatch stops before an outcome is known.
pub const CANCELLED_EVENT: &str = "cancelled";
