// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;

use crate::Attempt;

/// Why an attempt was launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CascadeReason {
    /// The first attempt of a dispatch.
    Initial,

    /// The previous attempt failed.
    Failure,

    /// The previous attempt did not finish within the hedge interval. It keeps running.
    HedgeElapsed,
}

impl CascadeReason {
    /// Returns a short `snake_case` name, as used in telemetry.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Failure => "failure",
            Self::HedgeElapsed => "hedge_elapsed",
        }
    }
}

impl Display for CascadeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments for the [`on_launch`][super::FailoverLayer::on_launch] callback function.
///
/// Provides context when an attempt is about to be launched against a candidate.
#[derive(Debug)]
pub struct OnLaunchArgs {
    pub(super) attempt: Attempt,
    pub(super) priority: i64,
    pub(super) reason: CascadeReason,
}

impl OnLaunchArgs {
    /// Returns the attempt being launched.
    #[must_use]
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// Returns the priority of the candidate the attempt targets.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Returns why the attempt is launched.
    #[must_use]
    pub fn reason(&self) -> CascadeReason {
        self.reason
    }
}
