// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{CancelReason, CandidateFailures, Recovery, RecoveryInfo};

/// Why a dispatch did not produce a successful result.
///
/// Individual candidate failures are never surfaced on their own; they are only reported as part
/// of [`DispatchError::AllCandidatesFailed`] once every candidate has failed. An attempt that is
/// merely slower than the hedge interval is not a failure.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError<Id, E> {
    /// The candidate set was empty, so nothing was attempted.
    #[error("no candidates available")]
    NoCandidatesAvailable,

    /// Every candidate was attempted and every attempt failed.
    ///
    /// The failures are listed in the order they were reported.
    #[error("all candidates failed:\n{0}")]
    AllCandidatesFailed(CandidateFailures<Id, E>),

    /// The scope of the dispatch was cancelled or its deadline passed before an outcome was known.
    #[error("dispatch cancelled: {0}")]
    Cancelled(CancelReason),
}

impl<Id, E> DispatchError<Id, E> {
    /// Returns the per-candidate failures when every candidate failed.
    #[must_use]
    pub fn failures(&self) -> Option<&CandidateFailures<Id, E>> {
        match self {
            Self::AllCandidatesFailed(failures) => Some(failures),
            _ => None,
        }
    }

    /// Returns the reason when the dispatch was cancelled.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::Cancelled(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl<Id, E> Recovery for DispatchError<Id, E> {
    fn recovery(&self) -> RecoveryInfo {
        match self {
            Self::AllCandidatesFailed(_) => RecoveryInfo::unavailable(),
            Self::NoCandidatesAvailable | Self::Cancelled(_) => RecoveryInfo::never(),
        }
    }
}

impl<Id, E> From<CancelReason> for DispatchError<Id, E> {
    fn from(reason: CancelReason) -> Self {
        Self::Cancelled(reason)
    }
}
