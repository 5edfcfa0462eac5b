// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;

use crate::Attempt;

/// The failure reported by one attempt, tagged with the candidate it was made against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure<Id, E> {
    candidate: Id,
    priority: i64,
    attempt: Attempt,
    error: E,
}

impl<Id, E> CandidateFailure<Id, E> {
    pub(crate) fn new(candidate: Id, priority: i64, attempt: Attempt, error: E) -> Self {
        Self {
            candidate,
            priority,
            attempt,
            error,
        }
    }

    /// Returns the identifier of the candidate that failed.
    #[must_use]
    pub fn candidate(&self) -> &Id {
        &self.candidate
    }

    /// Returns the priority of the candidate that failed.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Returns the attempt that produced this failure.
    #[must_use]
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// Returns the error reported by the transport.
    #[must_use]
    pub fn error(&self) -> &E {
        &self.error
    }

    /// Consumes the failure and returns the candidate identifier and the error.
    #[must_use]
    pub fn into_parts(self) -> (Id, E) {
        (self.candidate, self.error)
    }
}

impl<Id: Display, E: Display> Display for CandidateFailure<Id, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.candidate, self.error)
    }
}

/// Every per-candidate failure of a dispatch, in the order the failures were reported.
///
/// The order is the arrival order of the failures, which may differ from the priority order in
/// which the candidates were launched when a hedged attempt fails before a slower earlier one.
///
/// The [`Display`] output lists one `candidate: error` line per failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailures<Id, E>(Vec<CandidateFailure<Id, E>>);

impl<Id, E> CandidateFailures<Id, E> {
    /// Returns the number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no failure was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the failures in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, CandidateFailure<Id, E>> {
        self.0.iter()
    }

    /// Returns the candidate identifiers in arrival order.
    pub fn candidates(&self) -> impl Iterator<Item = &Id> {
        self.0.iter().map(CandidateFailure::candidate)
    }

    /// Consumes the collection and returns the underlying failures.
    #[must_use]
    pub fn into_vec(self) -> Vec<CandidateFailure<Id, E>> {
        self.0
    }
}

impl<Id: Display, E: Display> Display for CandidateFailures<Id, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, failure) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            failure.fmt(f)?;
        }
        Ok(())
    }
}

impl<Id, E> IntoIterator for CandidateFailures<Id, E> {
    type Item = CandidateFailure<Id, E>;
    type IntoIter = std::vec::IntoIter<CandidateFailure<Id, E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, Id, E> IntoIterator for &'a CandidateFailures<Id, E> {
    type Item = &'a CandidateFailure<Id, E>;
    type IntoIter = std::slice::Iter<'a, CandidateFailure<Id, E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Accumulates failures until every candidate of a dispatch has reported one.
#[derive(Debug)]
pub(crate) struct ErrorAggregator<Id, E> {
    failures: Vec<CandidateFailure<Id, E>>,
    expected: usize,
}

impl<Id, E> ErrorAggregator<Id, E> {
    pub(crate) fn new(expected: usize) -> Self {
        Self {
            failures: Vec::with_capacity(expected),
            expected,
        }
    }

    pub(crate) fn record(&mut self, failure: CandidateFailure<Id, E>) {
        self.failures.push(failure);
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.failures.len() >= self.expected
    }

    pub(crate) fn finish(self) -> CandidateFailures<Id, E> {
        CandidateFailures(self.failures)
    }
}
