// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;

/// A ranked target that a dispatch may attempt.
///
/// A candidate pairs an opaque identifier (an address, a node handle, a replica name) with a
/// priority. Lower priorities are tried first; candidates that share a priority are tried in the
/// order they were supplied.
///
/// # Examples
///
/// ```
/// use hedgerow::Candidate;
///
/// let primary = Candidate::new("10.0.0.1:443", 1);
/// assert_eq!(*primary.id(), "10.0.0.1:443");
/// assert_eq!(primary.priority(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate<Id> {
    id: Id,
    priority: i64,
}

impl<Id> Candidate<Id> {
    /// Creates a candidate with the given identifier and priority.
    #[must_use]
    pub fn new(id: Id, priority: i64) -> Self {
        Self { id, priority }
    }

    /// Creates candidates from a flat list, ranking them by their position.
    ///
    /// The first identifier receives priority `0`, the second `1`, and so on, so the list is
    /// attempted exactly in the order given.
    ///
    /// # Examples
    ///
    /// ```
    /// use hedgerow::Candidate;
    ///
    /// let candidates = Candidate::ranked(["east", "west"]);
    /// assert_eq!(candidates[0].priority(), 0);
    /// assert_eq!(*candidates[1].id(), "west");
    /// ```
    #[must_use]
    pub fn ranked(ids: impl IntoIterator<Item = Id>) -> Vec<Self> {
        ids.into_iter()
            .zip(0_i64..)
            .map(|(id, priority)| Self::new(id, priority))
            .collect()
    }

    /// Returns the identifier of this candidate.
    #[must_use]
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns the priority of this candidate. Lower values are tried first.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Consumes the candidate and returns its identifier.
    #[must_use]
    pub fn into_id(self) -> Id {
        self.id
    }
}

impl<Id: Display> Display for Candidate<Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (priority {})", self.id, self.priority)
    }
}

/// Orders candidates by ascending priority.
///
/// The sort is stable: candidates with equal priority keep their relative input order. An empty
/// input yields an empty output.
///
/// # Examples
///
/// ```
/// use hedgerow::{Candidate, order_candidates};
///
/// let ordered = order_candidates(vec![
///     Candidate::new("c", 3),
///     Candidate::new("a", 1),
///     Candidate::new("b", 2),
/// ]);
///
/// let ids: Vec<_> = ordered.iter().map(|c| *c.id()).collect();
/// assert_eq!(ids, ["a", "b", "c"]);
/// ```
#[must_use]
pub fn order_candidates<Id>(mut candidates: Vec<Candidate<Id>>) -> Vec<Candidate<Id>> {
    candidates.sort_by_key(Candidate::priority);
    candidates
}
