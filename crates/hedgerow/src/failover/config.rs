// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::constants::DEFAULT_HEDGE_DELAY;

/// Plain-data configuration of a [`Failover`][super::Failover] dispatcher.
///
/// Apply it with [`FailoverLayer::config`][super::FailoverLayer::config]. With the `serde`
/// feature enabled the configuration can be loaded from any serde format; missing fields take
/// their default values.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use hedgerow::FailoverConfig;
///
/// let config = FailoverConfig {
///     hedge_delay: Duration::from_millis(250),
///     ..FailoverConfig::default()
/// };
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FailoverConfig {
    /// How long the most recently launched attempt may run before the next candidate is launched
    /// alongside it.
    pub hedge_delay: Duration,

    /// When `false`, only the highest-priority candidate is attempted.
    pub enabled: bool,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            hedge_delay: DEFAULT_HEDGE_DELAY,
            enabled: true,
        }
    }
}
