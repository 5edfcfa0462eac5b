// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use anyspawn::Spawner;
use layered::Layer;
use tick::Clock;

use super::args::OnLaunchArgs;
use super::callbacks::OnLaunch;
use super::config::FailoverConfig;
use super::constants::DEFAULT_HEDGE_DELAY;
use super::service::{Failover, FailoverShared};
use crate::utils::{EnableIf, TelemetryHelper};
use crate::{FailoverContext, NotSet};

/// Builder for configuring a [`Failover`] dispatcher.
///
/// This type is created by calling [`Failover::layer`] and uses the type-state pattern to enforce
/// that a [`Spawner`] is configured before the dispatcher can be built: attempts run as detached
/// tasks and there is no implicit runtime to fall back to.
///
/// For comprehensive examples, see the [crate] documentation.
///
/// # Type State
///
/// - `Sp`: [`NotSet`] until [`spawner`][FailoverLayer::spawner] has been called, [`Spawner`] after.
#[derive(Debug)]
pub struct FailoverLayer<Id, Req, Sp = Spawner> {
    clock: Clock,
    spawner: Sp,
    hedge_delay: Duration,
    on_launch: Option<OnLaunch>,
    enable_if: EnableIf<Req>,
    telemetry: TelemetryHelper,
    _state: PhantomData<fn(Id, Req)>,
}

impl<Id, Req> FailoverLayer<Id, Req, NotSet> {
    #[must_use]
    pub(crate) fn new(name: Cow<'static, str>, context: &FailoverContext) -> Self {
        Self {
            clock: context.get_clock().clone(),
            spawner: NotSet,
            hedge_delay: DEFAULT_HEDGE_DELAY,
            on_launch: None,
            enable_if: EnableIf::always(),
            telemetry: context.create_telemetry(name),
            _state: PhantomData,
        }
    }
}

impl<Id, Req, Sp> FailoverLayer<Id, Req, Sp> {
    /// Sets the spawner that runs the attempts.
    ///
    /// Every attempt is spawned as a detached task. When the dispatch resolves, attempts that are
    /// still running are neither awaited nor aborted.
    #[must_use]
    pub fn spawner(self, spawner: Spawner) -> FailoverLayer<Id, Req, Spawner> {
        FailoverLayer {
            clock: self.clock,
            spawner,
            hedge_delay: self.hedge_delay,
            on_launch: self.on_launch,
            enable_if: self.enable_if,
            telemetry: self.telemetry,
            _state: PhantomData,
        }
    }

    /// Sets the hedge interval.
    ///
    /// When the most recently launched attempt neither succeeds nor fails within this interval,
    /// the next candidate is launched while the slow attempt keeps running. The interval is
    /// capped by the time left in the scope of the dispatch.
    ///
    /// **Default**: 500 milliseconds
    #[must_use]
    pub fn hedge_delay(mut self, delay: Duration) -> Self {
        self.hedge_delay = delay;
        self
    }

    /// Configures a callback invoked right before an attempt is launched.
    ///
    /// This callback is useful for logging, metrics, or other observability purposes.
    /// It does not affect dispatch behavior.
    ///
    /// **Default**: None
    #[must_use]
    pub fn on_launch(mut self, launch_fn: impl Fn(OnLaunchArgs) + Send + Sync + 'static) -> Self {
        self.on_launch = Some(OnLaunch::new(launch_fn));
        self
    }

    /// Optionally enables hedging and cascading based on the request.
    ///
    /// When disabled for a request, only the highest-priority candidate is attempted. The scope
    /// of the dispatch is still honored.
    ///
    /// **Default**: Always enabled
    #[must_use]
    pub fn enable_if(mut self, is_enabled: impl Fn(&Req) -> bool + Send + Sync + 'static) -> Self {
        self.enable_if = EnableIf::new(is_enabled);
        self
    }

    /// Enables hedging and cascading unconditionally.
    ///
    /// **Note**: This is the default behavior.
    #[must_use]
    pub fn enable_always(mut self) -> Self {
        self.enable_if = EnableIf::always();
        self
    }

    /// Disables hedging and cascading for every request.
    #[must_use]
    pub fn disable(mut self) -> Self {
        self.enable_if = EnableIf::never();
        self
    }

    /// Applies a [`FailoverConfig`], replacing the hedge interval and the enablement condition.
    #[must_use]
    pub fn config(self, config: &FailoverConfig) -> Self {
        let layer = self.hedge_delay(config.hedge_delay);

        if config.enabled { layer.enable_always() } else { layer.disable() }
    }
}

impl<Id, Req, S> Layer<S> for FailoverLayer<Id, Req, Spawner> {
    type Service = Failover<Id, Req, S>;

    fn layer(&self, inner: S) -> Self::Service {
        let shared = FailoverShared {
            clock: self.clock.clone(),
            spawner: self.spawner.clone(),
            hedge_delay: self.hedge_delay,
            on_launch: self.on_launch.clone(),
            enable_if: self.enable_if.clone(),
            telemetry: self.telemetry.clone(),
        };

        Failover {
            shared: Arc::new(shared),
            transport: Arc::new(inner),
            _ids: PhantomData,
        }
    }
}
