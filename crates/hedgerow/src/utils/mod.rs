// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod define_fn_wrapper;
pub(crate) use define_fn_wrapper::define_fn_wrapper;

mod telemetry_helper;
pub(crate) use telemetry_helper::TelemetryHelper;

define_fn_wrapper!(EnableIf<Req>(Fn(&Req) -> bool));

impl<Req> EnableIf<Req> {
    /// Hedging and cascading apply to every request.
    pub(crate) fn always() -> Self {
        Self::new(|_| true)
    }

    /// Only the highest-priority candidate is ever attempted.
    pub(crate) fn never() -> Self {
        Self::new(|_| false)
    }
}
