// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use opentelemetry::InstrumentationScope;
use opentelemetry::metrics::{Counter, Meter, MeterProvider};

fn instrumentation_scope() -> InstrumentationScope {
    InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
        .with_version(concat!("v", env!("CARGO_PKG_VERSION")))
        .with_schema_url("https://opentelemetry.io/schemas/1.47.0")
        .build()
}

pub(crate) fn create_meter(provider: &dyn MeterProvider) -> Meter {
    provider.meter_with_scope(instrumentation_scope())
}

/// One counter for every dispatch event; the kind of event travels in the attributes.
pub(crate) fn create_resilience_event_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter("resilience.event")
        .with_description("Emitted when a failover dispatch launches, exhausts or is cancelled.")
        .with_unit("u64")
        .build()
}
