// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The hedged failover dispatcher and its configuration.
//!
//! # Defaults
//!
//! | Parameter | Default Value | Configured By |
//! |-----------|---------------|---------------|
//! | Hedge interval | `500ms` | [`hedge_delay`][FailoverLayer::hedge_delay] |
//! | Launch callback | None | [`on_launch`][FailoverLayer::on_launch] |
//! | Enabled | Always | [`enable_if`][FailoverLayer::enable_if], [`disable`][FailoverLayer::disable] |

mod args;
mod callbacks;
mod config;
mod constants;
mod layer;
mod service;

pub use args::{CascadeReason, OnLaunchArgs};
pub use config::FailoverConfig;
pub use layer::FailoverLayer;
pub use service::{DispatchRequest, Failover};
