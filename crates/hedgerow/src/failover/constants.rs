// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Default hedge interval: 500 milliseconds.
///
/// When the most recently launched attempt has neither succeeded nor failed within this
/// interval, the next candidate is launched alongside it.
pub(crate) const DEFAULT_HEDGE_DELAY: Duration = Duration::from_millis(500);
