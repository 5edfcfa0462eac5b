// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Type-state marker: a required property has not been configured yet.
#[non_exhaustive]
#[derive(Debug)]
pub struct NotSet;
