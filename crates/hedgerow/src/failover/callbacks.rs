// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::args::OnLaunchArgs;

crate::utils::define_fn_wrapper!(OnLaunch(Fn(OnLaunchArgs)));
