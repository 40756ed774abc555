// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

pub mod logging;

/// The default port on which the macallocd API server listens.
pub const DEFAULT_MACALLOCD_PORT: u16 = 12233;
/// The default port on which the platform state service listens.
pub const DEFAULT_PLATFORM_PORT: u16 = 12235;
