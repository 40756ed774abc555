// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Wire types shared by the MAC allocation daemon and the platform
//! services it talks to.

pub mod attrs;
pub mod macaddr;
pub mod types;

pub use macaddr::MacAddr;
