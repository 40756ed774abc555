// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Well-known attribute paths for interface change objects.

/// Interface classification, the string form of
/// [`crate::types::InterfaceType`].
pub const INTF_TYPE: &str = "if/interfaces/interface/type";

/// The interface's MAC address.  This is the attribute the daemon
/// fills in; everything else here is input.
pub const PHYS_ADDRESS: &str = "if/interfaces/interface/phys-address";

/// The front-panel port backing a physical interface.
pub const FRONT_PANEL_PORT: &str = "if-phy/front-panel-port";

/// The logical channel of the front-panel port, counted within its
/// current breakout mode.
pub const SUBPORT_ID: &str = "if-phy/subport-id";

/// The 802.1Q id of a vlan interface.
pub const VLAN_ID: &str = "if-vlan/vlan-id";

/// The identifier of a link aggregation group.
pub const LAG_ID: &str = "if-lag/lag-id";
