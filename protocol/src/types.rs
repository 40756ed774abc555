// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::macaddr::MacAddr;

/// Number of serdes lanes behind each front-panel port.  Every lane is
/// backed by one address in the chassis MAC pool, so a port covers
/// `LANES_PER_PORT` consecutive addresses regardless of how it is
/// broken out.
pub const LANES_PER_PORT: u32 = 4;

/// How a front-panel port is split into logical channels.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, JsonSchema, Serialize,
)]
pub enum BreakoutMode {
    /// All lanes form a single channel.
    #[serde(rename = "1x1")]
    Single,
    /// Two channels of two lanes each.
    #[serde(rename = "2x1")]
    Dual,
    /// Four channels of one lane each.
    #[serde(rename = "4x1")]
    Quad,
}

impl BreakoutMode {
    /// The number of logical channels the port is split into.
    pub fn channels(self) -> u32 {
        match self {
            BreakoutMode::Single => 1,
            BreakoutMode::Dual => 2,
            BreakoutMode::Quad => 4,
        }
    }

    /// The number of lanes, and thus of pool addresses, between the
    /// first lanes of adjacent channels.
    pub fn lane_step(self) -> u32 {
        LANES_PER_PORT / self.channels()
    }
}

impl fmt::Display for BreakoutMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let m = match self {
            BreakoutMode::Single => "1x1",
            BreakoutMode::Dual => "2x1",
            BreakoutMode::Quad => "4x1",
        };
        write!(f, "{m}")
    }
}

/// Classification of the interface being configured, as carried in the
/// type attribute of a change object.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, JsonSchema, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    Physical,
    Vlan,
    Lag,
    Loopback,
    Management,
}

impl FromStr for InterfaceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "physical" => Ok(InterfaceType::Physical),
            "vlan" => Ok(InterfaceType::Vlan),
            "lag" => Ok(InterfaceType::Lag),
            "loopback" => Ok(InterfaceType::Loopback),
            "management" => Ok(InterfaceType::Management),
            x => Err(format!("unrecognized interface type: {x}")),
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let t = match self {
            InterfaceType::Physical => "physical",
            InterfaceType::Vlan => "vlan",
            InterfaceType::Lag => "lag",
            InterfaceType::Loopback => "loopback",
            InterfaceType::Management => "management",
        };
        write!(f, "{t}")
    }
}

/// The kind of configuration operation that produced a request.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, JsonSchema, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// A configuration change being assembled for commit.
    Transaction,
    /// A read-only retrieval of current state.
    Query,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let k = match self {
            OperationKind::Transaction => "transaction",
            OperationKind::Query => "query",
        };
        write!(f, "{k}")
    }
}

/// A single interface's pending configuration, expressed as a bag of
/// attributes keyed by path.  The paths this daemon consumes and
/// produces are collected in [`crate::attrs`]; attributes it doesn't
/// recognize pass through untouched.
#[derive(
    Clone, Debug, Default, PartialEq, Deserialize, JsonSchema, Serialize,
)]
pub struct ChangeObject {
    #[serde(flatten)]
    attrs: BTreeMap<String, Value>,
}

impl ChangeObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a raw attribute by path.
    pub fn attr(&self, path: &str) -> Option<&Value> {
        self.attrs.get(path)
    }

    /// Fetch an attribute expected to hold a string.  Returns `None` if
    /// the attribute is absent or holds some other type.
    pub fn str_attr(&self, path: &str) -> Option<&str> {
        self.attrs.get(path).and_then(Value::as_str)
    }

    /// Fetch an attribute expected to hold an unsigned integer.
    /// Returns `None` if the attribute is absent, holds some other
    /// type, or doesn't fit in a `u32`.
    pub fn u32_attr(&self, path: &str) -> Option<u32> {
        self.attrs
            .get(path)
            .and_then(Value::as_u64)
            .and_then(|x| u32::try_from(x).ok())
    }

    /// Set or replace an attribute.
    pub fn set_attr(
        &mut self,
        path: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.attrs.insert(path.into(), value.into());
    }

    /// Builder-style variant of [`Self::set_attr`].
    pub fn with_attr(
        mut self,
        path: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.set_attr(path, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }
}

/// A request to assign a MAC address to the interface described by a
/// change object.
#[derive(Clone, Debug, Deserialize, JsonSchema, Serialize)]
pub struct MacAllocRequest {
    /// What kind of operation produced this request.  Only transactions
    /// are accepted; a query has no pending state to assign into.
    pub operation: OperationKind,
    /// The pending interface configuration.
    pub change: ChangeObject,
}

/// The subset of a front-panel port's state needed to derive interface
/// MAC addresses, as published by the platform service.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, JsonSchema, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub struct FrontPanelPort {
    /// The chassis-unique front-panel port number.
    pub port_id: u32,
    /// How the port is currently split into channels.
    pub breakout_mode: BreakoutMode,
    /// The offset of the port's first lane within the chassis MAC pool.
    pub mac_offset: u32,
}

/// A front-panel port change notification.  Notifications are sparse:
/// either field may be missing, and consumers drop updates that lack
/// what they need.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, JsonSchema,
    Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub struct PortUpdate {
    /// Which port changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_panel_port: Option<u32>,
    /// The port's new breakout mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakout_mode: Option<BreakoutMode>,
}

/// Chassis-wide identity reported by the platform service.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, JsonSchema, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub struct Chassis {
    /// The first address in the chassis MAC allocation pool.
    pub base_mac: MacAddr,
    /// The number of addresses in the pool.
    pub mac_pool_size: u32,
}
