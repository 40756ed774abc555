// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The front-panel port cache.
//!
//! Port attributes are loaded once at startup from the platform service
//! and kept fresh afterwards by breakout-mode change events.  Every
//! access goes through the single mutex inside the cache; callers get
//! copies out, never the lock itself.

use std::collections::BTreeMap;
use std::sync::Mutex;

use slog::error;
use slog::info;

use protocol::types::BreakoutMode;
use protocol::types::FrontPanelPort;

/// Outcome of applying a breakout-mode change to the cache.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheUpdate {
    /// The port's mode changed.
    Updated,
    /// The port already had this mode.
    Unchanged,
    /// The port isn't in the cache.
    NotFound,
}

pub struct PortCache {
    log: slog::Logger,
    ports: Mutex<BTreeMap<u32, FrontPanelPort>>,
}

impl PortCache {
    pub fn new(log: &slog::Logger) -> Self {
        PortCache {
            log: log.new(slog::o!("unit" => "port-cache")),
            ports: Mutex::new(BTreeMap::new()),
        }
    }

    /// Bulk-load the port table.  Called once, before the daemon starts
    /// fielding allocation requests.
    pub fn populate(&self, ports: Vec<FrontPanelPort>) {
        let mut hash = self.ports.lock().unwrap();
        for port in ports {
            hash.insert(port.port_id, port);
        }
        info!(self.log, "populated port cache"; "ports" => hash.len());
    }

    /// Copy out a single port's attributes.
    pub fn get(&self, port_id: u32) -> Option<FrontPanelPort> {
        self.ports.lock().unwrap().get(&port_id).copied()
    }

    /// Apply a breakout-mode change.  An unknown port is logged and
    /// reported, never created; a same-mode change is detected so
    /// callers can skip downstream work.
    pub fn update_breakout(
        &self,
        port_id: u32,
        mode: BreakoutMode,
    ) -> CacheUpdate {
        let mut hash = self.ports.lock().unwrap();
        let Some(port) = hash.get_mut(&port_id) else {
            error!(self.log, "breakout change for unknown port";
                "port" => port_id);
            return CacheUpdate::NotFound;
        };
        if port.breakout_mode == mode {
            CacheUpdate::Unchanged
        } else {
            info!(self.log, "breakout mode changed";
                "port" => port_id,
                "old" => %port.breakout_mode,
                "new" => %mode);
            port.breakout_mode = mode;
            CacheUpdate::Updated
        }
    }
}
