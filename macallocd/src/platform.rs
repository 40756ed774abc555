// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Client for the platform state service, which owns the hardware
//! inventory this daemon allocates from: the chassis identity and the
//! front-panel port table.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use slog::error;
use tokio::sync::mpsc;

use protocol::types::Chassis;
use protocol::types::FrontPanelPort;
use protocol::types::PortUpdate;

use crate::errors::McdResult;

/// How long to wait before re-polling after a failed event fetch.
const EVENT_RETRY: Duration = Duration::from_secs(1);

/// The per-service readiness keys the platform service publishes, in
/// the order this daemon gates on them.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ServiceKey {
    Chassis,
    PhysicalPort,
    FrontPanelPort,
}

impl ServiceKey {
    pub fn name(self) -> &'static str {
        match self {
            ServiceKey::Chassis => "chassis",
            ServiceKey::PhysicalPort => "physical-port",
            ServiceKey::FrontPanelPort => "front-panel-port",
        }
    }
}

#[derive(Deserialize)]
struct ReadyResponse {
    ready: bool,
}

#[derive(Clone)]
pub struct PlatformClient {
    log: slog::Logger,
    client: reqwest::Client,
    base_url: String,
}

impl PlatformClient {
    pub fn new(log: &slog::Logger, addr: SocketAddr) -> Self {
        PlatformClient {
            log: log.new(slog::o!("unit" => "platform-client")),
            client: reqwest::Client::new(),
            base_url: format!("http://{addr}"),
        }
    }

    /// Ask whether one of the platform services has come up.
    pub async fn is_ready(&self, key: ServiceKey) -> McdResult<bool> {
        let url = format!("{}/ready/{}", self.base_url, key.name());
        let rsp = self.client.get(&url).send().await?.error_for_status()?;
        let body: ReadyResponse = rsp.json().await?;
        Ok(body.ready)
    }

    /// Fetch the chassis identity: the base of the MAC pool and its
    /// size.  This is immutable hardware state, read once at startup.
    pub async fn get_chassis(&self) -> McdResult<Chassis> {
        let url = format!("{}/chassis", self.base_url);
        let rsp = self.client.get(&url).send().await?.error_for_status()?;
        Ok(rsp.json().await?)
    }

    /// Fetch the full front-panel port table for cache pre-population.
    pub async fn get_front_panel_ports(
        &self,
    ) -> McdResult<Vec<FrontPanelPort>> {
        let url = format!("{}/front-panel-port", self.base_url);
        let rsp = self.client.get(&url).send().await?.error_for_status()?;
        Ok(rsp.json().await?)
    }

    /// Long-poll the platform service for front-panel port events,
    /// forwarding each one to `tx`.  The service holds the request
    /// until it has something to report, so this loop runs for the life
    /// of the daemon; transport failures are logged and retried.
    pub async fn subscribe_port_events(&self, tx: mpsc::Sender<PortUpdate>) {
        let url = format!("{}/front-panel-port/events", self.base_url);
        loop {
            match self.poll_events(&url).await {
                Ok(updates) => {
                    for update in updates {
                        if tx.send(update).await.is_err() {
                            // The watcher is gone, so the daemon is
                            // shutting down.
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!(self.log, "event poll failed"; "error" => %e);
                    tokio::time::sleep(EVENT_RETRY).await;
                }
            }
        }
    }

    async fn poll_events(&self, url: &str) -> McdResult<Vec<PortUpdate>> {
        let rsp = self.client.get(url).send().await?.error_for_status()?;
        Ok(rsp.json().await?)
    }
}
