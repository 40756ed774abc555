// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Startup gating.
//!
//! The daemon serves nothing until the platform services it depends on
//! have come up.  There is deliberately no timeout anywhere in here: a
//! dependency that never appears leaves the daemon waiting and logging
//! rather than half-started.

use std::future::Future;
use std::time::Duration;

use slog::debug;
use slog::info;

use crate::errors::McdResult;
use crate::platform::ServiceKey;

/// How long to wait between readiness probes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Emit a "still waiting" log entry on the first failed probe and
/// every this many after it.
const LOG_EVERY: u64 = 10;

/// Poll `predicate` on a fixed interval until it reports true.  A
/// status entry goes out on the first failed check and every
/// `log_every` after that, and the success entry reports how many
/// checks failed before the predicate passed.
pub async fn wait_until<F, Fut>(
    log: &slog::Logger,
    what: &str,
    interval: Duration,
    log_every: u64,
    mut predicate: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    // `checks` counts failures, so an immediately-ready dependency
    // reports 0.
    let mut checks = 0u64;
    loop {
        if predicate().await {
            info!(log, "{what} ready after {checks} checks");
            return;
        }
        if checks % log_every == 0 {
            info!(log, "still waiting for {what}"; "checks" => checks);
        }
        checks += 1;
        tokio::time::sleep(interval).await;
    }
}

/// Wait for the platform services this daemon depends on, strictly in
/// dependency order: the chassis object must exist before the physical
/// port service has anything to describe, and the front-panel port
/// table comes up last.  A probe transport error counts as "not ready"
/// since during early boot the service may not even be listening yet.
pub async fn wait_for_platform<F, Fut>(log: &slog::Logger, mut probe: F)
where
    F: FnMut(ServiceKey) -> Fut,
    Fut: Future<Output = McdResult<bool>>,
{
    for key in [
        ServiceKey::Chassis,
        ServiceKey::PhysicalPort,
        ServiceKey::FrontPanelPort,
    ] {
        wait_until(log, key.name(), POLL_INTERVAL, LOG_EVERY, || {
            let check = probe(key);
            async move {
                match check.await {
                    Ok(ready) => ready,
                    Err(e) => {
                        debug!(log, "readiness probe failed";
                            "service" => key.name(),
                            "error" => %e);
                        false
                    }
                }
            }
        })
        .await;
    }
}
