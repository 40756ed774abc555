// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The front-panel port event watcher.
//!
//! Breakout changes arrive as sparse attribute bags.  The watcher
//! validates each one and folds it into the cache; a bad event is
//! dropped with a log entry rather than taking the daemon down.

use std::sync::Arc;

use slog::debug;
use slog::error;
use slog::info;
use tokio::sync::mpsc;

use protocol::types::PortUpdate;

use crate::cache::CacheUpdate;
use crate::Global;

/// Apply one event to the cache, if it carries enough to act on.
pub fn apply_update(
    log: &slog::Logger,
    g: &Global,
    update: PortUpdate,
) -> Option<CacheUpdate> {
    let Some(port_id) = update.front_panel_port else {
        info!(log, "event without a front-panel port, ignoring");
        debug!(log, "ignored event"; "event" => ?update);
        return None;
    };
    let Some(mode) = update.breakout_mode else {
        error!(log, "no breakout mode in event"; "port" => port_id);
        return None;
    };
    Some(g.cache.update_breakout(port_id, mode))
}

/// Consume port events until the sending side closes, which only
/// happens when the daemon exits.
pub async fn watch_loop(g: Arc<Global>, mut rx: mpsc::Receiver<PortUpdate>) {
    let log = g.log.new(slog::o!("unit" => "event-watcher"));
    debug!(log, "event watcher started");
    while let Some(update) = rx.recv().await {
        apply_update(&log, &g, update);
    }
    debug!(log, "event watcher shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::types::BreakoutMode;
    use protocol::types::Chassis;
    use protocol::types::FrontPanelPort;
    use protocol::MacAddr;

    fn test_global() -> Global {
        let log = slog::Logger::root(slog::Discard, slog::o!());
        Global::new(
            &log,
            Chassis {
                base_mac: MacAddr::new(0x00, 0x0a, 0xf8, 0x00, 0x00, 0x00),
                mac_pool_size: 64,
            },
        )
    }

    fn port(id: u32, mode: BreakoutMode, offset: u32) -> FrontPanelPort {
        FrontPanelPort {
            port_id: id,
            breakout_mode: mode,
            mac_offset: offset,
        }
    }

    fn update(port: Option<u32>, mode: Option<BreakoutMode>) -> PortUpdate {
        PortUpdate {
            front_panel_port: port,
            breakout_mode: mode,
        }
    }

    #[test]
    fn test_apply_full_event() {
        let g = test_global();
        g.cache.populate(vec![port(3, BreakoutMode::Single, 8)]);

        assert_eq!(
            apply_update(&g.log, &g, update(Some(3), Some(BreakoutMode::Quad))),
            Some(CacheUpdate::Updated)
        );
        assert_eq!(g.cache.get(3).unwrap().breakout_mode, BreakoutMode::Quad);
    }

    #[test]
    fn test_event_without_port_ignored() {
        let g = test_global();
        g.cache.populate(vec![port(3, BreakoutMode::Single, 8)]);

        assert_eq!(
            apply_update(&g.log, &g, update(None, Some(BreakoutMode::Quad))),
            None
        );
        assert_eq!(g.cache.get(3).unwrap().breakout_mode, BreakoutMode::Single);
    }

    #[test]
    fn test_event_without_mode_dropped() {
        let g = test_global();
        g.cache.populate(vec![port(3, BreakoutMode::Single, 8)]);

        assert_eq!(apply_update(&g.log, &g, update(Some(3), None)), None);
        assert_eq!(g.cache.get(3).unwrap().breakout_mode, BreakoutMode::Single);
    }

    #[test]
    fn test_event_for_unknown_port() {
        let g = test_global();
        g.cache.populate(vec![port(3, BreakoutMode::Single, 8)]);

        assert_eq!(
            apply_update(
                &g.log,
                &g,
                update(Some(99), Some(BreakoutMode::Dual))
            ),
            Some(CacheUpdate::NotFound)
        );
        assert!(g.cache.get(99).is_none());
    }

    #[tokio::test]
    async fn test_watch_loop_survives_bad_events() {
        let g = Arc::new(test_global());
        g.cache.populate(vec![
            port(1, BreakoutMode::Single, 0),
            port(2, BreakoutMode::Single, 4),
        ]);

        let (tx, rx) = mpsc::channel(8);
        let watcher = tokio::task::spawn(watch_loop(g.clone(), rx));

        tx.send(update(Some(1), Some(BreakoutMode::Quad))).await.unwrap();
        tx.send(update(None, None)).await.unwrap();
        tx.send(update(Some(77), Some(BreakoutMode::Dual))).await.unwrap();
        tx.send(update(Some(2), Some(BreakoutMode::Dual))).await.unwrap();
        drop(tx);
        watcher.await.unwrap();

        assert_eq!(g.cache.get(1).unwrap().breakout_mode, BreakoutMode::Quad);
        assert_eq!(g.cache.get(2).unwrap().breakout_mode, BreakoutMode::Dual);
        assert!(g.cache.get(77).is_none());
    }
}
