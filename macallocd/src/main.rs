// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use std::net::IpAddr;
use std::net::Ipv6Addr;
use std::net::SocketAddr;
use std::sync::Arc;

use protocol::types::Chassis;
use signal_hook::consts::signal::*;
use signal_hook::iterator::Signals;
use slog::debug;
use slog::error;
use slog::info;
use structopt::StructOpt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use cache::PortCache;
pub use errors::McdError;
pub use errors::McdResult;
use platform::PlatformClient;

mod allocator;
mod api_server;
mod cache;
mod errors;
mod events;
mod platform;
mod readiness;

/// All global state for the macallocd daemon
pub struct Global {
    /// Root of the tree of loggers
    pub log: slog::Logger,
    /// Chassis identity, fetched once from the platform service
    pub chassis: Chassis,
    /// Cached front-panel port attributes
    pub cache: PortCache,
}

impl Global {
    fn new(log: &slog::Logger, chassis: Chassis) -> Self {
        Global {
            log: log.clone(),
            chassis,
            cache: PortCache::new(log),
        }
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "macallocd", about = "interface MAC allocation daemon")]
enum Args {
    /// Run the MAC allocation daemon.
    Run(Opt),
}

#[derive(Clone, Debug, StructOpt)]
pub(crate) struct Opt {
    #[structopt(long, about = "log file")]
    log_file: Option<String>,

    #[structopt(
        long,
        short = "l",
        default_value = "json",
        about = "log format",
        help = "format logs for 'human' or 'json' consumption"
    )]
    log_format: common::logging::LogFormat,

    #[structopt(
        long = "platform-addr",
        short = "p",
        about = "SocketAddr the platform state service is listening on. \
                 (default localhost:12235)"
    )]
    platform_addr: Option<SocketAddr>,

    #[structopt(
        long = "listen-addr",
        short = "a",
        about = "SocketAddr the API server should listen on. \
                 (default localhost:12233)"
    )]
    listen_addr: Option<SocketAddr>,
}

async fn signal_handler(
    log: slog::Logger,
    mut sigs: Signals,
    done_tx: oneshot::Sender<()>,
) {
    let log = log.new(slog::o!("unit" => "signal-handler"));
    for signal in &mut sigs {
        if signal == SIGINT || signal == SIGQUIT || signal == SIGTERM {
            info!(&log, "caught signal {signal} - exiting");
            break;
        }
    }
    _ = done_tx.send(());
}

fn notify_supervisor(log: &slog::Logger, state: sd_notify::NotifyState) {
    // Outside of systemd there is no notification socket, which is fine.
    if let Err(e) = sd_notify::notify(false, &[state]) {
        debug!(log, "supervisor notification not delivered: {e:?}");
    }
}

async fn run_macallocd(opts: Opt) -> McdResult<()> {
    let log =
        common::logging::init("macallocd", &opts.log_file, opts.log_format)?;

    // The shutdown flag: set by the signal handler, waited on at the
    // bottom of this function.  Handlers are installed before anything
    // that can block; an installation failure aborts startup.
    const SIGNALS: &[std::ffi::c_int] = &[SIGTERM, SIGQUIT, SIGINT];
    let sigs = Signals::new(SIGNALS)?;
    let (done_tx, done_rx) = oneshot::channel();
    let sig_log = log.clone();
    _ = tokio::task::spawn(async move {
        signal_handler(sig_log, sigs, done_tx).await
    });

    // READY goes out before the upstream gate.  The supervisor tracks
    // process liveness, not serviceability, and the gate may block
    // indefinitely.
    notify_supervisor(&log, sd_notify::NotifyState::Ready);

    let platform_addr = opts.platform_addr.unwrap_or(SocketAddr::new(
        IpAddr::V6(Ipv6Addr::LOCALHOST),
        common::DEFAULT_PLATFORM_PORT,
    ));
    let client = PlatformClient::new(&log, platform_addr);
    readiness::wait_for_platform(&log, |key| client.is_ready(key)).await;

    let chassis = client.get_chassis().await?;
    info!(log, "chassis identity";
        "base_mac" => %chassis.base_mac,
        "mac_pool_size" => chassis.mac_pool_size);

    let global = Arc::new(Global::new(&log, chassis));

    let listen_addr = opts.listen_addr.unwrap_or(SocketAddr::new(
        IpAddr::V6(Ipv6Addr::LOCALHOST),
        common::DEFAULT_MACALLOCD_PORT,
    ));
    let server = api_server::launch_server(global.clone(), &listen_addr)?;

    global.cache.populate(client.get_front_panel_ports().await?);

    let (event_tx, event_rx) = mpsc::channel(64);
    let sub_client = client.clone();
    _ = tokio::task::spawn(async move {
        sub_client.subscribe_port_events(event_tx).await
    });
    let watch_global = global.clone();
    _ = tokio::task::spawn(async move {
        events::watch_loop(watch_global, event_rx).await
    });

    _ = done_rx.await;

    notify_supervisor(&log, sd_notify::NotifyState::Stopping);
    debug!(&log, "shutting down API server");
    if let Err(e) = server.close().await {
        error!(&log, "error closing api server: {e:?}");
    }

    info!(&log, "exiting");
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> McdResult<()> {
    let args = Args::from_args();

    match args {
        Args::Run(opt) => run_macallocd(opt).await,
    }
}
