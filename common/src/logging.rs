// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use std::fs::File;
use std::str::FromStr;

use slog::o;
use slog::Drain;

/// Output format for a daemon's log stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Human,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "h" | "human" => Ok(LogFormat::Human),
            "j" | "json" => Ok(LogFormat::Json),
            _ => Err("invalid log format".to_string()),
        }
    }
}

fn open_log_file(path: &str) -> std::io::Result<File> {
    std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
}

/// Construct the root logger for a daemon.  Messages go to the named log
/// file if one is given and to stdout otherwise, formatted either as
/// bunyan-style JSON or for human consumption.
pub fn init(
    name: &'static str,
    log_file: &Option<String>,
    log_format: LogFormat,
) -> anyhow::Result<slog::Logger> {
    let drain = match (log_file, log_format) {
        (Some(path), LogFormat::Json) => {
            let file = open_log_file(path)?;
            let drain = slog_bunyan::with_name(name, file).build().fuse();
            slog_async::Async::new(drain).build().fuse()
        }
        (Some(path), LogFormat::Human) => {
            let decorator =
                slog_term::PlainDecorator::new(open_log_file(path)?);
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            slog_async::Async::new(drain).build().fuse()
        }
        (None, LogFormat::Json) => {
            let drain =
                slog_bunyan::with_name(name, std::io::stdout()).build().fuse();
            slog_async::Async::new(drain)
                .chan_size(32768)
                .build()
                .fuse()
        }
        (None, LogFormat::Human) => {
            let decorator = slog_term::TermDecorator::new().build();
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            slog_async::Async::new(drain)
                .chan_size(32768)
                .build()
                .fuse()
        }
    };
    Ok(slog::Logger::root(drain, o!()))
}
