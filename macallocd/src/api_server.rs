// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! MAC allocation HTTP API types and endpoint functions.

use std::net::SocketAddr;
use std::sync::Arc;

use dropshot::endpoint;
use dropshot::HttpError;
use dropshot::HttpResponseOk;
use dropshot::RequestContext;
use dropshot::TypedBody;
use slog::error;
use slog::info;
use slog::o;

use protocol::attrs;
use protocol::types::ChangeObject;
use protocol::types::InterfaceType;
use protocol::types::MacAllocRequest;
use protocol::types::OperationKind;

use crate::allocator;
use crate::errors::McdError;
use crate::errors::McdResult;
use crate::Global;

pub type ApiServer = dropshot::HttpServer<Arc<Global>>;

/// Walk an allocation request through validation, address derivation,
/// and attribute assignment.  On success the returned change object is
/// the caller's, with exactly the phys-address attribute added.
pub fn handle_alloc(
    g: &Global,
    request: MacAllocRequest,
) -> McdResult<ChangeObject> {
    if request.operation != OperationKind::Transaction {
        return Err(McdError::UnsupportedOperation(
            request.operation.to_string(),
        ));
    }

    let mut change = request.change;
    let if_type = change
        .str_attr(attrs::INTF_TYPE)
        .ok_or(McdError::MissingAttr(attrs::INTF_TYPE))?
        .parse::<InterfaceType>()
        .map_err(McdError::Invalid)?;

    // Loopback and management interfaces take their addresses from the
    // OS, not from the chassis pool.
    if matches!(if_type, InterfaceType::Loopback | InterfaceType::Management) {
        return Err(McdError::UnsupportedType(if_type.to_string()));
    }

    let mac = allocator::allocate(&g.chassis, &g.cache, if_type, &change)?;
    change.set_attr(attrs::PHYS_ADDRESS, mac.to_string());
    Ok(change)
}

/// Assign a MAC address to the interface described by the submitted
/// change, returning the change with the phys-address attribute filled
/// in.
#[endpoint {
    method = POST,
    path = "/interface/mac-address",
}]
async fn interface_alloc_mac(
    rqctx: RequestContext<Arc<Global>>,
    body: TypedBody<MacAllocRequest>,
) -> Result<HttpResponseOk<ChangeObject>, HttpError> {
    let global: &Global = rqctx.context();
    let req_id = uuid::Uuid::new_v4();

    match handle_alloc(global, body.into_inner()) {
        Ok(change) => {
            info!(global.log, "allocated MAC address";
                "req_id" => req_id.to_string(),
                "mac" => change.str_attr(attrs::PHYS_ADDRESS).unwrap_or("-"));
            Ok(HttpResponseOk(change))
        }
        Err(e) => {
            error!(global.log, "MAC allocation failed";
                "req_id" => req_id.to_string(),
                "error" => %e);
            Err(e.into())
        }
    }
}

/// Launch the dropshot server that fields allocation requests.
pub fn launch_server(
    global: Arc<Global>,
    addr: &SocketAddr,
) -> anyhow::Result<ApiServer> {
    let config_dropshot = dropshot::ConfigDropshot {
        bind_address: *addr,
        request_body_max_bytes: 10240,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
    };
    let log = global.log.new(o!("unit" => "api-server"));

    slog::info!(log, "starting api server on {addr}");
    dropshot::HttpServerStarter::new(
        &config_dropshot,
        http_api(),
        global.clone(),
        &log,
    )
    .map(|s| s.start())
    .map_err(|e| anyhow::anyhow!(e.to_string()))
}

pub fn http_api() -> dropshot::ApiDescription<Arc<Global>> {
    let mut api = dropshot::ApiDescription::new();

    api.register(interface_alloc_mac).unwrap();

    api
}
