// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! MAC address derivation.
//!
//! Every address this daemon hands out is `base_mac + offset` for some
//! offset within the chassis pool.  A physical interface's offset comes
//! from its front-panel port's pool position plus the lane its subport
//! starts on; vlan and lag interfaces share fixed offsets reserved near
//! the base of the pool.

use protocol::attrs;
use protocol::types::ChangeObject;
use protocol::types::Chassis;
use protocol::types::InterfaceType;
use protocol::MacAddr;

use crate::cache::PortCache;
use crate::errors::McdError;
use crate::errors::McdResult;

/// Pool offset shared by all vlan routing interfaces.
pub const RESERVED_VLAN_OFFSET: u32 = 1;
/// Pool offset shared by all link aggregation groups.
pub const RESERVED_LAG_OFFSET: u32 = 2;

/// Derive the MAC address for the interface described by `change`.
/// Identical inputs against identical cache state always produce the
/// same address; nothing here mutates the cache or the change object.
pub fn allocate(
    chassis: &Chassis,
    cache: &PortCache,
    if_type: InterfaceType,
    change: &ChangeObject,
) -> McdResult<MacAddr> {
    let offset = match if_type {
        InterfaceType::Loopback | InterfaceType::Management => {
            return Err(McdError::UnsupportedType(if_type.to_string()));
        }
        InterfaceType::Physical => physical_offset(cache, change)?,
        InterfaceType::Vlan => vlan_offset(change)?,
        InterfaceType::Lag => lag_offset(change)?,
    };

    if offset >= chassis.mac_pool_size {
        return Err(McdError::AllocFailed(format!(
            "offset {offset} is outside the pool of {}",
            chassis.mac_pool_size
        )));
    }

    let mac = chassis.base_mac.offset(offset);
    if mac.is_null() {
        return Err(McdError::AllocFailed(
            "derived the null address".to_string(),
        ));
    }
    Ok(mac)
}

// A physical interface is one channel of a front-panel port.  Its
// offset is the port's base offset plus the first lane of the channel,
// so re-breaking out a port moves the addresses of its subports.
fn physical_offset(
    cache: &PortCache,
    change: &ChangeObject,
) -> McdResult<u32> {
    let port_id = change
        .u32_attr(attrs::FRONT_PANEL_PORT)
        .ok_or(McdError::MissingAttr(attrs::FRONT_PANEL_PORT))?;
    let subport = change
        .u32_attr(attrs::SUBPORT_ID)
        .ok_or(McdError::MissingAttr(attrs::SUBPORT_ID))?;
    let port = cache.get(port_id).ok_or(McdError::PortNotFound(port_id))?;

    let mode = port.breakout_mode;
    if subport >= mode.channels() {
        return Err(McdError::Invalid(format!(
            "subport {subport} out of range for a {mode} port"
        )));
    }
    Ok(port.mac_offset + subport * mode.lane_step())
}

fn vlan_offset(change: &ChangeObject) -> McdResult<u32> {
    let vlan_id = change
        .u32_attr(attrs::VLAN_ID)
        .ok_or(McdError::MissingAttr(attrs::VLAN_ID))?;
    if !(1..=4094).contains(&vlan_id) {
        return Err(McdError::Invalid(format!("bad vlan id: {vlan_id}")));
    }
    Ok(RESERVED_VLAN_OFFSET)
}

fn lag_offset(change: &ChangeObject) -> McdResult<u32> {
    change
        .u32_attr(attrs::LAG_ID)
        .ok_or(McdError::MissingAttr(attrs::LAG_ID))?;
    Ok(RESERVED_LAG_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::types::BreakoutMode;
    use protocol::types::FrontPanelPort;

    fn test_logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn test_chassis() -> Chassis {
        Chassis {
            base_mac: MacAddr::new(0x00, 0x0a, 0xf8, 0x00, 0x00, 0x00),
            mac_pool_size: 64,
        }
    }

    fn cache_with(ports: Vec<FrontPanelPort>) -> PortCache {
        let cache = PortCache::new(&test_logger());
        cache.populate(ports);
        cache
    }

    fn port(id: u32, mode: BreakoutMode, offset: u32) -> FrontPanelPort {
        FrontPanelPort {
            port_id: id,
            breakout_mode: mode,
            mac_offset: offset,
        }
    }

    fn physical_change(port_id: u32, subport: u32) -> ChangeObject {
        ChangeObject::new()
            .with_attr(attrs::INTF_TYPE, "physical")
            .with_attr(attrs::FRONT_PANEL_PORT, port_id)
            .with_attr(attrs::SUBPORT_ID, subport)
    }

    #[test]
    fn test_loopback_and_management_never_allocated() {
        // An empty cache proves these paths never consult port state.
        let cache = cache_with(Vec::new());
        for if_type in [InterfaceType::Loopback, InterfaceType::Management] {
            let err = allocate(
                &test_chassis(),
                &cache,
                if_type,
                &ChangeObject::new(),
            )
            .unwrap_err();
            assert!(matches!(err, McdError::UnsupportedType(_)), "{err}");
        }
    }

    #[test]
    fn test_physical_offsets_follow_breakout() {
        let chassis = test_chassis();
        let cache = cache_with(vec![
            port(1, BreakoutMode::Single, 0),
            port(2, BreakoutMode::Dual, 4),
            port(3, BreakoutMode::Quad, 8),
        ]);

        let alloc = |port_id, subport| {
            allocate(
                &chassis,
                &cache,
                InterfaceType::Physical,
                &physical_change(port_id, subport),
            )
        };

        // A subport's address starts at the first lane of its channel.
        assert_eq!(alloc(1, 0).unwrap(), chassis.base_mac);
        assert_eq!(alloc(2, 0).unwrap(), chassis.base_mac.offset(4));
        assert_eq!(alloc(2, 1).unwrap(), chassis.base_mac.offset(6));
        assert_eq!(alloc(3, 0).unwrap(), chassis.base_mac.offset(8));
        assert_eq!(alloc(3, 3).unwrap(), chassis.base_mac.offset(11));

        // Subports past the channel count don't exist in this mode.
        assert!(matches!(alloc(1, 1).unwrap_err(), McdError::Invalid(_)));
        assert!(matches!(alloc(2, 2).unwrap_err(), McdError::Invalid(_)));
        assert!(matches!(alloc(3, 4).unwrap_err(), McdError::Invalid(_)));
    }

    #[test]
    fn test_physical_missing_attrs() {
        let cache = cache_with(vec![port(1, BreakoutMode::Single, 0)]);

        let change =
            ChangeObject::new().with_attr(attrs::INTF_TYPE, "physical");
        assert!(matches!(
            allocate(
                &test_chassis(),
                &cache,
                InterfaceType::Physical,
                &change
            )
            .unwrap_err(),
            McdError::MissingAttr(attrs::FRONT_PANEL_PORT)
        ));

        let change = change.with_attr(attrs::FRONT_PANEL_PORT, 1u32);
        assert!(matches!(
            allocate(
                &test_chassis(),
                &cache,
                InterfaceType::Physical,
                &change
            )
            .unwrap_err(),
            McdError::MissingAttr(attrs::SUBPORT_ID)
        ));
    }

    #[test]
    fn test_physical_unknown_port() {
        let cache = cache_with(vec![port(1, BreakoutMode::Single, 0)]);
        assert!(matches!(
            allocate(
                &test_chassis(),
                &cache,
                InterfaceType::Physical,
                &physical_change(7, 0),
            )
            .unwrap_err(),
            McdError::PortNotFound(7)
        ));
    }

    #[test]
    fn test_offset_bounded_by_pool() {
        let chassis = Chassis {
            base_mac: MacAddr::new(0x00, 0x0a, 0xf8, 0x00, 0x00, 0x10),
            mac_pool_size: 8,
        };
        let cache = cache_with(vec![port(2, BreakoutMode::Quad, 4)]);

        let alloc = |subport| {
            allocate(
                &chassis,
                &cache,
                InterfaceType::Physical,
                &physical_change(2, subport),
            )
        };
        assert_eq!(alloc(3).unwrap(), chassis.base_mac.offset(7));

        let tight = Chassis {
            mac_pool_size: 7,
            ..chassis
        };
        let err = allocate(
            &tight,
            &cache,
            InterfaceType::Physical,
            &physical_change(2, 3),
        )
        .unwrap_err();
        assert!(matches!(err, McdError::AllocFailed(_)), "{err}");
    }

    #[test]
    fn test_vlan_allocation() {
        let chassis = test_chassis();
        let cache = cache_with(Vec::new());

        let change = ChangeObject::new()
            .with_attr(attrs::INTF_TYPE, "vlan")
            .with_attr(attrs::VLAN_ID, 100u32);
        assert_eq!(
            allocate(&chassis, &cache, InterfaceType::Vlan, &change).unwrap(),
            chassis.base_mac.offset(RESERVED_VLAN_OFFSET)
        );

        // All vlans share the reserved offset.
        let other = ChangeObject::new()
            .with_attr(attrs::INTF_TYPE, "vlan")
            .with_attr(attrs::VLAN_ID, 200u32);
        assert_eq!(
            allocate(&chassis, &cache, InterfaceType::Vlan, &change).unwrap(),
            allocate(&chassis, &cache, InterfaceType::Vlan, &other).unwrap(),
        );

        for bad_id in [0u32, 4095] {
            let change = ChangeObject::new()
                .with_attr(attrs::INTF_TYPE, "vlan")
                .with_attr(attrs::VLAN_ID, bad_id);
            assert!(matches!(
                allocate(&chassis, &cache, InterfaceType::Vlan, &change)
                    .unwrap_err(),
                McdError::Invalid(_)
            ));
        }

        assert!(matches!(
            allocate(
                &chassis,
                &cache,
                InterfaceType::Vlan,
                &ChangeObject::new()
            )
            .unwrap_err(),
            McdError::MissingAttr(attrs::VLAN_ID)
        ));
    }

    #[test]
    fn test_lag_allocation() {
        let chassis = test_chassis();
        let cache = cache_with(Vec::new());

        let change = ChangeObject::new()
            .with_attr(attrs::INTF_TYPE, "lag")
            .with_attr(attrs::LAG_ID, 1u32);
        assert_eq!(
            allocate(&chassis, &cache, InterfaceType::Lag, &change).unwrap(),
            chassis.base_mac.offset(RESERVED_LAG_OFFSET)
        );

        assert!(matches!(
            allocate(
                &chassis,
                &cache,
                InterfaceType::Lag,
                &ChangeObject::new()
            )
            .unwrap_err(),
            McdError::MissingAttr(attrs::LAG_ID)
        ));
    }

    #[test]
    fn test_null_address_rejected() {
        // A zero base MAC plus a zero offset derives the null address,
        // which must never escape as a valid allocation.
        let chassis = Chassis {
            base_mac: MacAddr::ZERO,
            mac_pool_size: 64,
        };
        let cache = cache_with(vec![port(1, BreakoutMode::Single, 0)]);
        let err = allocate(
            &chassis,
            &cache,
            InterfaceType::Physical,
            &physical_change(1, 0),
        )
        .unwrap_err();
        assert!(matches!(err, McdError::AllocFailed(_)), "{err}");
    }
}
