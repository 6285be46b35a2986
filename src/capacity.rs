// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::common::*;
use crate::error::Error;
use crate::platform::Platform;
use crate::quantity::{bytes_to_gb, parse_bytes};
use crate::swiftstorage_types::SwiftStorage;
use tracing::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub host: String,
    pub device: String,
    pub capacity_gb: u64,
}

/// Per-replica capacity table consumed by the ring builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceManifest {
    pub devices: Vec<Device>,
}

impl DeviceManifest {
    /// One `host,device,capacity-gb` line per replica, each newline terminated.
    pub fn render(&self) -> String {
        self.devices
            .iter()
            .map(|d| format!("{},{},{}\n", d.host, d.device, d.capacity_gb))
            .collect()
    }
}

/// Reads the bound capacity of every replica's claim. A missing or unbound
/// claim fails the whole manifest; a partial table is never produced.
pub async fn discover_devices<P: Platform + ?Sized>(
    platform: &P,
    swift: &SwiftStorage,
) -> Result<DeviceManifest, Error> {
    let namespace = swift_namespace(swift);
    let mut devices = Vec::new();
    for replica in 0..swift.spec.replicas {
        let name = claim_name(swift, replica);
        let claim = platform
            .get_persistent_volume_claim(&namespace, &name)
            .await
            .map_err(|source| Error::GetClaimFailed {
                name: name.clone(),
                source,
            })?
            .ok_or_else(|| Error::ClaimNotFound(name.clone()))?;
        let status = claim.status.unwrap_or_default();
        if status.phase.as_deref() != Some("Bound") {
            return Err(Error::ClaimNotBound(name));
        }
        let capacity = status
            .capacity
            .as_ref()
            .and_then(|capacity| capacity.get("storage"))
            .ok_or_else(|| Error::ClaimNotBound(name.clone()))?;
        let bytes = parse_bytes(&capacity.0)?;
        debug!("Claim {} has {} bytes", name, bytes);
        devices.push(Device {
            host: replica_host(swift, replica),
            device: DEVICE_NAME.to_string(),
            capacity_gb: bytes_to_gb(bytes),
        });
    }
    Ok(DeviceManifest { devices })
}
