// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use super::*;
use crate::capacity::*;
use crate::error::Error;
use crate::platform::fake::FakePlatform;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, PersistentVolumeClaimStatus};

#[tokio::test]
pub async fn test_manifest_from_bound_claims() {
    let platform = FakePlatform::new();
    platform.insert_bound_claim(NAMESPACE, "swift-alpha-0", "10000000000");
    platform.insert_bound_claim(NAMESPACE, "swift-alpha-1", "21000000000");

    let manifest = discover_devices(&platform, &make_swift("alpha", 2))
        .await
        .unwrap();
    assert_eq!(manifest.devices.len(), 2);
    assert_eq!(manifest.devices[1].host, "alpha-1.alpha");
    assert_eq!(manifest.render(), "alpha-0.alpha,d1,10\nalpha-1.alpha,d1,21\n");
}

#[tokio::test]
pub async fn test_manifest_with_binary_capacity() {
    let platform = FakePlatform::new();
    platform.insert_bound_claim(NAMESPACE, "swift-beta-0", "10Gi");

    let manifest = discover_devices(&platform, &make_swift("beta", 1))
        .await
        .unwrap();
    assert_eq!(manifest.render(), "beta-0.beta,d1,10\n");
}

#[tokio::test]
pub async fn test_no_replicas_gives_empty_manifest() {
    let platform = FakePlatform::new();
    let manifest = discover_devices(&platform, &make_swift("alpha", 0))
        .await
        .unwrap();
    assert_eq!(manifest, DeviceManifest::default());
    assert_eq!(manifest.render(), "");
}

#[tokio::test]
pub async fn test_missing_claim_fails() {
    let platform = FakePlatform::new();
    platform.insert_bound_claim(NAMESPACE, "swift-alpha-0", "10G");

    match discover_devices(&platform, &make_swift("alpha", 2)).await {
        Err(Error::ClaimNotFound(name)) => assert_eq!(name, "swift-alpha-1"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
pub async fn test_pending_claim_fails() {
    let platform = FakePlatform::new();
    platform.insert_claim(PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some("swift-alpha-0".to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..ObjectMeta::default()
        },
        status: Some(PersistentVolumeClaimStatus {
            phase: Some("Pending".to_string()),
            ..PersistentVolumeClaimStatus::default()
        }),
        ..PersistentVolumeClaim::default()
    });

    match discover_devices(&platform, &make_swift("alpha", 1)).await {
        Err(Error::ClaimNotBound(name)) => assert_eq!(name, "swift-alpha-0"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
pub async fn test_claim_read_failure_is_propagated() {
    let platform = FakePlatform::new();
    platform.fail_on("get_persistent_volume_claim");

    match discover_devices(&platform, &make_swift("alpha", 1)).await {
        Err(Error::GetClaimFailed { name, .. }) => assert_eq!(name, "swift-alpha-0"),
        other => panic!("unexpected result {:?}", other),
    }
}
