// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod capacity;
pub mod controller;
pub mod resources;

use crate::common::RING_CONFIG_MAP_NAME;
use crate::swiftstorage_types::*;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

pub const NAMESPACE: &str = "openstack";

pub fn make_swift(name: &str, replicas: i32) -> SwiftStorage {
    let mut swift = SwiftStorage::new(
        name,
        SwiftStorageSpec {
            replicas,
            ..SwiftStorageSpec::default()
        },
    );
    swift.metadata.namespace = Some(NAMESPACE.to_string());
    swift.metadata.uid = Some(format!("{}-uid", name));
    swift
}

pub fn image_defaults() -> ImageDefaults {
    ImageDefaults {
        account: "registry/swift-account:test".to_string(),
        container: "registry/swift-container:test".to_string(),
        object: "registry/swift-object:test".to_string(),
        proxy: "registry/swift-proxy:test".to_string(),
        memcached: "registry/memcached:test".to_string(),
    }
}

pub fn ring_config_map() -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(RING_CONFIG_MAP_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..ObjectMeta::default()
        },
        data: Some(BTreeMap::from([(
            "account.ring.gz".to_string(),
            "ring".to_string(),
        )])),
        ..ConfigMap::default()
    }
}
