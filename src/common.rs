// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::swiftstorage_types::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use std::collections::BTreeMap;
use std::time::Duration;

pub const ACCOUNT_SERVER_PORT: i32 = 6202;
pub const CONTAINER_SERVER_PORT: i32 = 6201;
pub const OBJECT_SERVER_PORT: i32 = 6200;
pub const RSYNC_PORT: i32 = 873;
pub const MEMCACHED_PORT: i32 = 11211;

pub const RUN_AS_USER: i64 = 42445;

pub const CLAIM_NAME: &str = "swift";
pub const SERVICE_ACCOUNT: &str = "swift-swift";
pub const DEVICE_NAME: &str = "d1";

/// Produced by the ring reconciler; the storage pods must never start without it.
pub const RING_CONFIG_MAP_NAME: &str = "swift-ring-files";
pub const DEVICE_CONFIG_MAP_NAME: &str = "swift-storage-config-data";
pub const DEVICE_LIST_KEY: &str = "devices.csv";

pub const RING_CONFIG_RETRY: Duration = Duration::from_secs(5);

pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";

pub fn storage_labels() -> BTreeMap<String, String> {
    BTreeMap::from([("component".to_string(), "swift-storage".to_string())])
}

pub fn proxy_labels() -> BTreeMap<String, String> {
    BTreeMap::from([("component".to_string(), "swift-proxy".to_string())])
}

/// Labels carried by every object generated for one SwiftStorage.
pub fn instance_labels(swift: &SwiftStorage) -> BTreeMap<String, String> {
    let mut labels = storage_labels();
    labels.insert(INSTANCE_LABEL.to_string(), swift_name(swift));
    labels
}

pub fn swift_name(swift: &SwiftStorage) -> String {
    swift.metadata.name.clone().unwrap_or_default()
}

pub fn swift_namespace(swift: &SwiftStorage) -> String {
    swift.metadata.namespace.clone().unwrap_or_default()
}

pub fn config_data_name(swift: &SwiftStorage) -> String {
    swift_name(swift) + "-config-data"
}

pub fn scripts_name(swift: &SwiftStorage) -> String {
    swift_name(swift) + "-scripts"
}

pub fn service_name(swift: &SwiftStorage) -> String {
    swift_name(swift)
}

pub fn network_policy_name(swift: &SwiftStorage) -> String {
    format!("np-{}", swift_name(swift))
}

pub fn stateful_set_name(swift: &SwiftStorage) -> String {
    swift_name(swift)
}

pub fn claim_name(swift: &SwiftStorage, replica: i32) -> String {
    format!("{}-{}-{}", CLAIM_NAME, swift_name(swift), replica)
}

/// Stable DNS name of one replica behind the headless service.
pub fn replica_host(swift: &SwiftStorage, replica: i32) -> String {
    format!("{name}-{replica}.{name}", name = swift_name(swift))
}

pub fn make_owner_references(swift: &SwiftStorage) -> Option<Vec<OwnerReference>> {
    swift.controller_owner_ref(&()).map(|owner_ref| vec![owner_ref])
}

pub fn storage_endpoints(swift: &SwiftStorage) -> BTreeMap<String, String> {
    let host = format!(
        "{}.{}.svc",
        service_name(swift),
        swift_namespace(swift)
    );
    [
        ("account", ACCOUNT_SERVER_PORT),
        ("container", CONTAINER_SERVER_PORT),
        ("object", OBJECT_SERVER_PORT),
        ("rsync", RSYNC_PORT),
    ]
    .into_iter()
    .map(|(role, port)| (role.to_string(), format!("{}:{}", host, port)))
    .collect()
}
