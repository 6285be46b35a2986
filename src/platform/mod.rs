// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
//! The platform is every Kubernetes read and write the reconciler performs.
//! `KubePlatform` talks to the API server; tests use the in-memory `FakePlatform`.
pub mod kube_platform;


pub use kube_platform::KubePlatform;

use crate::swiftstorage_types::{SwiftStorage, SwiftStorageStatus};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Service};
use k8s_openapi::api::networking::v1::NetworkPolicy;

/// Apply operations create the object when it is missing and bring an existing one
/// in line with the desired object otherwise. They return the live object.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn get_swift_storage(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SwiftStorage>, kube::Error>;

    async fn update_swift_storage_replicas(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<SwiftStorage, kube::Error>;

    async fn update_swift_storage_status(
        &self,
        namespace: &str,
        name: &str,
        status: &SwiftStorageStatus,
    ) -> Result<(), kube::Error>;

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, kube::Error>;

    async fn apply_config_map(&self, config_map: ConfigMap) -> Result<ConfigMap, kube::Error>;

    async fn apply_service(&self, service: Service) -> Result<Service, kube::Error>;

    async fn apply_network_policy(
        &self,
        network_policy: NetworkPolicy,
    ) -> Result<NetworkPolicy, kube::Error>;

    async fn get_stateful_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StatefulSet>, kube::Error>;

    async fn apply_stateful_set(
        &self,
        stateful_set: StatefulSet,
    ) -> Result<StatefulSet, kube::Error>;

    async fn get_persistent_volume_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>, kube::Error>;
}

/// Whether the live StatefulSet differs from the desired one in a field this
/// controller owns. Everything else in the spec is defaulted or set by the API
/// server, and the claim templates are immutable after creation.
pub fn stateful_set_drifted(found: &StatefulSet, desired: &StatefulSet) -> bool {
    match (found.spec.as_ref(), desired.spec.as_ref()) {
        (Some(found), Some(desired)) => {
            found.replicas != desired.replicas || found.template != desired.template
        }
        (None, None) => false,
        _ => true,
    }
}
