// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use super::{stateful_set_drifted, Platform};
use crate::swiftstorage_types::{SwiftStorage, SwiftStorageStatus};
use async_trait::async_trait;
use core::fmt::Debug;
use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Service, ServiceSpec};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Api, Patch, PatchParams, PostParams},
    Client, Resource,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::*;

pub struct KubePlatform {
    client: Client,
}

impl KubePlatform {
    pub fn new(client: Client) -> KubePlatform {
        KubePlatform { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::<K>::namespaced(self.client.clone(), namespace)
    }

    fn api_for<K>(&self, obj: &K) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        self.api(obj.meta().namespace.as_deref().unwrap_or_default())
    }
}

/// Gets the object by name and creates it if it is missing. Otherwise `update`
/// decides, from the found and the desired object, whether a replace is needed.
async fn create_or_update<K>(
    api: &Api<K>,
    desired: K,
    update: impl FnOnce(K, K) -> Option<K>,
) -> Result<K, kube::Error>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    K::DynamicType: Default,
{
    let kind = K::kind(&K::DynamicType::default()).to_string();
    let name = desired.meta().name.clone().unwrap_or_default();
    match api.get_opt(&name).await? {
        Some(found) => {
            debug!(
                "Current rv of {} {}: {}",
                kind,
                name,
                found.meta().resource_version.as_deref().unwrap_or_default()
            );
            match update(found.clone(), desired) {
                Some(updated) => {
                    info!("Update {}: {}", kind, name);
                    api.replace(&name, &PostParams::default(), &updated).await
                }
                None => Ok(found),
            }
        }
        None => {
            info!("Create {}: {}", kind, name);
            match api.create(&PostParams::default(), &desired).await {
                Err(kube_client::Error::Api(kube_core::ErrorResponse { ref reason, .. }))
                    if reason == "AlreadyExists" =>
                {
                    api.get(&name).await
                }
                result => result,
            }
        }
    }
}

#[async_trait]
impl Platform for KubePlatform {
    async fn get_swift_storage(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SwiftStorage>, kube::Error> {
        // A quorum read, not the controller cache, so every pass starts from fresh state.
        self.api::<SwiftStorage>(namespace).get_opt(name).await
    }

    async fn update_swift_storage_replicas(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<SwiftStorage, kube::Error> {
        let patch = Patch::Merge(json!({
            "spec": {
                "replicas": replicas,
            },
        }));
        self.api::<SwiftStorage>(namespace)
            .patch(name, &PatchParams::default(), &patch)
            .await
    }

    async fn update_swift_storage_status(
        &self,
        namespace: &str,
        name: &str,
        status: &SwiftStorageStatus,
    ) -> Result<(), kube::Error> {
        let patch = Patch::Merge(json!({ "status": status }));
        self.api::<SwiftStorage>(namespace)
            .patch_status(name, &PatchParams::default(), &patch)
            .await?;
        Ok(())
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, kube::Error> {
        self.api::<ConfigMap>(namespace).get_opt(name).await
    }

    async fn apply_config_map(&self, config_map: ConfigMap) -> Result<ConfigMap, kube::Error> {
        let api = self.api_for(&config_map);
        create_or_update(&api, config_map, |found, desired| {
            if found.data == desired.data && found.metadata.labels == desired.metadata.labels {
                return None;
            }
            let mut metadata = found.metadata.clone();
            metadata.labels = desired.metadata.labels;
            metadata.owner_references = desired.metadata.owner_references;
            Some(ConfigMap {
                metadata,
                data: desired.data,
                binary_data: desired.binary_data,
                immutable: desired.immutable,
            })
        })
        .await
    }

    async fn apply_service(&self, service: Service) -> Result<Service, kube::Error> {
        let api = self.api_for(&service);
        create_or_update(&api, service, |found, desired| {
            let found_spec = found.spec.clone().unwrap_or_default();
            let desired_spec = desired.spec.unwrap_or_default();
            if found_spec.ports == desired_spec.ports && found_spec.selector == desired_spec.selector
            {
                return None;
            }
            // cluster_ip is immutable, only ports and selector are carried over.
            Some(Service {
                spec: Some(ServiceSpec {
                    ports: desired_spec.ports,
                    selector: desired_spec.selector,
                    ..found_spec
                }),
                ..found
            })
        })
        .await
    }

    async fn apply_network_policy(
        &self,
        network_policy: NetworkPolicy,
    ) -> Result<NetworkPolicy, kube::Error> {
        let api = self.api_for(&network_policy);
        create_or_update(&api, network_policy, |found, desired| {
            if found.spec == desired.spec {
                return None;
            }
            Some(NetworkPolicy {
                spec: desired.spec,
                ..found
            })
        })
        .await
    }

    async fn get_stateful_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StatefulSet>, kube::Error> {
        self.api::<StatefulSet>(namespace).get_opt(name).await
    }

    async fn apply_stateful_set(
        &self,
        stateful_set: StatefulSet,
    ) -> Result<StatefulSet, kube::Error> {
        let api = self.api_for(&stateful_set);
        create_or_update(&api, stateful_set, |found, desired| {
            if !stateful_set_drifted(&found, &desired) {
                return None;
            }
            // Claim templates cannot change on a live StatefulSet.
            let spec = desired.spec.map(|spec| StatefulSetSpec {
                volume_claim_templates: found
                    .spec
                    .as_ref()
                    .and_then(|found| found.volume_claim_templates.clone()),
                ..spec
            });
            Some(StatefulSet { spec, ..found })
        })
        .await
    }

    async fn get_persistent_volume_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>, kube::Error> {
        self.api::<PersistentVolumeClaim>(namespace)
            .get_opt(name)
            .await
    }
}
