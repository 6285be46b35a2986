// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SwiftStorage describes the storage tier of a Swift cluster: the account,
/// container and object servers with their background daemons, one pod per replica.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "swift.openstack.org",
    version = "v1beta1",
    kind = "SwiftStorage",
    shortname = "swiftstorage",
    status = "SwiftStorageStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SwiftStorageSpec {
    #[serde(default = "default_replicas")]
    #[schemars(range(min = 0))]
    pub replicas: i32,
    #[serde(default = "default_storage_class")]
    pub storage_class: String,
    #[serde(default = "default_storage_request")]
    pub storage_request: String,
    /// Secret carrying swift.conf (hash path prefix/suffix); mounted next to the rings.
    #[serde(default = "default_swift_conf_secret")]
    pub swift_conf_secret: String,
    /// Secret carrying the admin credential.
    #[serde(default = "default_secret")]
    pub secret: String,
    #[serde(default)]
    pub password_selectors: PasswordSelector,
    #[serde(default)]
    pub container_image_account: String,
    #[serde(default)]
    pub container_image_container: String,
    #[serde(default)]
    pub container_image_object: String,
    #[serde(default)]
    pub container_image_proxy: String,
    #[serde(default)]
    pub container_image_memcached: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSelector {
    #[serde(default = "default_password_selector")]
    pub service: String,
}

impl Default for PasswordSelector {
    fn default() -> Self {
        PasswordSelector {
            service: default_password_selector(),
        }
    }
}

impl Default for SwiftStorageSpec {
    fn default() -> Self {
        SwiftStorageSpec {
            replicas: default_replicas(),
            storage_class: default_storage_class(),
            storage_request: default_storage_request(),
            swift_conf_secret: default_swift_conf_secret(),
            secret: default_secret(),
            password_selectors: PasswordSelector::default(),
            container_image_account: String::new(),
            container_image_container: String::new(),
            container_image_object: String::new(),
            container_image_proxy: String::new(),
            container_image_memcached: String::new(),
        }
    }
}

fn default_replicas() -> i32 {
    1
}

fn default_storage_class() -> String {
    "local-storage".to_string()
}

fn default_storage_request() -> String {
    "10Gi".to_string()
}

fn default_swift_conf_secret() -> String {
    "swift-conf".to_string()
}

fn default_secret() -> String {
    "osp-secret".to_string()
}

fn default_password_selector() -> String {
    "SwiftPassword".to_string()
}

/// Per-role image references used when the SwiftStorage leaves an image unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDefaults {
    pub account: String,
    pub container: String,
    pub object: String,
    pub proxy: String,
    pub memcached: String,
}

impl SwiftStorageSpec {
    pub fn with_image_defaults(mut self, defaults: &ImageDefaults) -> Self {
        fn fill(field: &mut String, default: &str) {
            if field.is_empty() {
                *field = default.to_string();
            }
        }
        fill(&mut self.container_image_account, &defaults.account);
        fill(&mut self.container_image_container, &defaults.container);
        fill(&mut self.container_image_object, &defaults.object);
        fill(&mut self.container_image_proxy, &defaults.proxy);
        fill(&mut self.container_image_memcached, &defaults.memcached);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwiftStorageStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Role name to host:port of the headless endpoint.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub severity: ConditionSeverity,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    pub last_transition_time: Time,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionSeverity {
    #[default]
    #[serde(rename = "")]
    None,
    Info,
    Warning,
    Error,
}
