// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::swiftstorage_types::ImageDefaults;
use clap::Args;
use std::time::Duration;

pub const ACCOUNT_IMAGE_DEFAULT: &str =
    "quay.io/podified-antelope-centos9/openstack-swift-account:current-podified";
pub const CONTAINER_IMAGE_DEFAULT: &str =
    "quay.io/podified-antelope-centos9/openstack-swift-container:current-podified";
pub const OBJECT_IMAGE_DEFAULT: &str =
    "quay.io/podified-antelope-centos9/openstack-swift-object:current-podified";
pub const PROXY_IMAGE_DEFAULT: &str =
    "quay.io/podified-antelope-centos9/openstack-swift-proxy-server:current-podified";
pub const MEMCACHED_IMAGE_DEFAULT: &str =
    "quay.io/podified-antelope-centos9/openstack-memcached:current-podified";

/// Settings of the `run` command. Every flag can also be set from the environment.
#[derive(Debug, Clone, Args)]
pub struct ControllerConfig {
    /// Account image used when a SwiftStorage leaves it unset.
    #[arg(long, env = "RELATED_IMAGE_SWIFT_ACCOUNT_IMAGE_URL_DEFAULT", default_value = ACCOUNT_IMAGE_DEFAULT)]
    pub account_image: String,

    /// Container image used when a SwiftStorage leaves it unset.
    #[arg(long, env = "RELATED_IMAGE_SWIFT_CONTAINER_IMAGE_URL_DEFAULT", default_value = CONTAINER_IMAGE_DEFAULT)]
    pub container_image: String,

    /// Object image used when a SwiftStorage leaves it unset.
    #[arg(long, env = "RELATED_IMAGE_SWIFT_OBJECT_IMAGE_URL_DEFAULT", default_value = OBJECT_IMAGE_DEFAULT)]
    pub object_image: String,

    /// Proxy image, also running the expirer and ring sync.
    #[arg(long, env = "RELATED_IMAGE_SWIFT_PROXY_IMAGE_URL_DEFAULT", default_value = PROXY_IMAGE_DEFAULT)]
    pub proxy_image: String,

    #[arg(long, env = "RELATED_IMAGE_SWIFT_MEMCACHED_IMAGE_URL_DEFAULT", default_value = MEMCACHED_IMAGE_DEFAULT)]
    pub memcached_image: String,

    /// First retry delay after a failed pass; doubled on every further failure.
    #[arg(long, env = "SWIFT_STORAGE_BACKOFF_BASE_SECS", default_value_t = 5)]
    pub backoff_base_secs: u64,

    #[arg(long, env = "SWIFT_STORAGE_BACKOFF_MAX_SECS", default_value_t = 300)]
    pub backoff_max_secs: u64,
}

impl ControllerConfig {
    pub fn image_defaults(&self) -> ImageDefaults {
        ImageDefaults {
            account: self.account_image.clone(),
            container: self.container_image.clone(),
            object: self.object_image.clone(),
            proxy: self.proxy_image.clone(),
            memcached: self.memcached_image.clone(),
        }
    }

    /// Delay before retrying after `failures` consecutive failed passes.
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 1u64.checked_shl(failures.saturating_sub(1)).unwrap_or(u64::MAX);
        let secs = self
            .backoff_base_secs
            .saturating_mul(factor)
            .min(self.backoff_max_secs);
        Duration::from_secs(secs)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            account_image: ACCOUNT_IMAGE_DEFAULT.to_string(),
            container_image: CONTAINER_IMAGE_DEFAULT.to_string(),
            object_image: OBJECT_IMAGE_DEFAULT.to_string(),
            proxy_image: PROXY_IMAGE_DEFAULT.to_string(),
            memcached_image: MEMCACHED_IMAGE_DEFAULT.to_string(),
            backoff_base_secs: 5,
            backoff_max_secs: 300,
        }
    }
}
