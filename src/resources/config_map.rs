// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::capacity::DeviceManifest;
use crate::common::*;
use crate::swiftstorage_types::SwiftStorage;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use std::collections::BTreeMap;

/// Every key the storage server configuration templates accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfigOptions {
    pub bind_ip: String,
    pub account_port: i32,
    pub container_port: i32,
    pub object_port: i32,
    pub rsync_port: i32,
    pub devices_root: String,
    pub mount_check: bool,
    pub memcache_servers: String,
    pub workers: u32,
}

impl Default for StorageConfigOptions {
    fn default() -> Self {
        StorageConfigOptions {
            bind_ip: "::".to_string(),
            account_port: ACCOUNT_SERVER_PORT,
            container_port: CONTAINER_SERVER_PORT,
            object_port: OBJECT_SERVER_PORT,
            rsync_port: RSYNC_PORT,
            devices_root: "/srv/node".to_string(),
            mount_check: false,
            memcache_servers: format!("127.0.0.1:{}", MEMCACHED_PORT),
            workers: 1,
        }
    }
}

/// Every key the helper script templates accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOptions {
    pub default_config_dir: String,
    pub swift_conf_dir: String,
    pub ring_dir: String,
    pub merged_config_dir: String,
    pub device_dir: String,
    pub ring_sync_interval_secs: u32,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        ScriptOptions {
            default_config_dir: "/var/lib/config-data/default".to_string(),
            swift_conf_dir: "/var/lib/config-data/swiftconf".to_string(),
            ring_dir: "/var/lib/config-data/rings".to_string(),
            merged_config_dir: "/etc/swift".to_string(),
            device_dir: format!("/srv/node/{}", DEVICE_NAME),
            ring_sync_interval_secs: 60,
        }
    }
}

pub fn make_config_data_configmap(swift: &SwiftStorage) -> corev1::ConfigMap {
    let options = StorageConfigOptions::default();
    make_configmap(
        swift,
        config_data_name(swift),
        BTreeMap::from([
            (
                "account-server.conf".to_string(),
                make_server_config(&options, "account", options.account_port),
            ),
            (
                "container-server.conf".to_string(),
                make_server_config(&options, "container", options.container_port),
            ),
            (
                "object-server.conf".to_string(),
                make_server_config(&options, "object", options.object_port),
            ),
            (
                "object-expirer.conf".to_string(),
                make_object_expirer_config(&options),
            ),
            (
                "internal-client.conf".to_string(),
                make_internal_client_config(&options),
            ),
            ("rsyncd.conf".to_string(), make_rsyncd_config(&options)),
        ]),
    )
}

pub fn make_scripts_configmap(swift: &SwiftStorage) -> corev1::ConfigMap {
    let options = ScriptOptions::default();
    make_configmap(
        swift,
        scripts_name(swift),
        BTreeMap::from([
            ("swift-init.sh".to_string(), make_swift_init_script(&options)),
            ("ring-sync.sh".to_string(), make_ring_sync_script(&options)),
        ]),
    )
}

pub fn make_device_configmap(swift: &SwiftStorage, devices: &DeviceManifest) -> corev1::ConfigMap {
    make_configmap(
        swift,
        DEVICE_CONFIG_MAP_NAME.to_string(),
        BTreeMap::from([(DEVICE_LIST_KEY.to_string(), devices.render())]),
    )
}

fn make_configmap(
    swift: &SwiftStorage,
    name: String,
    data: BTreeMap<String, String>,
) -> corev1::ConfigMap {
    corev1::ConfigMap {
        metadata: metav1::ObjectMeta {
            name: Some(name),
            namespace: swift.metadata.namespace.clone(),
            labels: Some(instance_labels(swift)),
            owner_references: make_owner_references(swift),
            ..metav1::ObjectMeta::default()
        },
        data: Some(data),
        ..corev1::ConfigMap::default()
    }
}

fn make_server_config(options: &StorageConfigOptions, role: &str, port: i32) -> String {
    let extra = match role {
        "account" => "\n[account-reaper]\n\n[account-auditor]\n\n[account-replicator]\n".to_string(),
        "container" => concat!(
            "\n[container-replicator]\n",
            "\n[container-updater]\n",
            "\n[container-auditor]\n",
            "\n[container-sync]\n",
        )
        .to_string(),
        _ => concat!(
            "\n[object-replicator]\n",
            "\n[object-updater]\n",
            "\n[object-auditor]\n",
            "\n[object-reconstructor]\n",
        )
        .to_string(),
    };
    format!(
        "[DEFAULT]\n\
        bind_ip = {bind_ip}\n\
        bind_port = {port}\n\
        devices = {devices}\n\
        mount_check = {mount_check}\n\
        workers = {workers}\n\
        \n\
        [pipeline:main]\n\
        pipeline = healthcheck recon {role}-server\n\
        \n\
        [app:{role}-server]\n\
        use = egg:swift#{role}\n\
        \n\
        [filter:healthcheck]\n\
        use = egg:swift#healthcheck\n\
        \n\
        [filter:recon]\n\
        use = egg:swift#recon\n\
        recon_cache_path = /var/cache/swift\n\
        {extra}",
        bind_ip = options.bind_ip,
        port = port,
        devices = options.devices_root,
        mount_check = options.mount_check,
        workers = options.workers,
        role = role,
        extra = extra,
    )
}

fn make_object_expirer_config(options: &StorageConfigOptions) -> String {
    format!(
        "[DEFAULT]\n\
        \n\
        [object-expirer]\n\
        interval = 300\n\
        \n\
        [pipeline:main]\n\
        pipeline = catch_errors proxy-logging cache proxy-server\n\
        \n\
        [app:proxy-server]\n\
        use = egg:swift#proxy\n\
        \n\
        [filter:cache]\n\
        use = egg:swift#memcache\n\
        memcache_servers = {memcache}\n\
        \n\
        [filter:catch_errors]\n\
        use = egg:swift#catch_errors\n\
        \n\
        [filter:proxy-logging]\n\
        use = egg:swift#proxy_logging\n",
        memcache = options.memcache_servers,
    )
}

fn make_internal_client_config(options: &StorageConfigOptions) -> String {
    format!(
        "[DEFAULT]\n\
        \n\
        [pipeline:main]\n\
        pipeline = catch_errors proxy-logging cache proxy-server\n\
        \n\
        [app:proxy-server]\n\
        use = egg:swift#proxy\n\
        account_autocreate = true\n\
        \n\
        [filter:cache]\n\
        use = egg:swift#memcache\n\
        memcache_servers = {memcache}\n\
        \n\
        [filter:catch_errors]\n\
        use = egg:swift#catch_errors\n\
        \n\
        [filter:proxy-logging]\n\
        use = egg:swift#proxy_logging\n",
        memcache = options.memcache_servers,
    )
}

fn make_rsyncd_config(options: &StorageConfigOptions) -> String {
    format!(
        "uid = {uid}\n\
        gid = {uid}\n\
        log file = /dev/stdout\n\
        pid file = /var/cache/swift/rsyncd.pid\n\
        address = {bind_ip}\n\
        port = {port}\n\
        \n\
        [account]\n\
        max connections = 2\n\
        path = {devices}/\n\
        read only = false\n\
        lock file = /var/cache/swift/account.lock\n\
        \n\
        [container]\n\
        max connections = 4\n\
        path = {devices}/\n\
        read only = false\n\
        lock file = /var/cache/swift/container.lock\n\
        \n\
        [object]\n\
        max connections = 8\n\
        path = {devices}/\n\
        read only = false\n\
        lock file = /var/cache/swift/object.lock\n",
        uid = RUN_AS_USER,
        bind_ip = options.bind_ip,
        port = options.rsync_port,
        devices = options.devices_root,
    )
}

fn make_swift_init_script(options: &ScriptOptions) -> String {
    format!(
        "#!/bin/sh\n\
        set -ex\n\
        \n\
        # Merge the generated config, swift.conf and the rings into one directory\n\
        cp -t {merged}/ {defaults}/*\n\
        cp -t {merged}/ {swiftconf}/*\n\
        if [ -d {rings} ]; then\n\
        \x20   for f in {rings}/*; do\n\
        \x20       [ -f \"$f\" ] && tar -xzf \"$f\" -C {merged}/ || true\n\
        \x20   done\n\
        fi\n\
        \n\
        mkdir -p {device}/tmp\n",
        merged = options.merged_config_dir,
        defaults = options.default_config_dir,
        swiftconf = options.swift_conf_dir,
        rings = options.ring_dir,
        device = options.device_dir,
    )
}

fn make_ring_sync_script(options: &ScriptOptions) -> String {
    format!(
        "#!/bin/sh\n\
        set -e\n\
        \n\
        while true; do\n\
        \x20   for f in {rings}/*; do\n\
        \x20       [ -f \"$f\" ] && tar -xzf \"$f\" -C {merged}/ || true\n\
        \x20   done\n\
        \x20   sleep {interval}\n\
        done\n",
        rings = options.ring_dir,
        merged = options.merged_config_dir,
        interval = options.ring_sync_interval_secs,
    )
}
