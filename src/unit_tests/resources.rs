// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use super::*;
use crate::capacity::{Device, DeviceManifest};
use crate::common::*;
use crate::platform::stateful_set_drifted;
use crate::resources::{config_map::*, network_policy::*, service::*, stateful_set::*};
use k8s_openapi::api::apps::v1::StatefulSetStatus;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

fn container_names(swift: &SwiftStorage) -> Vec<String> {
    make_stateful_set(swift)
        .spec
        .unwrap()
        .template
        .spec
        .unwrap()
        .containers
        .into_iter()
        .map(|c| c.name)
        .collect()
}

fn container_command(swift: &SwiftStorage, name: &str) -> Vec<String> {
    make_stateful_set(swift)
        .spec
        .unwrap()
        .template
        .spec
        .unwrap()
        .containers
        .into_iter()
        .find(|c| c.name == name)
        .unwrap()
        .command
        .unwrap()
}

#[test]
pub fn test_headless_service_ports() {
    let swift = make_swift("alpha", 1);
    let service = make_headless_service(&swift);
    assert_eq!(service.metadata.name, Some("alpha".to_string()));
    assert_eq!(service.metadata.owner_references.unwrap()[0].uid, "alpha-uid");

    let spec = service.spec.unwrap();
    assert_eq!(spec.cluster_ip, Some("None".to_string()));
    assert_eq!(spec.selector, Some(instance_labels(&swift)));
    let ports: Vec<(String, i32)> = spec
        .ports
        .unwrap()
        .into_iter()
        .map(|p| (p.name.unwrap(), p.port))
        .collect();
    assert_eq!(
        ports,
        vec![
            ("account".to_string(), 6202),
            ("container".to_string(), 6201),
            ("object".to_string(), 6200),
            ("rsync".to_string(), 873),
        ]
    );
}

#[test]
pub fn test_network_policy_rules() {
    let swift = make_swift("alpha", 1);
    let policy = make_network_policy(&swift);
    assert_eq!(policy.metadata.name, Some("np-alpha".to_string()));

    let spec = policy.spec.unwrap();
    assert_eq!(spec.pod_selector.match_labels, Some(storage_labels()));
    let rules = spec.ingress.unwrap();
    assert_eq!(rules.len(), 2);

    let rule_ports = |i: usize| -> Vec<IntOrString> {
        rules[i]
            .ports
            .clone()
            .unwrap()
            .into_iter()
            .map(|p| p.port.unwrap())
            .collect()
    };
    let rule_source = |i: usize| rules[i].from.clone().unwrap()[0].pod_selector.clone().unwrap();

    assert_eq!(rule_source(0).match_labels, Some(storage_labels()));
    assert_eq!(
        rule_ports(0),
        vec![
            IntOrString::Int(6202),
            IntOrString::Int(6201),
            IntOrString::Int(6200),
            IntOrString::Int(873),
        ]
    );
    // Proxies never reach rsync.
    assert_eq!(rule_source(1).match_labels, Some(proxy_labels()));
    assert_eq!(
        rule_ports(1),
        vec![
            IntOrString::Int(6202),
            IntOrString::Int(6201),
            IntOrString::Int(6200),
        ]
    );
}

#[test]
pub fn test_stateful_set_container_order() {
    let swift = make_swift("alpha", 1);
    assert_eq!(
        container_names(&swift),
        vec![
            "account-server",
            "account-replicator",
            "account-auditor",
            "account-reaper",
            "container-server",
            "container-replicator",
            "container-auditor",
            "container-updater",
            "object-server",
            "object-replicator",
            "object-auditor",
            "object-updater",
            "object-expirer",
            "rsync",
            "memcached",
            "ring-sync",
        ]
    );
}

#[test]
pub fn test_auditor_and_updater_run_their_own_daemons() {
    let swift = make_swift("alpha", 1);
    assert_eq!(
        container_command(&swift, "container-auditor"),
        vec![
            "/usr/bin/swift-container-auditor",
            "/etc/swift/container-server.conf",
            "-v"
        ]
    );
    assert_eq!(
        container_command(&swift, "container-updater"),
        vec![
            "/usr/bin/swift-container-updater",
            "/etc/swift/container-server.conf",
            "-v"
        ]
    );
    assert_eq!(
        container_command(&swift, "object-updater")[0],
        "/usr/bin/swift-object-updater"
    );
    assert_eq!(
        container_command(&swift, "account-reaper")[0],
        "/usr/bin/swift-account-reaper"
    );
}

#[test]
pub fn test_stateful_set_spec() {
    let mut swift = make_swift("alpha", 3);
    swift.spec.storage_class = "fast".to_string();
    swift.spec.storage_request = "20Gi".to_string();
    swift.spec.container_image_object = "registry/object:1".to_string();
    let sts = make_stateful_set(&swift);
    assert_eq!(sts.metadata.name, Some("alpha".to_string()));

    let spec = sts.spec.unwrap();
    assert_eq!(spec.replicas, Some(3));
    assert_eq!(spec.service_name, "alpha");
    assert_eq!(spec.selector.match_labels, Some(instance_labels(&swift)));

    let claim = &spec.volume_claim_templates.unwrap()[0];
    assert_eq!(claim.metadata.name, Some("swift".to_string()));
    let claim_spec = claim.spec.clone().unwrap();
    assert_eq!(claim_spec.storage_class_name, Some("fast".to_string()));
    assert_eq!(
        claim_spec.resources.unwrap().requests.unwrap()["storage"].0,
        "20Gi"
    );

    let pod = spec.template.spec.unwrap();
    assert_eq!(pod.service_account_name, Some("swift-swift".to_string()));
    assert_eq!(pod.init_containers.unwrap()[0].name, "swift-init");
    let rsync = pod.containers.iter().find(|c| c.name == "rsync").unwrap();
    assert_eq!(rsync.image, Some("registry/object:1".to_string()));
    assert_eq!(rsync.ports.clone().unwrap()[0].container_port, 873);
    let memcached = pod.containers.iter().find(|c| c.name == "memcached").unwrap();
    assert_eq!(memcached.volume_mounts, None);
}

#[test]
pub fn test_generators_are_deterministic() {
    let swift = make_swift("alpha", 2);
    assert_eq!(make_stateful_set(&swift), make_stateful_set(&swift));
    assert_eq!(make_config_data_configmap(&swift), make_config_data_configmap(&swift));
    assert_eq!(make_network_policy(&swift), make_network_policy(&swift));
}

#[test]
pub fn test_config_bundle_keys() {
    let swift = make_swift("alpha", 1);
    let config_data = make_config_data_configmap(&swift);
    assert_eq!(config_data.metadata.name, Some("alpha-config-data".to_string()));
    let data = config_data.data.unwrap();
    let keys: Vec<&str> = data.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "account-server.conf",
            "container-server.conf",
            "internal-client.conf",
            "object-expirer.conf",
            "object-server.conf",
            "rsyncd.conf",
        ]
    );
    assert!(data["object-server.conf"].contains("bind_port = 6200\n"));
    assert!(data["rsyncd.conf"].contains("port = 873\n"));

    let scripts = make_scripts_configmap(&swift);
    assert_eq!(scripts.metadata.name, Some("alpha-scripts".to_string()));
    assert!(scripts.data.unwrap().contains_key("ring-sync.sh"));
}

#[test]
pub fn test_device_configmap() {
    let swift = make_swift("alpha", 1);
    let devices = DeviceManifest {
        devices: vec![Device {
            host: "alpha-0.alpha".to_string(),
            device: "d1".to_string(),
            capacity_gb: 10,
        }],
    };
    let config_map = make_device_configmap(&swift, &devices);
    assert_eq!(
        config_map.metadata.name,
        Some("swift-storage-config-data".to_string())
    );
    assert_eq!(
        config_map.data.unwrap()["devices.csv"],
        "alpha-0.alpha,d1,10\n"
    );
}

#[test]
pub fn test_image_defaults_fill_only_unset_images() {
    let mut spec = SwiftStorageSpec::default();
    spec.container_image_proxy = "registry/proxy:pinned".to_string();
    let spec = spec.with_image_defaults(&image_defaults());
    assert_eq!(spec.container_image_account, "registry/swift-account:test");
    assert_eq!(spec.container_image_memcached, "registry/memcached:test");
    assert_eq!(spec.container_image_proxy, "registry/proxy:pinned");
}

#[test]
pub fn test_storage_endpoints() {
    let swift = make_swift("alpha", 1);
    let endpoints = storage_endpoints(&swift);
    assert_eq!(endpoints.len(), 4);
    assert_eq!(endpoints["object"], "alpha.openstack.svc:6200");
    assert_eq!(endpoints["rsync"], "alpha.openstack.svc:873");
}

#[test]
pub fn test_stateful_set_drift_ignores_server_fields() {
    let swift = make_swift("alpha", 3);
    let desired = make_stateful_set(&swift);

    let mut live = desired.clone();
    live.metadata.resource_version = Some("42".to_string());
    let spec = live.spec.as_mut().unwrap();
    spec.revision_history_limit = Some(10);
    spec.pod_management_policy = Some("OrderedReady".to_string());
    live.status = Some(StatefulSetStatus {
        ready_replicas: Some(1),
        ..StatefulSetStatus::default()
    });
    assert!(!stateful_set_drifted(&live, &desired));

    let mut scaled = live.clone();
    scaled.spec.as_mut().unwrap().replicas = Some(2);
    assert!(stateful_set_drifted(&scaled, &desired));

    let mut retagged = live.clone();
    retagged
        .spec
        .as_mut()
        .unwrap()
        .template
        .spec
        .as_mut()
        .unwrap()
        .containers[0]
        .image = Some("registry/swift-account:old".to_string());
    assert!(stateful_set_drifted(&retagged, &desired));
}
