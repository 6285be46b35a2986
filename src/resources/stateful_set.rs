// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::common::*;
use crate::swiftstorage_types::SwiftStorage;
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use std::collections::BTreeMap;

const SCRIPTS_DIR: &str = "/usr/local/bin/container-scripts";

pub fn make_stateful_set(swift: &SwiftStorage) -> appsv1::StatefulSet {
    appsv1::StatefulSet {
        metadata: metav1::ObjectMeta {
            name: Some(stateful_set_name(swift)),
            namespace: swift.metadata.namespace.clone(),
            labels: Some(instance_labels(swift)),
            owner_references: make_owner_references(swift),
            ..metav1::ObjectMeta::default()
        },
        spec: Some(appsv1::StatefulSetSpec {
            replicas: Some(swift.spec.replicas),
            service_name: service_name(swift),
            selector: metav1::LabelSelector {
                match_labels: Some(instance_labels(swift)),
                ..metav1::LabelSelector::default()
            },
            template: corev1::PodTemplateSpec {
                metadata: Some(metav1::ObjectMeta {
                    labels: Some(instance_labels(swift)),
                    ..metav1::ObjectMeta::default()
                }),
                spec: Some(make_pod_spec(swift)),
            },
            volume_claim_templates: Some(vec![make_volume_claim_template(swift)]),
            ..appsv1::StatefulSetSpec::default()
        }),
        ..appsv1::StatefulSet::default()
    }
}

fn make_volume_claim_template(swift: &SwiftStorage) -> corev1::PersistentVolumeClaim {
    corev1::PersistentVolumeClaim {
        metadata: metav1::ObjectMeta {
            name: Some(CLAIM_NAME.to_string()),
            labels: Some(instance_labels(swift)),
            ..metav1::ObjectMeta::default()
        },
        spec: Some(corev1::PersistentVolumeClaimSpec {
            storage_class_name: Some(swift.spec.storage_class.clone()),
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(corev1::VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(swift.spec.storage_request.clone()),
                )])),
                ..corev1::VolumeResourceRequirements::default()
            }),
            ..corev1::PersistentVolumeClaimSpec::default()
        }),
        ..corev1::PersistentVolumeClaim::default()
    }
}

fn make_pod_spec(swift: &SwiftStorage) -> corev1::PodSpec {
    corev1::PodSpec {
        service_account_name: Some(SERVICE_ACCOUNT.to_string()),
        security_context: Some(corev1::PodSecurityContext {
            fs_group: Some(RUN_AS_USER),
            fs_group_change_policy: Some("OnRootMismatch".to_string()),
            sysctls: Some(vec![corev1::Sysctl {
                name: "net.ipv4.ip_unprivileged_port_start".to_string(),
                value: RSYNC_PORT.to_string(),
            }]),
            run_as_non_root: Some(true),
            seccomp_profile: Some(corev1::SeccompProfile {
                type_: "RuntimeDefault".to_string(),
                ..corev1::SeccompProfile::default()
            }),
            ..corev1::PodSecurityContext::default()
        }),
        volumes: Some(make_volumes(swift)),
        init_containers: Some(vec![make_container(
            "swift-init",
            &swift.spec.container_image_account,
            &[&format!("{}/swift-init.sh", SCRIPTS_DIR)],
            None,
            true,
        )]),
        containers: make_containers(swift),
        ..corev1::PodSpec::default()
    }
}

/// The fixed process set of one storage replica, in start order.
fn make_containers(swift: &SwiftStorage) -> Vec<corev1::Container> {
    let spec = &swift.spec;
    let mut containers = Vec::new();
    for (role, image, port) in [
        ("account", &spec.container_image_account, ACCOUNT_SERVER_PORT),
        ("container", &spec.container_image_container, CONTAINER_SERVER_PORT),
        ("object", &spec.container_image_object, OBJECT_SERVER_PORT),
    ] {
        // Accounts are reaped; containers and objects push updates instead.
        let daemons: [&str; 4] = if role == "account" {
            ["server", "replicator", "auditor", "reaper"]
        } else {
            ["server", "replicator", "auditor", "updater"]
        };
        for daemon in daemons {
            let config = format!("/etc/swift/{}-server.conf", role);
            containers.push(make_container(
                &format!("{}-{}", role, daemon),
                image,
                &[&format!("/usr/bin/swift-{}-{}", role, daemon), &config, "-v"],
                (daemon == "server").then(|| (role, port)),
                true,
            ));
        }
    }
    containers.push(make_container(
        "object-expirer",
        &spec.container_image_proxy,
        &[
            "/usr/bin/swift-object-expirer",
            "/etc/swift/object-expirer.conf",
            "-v",
        ],
        None,
        true,
    ));
    containers.push(make_container(
        "rsync",
        &spec.container_image_object,
        &[
            "/usr/bin/rsync",
            "--daemon",
            "--no-detach",
            "--config=/etc/swift/rsyncd.conf",
            "--log-file=/dev/stdout",
        ],
        Some(("rsync", RSYNC_PORT)),
        true,
    ));
    containers.push(make_container(
        "memcached",
        &spec.container_image_memcached,
        &[
            "/usr/bin/memcached",
            "-p",
            &MEMCACHED_PORT.to_string(),
            "-u",
            "memcached",
        ],
        Some(("memcached", MEMCACHED_PORT)),
        false,
    ));
    containers.push(make_container(
        "ring-sync",
        &spec.container_image_proxy,
        &[&format!("{}/ring-sync.sh", SCRIPTS_DIR)],
        None,
        true,
    ));
    containers
}

fn make_container(
    name: &str,
    image: &str,
    command: &[&str],
    port: Option<(&str, i32)>,
    mount_volumes: bool,
) -> corev1::Container {
    corev1::Container {
        name: name.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        command: Some(command.iter().map(|arg| arg.to_string()).collect()),
        ports: port.map(|(port_name, container_port)| {
            vec![corev1::ContainerPort {
                name: Some(port_name.to_string()),
                container_port,
                ..corev1::ContainerPort::default()
            }]
        }),
        security_context: Some(make_security_context()),
        volume_mounts: mount_volumes.then(make_volume_mounts),
        ..corev1::Container::default()
    }
}

fn make_security_context() -> corev1::SecurityContext {
    corev1::SecurityContext {
        run_as_user: Some(RUN_AS_USER),
        run_as_group: Some(RUN_AS_USER),
        allow_privilege_escalation: Some(false),
        capabilities: Some(corev1::Capabilities {
            drop: Some(vec!["ALL".to_string()]),
            ..corev1::Capabilities::default()
        }),
        ..corev1::SecurityContext::default()
    }
}

fn make_volumes(swift: &SwiftStorage) -> Vec<corev1::Volume> {
    vec![
        corev1::Volume {
            name: CLAIM_NAME.to_string(),
            persistent_volume_claim: Some(corev1::PersistentVolumeClaimVolumeSource {
                claim_name: CLAIM_NAME.to_string(),
                ..corev1::PersistentVolumeClaimVolumeSource::default()
            }),
            ..corev1::Volume::default()
        },
        make_config_map_volume("config-data", config_data_name(swift), None),
        corev1::Volume {
            name: "swiftconf".to_string(),
            secret: Some(corev1::SecretVolumeSource {
                secret_name: Some(swift.spec.swift_conf_secret.clone()),
                ..corev1::SecretVolumeSource::default()
            }),
            ..corev1::Volume::default()
        },
        make_config_map_volume("ring-data", RING_CONFIG_MAP_NAME.to_string(), None),
        make_empty_dir_volume("config-data-merged"),
        make_empty_dir_volume("cache"),
        make_config_map_volume("scripts", scripts_name(swift), Some(0o755)),
    ]
}

fn make_config_map_volume(name: &str, config_map: String, mode: Option<i32>) -> corev1::Volume {
    corev1::Volume {
        name: name.to_string(),
        config_map: Some(corev1::ConfigMapVolumeSource {
            name: Some(config_map),
            default_mode: mode,
            ..corev1::ConfigMapVolumeSource::default()
        }),
        ..corev1::Volume::default()
    }
}

fn make_empty_dir_volume(name: &str) -> corev1::Volume {
    corev1::Volume {
        name: name.to_string(),
        empty_dir: Some(corev1::EmptyDirVolumeSource::default()),
        ..corev1::Volume::default()
    }
}

fn make_volume_mounts() -> Vec<corev1::VolumeMount> {
    [
        (CLAIM_NAME, "/srv/node/d1", false),
        ("config-data", "/var/lib/config-data/default", true),
        ("swiftconf", "/var/lib/config-data/swiftconf", true),
        ("ring-data", "/var/lib/config-data/rings", true),
        ("config-data-merged", "/etc/swift", false),
        ("cache", "/var/cache/swift", false),
        ("scripts", SCRIPTS_DIR, true),
    ]
    .into_iter()
    .map(|(name, mount_path, read_only)| corev1::VolumeMount {
        name: name.to_string(),
        mount_path: mount_path.to_string(),
        read_only: Some(read_only),
        ..corev1::VolumeMount::default()
    })
    .collect()
}
