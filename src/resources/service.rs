// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::common::*;
use crate::swiftstorage_types::SwiftStorage;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

/// The headless service gives each storage replica a stable domain name.
/// The memcached port stays pod-local and is not published here.
pub fn make_headless_service(swift: &SwiftStorage) -> corev1::Service {
    corev1::Service {
        metadata: metav1::ObjectMeta {
            name: Some(service_name(swift)),
            namespace: swift.metadata.namespace.clone(),
            labels: Some(instance_labels(swift)),
            owner_references: make_owner_references(swift),
            ..metav1::ObjectMeta::default()
        },
        spec: Some(corev1::ServiceSpec {
            cluster_ip: Some("None".to_string()),
            selector: Some(instance_labels(swift)),
            ports: Some(vec![
                make_service_port("account", ACCOUNT_SERVER_PORT),
                make_service_port("container", CONTAINER_SERVER_PORT),
                make_service_port("object", OBJECT_SERVER_PORT),
                make_service_port("rsync", RSYNC_PORT),
            ]),
            ..corev1::ServiceSpec::default()
        }),
        ..corev1::Service::default()
    }
}

fn make_service_port(name: &str, port: i32) -> corev1::ServicePort {
    corev1::ServicePort {
        name: Some(name.to_string()),
        port,
        target_port: Some(IntOrString::Int(port)),
        protocol: Some("TCP".to_string()),
        ..corev1::ServicePort::default()
    }
}
