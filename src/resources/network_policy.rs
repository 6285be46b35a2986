// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::common::*;
use crate::swiftstorage_types::SwiftStorage;
use k8s_openapi::api::networking::v1 as networkingv1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

/// Storage ports only accept traffic from other storage pods and from the proxies.
/// Replication over rsync is limited to storage peers.
pub fn make_network_policy(swift: &SwiftStorage) -> networkingv1::NetworkPolicy {
    let server_ports = [ACCOUNT_SERVER_PORT, CONTAINER_SERVER_PORT, OBJECT_SERVER_PORT];
    let peer_ports = [
        ACCOUNT_SERVER_PORT,
        CONTAINER_SERVER_PORT,
        OBJECT_SERVER_PORT,
        RSYNC_PORT,
    ];

    networkingv1::NetworkPolicy {
        metadata: metav1::ObjectMeta {
            name: Some(network_policy_name(swift)),
            namespace: swift.metadata.namespace.clone(),
            labels: Some(instance_labels(swift)),
            owner_references: make_owner_references(swift),
            ..metav1::ObjectMeta::default()
        },
        spec: Some(networkingv1::NetworkPolicySpec {
            pod_selector: make_selector(storage_labels()),
            ingress: Some(vec![
                make_ingress_rule(&peer_ports, storage_labels()),
                make_ingress_rule(&server_ports, proxy_labels()),
            ]),
            policy_types: Some(vec!["Ingress".to_string()]),
            ..networkingv1::NetworkPolicySpec::default()
        }),
        ..networkingv1::NetworkPolicy::default()
    }
}

fn make_ingress_rule(
    ports: &[i32],
    from: BTreeMap<String, String>,
) -> networkingv1::NetworkPolicyIngressRule {
    networkingv1::NetworkPolicyIngressRule {
        ports: Some(
            ports
                .iter()
                .map(|port| networkingv1::NetworkPolicyPort {
                    port: Some(IntOrString::Int(*port)),
                    protocol: Some("TCP".to_string()),
                    ..networkingv1::NetworkPolicyPort::default()
                })
                .collect(),
        ),
        from: Some(vec![networkingv1::NetworkPolicyPeer {
            pod_selector: Some(make_selector(from)),
            ..networkingv1::NetworkPolicyPeer::default()
        }]),
    }
}

fn make_selector(labels: BTreeMap<String, String>) -> metav1::LabelSelector {
    metav1::LabelSelector {
        match_labels: Some(labels),
        ..metav1::LabelSelector::default()
    }
}
