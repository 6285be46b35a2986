// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("MissingObjectKey: {0}")]
    MissingObjectKey(&'static str),
    #[error("Failed to get SwiftStorage: {0}")]
    GetSwiftStorageFailed(#[source] kube::Error),
    #[error("Failed to restore SwiftStorage replicas: {0}")]
    UpdateReplicasFailed(#[source] kube::Error),
    #[error("Failed to update SwiftStorage status: {0}")]
    UpdateStatusFailed(#[source] kube::Error),
    #[error("Failed to reconcile ConfigMap: {0}")]
    ReconcileConfigMapFailed(#[source] kube::Error),
    #[error("Failed to get ring ConfigMap: {0}")]
    GetRingConfigMapFailed(#[source] kube::Error),
    #[error("Failed to reconcile Service: {0}")]
    ReconcileServiceFailed(#[source] kube::Error),
    #[error("Failed to reconcile NetworkPolicy: {0}")]
    ReconcileNetworkPolicyFailed(#[source] kube::Error),
    #[error("Failed to get StatefulSet: {0}")]
    GetStatefulSetFailed(#[source] kube::Error),
    #[error("Failed to reconcile StatefulSet: {0}")]
    ReconcileStatefulSetFailed(#[source] kube::Error),
    #[error("Failed to get PersistentVolumeClaim {name}: {source}")]
    GetClaimFailed {
        name: String,
        #[source]
        source: kube::Error,
    },
    #[error("PersistentVolumeClaim {0} not found")]
    ClaimNotFound(String),
    #[error("PersistentVolumeClaim {0} is not bound")]
    ClaimNotBound(String),
    #[error("Invalid quantity {0:?}")]
    InvalidQuantity(String),
}

pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(
        err,
        kube_client::Error::Api(kube_core::ErrorResponse { reason, code, .. })
            if reason == "NotFound" || *code == 404
    )
}
