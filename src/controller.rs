// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::config::ControllerConfig;
use crate::error::Error;
use crate::platform::{KubePlatform, Platform};
use crate::reconciler::{ReconcileOutcome, SwiftStorageReconciler};
use crate::swiftstorage_types::SwiftStorage;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use kube::{
    api::Api,
    runtime::controller::{Action, Controller},
    runtime::watcher,
    Client,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::*;

// Data we want access to in error/reconcile calls
pub struct Data<P> {
    pub reconciler: SwiftStorageReconciler<P>,
    pub config: ControllerConfig,
    /// Consecutive failed passes per namespace/name.
    failures: Mutex<HashMap<String, u32>>,
}

impl<P: Platform> Data<P> {
    pub fn new(reconciler: SwiftStorageReconciler<P>, config: ControllerConfig) -> Data<P> {
        Data {
            reconciler,
            config,
            failures: Mutex::new(HashMap::new()),
        }
    }

    fn failures(&self) -> std::sync::MutexGuard<'_, HashMap<String, u32>> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Counts one more failure for `key` and returns the delay before the next try.
    pub fn record_failure(&self, key: &str) -> std::time::Duration {
        let mut failures = self.failures();
        let count = failures.entry(key.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        self.config.backoff(*count)
    }

    pub fn reset_failures(&self, key: &str) {
        self.failures().remove(key);
    }

    pub fn action_for(&self, outcome: ReconcileOutcome) -> Action {
        match outcome {
            // A rollout is followed through the StatefulSet status events.
            ReconcileOutcome::Absent
            | ReconcileOutcome::Terminating
            | ReconcileOutcome::Progressing
            | ReconcileOutcome::Converged => Action::await_change(),
            ReconcileOutcome::RequeueAfter(delay) => Action::requeue(delay),
        }
    }
}

fn object_key(swift: &SwiftStorage) -> String {
    format!(
        "{}/{}",
        swift.metadata.namespace.as_deref().unwrap_or_default(),
        swift.metadata.name.as_deref().unwrap_or_default()
    )
}

/// Controller triggers this whenever our main object or our children changed
pub async fn reconcile<P: Platform>(
    swift_from_cache: Arc<SwiftStorage>,
    ctx: Arc<Data<P>>,
) -> Result<Action, Error> {
    let name = swift_from_cache
        .metadata
        .name
        .as_ref()
        .ok_or_else(|| Error::MissingObjectKey(".metadata.name"))?;
    let namespace = swift_from_cache
        .metadata
        .namespace
        .as_ref()
        .ok_or_else(|| Error::MissingObjectKey(".metadata.namespace"))?;

    let outcome = ctx.reconciler.reconcile(namespace, name).await?;
    ctx.reset_failures(&object_key(&swift_from_cache));
    debug!("Reconcile {}/{} ends with {:?}", namespace, name, outcome);
    Ok(ctx.action_for(outcome))
}

/// The controller triggers this on reconcile errors
pub fn error_policy<P: Platform>(
    swift: Arc<SwiftStorage>,
    error: &Error,
    ctx: Arc<Data<P>>,
) -> Action {
    let key = object_key(&swift);
    let delay = ctx.record_failure(&key);
    warn!(
        "Reconcile of {} failed due to error: {}, retry in {:?}",
        key, error, delay
    );
    Action::requeue(delay)
}

pub async fn run_controller(client: Client, config: ControllerConfig) {
    let swifts = Api::<SwiftStorage>::all(client.clone());
    let reconciler =
        SwiftStorageReconciler::new(KubePlatform::new(client.clone()), config.image_defaults());
    let data = Arc::new(Data::new(reconciler, config));

    Controller::new(swifts, watcher::Config::default())
        .owns(Api::<ConfigMap>::all(client.clone()), watcher::Config::default())
        .owns(Api::<Service>::all(client.clone()), watcher::Config::default())
        .owns(Api::<NetworkPolicy>::all(client.clone()), watcher::Config::default())
        .owns(Api::<StatefulSet>::all(client), watcher::Config::default())
        .shutdown_on_signal()
        .run(
            reconcile::<KubePlatform>,
            error_policy::<KubePlatform>,
            data,
        )
        .for_each(|res| async move {
            match res {
                Ok(o) => info!("reconciled {:?}", o),
                Err(e) => warn!("reconcile failed: {}", e),
            }
        })
        .await;
}
