// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
//! One reconcile pass of a SwiftStorage.
//!
//! A pass loads the object, then runs the steps of [`ReconcileStep::ALL`] in
//! order until one of them stops the pass. Every step works on freshly read
//! platform state, and the status is written back once, at the end of the pass.
use crate::capacity::discover_devices;
use crate::common::*;
use crate::conditions::*;
use crate::error::{is_not_found, Error};
use crate::platform::Platform;
use crate::resources::{config_map::*, network_policy::*, service::*, stateful_set::*};
use crate::swiftstorage_types::*;
use chrono::{SubsecRound, Utc};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    InitConditions,
    DeletionGuard,
    EnsureConfigBundle,
    WaitForRingConfig,
    EnsureEndpoint,
    EnsureIsolationPolicy,
    ScaleDownGuard,
    EnsureWorkload,
    ReadinessCheck,
    PublishDeviceManifest,
    MarkReady,
}

impl ReconcileStep {
    pub const ALL: [ReconcileStep; 11] = [
        ReconcileStep::InitConditions,
        ReconcileStep::DeletionGuard,
        ReconcileStep::EnsureConfigBundle,
        ReconcileStep::WaitForRingConfig,
        ReconcileStep::EnsureEndpoint,
        ReconcileStep::EnsureIsolationPolicy,
        ReconcileStep::ScaleDownGuard,
        ReconcileStep::EnsureWorkload,
        ReconcileStep::ReadinessCheck,
        ReconcileStep::PublishDeviceManifest,
        ReconcileStep::MarkReady,
    ];
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a finished pass asks to be scheduled next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The object no longer exists.
    Absent,
    /// The object carries a deletion timestamp; owned objects are garbage collected.
    Terminating,
    /// The workload is not ready yet.
    Progressing,
    Converged,
    RequeueAfter(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    RetryAfter(Duration),
    Done(ReconcileOutcome),
}

/// Everything a pass carries from one step to the next.
pub struct ReconcileState {
    pub swift: SwiftStorage,
    pub conditions: ConditionTracker,
    pub endpoints: BTreeMap<String, String>,
    pub stateful_set: Option<StatefulSet>,
}

impl ReconcileState {
    pub fn new(swift: SwiftStorage, now: Time) -> ReconcileState {
        let status = swift.status.clone().unwrap_or_default();
        ReconcileState {
            swift,
            conditions: ConditionTracker::from_conditions(status.conditions, now),
            endpoints: status.endpoints,
            stateful_set: None,
        }
    }

    fn status(&self) -> SwiftStorageStatus {
        SwiftStorageStatus {
            conditions: self.conditions.conditions().to_vec(),
            endpoints: self.endpoints.clone(),
        }
    }
}

pub struct SwiftStorageReconciler<P> {
    platform: P,
    image_defaults: ImageDefaults,
}

impl<P: Platform> SwiftStorageReconciler<P> {
    pub fn new(platform: P, image_defaults: ImageDefaults) -> SwiftStorageReconciler<P> {
        SwiftStorageReconciler {
            platform,
            image_defaults,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<ReconcileOutcome, Error> {
        let key = format!("{}/{}", namespace, name);
        let swift = match self
            .platform
            .get_swift_storage(namespace, name)
            .await
            .map_err(Error::GetSwiftStorageFailed)?
        {
            Some(swift) => swift,
            None => {
                info!(swiftstorage = %key, "SwiftStorage not found, end reconcile");
                return Ok(ReconcileOutcome::Absent);
            }
        };
        let mut state = self.load(swift);

        let mut outcome = ReconcileOutcome::Converged;
        for step in ReconcileStep::ALL {
            debug!(swiftstorage = %key, %step, "Run step");
            match self.run_step(step, &mut state).await {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::RetryAfter(delay)) => {
                    outcome = ReconcileOutcome::RequeueAfter(delay);
                    break;
                }
                Ok(StepOutcome::Done(done)) => {
                    outcome = done;
                    break;
                }
                Err(err) => {
                    let message = error_message(&err.to_string());
                    for type_ in SWIFT_STORAGE_CONDITIONS {
                        state.conditions.mark_false(
                            type_,
                            ERROR_REASON,
                            ConditionSeverity::Warning,
                            &message,
                        );
                    }
                    if let Err(flush_err) = self.flush(&mut state).await {
                        warn!(swiftstorage = %key, "Failed to record error status: {}", flush_err);
                    }
                    return Err(err);
                }
            }
        }
        if !self.flush(&mut state).await? {
            return Ok(ReconcileOutcome::Absent);
        }
        Ok(outcome)
    }

    /// Builds the pass state from a freshly read object. Unset images are
    /// filled from the defaults in memory only; they are never written back.
    pub fn load(&self, mut swift: SwiftStorage) -> ReconcileState {
        swift.spec = swift.spec.with_image_defaults(&self.image_defaults);
        ReconcileState::new(swift, Time(Utc::now().trunc_subsecs(0)))
    }

    pub async fn run_step(
        &self,
        step: ReconcileStep,
        state: &mut ReconcileState,
    ) -> Result<StepOutcome, Error> {
        match step {
            ReconcileStep::InitConditions => self.init_conditions(state).await,
            ReconcileStep::DeletionGuard => Ok(deletion_guard(state)),
            ReconcileStep::EnsureConfigBundle => self.ensure_config_bundle(state).await,
            ReconcileStep::WaitForRingConfig => self.wait_for_ring_config(state).await,
            ReconcileStep::EnsureEndpoint => self.ensure_endpoint(state).await,
            ReconcileStep::EnsureIsolationPolicy => self.ensure_isolation_policy(state).await,
            ReconcileStep::ScaleDownGuard => self.scale_down_guard(state).await,
            ReconcileStep::EnsureWorkload => self.ensure_workload(state).await,
            ReconcileStep::ReadinessCheck => Ok(readiness_check(state)),
            ReconcileStep::PublishDeviceManifest => self.publish_device_manifest(state).await,
            ReconcileStep::MarkReady => Ok(mark_ready(state)),
        }
    }

    /// Writes the status if it differs from the stored one. Returns false when
    /// the object was deleted in the middle of the pass.
    async fn flush(&self, state: &mut ReconcileState) -> Result<bool, Error> {
        let status = state.status();
        if state.swift.status.as_ref() != Some(&status) {
            match self
                .platform
                .update_swift_storage_status(
                    &swift_namespace(&state.swift),
                    &swift_name(&state.swift),
                    &status,
                )
                .await
            {
                Ok(()) => {}
                Err(err) if is_not_found(&err) => {
                    info!(
                        "SwiftStorage {} is gone, skip status update",
                        swift_name(&state.swift)
                    );
                    return Ok(false);
                }
                Err(err) => return Err(Error::UpdateStatusFailed(err)),
            }
            state.swift.status = Some(status);
        }
        state.conditions.mark_clean();
        Ok(true)
    }

    async fn init_conditions(&self, state: &mut ReconcileState) -> Result<StepOutcome, Error> {
        state.conditions.init(&SWIFT_STORAGE_CONDITIONS);
        // Observers must see every condition type before any other change.
        if state.conditions.is_dirty() && !self.flush(state).await? {
            return Ok(StepOutcome::Done(ReconcileOutcome::Absent));
        }
        Ok(StepOutcome::Continue)
    }

    async fn ensure_config_bundle(&self, state: &mut ReconcileState) -> Result<StepOutcome, Error> {
        for config_map in [
            make_config_data_configmap(&state.swift),
            make_scripts_configmap(&state.swift),
        ] {
            self.platform
                .apply_config_map(config_map)
                .await
                .map_err(Error::ReconcileConfigMapFailed)?;
        }
        Ok(StepOutcome::Continue)
    }

    async fn wait_for_ring_config(&self, state: &mut ReconcileState) -> Result<StepOutcome, Error> {
        let rings = self
            .platform
            .get_config_map(&swift_namespace(&state.swift), RING_CONFIG_MAP_NAME)
            .await
            .map_err(Error::GetRingConfigMapFailed)?;
        match rings {
            Some(_) => Ok(StepOutcome::Continue),
            None => {
                info!(
                    "ConfigMap {} not found, retry in {:?}",
                    RING_CONFIG_MAP_NAME, RING_CONFIG_RETRY
                );
                Ok(StepOutcome::RetryAfter(RING_CONFIG_RETRY))
            }
        }
    }

    async fn ensure_endpoint(&self, state: &mut ReconcileState) -> Result<StepOutcome, Error> {
        self.platform
            .apply_service(make_headless_service(&state.swift))
            .await
            .map_err(Error::ReconcileServiceFailed)?;
        state.endpoints = storage_endpoints(&state.swift);
        Ok(StepOutcome::Continue)
    }

    async fn ensure_isolation_policy(
        &self,
        state: &mut ReconcileState,
    ) -> Result<StepOutcome, Error> {
        self.platform
            .apply_network_policy(make_network_policy(&state.swift))
            .await
            .map_err(Error::ReconcileNetworkPolicyFailed)?;
        Ok(StepOutcome::Continue)
    }

    /// Shrinking the workload would drop replicas that still hold data, so a
    /// lower replica count is overwritten with the live one.
    async fn scale_down_guard(&self, state: &mut ReconcileState) -> Result<StepOutcome, Error> {
        let namespace = swift_namespace(&state.swift);
        let name = swift_name(&state.swift);
        let found = self
            .platform
            .get_stateful_set(&namespace, &stateful_set_name(&state.swift))
            .await
            .map_err(Error::GetStatefulSetFailed)?;
        let live_replicas = found
            .as_ref()
            .and_then(|sts| sts.spec.as_ref())
            .and_then(|spec| spec.replicas);
        if let Some(live_replicas) = live_replicas {
            if live_replicas > state.swift.spec.replicas {
                info!(
                    "Downsizing ({} -> {}) number of replicas not supported",
                    live_replicas, state.swift.spec.replicas
                );
                let mut swift = self
                    .platform
                    .update_swift_storage_replicas(&namespace, &name, live_replicas)
                    .await
                    .map_err(Error::UpdateReplicasFailed)?;
                swift.spec = swift.spec.with_image_defaults(&self.image_defaults);
                state.swift = swift;
            }
        }
        state.stateful_set = found;
        Ok(StepOutcome::Continue)
    }

    async fn ensure_workload(&self, state: &mut ReconcileState) -> Result<StepOutcome, Error> {
        let stateful_set = self
            .platform
            .apply_stateful_set(make_stateful_set(&state.swift))
            .await
            .map_err(Error::ReconcileStatefulSetFailed)?;
        state.stateful_set = Some(stateful_set);
        Ok(StepOutcome::Continue)
    }

    async fn publish_device_manifest(
        &self,
        state: &mut ReconcileState,
    ) -> Result<StepOutcome, Error> {
        let devices = discover_devices(&self.platform, &state.swift).await?;
        self.platform
            .apply_config_map(make_device_configmap(&state.swift, &devices))
            .await
            .map_err(Error::ReconcileConfigMapFailed)?;
        Ok(StepOutcome::Continue)
    }
}

fn deletion_guard(state: &ReconcileState) -> StepOutcome {
    if state.swift.metadata.deletion_timestamp.is_some() {
        info!(
            "SwiftStorage {} is being deleted, leave cleanup to garbage collection",
            swift_name(&state.swift)
        );
        return StepOutcome::Done(ReconcileOutcome::Terminating);
    }
    StepOutcome::Continue
}

fn readiness_check(state: &mut ReconcileState) -> StepOutcome {
    let ready_replicas = state
        .stateful_set
        .as_ref()
        .and_then(|sts| sts.status.as_ref())
        .and_then(|status| status.ready_replicas)
        .unwrap_or(0);
    if ready_replicas == state.swift.spec.replicas {
        return StepOutcome::Continue;
    }
    debug!(
        "{} of {} replicas ready",
        ready_replicas, state.swift.spec.replicas
    );
    for type_ in SWIFT_STORAGE_CONDITIONS {
        state
            .conditions
            .mark_unknown(type_, REQUESTED_REASON, DEPLOYMENT_IN_PROGRESS_MESSAGE);
    }
    StepOutcome::Done(ReconcileOutcome::Progressing)
}

fn mark_ready(state: &mut ReconcileState) -> StepOutcome {
    for type_ in SWIFT_STORAGE_CONDITIONS {
        state.conditions.mark_true(type_, READY_MESSAGE);
    }
    StepOutcome::Done(ReconcileOutcome::Converged)
}
