// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
//! Tracking of the SwiftStorage status conditions.
//!
//! A `ConditionTracker` is owned by a single reconcile pass. Phases mark
//! conditions on it, and the driver writes the result back once, at the end
//! of the pass, if anything changed.
use crate::swiftstorage_types::{Condition, ConditionSeverity, ConditionStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

pub const READY_CONDITION: &str = "Ready";
pub const SWIFT_STORAGE_READY_CONDITION: &str = "SwiftStorageReady";

/// Every condition type the storage reconciler reports, primary first.
pub const SWIFT_STORAGE_CONDITIONS: [&str; 2] = [READY_CONDITION, SWIFT_STORAGE_READY_CONDITION];

pub const INIT_REASON: &str = "Init";
pub const REQUESTED_REASON: &str = "Requested";
pub const READY_REASON: &str = "Ready";
pub const ERROR_REASON: &str = "Error";

pub const READY_INIT_MESSAGE: &str = "Setup started";
pub const DEPLOYMENT_IN_PROGRESS_MESSAGE: &str = "Deployment in progress";
pub const READY_MESSAGE: &str = "Setup complete";

pub fn error_message(detail: &str) -> String {
    format!("Error occurred {}", detail)
}

#[derive(Debug, Clone)]
pub struct ConditionTracker {
    conditions: Vec<Condition>,
    now: Time,
    dirty: bool,
}

impl ConditionTracker {
    /// `now` is stamped on every condition whose status changes during this pass.
    pub fn from_conditions(conditions: Vec<Condition>, now: Time) -> ConditionTracker {
        ConditionTracker {
            conditions,
            now,
            dirty: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Adds every missing type in the Unknown state. Existing entries are untouched.
    pub fn init(&mut self, types: &[&str]) {
        for type_ in types {
            if self.get(type_).is_none() {
                self.set(
                    type_,
                    ConditionStatus::Unknown,
                    ConditionSeverity::None,
                    INIT_REASON,
                    READY_INIT_MESSAGE,
                );
            }
        }
    }

    pub fn mark_unknown(&mut self, type_: &str, reason: &str, message: &str) {
        self.set(
            type_,
            ConditionStatus::Unknown,
            ConditionSeverity::None,
            reason,
            message,
        );
    }

    pub fn mark_true(&mut self, type_: &str, message: &str) {
        self.set(
            type_,
            ConditionStatus::True,
            ConditionSeverity::None,
            READY_REASON,
            message,
        );
    }

    pub fn mark_false(
        &mut self,
        type_: &str,
        reason: &str,
        severity: ConditionSeverity,
        message: &str,
    ) {
        self.set(type_, ConditionStatus::False, severity, reason, message);
    }

    pub fn get(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    pub fn is_true(&self, type_: &str) -> bool {
        self.get(type_)
            .map_or(false, |c| c.status == ConditionStatus::True)
    }

    pub fn is_ready(&self) -> bool {
        self.is_true(READY_CONDITION)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn set(
        &mut self,
        type_: &str,
        status: ConditionStatus,
        severity: ConditionSeverity,
        reason: &str,
        message: &str,
    ) {
        let now = self.now.clone();
        match self.conditions.iter_mut().find(|c| c.type_ == type_) {
            Some(existing) => {
                if existing.status == status
                    && existing.severity == severity
                    && existing.reason == reason
                    && existing.message == message
                {
                    return;
                }
                if existing.status != status {
                    existing.last_transition_time = now;
                }
                existing.status = status;
                existing.severity = severity;
                existing.reason = reason.to_string();
                existing.message = message.to_string();
            }
            None => {
                let condition = Condition {
                    type_: type_.to_string(),
                    status,
                    severity,
                    reason: reason.to_string(),
                    message: message.to_string(),
                    last_transition_time: now,
                };
                // Ready always leads so observers find the summary first.
                if type_ == READY_CONDITION {
                    self.conditions.insert(0, condition);
                } else {
                    self.conditions.push(condition);
                }
            }
        }
        self.dirty = true;
    }
}
