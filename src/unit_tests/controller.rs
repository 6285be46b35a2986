// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use super::*;
use crate::config::*;
use crate::controller::*;
use crate::error::Error;
use crate::platform::fake::FakePlatform;
use crate::reconciler::{ReconcileOutcome, SwiftStorageReconciler};
use clap::Parser;
use kube::runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
struct TestCli {
    #[command(flatten)]
    config: ControllerConfig,
}

fn make_data(platform: FakePlatform) -> Arc<Data<FakePlatform>> {
    let config = ControllerConfig::default();
    let reconciler = SwiftStorageReconciler::new(platform, config.image_defaults());
    Arc::new(Data::new(reconciler, config))
}

#[test]
pub fn test_config_flags() {
    let cli = TestCli::parse_from([
        "swift-storage-controller",
        "--account-image",
        "registry/account:2",
        "--backoff-max-secs",
        "30",
    ]);
    assert_eq!(cli.config.account_image, "registry/account:2");
    assert_eq!(cli.config.image_defaults().account, "registry/account:2");
    assert_eq!(cli.config.backoff(10), Duration::from_secs(30));
}

#[test]
pub fn test_backoff_doubles_up_to_the_cap() {
    let config = ControllerConfig::default();
    assert_eq!(config.backoff(1), Duration::from_secs(5));
    assert_eq!(config.backoff(2), Duration::from_secs(10));
    assert_eq!(config.backoff(4), Duration::from_secs(40));
    assert_eq!(config.backoff(7), Duration::from_secs(300));
    assert_eq!(config.backoff(200), Duration::from_secs(300));
}

#[test]
pub fn test_outcome_actions() {
    let data = make_data(FakePlatform::new());
    assert_eq!(data.action_for(ReconcileOutcome::Converged), Action::await_change());
    assert_eq!(data.action_for(ReconcileOutcome::Absent), Action::await_change());
    assert_eq!(
        data.action_for(ReconcileOutcome::Terminating),
        Action::await_change()
    );
    assert_eq!(
        data.action_for(ReconcileOutcome::Progressing),
        Action::await_change()
    );
    assert_eq!(
        data.action_for(ReconcileOutcome::RequeueAfter(Duration::from_secs(5))),
        Action::requeue(Duration::from_secs(5))
    );
}

#[test]
pub fn test_error_policy_backs_off_per_object() {
    let data = make_data(FakePlatform::new());
    let alpha = Arc::new(make_swift("alpha", 1));
    let beta = Arc::new(make_swift("beta", 1));
    let error = Error::ClaimNotFound("swift-alpha-0".to_string());

    assert_eq!(
        error_policy(alpha.clone(), &error, data.clone()),
        Action::requeue(Duration::from_secs(5))
    );
    assert_eq!(
        error_policy(alpha.clone(), &error, data.clone()),
        Action::requeue(Duration::from_secs(10))
    );
    assert_eq!(
        error_policy(beta, &error, data.clone()),
        Action::requeue(Duration::from_secs(5))
    );

    data.reset_failures("openstack/alpha");
    assert_eq!(
        error_policy(alpha, &error, data),
        Action::requeue(Duration::from_secs(5))
    );
}

#[tokio::test]
pub async fn test_reconcile_resets_backoff() {
    let platform = FakePlatform::new();
    platform.insert_swift_storage(make_swift("alpha", 1));
    platform.insert_config_map(ring_config_map());
    let data = make_data(platform);
    let alpha = Arc::new(make_swift("alpha", 1));
    data.record_failure("openstack/alpha");
    data.record_failure("openstack/alpha");

    let action = reconcile(alpha.clone(), data.clone()).await.unwrap();
    assert_eq!(action, Action::requeue(Duration::from_secs(60)));
    assert_eq!(data.record_failure("openstack/alpha"), Duration::from_secs(5));
}

#[tokio::test]
pub async fn test_reconcile_needs_a_namespace() {
    let data = make_data(FakePlatform::new());
    let mut swift = make_swift("alpha", 1);
    swift.metadata.namespace = None;

    match reconcile(Arc::new(swift), data).await {
        Err(Error::MissingObjectKey(key)) => assert_eq!(key, ".metadata.namespace"),
        other => panic!("unexpected result {:?}", other),
    }
}
