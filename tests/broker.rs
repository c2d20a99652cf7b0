// ABOUTME: Tests for the deployment orchestrator's provision/update/deprovision flow.
// ABOUTME: Uses a recording mock director to assert step ordering and failure handling.

mod support;

use std::os::unix::fs::PermissionsExt;

use dirigent::broker::{Broker, BrokerError};
use dirigent::director::{DirectorErrorKind, OperationState};
use dirigent::params::ResolveError;
use dirigent::types::{BindingId, InstanceId, ParameterSet, PlanId};
use serde_json::json;

use support::{Call, FakeExecutor, MockDirector};

const MANIFEST_TEMPLATE: &str = "\
name: {{deployment_name}}
director_uuid: {{director_uuid}}
instance: {{instance_id}}
memory: {{memory}}
";

async fn test_broker(
    root: &std::path::Path,
    params: Vec<dirigent::config::ParamSpec>,
) -> (Broker<MockDirector, FakeExecutor>, MockDirector) {
    let manifest = support::write_template(&root.join("templates"), "manifest.yml", MANIFEST_TEMPLATE);
    let plan = support::base_plan(&manifest, params);
    let config = support::broker_config(root, "small", plan);

    let director = MockDirector::new();
    let broker = Broker::connect(config, director.clone(), FakeExecutor::succeeding(b"{}"))
        .await
        .expect("broker should connect");
    (broker, director)
}

#[tokio::test]
async fn provision_uploads_stemcell_then_release_then_deploys() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, director) = test_broker(
        dir.path(),
        vec![support::with_default("memory", json!(512))],
    )
    .await;

    let id = InstanceId::new("i-1").unwrap();
    let task = broker
        .provision(&id, &PlanId::new("small").unwrap(), ParameterSet::new())
        .await
        .expect("provision should succeed");

    let manifest_path = dir.path().join("deployments/i-1/manifest.yml");
    assert_eq!(
        director.calls(),
        vec![
            Call::UploadStemcell,
            Call::UploadRelease,
            Call::Deploy(manifest_path.clone()),
        ]
    );
    assert_eq!(task.as_str(), "1");

    // Manifest persisted non-executable with resolved and system parameters.
    let mode = std::fs::metadata(&manifest_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o640);

    let manifest = std::fs::read_to_string(&manifest_path).unwrap();
    assert!(manifest.contains("name: deploymenti-1"));
    assert!(manifest.contains(&format!("director_uuid: {}", support::DIRECTOR_UUID)));
    assert!(manifest.contains("instance: i-1"));
    assert!(manifest.contains("memory: 512"));
}

#[tokio::test]
async fn provision_with_unknown_plan_is_a_request_error() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, director) = test_broker(dir.path(), vec![]).await;

    let err = broker
        .provision(
            &InstanceId::new("i-1").unwrap(),
            &PlanId::new("huge").unwrap(),
            ParameterSet::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::UnknownPlan(_)));
    assert!(director.calls().is_empty());
}

#[tokio::test]
async fn missing_required_parameter_aborts_before_any_director_call() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, director) = test_broker(dir.path(), vec![support::required("memory")]).await;

    let err = broker
        .provision(
            &InstanceId::new("i-1").unwrap(),
            &PlanId::new("small").unwrap(),
            ParameterSet::new(),
        )
        .await
        .unwrap_err();

    match err {
        BrokerError::Resolve(ResolveError::MissingRequiredParameter(name)) => {
            assert_eq!(name, "memory");
        }
        other => panic!("expected MissingRequiredParameter, got {other:?}"),
    }
    assert!(director.calls().is_empty());
    assert!(!dir.path().join("deployments/i-1").exists());
}

#[tokio::test]
async fn release_upload_failure_aborts_deploy_and_keeps_stemcell() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, director) = test_broker(
        dir.path(),
        vec![support::with_default("memory", json!(512))],
    )
    .await;
    director.fail_release_upload();

    let err = broker
        .provision(
            &InstanceId::new("i-1").unwrap(),
            &PlanId::new("small").unwrap(),
            ParameterSet::new(),
        )
        .await
        .unwrap_err();

    match &err {
        BrokerError::Director(e) => assert_eq!(e.kind(), DirectorErrorKind::Http),
        other => panic!("expected director error, got {other:?}"),
    }

    // The stemcell upload happened and is not rolled back; deploy never ran.
    assert_eq!(
        director.calls(),
        vec![Call::UploadStemcell, Call::UploadRelease]
    );

    // The failed provision never registered the instance.
    let status_err = broker.last_operation(&InstanceId::new("i-1").unwrap()).await.unwrap_err();
    assert!(matches!(status_err, BrokerError::InstanceNotFound(_)));
}

#[tokio::test]
async fn update_reuses_the_stored_parameter_set() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, director) = test_broker(dir.path(), vec![support::random("memory")]).await;

    let id = InstanceId::new("i-1").unwrap();
    broker
        .provision(&id, &PlanId::new("small").unwrap(), ParameterSet::new())
        .await
        .unwrap();

    let manifest_path = dir.path().join("deployments/i-1/manifest.yml");
    let first = std::fs::read_to_string(&manifest_path).unwrap();

    let task = broker.update(&id).await.unwrap();
    let second = std::fs::read_to_string(&manifest_path).unwrap();

    // The generated value survives the update unchanged: the stored set is
    // reused, not re-generated.
    assert_eq!(first, second);
    assert_eq!(task.as_str(), "2");
    assert_eq!(director.calls().len(), 6);
}

#[tokio::test]
async fn update_of_unknown_instance_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, _director) = test_broker(dir.path(), vec![]).await;

    let err = broker.update(&InstanceId::new("ghost").unwrap()).await.unwrap_err();
    assert!(matches!(err, BrokerError::InstanceNotFound(_)));
}

#[tokio::test]
async fn deprovision_removes_artifacts_and_deletes_remote_deployment() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, director) = test_broker(dir.path(), vec![support::with_default("memory", json!(512))]).await;

    let id = InstanceId::new("i-1").unwrap();
    broker
        .provision(&id, &PlanId::new("small").unwrap(), ParameterSet::new())
        .await
        .unwrap();
    assert!(dir.path().join("deployments/i-1").exists());

    let task = broker.deprovision(&id).await.unwrap();

    assert!(!dir.path().join("deployments/i-1").exists());
    assert_eq!(
        director.calls().last(),
        Some(&Call::DeleteDeployment("deploymenti-1".to_string()))
    );

    // The registry entry survives deprovision so the deletion task can be
    // polled to completion.
    let state = broker.last_operation(&id).await.unwrap();
    assert_eq!(state, OperationState::Succeeded);
    assert_eq!(
        director.calls().last(),
        Some(&Call::TaskStatus(task.as_str().to_string()))
    );
}

#[tokio::test]
async fn deprovision_with_missing_local_directory_still_deletes_remote() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, director) = test_broker(dir.path(), vec![support::with_default("memory", json!(512))]).await;

    let id = InstanceId::new("i-1").unwrap();
    broker
        .provision(&id, &PlanId::new("small").unwrap(), ParameterSet::new())
        .await
        .unwrap();

    std::fs::remove_dir_all(dir.path().join("deployments/i-1")).unwrap();

    broker.deprovision(&id).await.expect("deprovision should succeed");
    assert_eq!(
        director.calls().last(),
        Some(&Call::DeleteDeployment("deploymenti-1".to_string()))
    );
}

#[tokio::test]
async fn last_operation_maps_task_states() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, director) = test_broker(dir.path(), vec![support::with_default("memory", json!(512))]).await;

    let id = InstanceId::new("i-1").unwrap();
    broker
        .provision(&id, &PlanId::new("small").unwrap(), ParameterSet::new())
        .await
        .unwrap();

    for (wire, expected) in [
        ("queued", OperationState::InProgress),
        ("processing", OperationState::InProgress),
        ("done", OperationState::Succeeded),
        ("fail", OperationState::Failed),
    ] {
        director.set_status(wire);
        assert_eq!(broker.last_operation(&id).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn unrecognized_task_status_propagates_as_protocol_error() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, director) = test_broker(dir.path(), vec![support::with_default("memory", json!(512))]).await;

    let id = InstanceId::new("i-1").unwrap();
    broker
        .provision(&id, &PlanId::new("small").unwrap(), ParameterSet::new())
        .await
        .unwrap();

    director.set_status("cancelling");
    let err = broker.last_operation(&id).await.unwrap_err();
    match err {
        BrokerError::Director(e) => assert_eq!(e.kind(), DirectorErrorKind::UnknownTaskStatus),
        other => panic!("expected UnknownTaskStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn operations_on_distinct_instances_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, _director) = test_broker(dir.path(), vec![support::with_default("memory", json!(512))]).await;

    let id_a = InstanceId::new("i-a").unwrap();
    let id_b = InstanceId::new("i-b").unwrap();
    let plan_a = PlanId::new("small").unwrap();
    let plan_b = PlanId::new("small").unwrap();
    let (a, b) = tokio::join!(
        broker.provision(&id_a, &plan_a, ParameterSet::new()),
        broker.provision(&id_b, &plan_b, ParameterSet::new()),
    );
    a.unwrap();
    b.unwrap();

    assert!(dir.path().join("deployments/i-a/manifest.yml").exists());
    assert!(dir.path().join("deployments/i-b/manifest.yml").exists());
}

#[test]
fn path_escaping_ids_cannot_be_constructed() {
    // Instance and binding ids name artifacts under deployments/<id>/, so
    // values that would escape the workdir are rejected up front.
    assert!(InstanceId::new("../outside").is_err());
    assert!(InstanceId::new("..").is_err());
    assert!(InstanceId::new("").is_err());
    assert!(BindingId::new("../../etc/cron.d/job").is_err());
}

#[tokio::test]
async fn catalog_lists_the_configured_plans() {
    let dir = tempfile::tempdir().unwrap();
    let (broker, _director) = test_broker(dir.path(), vec![]).await;

    let service = broker.catalog();
    assert_eq!(service.id, "test-broker");
    assert!(service.bindable);
    assert!(!service.plan_updatable);
    assert_eq!(service.plans.len(), 1);
    assert_eq!(service.plans[0].id.as_str(), "small");
    assert_eq!(service.plans[0].name, "small");
}
