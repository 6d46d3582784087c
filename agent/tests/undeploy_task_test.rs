//! Undeploy task handler tests

mod common;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use uuid::Uuid;

use satgent::cache::local::{LocalDeployment, LocalDeployments};
use satgent::models::deployment::DeploymentStatus;
use satgent::models::task::TaskStatus;
use satgent::tasks::undeploy::{UndeployTask, REASON_CONTAINER_REMOVAL, REASON_RECORD_DELETE};
use satgent::tasks::TaskHandler;

use common::{make_deployment, parse_task, task_doc, MockPlatform, MockRuntime};

struct Harness {
    platform: Arc<MockPlatform>,
    runtime: Arc<MockRuntime>,
    local: Arc<LocalDeployments>,
    task: UndeployTask,
}

fn harness() -> Harness {
    let platform = Arc::new(MockPlatform::new());
    let runtime = Arc::new(MockRuntime::new());
    let local = Arc::new(LocalDeployments::new());
    let task = UndeployTask::new(platform.clone(), runtime.clone(), local.clone());
    Harness {
        platform,
        runtime,
        local,
        task,
    }
}

fn track_locally(local: &LocalDeployments, deployment_id: Uuid) {
    local.insert(LocalDeployment {
        deployment_id,
        dynamic_attributes: HashMap::new(),
        manifest: None,
        openapi_schema: None,
    });
}

#[tokio::test]
async fn test_undeploy_with_running_container() {
    let h = harness();
    let deployment_id = Uuid::new_v4();
    let artifact_id = Uuid::new_v4();

    h.platform
        .insert_deployment(make_deployment(deployment_id, artifact_id));
    h.runtime.set_remove_result(true, Some(artifact_id));
    track_locally(&h.local, deployment_id);

    let raw = task_doc("undeploy", deployment_id);
    let task = parse_task(&raw);
    h.task.run(&task).await.unwrap();

    assert_eq!(
        h.platform.statuses_for(task.id),
        vec![TaskStatus::Running, TaskStatus::Done]
    );
    assert_eq!(*h.runtime.removed.lock().unwrap(), vec![deployment_id]);
    assert_eq!(
        *h.platform.deleted_deployments.lock().unwrap(),
        vec![deployment_id]
    );
    assert!(h.local.get(deployment_id).is_none());

    // Cache cleanup ran for the recovered artifact id
    assert_eq!(*h.runtime.cleanups.lock().unwrap(), vec![artifact_id]);

    // Result payload reports the container was actually removed
    let updates = h.platform.task_updates.lock().unwrap();
    let (_, _, result) = updates.last().unwrap();
    assert_eq!(result.as_ref().unwrap()["container_removed"], true);
}

#[tokio::test]
async fn test_undeploy_absent_container_is_idempotent() {
    let h = harness();
    let deployment_id = Uuid::new_v4();

    h.platform
        .insert_deployment(make_deployment(deployment_id, Uuid::new_v4()));
    h.runtime.set_remove_result(false, None);
    track_locally(&h.local, deployment_id);

    let raw = task_doc("undeploy", deployment_id);
    let task = parse_task(&raw);
    h.task.run(&task).await.unwrap();

    assert_eq!(
        h.platform.statuses_for(task.id),
        vec![TaskStatus::Running, TaskStatus::Done]
    );
    assert!(h.local.get(deployment_id).is_none());
    // No artifact id recoverable, so no cache cleanup
    assert!(h.runtime.cleanups.lock().unwrap().is_empty());

    let updates = h.platform.task_updates.lock().unwrap();
    let (_, _, result) = updates.last().unwrap();
    assert_eq!(result.as_ref().unwrap()["container_removed"], false);
}

#[tokio::test]
async fn test_undeploy_removal_failure_keeps_everything() {
    let h = harness();
    let deployment_id = Uuid::new_v4();

    h.platform
        .insert_deployment(make_deployment(deployment_id, Uuid::new_v4()));
    h.runtime.fail_remove.store(true, Ordering::SeqCst);
    track_locally(&h.local, deployment_id);

    let raw = task_doc("undeploy", deployment_id);
    let task = parse_task(&raw);
    h.task.run(&task).await.unwrap();

    assert_eq!(
        h.platform.failure_reason(task.id).unwrap(),
        REASON_CONTAINER_REMOVAL
    );
    let patch = h.platform.last_patch(deployment_id).unwrap();
    assert_eq!(patch.status, Some(DeploymentStatus::DeletionFailed));

    // Nothing was torn down; the platform can retry the whole undeploy
    assert!(h.platform.deleted_deployments.lock().unwrap().is_empty());
    assert!(h.local.get(deployment_id).is_some());
}

#[tokio::test]
async fn test_undeploy_record_delete_failure_reports_gap() {
    let h = harness();
    let deployment_id = Uuid::new_v4();
    let artifact_id = Uuid::new_v4();

    h.platform
        .insert_deployment(make_deployment(deployment_id, artifact_id));
    h.runtime.set_remove_result(true, Some(artifact_id));
    h.platform.fail_delete_deployment.store(true, Ordering::SeqCst);
    track_locally(&h.local, deployment_id);

    let raw = task_doc("undeploy", deployment_id);
    let task = parse_task(&raw);
    h.task.run(&task).await.unwrap();

    // Container is gone but the remote record remains: surfaced as
    // deletion_failed, not hidden
    assert_eq!(*h.runtime.removed.lock().unwrap(), vec![deployment_id]);
    assert_eq!(
        h.platform.failure_reason(task.id).unwrap(),
        REASON_RECORD_DELETE
    );
    let patch = h.platform.last_patch(deployment_id).unwrap();
    assert_eq!(patch.status, Some(DeploymentStatus::DeletionFailed));

    // Local state and cache are untouched until the retry succeeds
    assert!(h.local.get(deployment_id).is_some());
    assert!(h.runtime.cleanups.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_undeploy_skips_cache_cleanup_when_artifact_in_use() {
    let h = harness();
    let deployment_id = Uuid::new_v4();
    let artifact_id = Uuid::new_v4();

    h.platform
        .insert_deployment(make_deployment(deployment_id, artifact_id));
    h.runtime.set_remove_result(true, Some(artifact_id));
    h.runtime.in_use.store(true, Ordering::SeqCst);

    let raw = task_doc("undeploy", deployment_id);
    let task = parse_task(&raw);
    h.task.run(&task).await.unwrap();

    // Undeploy still succeeds; only the shared cache entry is kept
    assert_eq!(
        h.platform.statuses_for(task.id),
        vec![TaskStatus::Running, TaskStatus::Done]
    );
    assert!(h.runtime.cleanups.lock().unwrap().is_empty());
}
