use serde_json::json;

use super::{scripted, seed_plugin};
use crate::core::execution::{ExecutionStatus, run_plugins};
use crate::core::store::{ExecutionRow, Store, test_store};

async fn pending_execution(store: &Store) -> String {
    store
        .insert_execution(&ExecutionRow {
            tenant_id: "t1".to_string(),
            execution_type: "strategy".to_string(),
            status: "pending".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn failure_does_not_abort_the_loop() {
    let store = test_store().await;
    let execution_id = pending_execution(&store).await;
    let plugins = vec![
        seed_plugin(&store, "crm-sync", "crm.sh", 10).await,
        seed_plugin(&store, "mailer", "fail.sh", 20).await,
        seed_plugin(&store, "report", "report.sh", 5).await,
    ];
    let executor = scripted();

    let summary = run_plugins(&store, executor.as_ref(), "t1", &execution_id, &plugins, &json!({})).await;

    assert_eq!(executor.calls(), vec!["crm-sync", "mailer", "report"]);
    assert_eq!(summary.status, ExecutionStatus::Partial);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.xp_earned, 15);
    assert_eq!(summary.error().unwrap(), "mailer: mailer refused to run");

    let logs = store.list_plugin_logs(&execution_id).await.unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[1].status, "failure");
    assert_eq!(logs[1].xp_earned, 0);
    assert!(logs[1].output.is_none());
    assert!(logs[1].error.as_deref().unwrap().contains("refused"));
    assert_eq!(logs[2].status, "success");
    assert_eq!(logs[2].output.as_ref().unwrap()["step"], 2);
    assert_eq!(logs[0].input.as_ref().unwrap()["execution_id"], execution_id.as_str());
}

#[tokio::test]
async fn all_success_and_all_failure() {
    let store = test_store().await;
    let execution_id = pending_execution(&store).await;
    let ok = vec![
        seed_plugin(&store, "a", "a.sh", 1).await,
        seed_plugin(&store, "b", "b.sh", 2).await,
    ];
    let bad = vec![
        seed_plugin(&store, "c", "fail-c", 1).await,
        seed_plugin(&store, "d", "fail-d", 2).await,
    ];
    let executor = scripted();

    let summary = run_plugins(&store, executor.as_ref(), "t1", &execution_id, &ok, &json!({})).await;
    assert_eq!(summary.status, ExecutionStatus::Success);
    assert_eq!(summary.xp_earned, 3);
    assert!(summary.error().is_none());

    let summary = run_plugins(&store, executor.as_ref(), "t1", &execution_id, &bad, &json!({})).await;
    assert_eq!(summary.status, ExecutionStatus::Failure);
    assert_eq!(summary.xp_earned, 0);
}

#[tokio::test]
async fn empty_plugin_list_is_a_failure() {
    let store = test_store().await;
    let execution_id = pending_execution(&store).await;
    let summary = run_plugins(&store, scripted().as_ref(), "t1", &execution_id, &[], &json!({})).await;
    assert_eq!(summary.status, ExecutionStatus::Failure);
    assert_eq!(summary.output()["total"], 0);
    assert!(store.list_plugin_logs(&execution_id).await.unwrap().is_empty());
}
