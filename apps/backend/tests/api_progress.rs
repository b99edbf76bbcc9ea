//! Progress API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL before running. The catalog is shared with other tests,
//! so assertions look at the topics each test creates.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::fixtures;
use common::TestContext;

#[tokio::test]
async fn test_complete_requires_token() {
    let ctx = TestContext::without_database();
    let server = ctx.server();

    let response = server
        .post("/api/user/progress/complete")
        .json(&fixtures::completion("t1", "l1", 90.0))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_complete_rejects_negative_score() {
    let ctx = TestContext::without_database();
    let server = ctx.server();

    let response = server
        .post("/api/user/progress/complete")
        .add_header(AUTHORIZATION, TestContext::auth_header_value("alice"))
        .json(&fixtures::completion("t1", "l1", -5.0))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_user_progress_counts_own_completions() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let topic_id = fixtures::unique_topic_id("progress");
    let alice = fixtures::unique_uid("alice");

    server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&topic_id, 4))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/user/progress/complete")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
        .json(&fixtures::completion(&topic_id, "l1", 80.0))
        .await;
    response.assert_status_ok();
    let owned: serde_json::Value = response.json();
    assert_eq!(owned["userId"], alice.as_str());
    assert_eq!(owned["lastAccessedTopic"], topic_id.as_str());
    assert_eq!(owned["completedLessons"].as_array().unwrap().len(), 1);

    let report: serde_json::Value = server.get(&format!("/api/progress/{alice}")).await.json();
    let entry = fixtures::topic_entry(&report, &topic_id);
    assert_eq!(entry["totalLessons"], 4);
    assert_eq!(entry["completedLessons"], 1);
    assert_eq!(entry["progressPercentage"], 25);
    assert_eq!(entry["completed"], false);
    assert_eq!(report["userId"], alice.as_str());

    ctx.cleanup_user(&alice).await;
    ctx.cleanup_topic(&topic_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_completing_every_lesson_completes_topic() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let topic_id = fixtures::unique_topic_id("full");
    let alice = fixtures::unique_uid("alice");

    server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&topic_id, 2))
        .await;

    for lesson_id in ["l1", "l2", "l1"] {
        server
            .post("/api/user/progress/complete")
            .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
            .json(&fixtures::completion(&topic_id, lesson_id, 100.0))
            .await
            .assert_status_ok();
    }

    let report: serde_json::Value = server.get(&format!("/api/progress/{alice}")).await.json();
    let entry = fixtures::topic_entry(&report, &topic_id);
    assert_eq!(entry["completedLessons"], 2);
    assert_eq!(entry["progressPercentage"], 100);
    assert_eq!(entry["completed"], true);

    ctx.cleanup_user(&alice).await;
    ctx.cleanup_topic(&topic_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_other_users_completions_do_not_count() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let topic_id = fixtures::unique_topic_id("isolation");
    let alice = fixtures::unique_uid("alice");
    let bob = fixtures::unique_uid("bob");

    let created: serde_json::Value = server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&topic_id, 2))
        .await
        .json();
    server
        .post("/api/user/progress/complete")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
        .json(&fixtures::completion(&topic_id, "l1", 70.0))
        .await
        .assert_status_ok();

    let report: serde_json::Value = server.get(&format!("/api/progress/{bob}")).await.json();
    let entry = fixtures::topic_entry(&report, &topic_id);
    assert_eq!(entry["completedLessons"], 0);
    assert_eq!(entry["progressPercentage"], 0);

    let catalog: serde_json::Value = server.get("/api/topics/progress").await.json();
    let entry = fixtures::topic_entry(&catalog, &topic_id);
    assert_eq!(entry["completedLessons"], 1);
    assert_eq!(entry["progressPercentage"], 50);

    let topic: serde_json::Value = server
        .get(&format!("/api/topics/{}", created["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(topic["progress"], 50);

    ctx.cleanup_user(&alice).await;
    ctx.cleanup_topic(&topic_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_empty_topic_reports_zero_percent() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let topic_id = fixtures::unique_topic_id("empty");

    server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&topic_id, 0))
        .await
        .assert_status(StatusCode::CREATED);

    let catalog: serde_json::Value = server.get("/api/topics/progress").await.json();
    let entry = fixtures::topic_entry(&catalog, &topic_id);
    assert_eq!(entry["totalLessons"], 0);
    assert_eq!(entry["progressPercentage"], 0);

    ctx.cleanup_topic(&topic_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_complete_unknown_lesson_is_not_found() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let topic_id = fixtures::unique_topic_id("unknown");
    let alice = fixtures::unique_uid("alice");

    server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&topic_id, 1))
        .await;

    server
        .post("/api/user/progress/complete")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
        .json(&fixtures::completion(&topic_id, "l9", 50.0))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/api/user/progress/complete")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
        .json(&fixtures::completion("no-such-topic", "l1", 50.0))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup_topic(&topic_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_own_progress_and_reset() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let topic_id = fixtures::unique_topic_id("reset");
    let alice = fixtures::unique_uid("alice");
    let auth = TestContext::auth_header_value(&alice);

    let fresh: serde_json::Value = server
        .get("/api/user/progress")
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(fresh["totalProgress"], 0);
    assert_eq!(fresh["completedLessons"], json!([]));

    server
        .delete("/api/user/progress")
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&topic_id, 1))
        .await;
    server
        .post("/api/user/progress/complete")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&fixtures::completion(&topic_id, "l1", 95.5))
        .await
        .assert_status_ok();

    let reset = server
        .delete("/api/user/progress")
        .add_header(AUTHORIZATION, auth.clone())
        .await;
    reset.assert_status_ok();
    assert_eq!(reset.json::<serde_json::Value>()["reset"], true);

    let report: serde_json::Value = server.get(&format!("/api/progress/{alice}")).await.json();
    assert_eq!(report["completedLessons"], 0);

    ctx.cleanup_topic(&topic_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_deleting_topic_drops_its_completions() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let topic_id = fixtures::unique_topic_id("dropped");
    let alice = fixtures::unique_uid("alice");

    let created: serde_json::Value = server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&topic_id, 1))
        .await
        .json();
    server
        .post("/api/user/progress/complete")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
        .json(&fixtures::completion(&topic_id, "l1", 60.0))
        .await
        .assert_status_ok();

    server
        .delete(&format!("/api/topics/{}", created["id"].as_str().unwrap()))
        .await
        .assert_status_ok();

    let owned: serde_json::Value = server
        .get("/api/user/progress")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
        .await
        .json();
    assert_eq!(owned["completedLessons"], json!([]));

    ctx.cleanup_user(&alice).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_renamed_topic_keeps_completions() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let old_id = fixtures::unique_topic_id("old");
    let new_id = fixtures::unique_topic_id("new");
    let alice = fixtures::unique_uid("alice");

    let created: serde_json::Value = server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&old_id, 1))
        .await
        .json();
    server
        .post("/api/user/progress/complete")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
        .json(&fixtures::completion(&old_id, "l1", 90.0))
        .await
        .assert_status_ok();

    server
        .put(&format!("/api/topics/{}", created["id"].as_str().unwrap()))
        .json(&fixtures::topic_payload(&new_id, 1))
        .await
        .assert_status_ok();
    server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&old_id, 1))
        .await
        .assert_status(StatusCode::CREATED);

    let report: serde_json::Value = server.get(&format!("/api/progress/{alice}")).await.json();
    assert_eq!(fixtures::topic_entry(&report, &new_id)["completedLessons"], 1);
    assert_eq!(fixtures::topic_entry(&report, &old_id)["completedLessons"], 0);

    let owned: serde_json::Value = server
        .get("/api/user/progress")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
        .await
        .json();
    assert_eq!(owned["lastAccessedTopic"], new_id.as_str());
    assert_eq!(owned["completedLessons"][0]["topicId"], new_id.as_str());

    ctx.cleanup_user(&alice).await;
    ctx.cleanup_topic(&old_id).await;
    ctx.cleanup_topic(&new_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_removed_lesson_drops_its_completions() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let topic_id = fixtures::unique_topic_id("trimmed");
    let alice = fixtures::unique_uid("alice");

    let created: serde_json::Value = server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&topic_id, 2))
        .await
        .json();
    let path = format!("/api/topics/{}", created["id"].as_str().unwrap());
    for lesson_id in ["l1", "l2"] {
        server
            .post("/api/user/progress/complete")
            .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
            .json(&fixtures::completion(&topic_id, lesson_id, 75.0))
            .await
            .assert_status_ok();
    }

    // Drop l2, then bring it back.
    server
        .put(&path)
        .json(&fixtures::topic_payload(&topic_id, 1))
        .await
        .assert_status_ok();
    server
        .put(&path)
        .json(&fixtures::topic_payload(&topic_id, 2))
        .await
        .assert_status_ok();

    let report: serde_json::Value = server.get(&format!("/api/progress/{alice}")).await.json();
    let entry = fixtures::topic_entry(&report, &topic_id);
    assert_eq!(entry["completedLessons"], 1);
    assert_eq!(entry["completed"], false);

    ctx.cleanup_user(&alice).await;
    ctx.cleanup_topic(&topic_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_completion_refreshes_record_and_log() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let topic_id = fixtures::unique_topic_id("cached");
    let alice = fixtures::unique_uid("alice");

    server
        .post("/api/topics")
        .json(&fixtures::topic_payload(&topic_id, 3))
        .await;

    let owned: serde_json::Value = server
        .post("/api/user/progress/complete")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&alice))
        .json(&fixtures::completion(&topic_id, "l2", 88.0))
        .await
        .json();

    assert_eq!(owned["lastAccessedTopic"], topic_id.as_str());
    assert!(owned["updatedAt"].is_string());
    assert_eq!(owned["completedLessons"][0]["lessonId"], "l2");
    assert_eq!(owned["completedLessons"][0]["score"], 88.0);

    ctx.cleanup_user(&alice).await;
    ctx.cleanup_topic(&topic_id).await;
}
