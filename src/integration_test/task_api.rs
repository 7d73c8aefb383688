use super::test_util::{authed_request, sign_up, test_router};
use crate::api::test_util::deserialize_body;
use crate::domain::task::{Priority, TaskStatus};
use crate::dto;
use crate::integration_test::test_util;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;
use speculoos::prelude::*;
use tower::ServiceExt;

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn walks_a_task_through_its_full_lifecycle() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_router(db);
        let session = sign_up(&app, "jdoe@example.com", "John Doe", "hunter2hunter2").await;

        // Create
        let create_response = app
            .clone()
            .oneshot(authed_request(
                Method::POST,
                "/api/tasks",
                &session.token,
                Some(json!({
                    "title": "Water the plants",
                    "description": "The ferns dry out quickly",
                    "priority": "high",
                    "due_date": "2026-09-01",
                    "categories": ["home"],
                })),
            ))
            .await
            .expect("The create request should complete");
        assert_eq!(StatusCode::CREATED, create_response.status());

        let created: dto::task::Task = deserialize_body(create_response.into_body()).await;
        assert_that!(created.title).is_equal_to("Water the plants".to_owned());
        assert_that!(created.priority).is_equal_to(Priority::High);
        assert_that!(created.status).is_equal_to(TaskStatus::Pending);
        assert_that!(created.updated_at).is_equal_to(created.created_at);

        // The new task shows up in the listing
        let list_response = app
            .clone()
            .oneshot(authed_request(
                Method::GET,
                "/api/tasks",
                &session.token,
                None,
            ))
            .await
            .expect("The list request should complete");
        assert_eq!(StatusCode::OK, list_response.status());
        let listed: Vec<dto::task::Task> = deserialize_body(list_response.into_body()).await;
        assert_that!(listed).is_equal_to(vec![created.clone()]);

        // Complete it and watch the modification time advance
        let update_response = app
            .clone()
            .oneshot(authed_request(
                Method::PATCH,
                &format!("/api/tasks/{}", created.id),
                &session.token,
                Some(json!({ "status": "completed" })),
            ))
            .await
            .expect("The update request should complete");
        assert_eq!(StatusCode::OK, update_response.status());

        let updated: dto::task::Task = deserialize_body(update_response.into_body()).await;
        assert_that!(updated.status).is_equal_to(TaskStatus::Completed);
        assert_that!(updated.title).is_equal_to(created.title.clone());
        assert_that!(updated.updated_at).is_greater_than(created.updated_at);

        // Delete it
        let delete_response = app
            .clone()
            .oneshot(authed_request(
                Method::DELETE,
                &format!("/api/tasks/{}", created.id),
                &session.token,
                None,
            ))
            .await
            .expect("The delete request should complete");
        assert_eq!(StatusCode::NO_CONTENT, delete_response.status());

        let empty_list_response = app
            .clone()
            .oneshot(authed_request(
                Method::GET,
                "/api/tasks",
                &session.token,
                None,
            ))
            .await
            .expect("The list request should complete");
        let remaining: Vec<dto::task::Task> =
            deserialize_body(empty_list_response.into_body()).await;
        assert_that!(remaining).is_empty();

        // Deleting it again comes up empty
        let second_delete_response = app
            .clone()
            .oneshot(authed_request(
                Method::DELETE,
                &format!("/api/tasks/{}", created.id),
                &session.token,
                None,
            ))
            .await
            .expect("The second delete request should complete");
        assert_eq!(StatusCode::NOT_FOUND, second_delete_response.status());

        let error_body: dto::ErrorBody =
            deserialize_body(second_delete_response.into_body()).await;
        assert_that!(error_body.error_code).is_equal_to("not_found".to_owned());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn tasks_come_back_newest_first() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_router(db);
        let session = sign_up(&app, "jdoe@example.com", "John Doe", "hunter2hunter2").await;

        for title in ["Water the plants", "File taxes", "Buy milk"] {
            let create_response = app
                .clone()
                .oneshot(authed_request(
                    Method::POST,
                    "/api/tasks",
                    &session.token,
                    Some(json!({ "title": title })),
                ))
                .await
                .expect("The create request should complete");
            assert_eq!(StatusCode::CREATED, create_response.status());
        }

        let list_response = app
            .clone()
            .oneshot(authed_request(
                Method::GET,
                "/api/tasks",
                &session.token,
                None,
            ))
            .await
            .expect("The list request should complete");
        let listed: Vec<dto::task::Task> = deserialize_body(list_response.into_body()).await;

        let titles: Vec<&str> = listed.iter().map(|task| task.title.as_str()).collect();
        assert_that!(titles).is_equal_to(vec!["Buy milk", "File taxes", "Water the plants"]);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn a_null_description_clears_while_an_absent_one_keeps() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_router(db);
        let session = sign_up(&app, "jdoe@example.com", "John Doe", "hunter2hunter2").await;

        let create_response = app
            .clone()
            .oneshot(authed_request(
                Method::POST,
                "/api/tasks",
                &session.token,
                Some(json!({
                    "title": "Water the plants",
                    "description": "The ferns dry out quickly",
                })),
            ))
            .await
            .expect("The create request should complete");
        let created: dto::task::Task = deserialize_body(create_response.into_body()).await;

        // A patch that doesn't mention the description leaves it alone
        let retitle_response = app
            .clone()
            .oneshot(authed_request(
                Method::PATCH,
                &format!("/api/tasks/{}", created.id),
                &session.token,
                Some(json!({ "title": "Water all the plants" })),
            ))
            .await
            .expect("The retitle request should complete");
        assert_eq!(StatusCode::OK, retitle_response.status());
        let retitled: dto::task::Task = deserialize_body(retitle_response.into_body()).await;
        assert_that!(retitled.description)
            .is_equal_to(Some("The ferns dry out quickly".to_owned()));

        // An explicit null wipes it
        let clear_response = app
            .clone()
            .oneshot(authed_request(
                Method::PATCH,
                &format!("/api/tasks/{}", created.id),
                &session.token,
                Some(json!({ "description": null })),
            ))
            .await
            .expect("The clearing request should complete");
        assert_eq!(StatusCode::OK, clear_response.status());
        let cleared: dto::task::Task = deserialize_body(clear_response.into_body()).await;
        assert_that!(cleared.description).is_none();
        assert_that!(cleared.title).is_equal_to("Water all the plants".to_owned());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn tasks_are_invisible_across_accounts() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_router(db);
        let owner = sign_up(&app, "jdoe@example.com", "John Doe", "hunter2hunter2").await;
        let other = sign_up(&app, "intruder@example.com", "Not John", "hunter2hunter2").await;

        let create_response = app
            .clone()
            .oneshot(authed_request(
                Method::POST,
                "/api/tasks",
                &owner.token,
                Some(json!({ "title": "Water the plants" })),
            ))
            .await
            .expect("The create request should complete");
        let created: dto::task::Task = deserialize_body(create_response.into_body()).await;

        // The other account can't see the task in a listing...
        let other_list_response = app
            .clone()
            .oneshot(authed_request(
                Method::GET,
                "/api/tasks",
                &other.token,
                None,
            ))
            .await
            .expect("The list request should complete");
        let other_tasks: Vec<dto::task::Task> =
            deserialize_body(other_list_response.into_body()).await;
        assert_that!(other_tasks).is_empty();

        // ...and editing or deleting it looks exactly like it doesn't exist
        let foreign_update_response = app
            .clone()
            .oneshot(authed_request(
                Method::PATCH,
                &format!("/api/tasks/{}", created.id),
                &other.token,
                Some(json!({ "title": "Hijacked" })),
            ))
            .await
            .expect("The foreign update request should complete");
        assert_eq!(StatusCode::NOT_FOUND, foreign_update_response.status());

        let foreign_delete_response = app
            .clone()
            .oneshot(authed_request(
                Method::DELETE,
                &format!("/api/tasks/{}", created.id),
                &other.token,
                None,
            ))
            .await
            .expect("The foreign delete request should complete");
        assert_eq!(StatusCode::NOT_FOUND, foreign_delete_response.status());

        // The same update from the owner sails through
        let owner_update_response = app
            .clone()
            .oneshot(authed_request(
                Method::PATCH,
                &format!("/api/tasks/{}", created.id),
                &owner.token,
                Some(json!({ "title": "Water all the plants" })),
            ))
            .await
            .expect("The owner's update request should complete");
        assert_eq!(StatusCode::OK, owner_update_response.status());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn missing_and_invalid_tokens_are_rejected() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_router(db);

        let anonymous_request = Request::builder()
            .method(Method::GET)
            .uri("/api/tasks")
            .body(Body::empty())
            .expect("Test request should build");
        let anonymous_response = app
            .clone()
            .oneshot(anonymous_request)
            .await
            .expect("The anonymous request should complete");
        assert_eq!(StatusCode::UNAUTHORIZED, anonymous_response.status());
        let missing_token_body: dto::ErrorBody =
            deserialize_body(anonymous_response.into_body()).await;
        assert_that!(missing_token_body.error_code).is_equal_to("token_required".to_owned());

        let forged_response = app
            .clone()
            .oneshot(authed_request(
                Method::GET,
                "/api/tasks",
                "not-a-real-token",
                None,
            ))
            .await
            .expect("The forged request should complete");
        assert_eq!(StatusCode::FORBIDDEN, forged_response.status());
        let forged_body: dto::ErrorBody = deserialize_body(forged_response.into_body()).await;
        assert_that!(forged_body.error_code).is_equal_to("invalid_token".to_owned());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn rejects_bad_payloads_end_to_end() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_router(db);
        let session = sign_up(&app, "jdoe@example.com", "John Doe", "hunter2hunter2").await;

        // A parseable payload that fails validation
        let invalid_create_response = app
            .clone()
            .oneshot(authed_request(
                Method::POST,
                "/api/tasks",
                &session.token,
                Some(json!({ "title": "" })),
            ))
            .await
            .expect("The invalid create request should complete");
        assert_eq!(StatusCode::BAD_REQUEST, invalid_create_response.status());
        let validation_body: dto::ErrorBody =
            deserialize_body(invalid_create_response.into_body()).await;
        assert_that!(validation_body.error_code).is_equal_to("invalid_input".to_owned());

        // A payload that isn't even JSON
        let garbled_request = Request::builder()
            .method(Method::POST)
            .uri("/api/tasks")
            .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("this is not json"))
            .expect("Test request should build");
        let garbled_response = app
            .clone()
            .oneshot(garbled_request)
            .await
            .expect("The garbled request should complete");
        assert_eq!(StatusCode::BAD_REQUEST, garbled_response.status());
        let garbled_body: dto::ErrorBody = deserialize_body(garbled_response.into_body()).await;
        assert_that!(garbled_body.error_code).is_equal_to("invalid_json".to_owned());
    });
}
