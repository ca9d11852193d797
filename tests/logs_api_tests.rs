// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session-authenticated log API tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{
    create_test_app, create_user, get_with_token, json_body, post_json, session_token, sync_token,
};

#[tokio::test]
async fn test_logs_require_session() {
    let (app, _) = create_test_app();

    for uri in ["/api/logs", "/api/me"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
        let body = json_body(response).await;
        assert_eq!(body["error"], "unauthorized");
    }

    let response = app
        .oneshot(post_json("/api/auth/token", None, &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sync_token_is_not_a_session() {
    let (app, state) = create_test_app();
    let user = create_user(&state, "collector@example.com").await;
    let token = sync_token(&state, &user);

    let response = app
        .oneshot(get_with_token("/api/logs", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_session_user_is_not_found() {
    let (app, state) = create_test_app();
    let session = session_token(&state, "nobody@example.com");

    let response = app
        .clone()
        .oneshot(get_with_token("/api/logs", &session))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["details"], "User not found");

    let entry = json!({ "type": "mouse", "timestamp": "2024-01-01T10:00:00Z" });
    let response = app
        .clone()
        .oneshot(post_json("/api/logs", Some(&session), &entry))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(post_json("/api/auth/token", Some(&session), &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_log_returns_stored_record() {
    let (app, state) = create_test_app();
    let user = create_user(&state, "writer@example.com").await;
    let session = session_token(&state, &user.email);

    let entry = json!({
        "type": "browser",
        "timestamp": "2024-03-05T08:30:00.250Z",
        "data": {
            "url": "https://docs.rs/",
            "browserTitle": "Docs.rs",
            "browserName": "Firefox"
        }
    });

    let response = app
        .oneshot(post_json("/api/logs", Some(&session), &entry))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let record = json_body(response).await;
    assert_eq!(record["id"].as_str().unwrap().len(), 24);
    assert_eq!(record["userId"], user.id.as_str());
    assert_eq!(record["type"], "browser");
    assert_eq!(record["data"]["url"], "https://docs.rs/");
    assert_eq!(record["data"]["browserName"], "Firefox");
    assert!(record["createdAt"].as_str().is_some());
    assert!(record["updatedAt"].as_str().is_some());

    let stored = state.db.list_recent_activities(&user.id, 10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, record["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_create_log_rejects_invalid_entries() {
    let (app, state) = create_test_app();
    let user = create_user(&state, "invalid@example.com").await;
    let session = session_token(&state, &user.email);

    let entries = [
        json!({ "type": "bogus", "timestamp": "2024-01-01T10:00:00Z" }),
        json!({ "timestamp": "2024-01-01T10:00:00Z" }),
        json!({ "type": "mouse" }),
        json!({ "type": "mouse", "timestamp": "yesterday" }),
        json!({ "type": "window", "timestamp": "2024-01-01T10:00:00Z", "data": {} }),
        json!("mouse"),
    ];

    for entry in entries {
        let response = app
            .clone()
            .oneshot(post_json("/api/logs", Some(&session), &entry))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "entry: {entry}");
        assert_eq!(json_body(response).await["error"], "validation_error");
    }

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/logs")
                .header(header::AUTHORIZATION, format!("Bearer {session}"))
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(state
        .db
        .list_recent_activities(&user.id, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_logs_are_newest_first_and_limited() {
    let (app, state) = create_test_app();
    let user = create_user(&state, "reader@example.com").await;
    let session = session_token(&state, &user.email);

    // Deliberately out of order.
    for minute in [5, 1, 9, 3, 7] {
        let entry = json!({
            "type": "keyboard",
            "timestamp": format!("2024-01-01T10:{minute:02}:00Z"),
        });
        let response = app
            .clone()
            .oneshot(post_json("/api/logs", Some(&session), &entry))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get_with_token("/api/logs", &session))
        .await
        .unwrap();
    let logs = json_body(response).await;
    let minutes: Vec<u32> = logs
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            chrono::DateTime::parse_from_rfc3339(r["timestamp"].as_str().unwrap())
                .map(|t| chrono::Timelike::minute(&t))
                .unwrap()
        })
        .collect();
    assert_eq!(minutes, vec![9, 7, 5, 3, 1]);

    let response = app
        .oneshot(get_with_token("/api/logs?limit=2", &session))
        .await
        .unwrap();
    let logs = json_body(response).await;
    assert_eq!(logs.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_logs_capped_at_one_hundred() {
    let (app, state) = create_test_app();
    let user = create_user(&state, "heavy@example.com").await;
    let token = sync_token(&state, &user);
    let session = session_token(&state, &user.email);

    let logs: Vec<_> = (0..120)
        .map(|i| json!({ "type": "mouse", "timestamp": 1_704_103_200_000_i64 + i * 1000 }))
        .collect();
    let response = app
        .clone()
        .oneshot(post_json("/api/sync", Some(&token), &json!({ "logs": logs })))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["saved"], 120);

    for uri in ["/api/logs", "/api/logs?limit=500"] {
        let response = app
            .clone()
            .oneshot(get_with_token(uri, &session))
            .await
            .unwrap();
        let logs = json_body(response).await;
        assert_eq!(logs.as_array().unwrap().len(), 100, "uri: {uri}");
    }
}

#[tokio::test]
async fn test_logs_are_scoped_to_user() {
    let (app, state) = create_test_app();
    let alice = create_user(&state, "alice@example.com").await;
    let bob = create_user(&state, "bob@example.com").await;

    let entry = json!({ "type": "mouse", "timestamp": "2024-01-01T10:00:00Z" });
    app.clone()
        .oneshot(post_json(
            "/api/logs",
            Some(&session_token(&state, &alice.email)),
            &entry,
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get_with_token(
            "/api/logs",
            &session_token(&state, &bob.email),
        ))
        .await
        .unwrap();
    assert!(json_body(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let (app, state) = create_test_app();
    let user = create_user(&state, "cookie@example.com").await;
    let session = session_token(&state, &user.email);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::COOKIE, format!("chronos_session={session}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["id"], user.id.as_str());
    assert_eq!(body["email"], "cookie@example.com");
    assert_eq!(body["provider"], "google");
}

#[tokio::test]
async fn test_issued_token_is_fresh_each_time() {
    let (app, state) = create_test_app();
    let user = create_user(&state, "fresh@example.com").await;
    let session = session_token(&state, &user.email);

    let mut tokens = Vec::new();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/api/auth/token", Some(&session), &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        tokens.push(json_body(response).await["token"].as_str().unwrap().to_string());
    }

    // Both tokens remain valid.
    for token in tokens {
        let response = app
            .clone()
            .oneshot(post_json("/api/sync", Some(&token), &json!({ "logs": [] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
