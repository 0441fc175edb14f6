//! Requests the router rejects before touching the database.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, body_text, get, json_request, lazy_pool, test_app, test_state, token_for,
};
use schoolyard::router::init_router;
use schoolyard_auth::UserRole;
use schoolyard_config::RateLimitConfig;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = test_app(lazy_pool());

    let response = app.oneshot(get("/api/students", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing authorization header");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = test_app(lazy_pool());

    let response = app
        .oneshot(get("/api/announcements", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_only_groups_reject_teachers() {
    let app = test_app(lazy_pool());
    let token = token_for(UserRole::Teacher, Uuid::new_v4());

    for uri in ["/api/dashboard", "/api/payments", "/api/payments/summary"] {
        let response = app.clone().oneshot(get(uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn test_staff_groups_reject_students_and_parents() {
    let app = test_app(lazy_pool());

    for role in [UserRole::Student, UserRole::Parent] {
        let token = token_for(role, Uuid::new_v4());
        for uri in [
            "/api/attendance",
            "/api/results",
            "/api/timetables",
            "/api/exams",
            "/api/halls",
            "/api/teachers",
            "/api/assignments",
        ] {
            let response = app.clone().oneshot(get(uri, Some(&token))).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} as {}", uri, role);
        }
    }
}

#[tokio::test]
async fn test_admin_writes_reject_teachers() {
    let app = test_app(lazy_pool());
    let token = token_for(UserRole::Teacher, Uuid::new_v4());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/students",
            Some(&token),
            json!({ "first_name": "A" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(json_request(
            "DELETE",
            &format!("/api/attendance/{}", Uuid::new_v4()),
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_student_list_is_staff_only() {
    let app = test_app(lazy_pool());
    let token = token_for(UserRole::Student, Uuid::new_v4());

    let response = app
        .oneshot(get("/api/students", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_validation_error() {
    let app = test_app(lazy_pool());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "not-an-email", "password": "secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid email format"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app(lazy_pool());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "a@b.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_academic_year_name_is_validated() {
    let app = test_app(lazy_pool());
    let token = token_for(UserRole::Admin, Uuid::new_v4());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/academic-years",
            Some(&token),
            json!({
                "name": "2024-2026",
                "start_date": "2024-09-01",
                "end_date": "2026-07-31"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_empty_attendance_records_rejected() {
    let app = test_app(lazy_pool());
    let token = token_for(UserRole::Teacher, Uuid::new_v4());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/attendance",
            Some(&token),
            json!({
                "classroom_id": Uuid::new_v4(),
                "date": "2024-10-01",
                "academic_year": "2024-2025",
                "records": []
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("records must not be empty")
    );
}

#[tokio::test]
async fn test_out_of_range_score_rejected() {
    let app = test_app(lazy_pool());
    let token = token_for(UserRole::Teacher, Uuid::new_v4());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/results",
            Some(&token),
            json!({
                "student_id": Uuid::new_v4(),
                "subject_id": Uuid::new_v4(),
                "academic_year": "2024-2025",
                "scores": {
                    "first_test": 10,
                    "second_test": 10,
                    "assignment": 10,
                    "midterm": 25,
                    "final_exam": 50
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_inverted_date_range_is_bad_request() {
    let app = test_app(lazy_pool());
    let token = token_for(UserRole::Admin, Uuid::new_v4());

    let response = app
        .oneshot(get(
            "/api/attendance/summary?from=2024-10-05&to=2024-10-01",
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "'from' date must not be after 'to' date");
}

#[tokio::test]
async fn test_general_rate_limit() {
    let config = RateLimitConfig {
        general_per_second: 1,
        general_burst_size: 2,
        auth_per_second: 1,
        auth_burst_size: 10,
    };
    let app = init_router(test_state(lazy_pool(), config));

    let request = |ip: &str| {
        let mut req = get("/api/students", None);
        req.headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        req
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(request("203.0.113.10")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app.clone().oneshot(request("203.0.113.10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Too many requests");

    let response = app.oneshot(request("203.0.113.11")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_rate_limit_is_stricter() {
    let config = RateLimitConfig {
        general_per_second: 100,
        general_burst_size: 100,
        auth_per_second: 1,
        auth_burst_size: 1,
    };
    let app = init_router(test_state(lazy_pool(), config));

    let login = || {
        let mut req = json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "bad", "password": "x" }),
        );
        req.headers_mut()
            .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
        req
    };

    let first = app.clone().oneshot(login()).await.unwrap();
    assert_eq!(first.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let second = app.oneshot(login()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = test_app(lazy_pool());

    let response = app
        .oneshot(get("/api-docs/openapi.json", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("/api/attendance/summary"));
    assert!(text.contains("bearer_auth"));
}

#[tokio::test]
async fn test_request_id_header_added() {
    let app = test_app(lazy_pool());

    let response = app.oneshot(get("/api/students", None)).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let app = test_app(lazy_pool());

    let preflight = |origin: &str| {
        axum::http::Request::builder()
            .method("OPTIONS")
            .uri("/api/students")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(axum::body::Body::empty())
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(preflight("http://localhost:5173"))
        .await
        .unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );

    let response = app.oneshot(preflight("http://evil.test")).await.unwrap();
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}
