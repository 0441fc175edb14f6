mod common;

use axum::http::StatusCode;
use common::{create_test_admin, get, json_request, send, test_app};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_login_and_profile(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": admin.email, "password": admin.password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"]["profile_id"].is_null());

    let token = body["access_token"].as_str().unwrap().to_string();
    let (status, me) = send(&app, get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], admin.email.as_str());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_wrong_password_and_unknown_email_look_the_same(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);

    let (status, wrong_password) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": admin.email, "password": "not-the-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "nobody@school.test", "password": "whatever" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown);
    assert_eq!(unknown["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_refresh_token_flow(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);

    let (_, login) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": admin.email, "password": admin.password }),
        ),
    )
    .await;

    let (status, refreshed) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({ "refresh_token": login["refresh_token"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["access_token"].is_string());

    // An access token is not accepted as a refresh token
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({ "refresh_token": login["access_token"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_change_password(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/change-password",
            Some(&admin.token),
            json!({ "current_password": "wrong-password", "new_password": "brand-new-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/change-password",
            Some(&admin.token),
            json!({ "current_password": admin.password, "new_password": "brand-new-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": admin.email, "password": "brand-new-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_email_is_case_insensitive(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool.clone());

    let student = |email: &str, admission: &str| {
        json_request(
            "POST",
            "/api/students",
            Some(&admin.token),
            json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": email,
                "password": "student-password",
                "admission_number": admission
            }),
        )
    };

    let (status, created) = send(&app, student("Ada@School.test", "ADM-1")).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["email"], "ada@school.test");

    let (status, _) = send(&app, student("ada@SCHOOL.test", "ADM-2")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let stored: Vec<String> = sqlx::query_scalar("SELECT email FROM users WHERE LOWER(email) = $1")
        .bind("ada@school.test")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(stored, vec!["ada@school.test".to_string()]);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "ADA@school.TEST", "password": "student-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "student");
}
