mod common;

use axum::http::StatusCode;
use common::{
    create_academic_year, create_student, create_test_admin, generate_unique_email, get,
    json_request, send, test_app, token_for,
};
use schoolyard_auth::UserRole;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_payment_installments(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;
    let student = create_student(&app, &admin.token, "ADM-1").await;

    let (status, payment) = send(
        &app,
        json_request(
            "POST",
            "/api/payments",
            Some(&admin.token),
            json!({
                "student_id": student["id"],
                "academic_year": year,
                "description": "First term fees",
                "amount_due": 50000
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["status"], "unpaid");
    let record_uri = format!("/api/payments/{}/record", payment["id"].as_str().unwrap());

    let (status, payment) = send(
        &app,
        json_request("POST", &record_uri, Some(&admin.token), json!({ "amount": 20000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "partial");
    assert_eq!(payment["amount_paid"], 20000);

    let (status, _) = send(
        &app,
        json_request("POST", &record_uri, Some(&admin.token), json!({ "amount": 40000 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, payment) = send(
        &app,
        json_request(
            "POST",
            &record_uri,
            Some(&admin.token),
            json!({ "amount": 30000, "method": "bank_transfer" }),
        ),
    )
    .await;
    assert_eq!(payment["status"], "paid");

    let (status, summary) = send(&app, get("/api/payments/summary", Some(&admin.token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_due"], 50000);
    assert_eq!(summary["total_paid"], 50000);
    assert_eq!(summary["outstanding"], 0);
    assert_eq!(summary["paid_count"], 1);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/payments",
            Some(&admin.token),
            json!({
                "student_id": student["id"],
                "academic_year": year,
                "description": "Overpaid",
                "amount_due": 100,
                "amount_paid": 200
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_timetable_clashes(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;

    let (status, teacher) = send(
        &app,
        json_request(
            "POST",
            "/api/teachers",
            Some(&admin.token),
            json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": generate_unique_email(),
                "password": "teacher-password",
                "employee_number": "EMP-1"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", teacher);

    let (_, subject) = send(
        &app,
        json_request(
            "POST",
            "/api/subjects",
            Some(&admin.token),
            json!({ "name": "Physics", "code": "PHY" }),
        ),
    )
    .await;

    let mut classrooms = Vec::new();
    for section in ["A", "B"] {
        let (_, classroom) = send(
            &app,
            json_request(
                "POST",
                "/api/classrooms",
                Some(&admin.token),
                json!({
                    "grade": "Grade 7",
                    "section": section,
                    "academic_year": year,
                    "capacity": 30
                }),
            ),
        )
        .await;
        classrooms.push(classroom["id"].clone());
    }

    let entry = |classroom: &serde_json::Value, start: &str, end: &str| {
        json_request(
            "POST",
            "/api/timetables",
            Some(&admin.token),
            json!({
                "classroom_id": classroom,
                "subject_id": subject["id"],
                "teacher_id": teacher["id"],
                "day_of_week": "monday",
                "start_time": start,
                "end_time": end,
                "academic_year": year
            }),
        )
    };

    let (status, _) = send(&app, entry(&classrooms[0], "08:00:00", "08:40:00")).await;
    assert_eq!(status, StatusCode::CREATED);

    // Same teacher, other classroom, overlapping period
    let (status, body) = send(&app, entry(&classrooms[1], "08:20:00", "09:00:00")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("teacher"));

    // Back-to-back periods do not overlap
    let (status, _) = send(&app, entry(&classrooms[0], "08:40:00", "09:20:00")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, entry(&classrooms[1], "10:00:00", "09:00:00")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, entries) = send(
        &app,
        get(
            &format!(
                "/api/timetables?classroom_id={}",
                classrooms[0].as_str().unwrap()
            ),
            Some(&admin.token),
        ),
    )
    .await;
    let starts: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["start_time"].as_str().unwrap())
        .collect();
    assert_eq!(starts, vec!["08:00:00", "08:40:00"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_announcement_audiences(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);

    let mut ids = Vec::new();
    for audience in ["all", "teachers", "students", "parents"] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/announcements",
                Some(&admin.token),
                json!({
                    "title": format!("For {}", audience),
                    "body": "Details",
                    "audience": audience
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    let (_, all) = send(&app, get("/api/announcements", Some(&admin.token))).await;
    assert_eq!(all["meta"]["total"], 4);

    let student_token = token_for(UserRole::Student, Uuid::new_v4());
    let (_, visible) = send(&app, get("/api/announcements", Some(&student_token))).await;
    let mut audiences: Vec<&str> = visible["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["audience"].as_str().unwrap())
        .collect();
    audiences.sort();
    assert_eq!(audiences, vec!["all", "students"]);

    // Hidden announcements look missing
    let (status, _) = send(
        &app,
        get(&format!("/api/announcements/{}", ids[1]), Some(&student_token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/announcements/{}", ids[0]),
            Some(&student_token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_dashboard(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    create_academic_year(&app, &admin.token, "2024-2025").await;
    create_student(&app, &admin.token, "ADM-1").await;

    let (status, stats) = send(&app, get("/api/dashboard", Some(&admin.token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["students"], 1);
    assert_eq!(stats["teachers"], 0);
    assert_eq!(stats["attendance_today"]["total"], 0);
    assert_eq!(stats["payments"]["count"], 0);
    assert!(stats["upcoming_exams"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_bookings_of_one_teacher(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool.clone());
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;

    let (_, teacher) = send(
        &app,
        json_request(
            "POST",
            "/api/teachers",
            Some(&admin.token),
            json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": generate_unique_email(),
                "password": "teacher-password",
                "employee_number": "EMP-1"
            }),
        ),
    )
    .await;
    let (_, subject) = send(
        &app,
        json_request(
            "POST",
            "/api/subjects",
            Some(&admin.token),
            json!({ "name": "Chemistry", "code": "CHM" }),
        ),
    )
    .await;

    let mut requests = Vec::new();
    for section in ["A", "B", "C", "D", "E"] {
        let (_, classroom) = send(
            &app,
            json_request(
                "POST",
                "/api/classrooms",
                Some(&admin.token),
                json!({
                    "grade": "Grade 8",
                    "section": section,
                    "academic_year": year,
                    "capacity": 30
                }),
            ),
        )
        .await;
        requests.push(json_request(
            "POST",
            "/api/timetables",
            Some(&admin.token),
            json!({
                "classroom_id": classroom["id"],
                "subject_id": subject["id"],
                "teacher_id": teacher["id"],
                "day_of_week": "tuesday",
                "start_time": "10:00:00",
                "end_time": "10:40:00",
                "academic_year": year
            }),
        ));
    }

    // Same teacher, same period, five classrooms at once
    let mut tasks = tokio::task::JoinSet::new();
    for request in requests {
        let app = app.clone();
        tasks.spawn(async move { send(&app, request).await.0 });
    }
    let mut statuses = Vec::new();
    while let Some(status) = tasks.join_next().await {
        statuses.push(status.unwrap());
    }

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!((created, conflicts), (1, 4), "{:?}", statuses);

    let booked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM timetable_entries")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(booked, 1);
}
