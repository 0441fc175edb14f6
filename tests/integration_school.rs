mod common;

use axum::http::StatusCode;
use common::{
    create_academic_year, create_student, create_test_admin, get, json_request, send, test_app,
    token_for,
};
use schoolyard_auth::UserRole;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

async fn create_classroom(app: &axum::Router, token: &str, year: &str, capacity: i32) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/classrooms",
            Some(token),
            json!({
                "grade": "Grade 4",
                "section": "A",
                "academic_year": year,
                "capacity": capacity
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    id_of(&body)
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_classroom_capacity_and_duplicates(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;
    let classroom_id = create_classroom(&app, &admin.token, &year, 2).await;

    let s1 = id_of(&create_student(&app, &admin.token, "ADM-1").await);
    let s2 = id_of(&create_student(&app, &admin.token, "ADM-2").await);
    let s3 = id_of(&create_student(&app, &admin.token, "ADM-3").await);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/classrooms/{}/students", classroom_id),
            Some(&admin.token),
            json!({ "student_ids": [s1, s2, s3] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let missing = Uuid::new_v4().to_string();
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/classrooms/{}/students", classroom_id),
            Some(&admin.token),
            json!({ "student_ids": [s1, s2, missing] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigned_count"], 2);
    assert_eq!(body["failed_ids"], json!([missing]));

    let (_, classroom) = send(
        &app,
        get(&format!("/api/classrooms/{}", classroom_id), Some(&admin.token)),
    )
    .await;
    assert_eq!(classroom["student_count"], 2);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/classrooms",
            Some(&admin.token),
            json!({
                "grade": "Grade 4",
                "section": "A",
                "academic_year": year,
                "capacity": 30
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/students",
            Some(&admin.token),
            json!({
                "first_name": "Late",
                "last_name": "Comer",
                "email": common::generate_unique_email(),
                "password": "student-password",
                "admission_number": "ADM-4",
                "classroom_id": classroom_id
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_attendance_marking_and_summary(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;
    let classroom_id = create_classroom(&app, &admin.token, &year, 10).await;

    let s1 = id_of(&create_student(&app, &admin.token, "ADM-1").await);
    let s2 = id_of(&create_student(&app, &admin.token, "ADM-2").await);
    let outsider = id_of(&create_student(&app, &admin.token, "ADM-3").await);

    send(
        &app,
        json_request(
            "POST",
            &format!("/api/classrooms/{}/students", classroom_id),
            Some(&admin.token),
            json!({ "student_ids": [s1, s2] }),
        ),
    )
    .await;

    let mark = |status_s1: &str| {
        json_request(
            "POST",
            "/api/attendance",
            Some(&admin.token),
            json!({
                "classroom_id": classroom_id,
                "date": "2024-10-01",
                "academic_year": year,
                "records": [
                    { "student_id": s1, "status": status_s1 },
                    { "student_id": s2, "status": "late" },
                    { "student_id": outsider, "status": "present" }
                ]
            }),
        )
    };

    let (status, body) = send(&app, mark("absent")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recorded_count"], 2);
    assert_eq!(body["failed_ids"], json!([outsider]));

    // Marking the same day again overwrites instead of duplicating
    let (_, body) = send(&app, mark("present")).await;
    assert_eq!(body["recorded_count"], 2);

    let (status, summary) = send(
        &app,
        get(
            &format!(
                "/api/attendance/summary?classroom_id={}&from=2024-10-01&to=2024-10-01",
                classroom_id
            ),
            Some(&admin.token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["present"], 1);
    assert_eq!(summary["late"], 1);
    assert_eq!(summary["attendance_rate"], 100.0);

    let (status, list) = send(
        &app,
        get("/api/attendance?status=late", Some(&admin.token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_results_grading_and_student_access(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;

    let student = create_student(&app, &admin.token, "ADM-1").await;
    let other = create_student(&app, &admin.token, "ADM-2").await;
    let student_id = id_of(&student);

    let (status, subject) = send(
        &app,
        json_request(
            "POST",
            "/api/subjects",
            Some(&admin.token),
            json!({ "name": "Mathematics", "code": "mth" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subject["code"], "MTH");

    let result = json!({
        "student_id": student_id,
        "subject_id": subject["id"],
        "academic_year": year,
        "scores": {
            "first_test": 9,
            "second_test": 8,
            "assignment": 7,
            "midterm": 18,
            "final_exam": 45
        }
    });
    let (status, created) = send(
        &app,
        json_request("POST", "/api/results", Some(&admin.token), result.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["total"], 87.0);
    assert_eq!(created["grade"], "B");

    let (status, _) = send(
        &app,
        json_request("POST", "/api/results", Some(&admin.token), result),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Students read their own summary but not someone else's record
    let student_user = Uuid::parse_str(student["user_id"].as_str().unwrap()).unwrap();
    let student_token = token_for(UserRole::Student, student_user);

    let (status, summary) = send(
        &app,
        get(
            &format!(
                "/api/students/{}/results/summary?academic_year={}",
                student_id, year
            ),
            Some(&student_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["subject_count"], 1);
    assert_eq!(summary["average"], 87.0);
    assert_eq!(summary["grade"], "B");

    let (status, _) = send(
        &app,
        get(&format!("/api/students/{}", id_of(&other)), Some(&student_token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, csv) = {
        use http_body_util::BodyExt;
        use tower::ServiceExt;
        let response = app
            .clone()
            .oneshot(get("/api/results/export", Some(&admin.token)))
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    };
    assert_eq!(status, StatusCode::OK);
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("MTH"));
}

async fn get_csv(app: &axum::Router, uri: &str, token: &str) -> (StatusCode, String) {
    use tower::ServiceExt;

    let response = app.clone().oneshot(get(uri, Some(token))).await.unwrap();
    let status = response.status();
    (status, common::body_text(response).await)
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_referenced_subject_and_classroom_are_not_deleted(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool.clone());
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;
    let classroom_id = create_classroom(&app, &admin.token, &year, 10).await;
    let student_id = id_of(&create_student(&app, &admin.token, "ADM-1").await);

    let (_, subject) = send(
        &app,
        json_request(
            "POST",
            "/api/subjects",
            Some(&admin.token),
            json!({ "name": "Biology", "code": "BIO" }),
        ),
    )
    .await;
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/results",
            Some(&admin.token),
            json!({
                "student_id": student_id,
                "subject_id": subject["id"],
                "academic_year": year,
                "scores": {
                    "first_test": 5, "second_test": 5, "assignment": 5,
                    "midterm": 10, "final_exam": 25
                }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/subjects/{}", id_of(&subject)),
            Some(&admin.token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Subject is still in use");

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 1);

    send(
        &app,
        json_request(
            "POST",
            &format!("/api/classrooms/{}/students", classroom_id),
            Some(&admin.token),
            json!({ "student_ids": [student_id] }),
        ),
    )
    .await;
    send(
        &app,
        json_request(
            "POST",
            "/api/attendance",
            Some(&admin.token),
            json!({
                "classroom_id": classroom_id,
                "date": "2024-10-01",
                "academic_year": year,
                "records": [{ "student_id": student_id, "status": "present" }]
            }),
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/classrooms/{}", classroom_id),
            Some(&admin.token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Nothing refers to this one
    let (_, unused) = send(
        &app,
        json_request(
            "POST",
            "/api/subjects",
            Some(&admin.token),
            json!({ "name": "Music", "code": "MUS" }),
        ),
    )
    .await;
    let (status, _) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/subjects/{}", id_of(&unused)),
            Some(&admin.token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_null_unlinks_classroom_and_clears_remarks(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;
    let classroom_id = create_classroom(&app, &admin.token, &year, 10).await;
    let student_id = id_of(&create_student(&app, &admin.token, "ADM-1").await);
    let student_uri = format!("/api/students/{}", student_id);

    let (status, student) = send(
        &app,
        json_request(
            "PUT",
            &student_uri,
            Some(&admin.token),
            json!({ "classroom_id": classroom_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(student["classroom_id"], classroom_id.as_str());

    let (_, marked) = send(
        &app,
        json_request(
            "POST",
            "/api/attendance",
            Some(&admin.token),
            json!({
                "classroom_id": classroom_id,
                "date": "2024-10-01",
                "academic_year": year,
                "records": [{ "student_id": student_id, "status": "late", "remarks": "Bus" }]
            }),
        ),
    )
    .await;
    assert_eq!(marked["recorded_count"], 1);

    let (_, list) = send(&app, get("/api/attendance", Some(&admin.token))).await;
    let record_id = list["data"][0]["id"].as_str().unwrap().to_string();
    let record_uri = format!("/api/attendance/{}", record_id);

    // Absent field keeps the remarks
    let (_, record) = send(
        &app,
        json_request("PUT", &record_uri, Some(&admin.token), json!({ "status": "present" })),
    )
    .await;
    assert_eq!(record["remarks"], "Bus");

    let (status, record) = send(
        &app,
        json_request("PUT", &record_uri, Some(&admin.token), json!({ "remarks": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["remarks"], Value::Null);
    assert_eq!(record["status"], "present");

    let (_, student) = send(
        &app,
        json_request(
            "PUT",
            &student_uri,
            Some(&admin.token),
            json!({ "first_name": "Grace" }),
        ),
    )
    .await;
    assert_eq!(student["classroom_id"], classroom_id.as_str());

    let (_, student) = send(
        &app,
        json_request(
            "PUT",
            &student_uri,
            Some(&admin.token),
            json!({ "classroom_id": null }),
        ),
    )
    .await;
    assert_eq!(student["classroom_id"], Value::Null);
    assert_eq!(student["first_name"], "Grace");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_hall_seating(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool.clone());
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;

    let create_hall = |name: &str, capacity: i32| {
        json_request(
            "POST",
            "/api/halls",
            Some(&admin.token),
            json!({ "name": name, "capacity": capacity }),
        )
    };
    let (status, main_hall) = send(&app, create_hall("Main Hall", 3)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, annex) = send(&app, create_hall("Annex", 10)).await;

    let mut students = Vec::new();
    for n in 1..=4 {
        students.push(id_of(&create_student(&app, &admin.token, &format!("ADM-{}", n)).await));
    }

    let seat = |hall: &Value, ids: &[&String]| {
        json_request(
            "POST",
            &format!("/api/halls/{}/assignments", id_of(hall)),
            Some(&admin.token),
            json!({
                "exam_title": "First Term Examination",
                "academic_year": year,
                "student_ids": ids
            }),
        )
    };

    let (status, body) = send(&app, seat(&main_hall, &[&students[0], &students[1]])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigned_count"], 2);
    assert_eq!(body["failed_ids"], json!([]));

    // Already seated for this title, even in another hall
    let (status, body) = send(&app, seat(&annex, &[&students[0], &students[2]])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigned_count"], 1);
    assert_eq!(body["failed_ids"], json!([students[0]]));

    // One seat left in the main hall
    let before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exam_hall_assignments")
        .fetch_one(&pool)
        .await
        .unwrap();
    let missing = Uuid::new_v4().to_string();
    let (status, _) = send(&app, seat(&main_hall, &[&students[3], &missing])).await;
    assert_eq!(status, StatusCode::OK);

    let (_, seats) = send(
        &app,
        get(
            &format!("/api/halls/{}/assignments", id_of(&main_hall)),
            Some(&admin.token),
        ),
    )
    .await;
    let numbers: Vec<i64> = seats
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["seat_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let (status, body) = send(&app, seat(&main_hall, &[&students[2]])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failed_ids"], json!([students[2]]));

    // Four students for three seats
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/halls/{}/assignments", id_of(&main_hall)),
            Some(&admin.token),
            json!({
                "exam_title": "Mock Examination",
                "academic_year": year,
                "student_ids": [students[0], students[1], students[2], students[3]]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exam_hall_assignments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(after, before + 1);

    let (status, _) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/halls/{}", id_of(&main_hall)),
            Some(&admin.token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_switching_current_academic_year(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    create_academic_year(&app, &admin.token, "2024-2025").await;
    create_academic_year(&app, &admin.token, "2025-2026").await;

    let (_, current) = send(&app, get("/api/academic-years/current", Some(&admin.token))).await;
    assert_eq!(current["name"], "2025-2026");

    let (_, years) = send(&app, get("/api/academic-years", Some(&admin.token))).await;
    let older = years
        .as_array()
        .unwrap()
        .iter()
        .find(|y| y["name"] == "2024-2025")
        .unwrap()
        .clone();

    let (status, updated) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/api/academic-years/{}/current", id_of(&older)),
            Some(&admin.token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_current"], true);

    let (_, years) = send(&app, get("/api/academic-years", Some(&admin.token))).await;
    let current: Vec<&str> = years
        .as_array()
        .unwrap()
        .iter()
        .filter(|y| y["is_current"] == true)
        .map(|y| y["name"].as_str().unwrap())
        .collect();
    assert_eq!(current, vec!["2024-2025"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_parent_children(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    let child = id_of(&create_student(&app, &admin.token, "ADM-1").await);
    let other = id_of(&create_student(&app, &admin.token, "ADM-2").await);

    let (status, parent) = send(
        &app,
        json_request(
            "POST",
            "/api/parents",
            Some(&admin.token),
            json!({
                "first_name": "Mary",
                "last_name": "Parent",
                "email": common::generate_unique_email(),
                "password": "parent-password"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", parent);
    let children_uri = format!("/api/parents/{}/children", id_of(&parent));

    let missing = Uuid::new_v4().to_string();
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &children_uri,
            Some(&admin.token),
            json!({ "student_ids": [child, missing] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigned_count"], 1);
    assert_eq!(body["failed_ids"], json!([missing]));

    let parent_user = Uuid::parse_str(parent["user_id"].as_str().unwrap()).unwrap();
    let parent_token = token_for(UserRole::Parent, parent_user);

    let (status, children) = send(&app, get(&children_uri, Some(&parent_token))).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = children
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![child.as_str()]);

    let (status, _) = send(&app, get(&format!("/api/students/{}", child), Some(&parent_token))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get(&format!("/api/students/{}", other), Some(&parent_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_csv_exports(pool: PgPool) {
    let admin = create_test_admin(&pool).await;
    let app = test_app(pool);
    let year = create_academic_year(&app, &admin.token, "2024-2025").await;
    let classroom_id = create_classroom(&app, &admin.token, &year, 10).await;
    let s1 = id_of(&create_student(&app, &admin.token, "ADM-1").await);
    create_student(&app, &admin.token, "ADM-2").await;

    send(
        &app,
        json_request(
            "POST",
            &format!("/api/classrooms/{}/students", classroom_id),
            Some(&admin.token),
            json!({ "student_ids": [s1] }),
        ),
    )
    .await;
    send(
        &app,
        json_request(
            "POST",
            "/api/attendance",
            Some(&admin.token),
            json!({
                "classroom_id": classroom_id,
                "date": "2024-10-01",
                "academic_year": year,
                "records": [{ "student_id": s1, "status": "excused", "remarks": "Clinic, morning" }]
            }),
        ),
    )
    .await;
    send(
        &app,
        json_request(
            "POST",
            "/api/payments",
            Some(&admin.token),
            json!({
                "student_id": s1,
                "academic_year": year,
                "description": "Library fee",
                "amount_due": 1500
            }),
        ),
    )
    .await;

    let (status, students) = get_csv(&app, "/api/students/export", &admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(students.lines().count(), 3);
    assert!(students.starts_with("Admission Number"));

    let (status, filtered) = get_csv(
        &app,
        &format!("/api/students/export?classroom_id={}", classroom_id),
        &admin.token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered.lines().count(), 2);
    assert!(filtered.contains("ADM-1"));

    let (status, attendance) = get_csv(&app, "/api/attendance/export", &admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attendance.lines().count(), 2);
    assert!(attendance.contains("excused"));
    assert!(attendance.contains("\"Clinic, morning\""));

    let (status, payments) = get_csv(&app, "/api/payments/export", &admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payments.lines().count(), 2);
    assert!(payments.contains("Library fee"));
    assert!(payments.contains("unpaid"));
}
