mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Create a student + a fresh section, returning (student_token, section_id)
async fn student_and_section(
    base_url: &str,
    admin: &str,
    seats: i32,
) -> Result<(String, String)> {
    let email = format!("{}@matricula.test", common::unique("aluno"));
    common::create_user(base_url, admin, &email, "hunter22", &["ALUNO"]).await?;
    let token = common::login(base_url, &email, "hunter22").await?;

    let section_id = common::create_section(
        base_url,
        admin,
        json!({
            "code": common::unique("SEC"),
            "name": "Test Section",
            "available_seats": seats,
        }),
    )
    .await?;
    Ok((token, section_id))
}

async fn enroll(base_url: &str, token: &str, section_id: &str) -> Result<reqwest::Response> {
    let client = reqwest::Client::new();
    Ok(client
        .post(format!("{}/api/enrollments", base_url))
        .bearer_auth(token)
        .json(&json!({ "section_id": section_id }))
        .send()
        .await?)
}

#[tokio::test]
async fn enroll_decrements_seats_and_shows_up_in_me() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;
    let (student, section_id) = student_and_section(&server.base_url, &admin, 3).await?;

    let res = enroll(&server.base_url, &student, &section_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let enrollment_id = body["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/api/sections/{}", server.base_url, section_id))
        .bearer_auth(&student)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["available_seats"], 2);

    let res = client
        .get(format!("{}/api/enrollments/me", server.base_url))
        .bearer_auth(&student)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["id"] == enrollment_id.as_str()));
    Ok(())
}

#[tokio::test]
async fn duplicate_enroll_is_409() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let admin = common::admin_token(&server.base_url).await?;
    let (student, section_id) = student_and_section(&server.base_url, &admin, 5).await?;

    let res = enroll(&server.base_url, &student, &section_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = enroll(&server.base_url, &student, &section_id).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn full_section_is_409() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let admin = common::admin_token(&server.base_url).await?;
    let (first, section_id) = student_and_section(&server.base_url, &admin, 1).await?;

    let res = enroll(&server.base_url, &first, &section_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let email = format!("{}@matricula.test", common::unique("aluno"));
    common::create_user(&server.base_url, &admin, &email, "hunter22", &["ALUNO"]).await?;
    let second = common::login(&server.base_url, &email, "hunter22").await?;

    let res = enroll(&server.base_url, &second, &section_id).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn non_student_cannot_enroll() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let admin = common::admin_token(&server.base_url).await?;
    let (_, section_id) = student_and_section(&server.base_url, &admin, 5).await?;

    let res = enroll(&server.base_url, &admin, &section_id).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn student_schedule_clash_is_409() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;

    let res = client
        .post(format!("{}/api/schedules", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "weekday": 2,
            "shift": 1,
            "code": common::unique("SLOT"),
            "description": "Tuesday morning",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let schedule_id = body["data"]["id"].as_str().unwrap().to_string();

    let make_section = |code: String| {
        json!({
            "code": code,
            "name": "Slot Section",
            "available_seats": 5,
            "schedule_id": schedule_id,
        })
    };
    let section_a =
        common::create_section(&server.base_url, &admin, make_section(common::unique("SEC"))).await?;
    let section_b =
        common::create_section(&server.base_url, &admin, make_section(common::unique("SEC"))).await?;

    let email = format!("{}@matricula.test", common::unique("aluno"));
    common::create_user(&server.base_url, &admin, &email, "hunter22", &["ALUNO"]).await?;
    let student = common::login(&server.base_url, &email, "hunter22").await?;

    let res = enroll(&server.base_url, &student, &section_a).await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    // Same weekly slot, different section
    let res = enroll(&server.base_url, &student, &section_b).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn instructor_schedule_clash_is_409() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;

    let email = format!("{}@matricula.test", common::unique("prof"));
    let professor_id =
        common::create_user(&server.base_url, &admin, &email, "hunter22", &["PROFESSOR"]).await?;

    let res = client
        .post(format!("{}/api/schedules", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "weekday": 4,
            "shift": 2,
            "code": common::unique("SLOT"),
            "description": null,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let schedule_id = body["data"]["id"].as_str().unwrap().to_string();

    common::create_section(
        &server.base_url,
        &admin,
        json!({
            "code": common::unique("SEC"),
            "name": "First",
            "available_seats": 5,
            "instructor_id": professor_id,
            "schedule_id": schedule_id,
        }),
    )
    .await?;

    let res = client
        .post(format!("{}/api/sections", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "code": common::unique("SEC"),
            "name": "Second",
            "available_seats": 5,
            "instructor_id": professor_id,
            "schedule_id": schedule_id,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn withdraw_restores_seat_and_allows_reenroll() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;
    let (student, section_id) = student_and_section(&server.base_url, &admin, 1).await?;

    let res = enroll(&server.base_url, &student, &section_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let enrollment_id = body["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .delete(format!("{}/api/enrollments/{}", server.base_url, enrollment_id))
        .bearer_auth(&student)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["rows_affected"], 1);

    let res = client
        .get(format!("{}/api/sections/{}", server.base_url, section_id))
        .bearer_auth(&student)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["available_seats"], 1);

    // The UNIQUE(student, section) row is gone, so re-enrolling works
    let res = enroll(&server.base_url, &student, &section_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn withdraw_unknown_enrollment_is_a_noop() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;

    let res = client
        .delete(format!(
            "{}/api/enrollments/00000000-0000-0000-0000-000000000000",
            server.base_url
        ))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["rows_affected"], 0);
    Ok(())
}

#[tokio::test]
async fn student_withdraw_of_unknown_enrollment_is_a_noop() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;

    let email = format!("{}@matricula.test", common::unique("ghost"));
    common::create_user(&server.base_url, &admin, &email, "hunter22", &["ALUNO"]).await?;
    let student = common::login(&server.base_url, &email, "hunter22").await?;

    // The ownership check falls through on an absent row; the withdraw
    // itself then reports 0 rows
    let res = client
        .delete(format!(
            "{}/api/enrollments/00000000-0000-0000-0000-000000000000",
            server.base_url
        ))
        .bearer_auth(&student)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["rows_affected"], 0);
    Ok(())
}

#[tokio::test]
async fn student_cannot_withdraw_someone_else() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;
    let (owner, section_id) = student_and_section(&server.base_url, &admin, 5).await?;

    let res = enroll(&server.base_url, &owner, &section_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let enrollment_id = body["data"]["id"].as_str().unwrap().to_string();

    let email = format!("{}@matricula.test", common::unique("other"));
    common::create_user(&server.base_url, &admin, &email, "hunter22", &["ALUNO"]).await?;
    let other = common::login(&server.base_url, &email, "hunter22").await?;

    let res = client
        .delete(format!("{}/api/enrollments/{}", server.base_url, enrollment_id))
        .bearer_auth(&other)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn section_with_enrollments_cannot_be_deleted() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;
    let (student, section_id) = student_and_section(&server.base_url, &admin, 5).await?;

    let res = enroll(&server.base_url, &student, &section_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .delete(format!("{}/api/sections/{}", server.base_url, section_id))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn subject_referenced_by_section_cannot_be_deleted() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;

    let res = client
        .post(format!("{}/api/subjects", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "code": common::unique("SUBJ"),
            "name": "Databases",
            "credit_hours": 60,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let subject_id = body["data"]["id"].as_str().unwrap().to_string();

    common::create_section(
        &server.base_url,
        &admin,
        json!({
            "code": common::unique("SEC"),
            "name": "Databases A",
            "available_seats": 5,
            "subject_id": subject_id,
        }),
    )
    .await?;

    let res = client
        .delete(format!("{}/api/subjects/{}", server.base_url, subject_id))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}
