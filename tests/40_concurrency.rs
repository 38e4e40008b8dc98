mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

/// K students racing for N seats: exactly N must win, and the final seat
/// count must be 0. The row lock on the section serializes the writers.
#[tokio::test]
async fn concurrent_enrolls_never_oversell() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    const STUDENTS: usize = 5;
    const SEATS: i32 = 2;

    let server = common::ensure_server().await?;
    let admin = common::admin_token(&server.base_url).await?;

    let section_id = common::create_section(
        &server.base_url,
        &admin,
        json!({
            "code": common::unique("RACE"),
            "name": "Contended Section",
            "available_seats": SEATS,
        }),
    )
    .await?;

    let mut tokens = Vec::with_capacity(STUDENTS);
    for _ in 0..STUDENTS {
        let email = format!("{}@matricula.test", common::unique("racer"));
        common::create_user(&server.base_url, &admin, &email, "hunter22", &["ALUNO"]).await?;
        tokens.push(common::login(&server.base_url, &email, "hunter22").await?);
    }

    let mut handles = Vec::with_capacity(STUDENTS);
    for token in tokens {
        let base_url = server.base_url.clone();
        let section = section_id.clone();
        handles.push(tokio::spawn(async move {
            let client = reqwest::Client::new();
            client
                .post(format!("{}/api/enrollments", base_url))
                .bearer_auth(&token)
                .json(&json!({ "section_id": section }))
                .send()
                .await
                .map(|r| r.status())
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await?? {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status under contention: {other}"),
        }
    }
    assert_eq!(created, SEATS as usize);
    assert_eq!(conflicts, STUDENTS - SEATS as usize);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/api/sections/{}", server.base_url, section_id))
        .bearer_auth(&admin)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["available_seats"], 0);
    Ok(())
}

/// The same student firing the same enroll twice in parallel must end up
/// with exactly one enrollment row.
#[tokio::test]
async fn concurrent_duplicate_enrolls_yield_one_row() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let admin = common::admin_token(&server.base_url).await?;

    let section_id = common::create_section(
        &server.base_url,
        &admin,
        json!({
            "code": common::unique("DUP"),
            "name": "Duplicate Race",
            "available_seats": 10,
        }),
    )
    .await?;

    let email = format!("{}@matricula.test", common::unique("dup"));
    common::create_user(&server.base_url, &admin, &email, "hunter22", &["ALUNO"]).await?;
    let token = common::login(&server.base_url, &email, "hunter22").await?;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let base_url = server.base_url.clone();
        let section = section_id.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            let client = reqwest::Client::new();
            client
                .post(format!("{}/api/enrollments", base_url))
                .bearer_auth(&token)
                .json(&json!({ "section_id": section }))
                .send()
                .await
                .map(|r| r.status())
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await?? == StatusCode::CREATED {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/api/enrollments/me", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    let mine = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["section_id"] == section_id.as_str())
        .count();
    assert_eq!(mine, 1);

    // Seats reflect exactly one successful enroll
    let res = client
        .get(format!("{}/api/sections/{}", server.base_url, section_id))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["available_seats"], 9);
    Ok(())
}

/// Two withdraws of the same enrollment racing each other: only the one
/// whose delete lands may restore the seat, so the section never ends up
/// above its declared capacity.
#[tokio::test]
async fn concurrent_double_withdraw_restores_one_seat() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;

    let section_id = common::create_section(
        &server.base_url,
        &admin,
        json!({
            "code": common::unique("DW"),
            "name": "Double Withdraw",
            "available_seats": 1,
        }),
    )
    .await?;

    let email = format!("{}@matricula.test", common::unique("dw"));
    common::create_user(&server.base_url, &admin, &email, "hunter22", &["ALUNO"]).await?;
    let student = common::login(&server.base_url, &email, "hunter22").await?;

    let res = client
        .post(format!("{}/api/enrollments", server.base_url))
        .bearer_auth(&student)
        .json(&json!({ "section_id": section_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let enrollment_id = body["data"]["id"].as_str().unwrap().to_string();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let base_url = server.base_url.clone();
        let id = enrollment_id.clone();
        let token = student.clone();
        handles.push(tokio::spawn(async move {
            let client = reqwest::Client::new();
            let res = client
                .delete(format!("{}/api/enrollments/{}", base_url, id))
                .bearer_auth(&token)
                .send()
                .await?;
            anyhow::ensure!(res.status() == StatusCode::OK, "withdraw: {}", res.status());
            let body: Value = res.json().await?;
            Ok::<i64, anyhow::Error>(body["data"]["rows_affected"].as_i64().unwrap())
        }));
    }

    let mut total_deleted = 0;
    for handle in handles {
        total_deleted += handle.await??;
    }
    // Exactly one delete lands; the loser is a 0-row no-op
    assert_eq!(total_deleted, 1);

    let res = client
        .get(format!("{}/api/sections/{}", server.base_url, section_id))
        .bearer_auth(&admin)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["available_seats"], 1);
    Ok(())
}

/// Withdraw racing an enroll on a one-seat section: whatever the
/// interleaving, seats plus enrollments stays consistent.
#[tokio::test]
async fn withdraw_and_enroll_race_keeps_counts_consistent() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(&server.base_url).await?;

    let section_id = common::create_section(
        &server.base_url,
        &admin,
        json!({
            "code": common::unique("SWAP"),
            "name": "Swap Race",
            "available_seats": 1,
        }),
    )
    .await?;

    let email_a = format!("{}@matricula.test", common::unique("swap-a"));
    common::create_user(&server.base_url, &admin, &email_a, "hunter22", &["ALUNO"]).await?;
    let token_a = common::login(&server.base_url, &email_a, "hunter22").await?;

    let email_b = format!("{}@matricula.test", common::unique("swap-b"));
    common::create_user(&server.base_url, &admin, &email_b, "hunter22", &["ALUNO"]).await?;
    let token_b = common::login(&server.base_url, &email_b, "hunter22").await?;

    // A takes the only seat
    let res = client
        .post(format!("{}/api/enrollments", server.base_url))
        .bearer_auth(&token_a)
        .json(&json!({ "section_id": section_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let enrollment_a = body["data"]["id"].as_str().unwrap().to_string();

    // A withdraws while B enrolls
    let withdraw = {
        let base_url = server.base_url.clone();
        let token = token_a.clone();
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            client
                .delete(format!("{}/api/enrollments/{}", base_url, enrollment_a))
                .bearer_auth(&token)
                .send()
                .await
                .map(|r| r.status())
        })
    };
    let enroll = {
        let base_url = server.base_url.clone();
        let section = section_id.clone();
        let token = token_b.clone();
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            client
                .post(format!("{}/api/enrollments", base_url))
                .bearer_auth(&token)
                .json(&json!({ "section_id": section }))
                .send()
                .await
                .map(|r| r.status())
        })
    };

    let withdraw_status = withdraw.await??;
    let enroll_status = enroll.await??;
    assert_eq!(withdraw_status, StatusCode::OK);
    assert!(
        enroll_status == StatusCode::CREATED || enroll_status == StatusCode::CONFLICT,
        "unexpected enroll status: {enroll_status}"
    );

    // Invariant: seats + enrollments == capacity
    let res = client
        .get(format!("{}/api/sections/{}", server.base_url, section_id))
        .bearer_auth(&admin)
        .send()
        .await?;
    let body: Value = res.json().await?;
    let seats = body["data"]["available_seats"].as_i64().unwrap();

    let res = client
        .get(format!("{}/api/enrollments", server.base_url))
        .bearer_auth(&admin)
        .send()
        .await?;
    let body: Value = res.json().await?;
    let enrolled = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["section_id"] == section_id.as_str())
        .count() as i64;

    assert_eq!(seats + enrolled, 1);
    Ok(())
}
