mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(&server.base_url).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "matricula-api");
    assert!(body["data"]["endpoints"]["enrollments"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_reports_database_status() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(format!("{}/health", server.base_url)).await?;
    // OK with a database, 503 without one; both are valid harness states
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected health status: {}",
        res.status()
    );

    let body: Value = res.json().await?;
    assert!(body["data"]["status"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(format!("{}/no-such-route", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
