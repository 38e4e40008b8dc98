#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const ADMIN_EMAIL: &str = "admin@matricula.test";
pub const ADMIN_PASSWORD: &str = "admin-test-password";

pub struct TestServer {
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_matricula-api"));
        cmd.env("MATRICULA_API_PORT", port.to_string())
            .env("ADMIN_EMAIL", ADMIN_EMAIL)
            .env("ADMIN_PASSWORD", ADMIN_PASSWORD)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL / JWT_SECRET
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// The database-backed suites only run against a real store
pub fn database_available() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

/// Unique suffix for codes/emails so suites can share one database
pub fn unique(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .subsec_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}-{}", prefix, std::process::id(), nanos, n)
}

/// Login and return the access token
pub async fn login(base_url: &str, email: &str, password: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
    let body: Value = res.json().await?;
    Ok(body["data"]["access_token"]
        .as_str()
        .context("missing access_token")?
        .to_string())
}

pub async fn admin_token(base_url: &str) -> Result<String> {
    login(base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

/// Create a user through the admin API and return its id
pub async fn create_user(
    base_url: &str,
    admin_token: &str,
    email: &str,
    password: &str,
    roles: &[&str],
) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/users", base_url))
        .bearer_auth(admin_token)
        .json(&json!({
            "email": email,
            "name": email,
            "password": password,
            "roles": roles,
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "create_user failed: {}",
        res.status()
    );
    let body: Value = res.json().await?;
    Ok(body["data"]["id"].as_str().context("missing user id")?.to_string())
}

/// Create a section through the admin API and return its id
pub async fn create_section(
    base_url: &str,
    admin_token: &str,
    payload: Value,
) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/sections", base_url))
        .bearer_auth(admin_token)
        .json(&payload)
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "create_section failed: {}",
        res.status()
    );
    let body: Value = res.json().await?;
    Ok(body["data"]["id"].as_str().context("missing section id")?.to_string())
}
