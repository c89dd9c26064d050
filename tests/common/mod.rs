#![allow(dead_code)]

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use hospital_api::{app, config::AppConfig, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Start a fresh server on its own memory store (doctors seeded)
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(AppConfig::in_memory()).await
}

pub async fn spawn_server_with(config: AppConfig) -> Result<TestServer> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let state = AppState::from_config(config).await?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    Ok(TestServer { port, base_url })
}

/// A client that keeps the session cookie between requests, like a browser
pub fn session_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().cookie_store(true).build()?)
}

pub fn user_payload(username: &str, role: &str) -> Value {
    json!({
        "username": username,
        "password": "secret-password",
        "role": role,
        "name": format!("{} Example", username),
        "email": format!("{}@example.com", username),
    })
}

/// Register (and thereby log in) a user on the given client
pub async fn register(
    server: &TestServer,
    client: &reqwest::Client,
    username: &str,
    role: &str,
) -> Result<Value> {
    let res = client
        .post(server.url("/api/register"))
        .json(&user_payload(username, role))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "register {} failed: {}",
        username,
        res.status()
    );
    Ok(res.json().await?)
}

/// Fresh logged-in client plus the user it is logged in as
pub async fn logged_in(server: &TestServer, username: &str, role: &str) -> Result<(reqwest::Client, Value)> {
    let client = session_client()?;
    let user = register(server, &client, username, role).await?;
    Ok((client, user))
}

pub fn doctor_payload(name: &str) -> Value {
    json!({
        "name": name,
        "specialization": "Dermatology",
        "bio": "Skin specialist",
        "imageUrl": "https://images.example.com/doctor.jpg",
        "availability": "Mon-Thu 09:00-15:00",
    })
}
