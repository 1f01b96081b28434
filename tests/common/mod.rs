#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use helpdesk_api::config::AppConfig;
use helpdesk_api::database::MemoryStore;
use helpdesk_api::server::{app, AppState};
use helpdesk_api::types::Role;

pub const PASSWORD: &str = "password123";

#[derive(Debug, Clone)]
pub struct SeededUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

/// Router running in-process on a free port against a fresh in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    pub employee: SeededUser,
    pub other_employee: SeededUser,
    pub agent: SeededUser,
    pub second_agent: SeededUser,
    pub admin: SeededUser,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;
        config.security.jwt_secret = "integration-secret".to_string();
        config.security.bcrypt_cost = 4;

        let state = AppState::new(config.clone(), Arc::new(MemoryStore::new()));
        let accounts = [
            ("emp@example.com", Role::Employee),
            ("emp2@example.com", Role::Employee),
            ("zoe.agent@example.com", Role::Agent),
            ("adam.agent@example.com", Role::Agent),
            ("boss@example.com", Role::Admin),
        ];
        for (email, role) in accounts {
            state.users.seed_user(email, PASSWORD, None, role).await?;
        }

        let listener = tokio::net::TcpListener::bind(config.bind_addr())
            .await
            .context("failed to bind test listener")?;
        let router = app(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let client = reqwest::Client::new();
        let mut logged_in = Vec::with_capacity(accounts.len());
        for (email, _) in accounts {
            logged_in.push(login(&client, &base_url, email).await?);
        }
        let [employee, other_employee, agent, second_agent, admin]: [SeededUser; 5] = logged_in
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected five seeded users"))?;

        Ok(Self {
            port,
            base_url,
            client,
            employee,
            other_employee,
            agent,
            second_agent,
            admin,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, user: &SeededUser, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&user.token)
    }

    pub fn post(&self, user: &SeededUser, path: &str, body: Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&user.token).json(&body)
    }

    pub fn patch(&self, user: &SeededUser, path: &str, body: Value) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(&user.token).json(&body)
    }

    /// Create a ticket and return its detail body
    pub async fn create_ticket(&self, user: &SeededUser, title: &str) -> Result<Value> {
        let res = self
            .post(
                user,
                "/tickets",
                json!({ "title": title, "description": "Something is broken" }),
            )
            .send()
            .await?;
        expect_json(res, StatusCode::CREATED).await
    }
}

async fn login(client: &reqwest::Client, base_url: &str, email: &str) -> Result<SeededUser> {
    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await?;
    let body = expect_json(res, StatusCode::OK).await?;

    Ok(SeededUser {
        id: body["user"]["id"].as_i64().context("login response without user id")?,
        email: email.to_string(),
        token: body["token"].as_str().context("login response without token")?.to_string(),
    })
}

/// Assert the status and decode the body, keeping the body in the failure message
pub async fn expect_json(res: Response, expected: StatusCode) -> Result<Value> {
    let status = res.status();
    let body = res.json::<Value>().await?;
    anyhow::ensure!(status == expected, "expected {}, got {}: {}", expected, status, body);
    Ok(body)
}

/// Assert an error response and return its body
pub async fn expect_error(res: Response, expected: StatusCode) -> Result<Value> {
    let body = expect_json(res, expected).await?;
    anyhow::ensure!(body["error"] == true, "error body without error flag: {}", body);
    Ok(body)
}
