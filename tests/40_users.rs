mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::{expect_json, TestServer};

#[tokio::test]
async fn agents_are_listed_by_email_without_credentials() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.get(&server.employee, "/users/agents").send().await?;
    let body = expect_json(res, StatusCode::OK).await?;
    let agents = body.as_array().cloned().unwrap_or_default();

    let emails: Vec<&str> = agents.iter().filter_map(|a| a["email"].as_str()).collect();
    assert_eq!(emails, vec!["adam.agent@example.com", "zoe.agent@example.com"]);

    for agent in &agents {
        assert_eq!(agent["role"], "agent");
        assert!(agent.get("password_hash").is_none());
        assert!(agent.get("passwordHash").is_none());
    }
    Ok(())
}
