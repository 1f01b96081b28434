use clap::Args;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::StoreHandle;
use crate::services::UserService;
use crate::types::Role;

#[derive(Args, Debug)]
pub struct SeedUserArgs {
    #[arg(help = "Login email, matched exactly")]
    pub email: String,

    #[arg(long, help = "Plaintext password; stored as a bcrypt hash")]
    pub password: String,

    #[arg(long, help = "Display name")]
    pub name: Option<String>,

    #[arg(long, default_value = "employee", help = "employee, agent or admin")]
    pub role: Role,
}

pub async fn handle(args: SeedUserArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let handle = StoreHandle::open(&config.database).await?;
    if !handle.is_persistent() {
        anyhow::bail!("DATABASE_URL must be set; the in-memory store does not outlive this command");
    }

    let users = UserService::new(handle.store.clone(), config.security.bcrypt_cost);
    let result = users
        .seed_user(&args.email, &args.password, args.name.as_deref(), args.role)
        .await;
    handle.close().await;
    let user = result?;

    output_success(
        &output_format,
        &format!("User {} ({}) ready", user.email, user.role),
        Some(json!({ "user": user })),
    )
}
