use anyhow::{Context, Result, anyhow};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::{debug, info};

use crate::{
    auth::password::hash_password,
    config::{BootstrapAdmin, Config},
    error::AppError,
    services::users::{self, CreateEmployee, NewEmployee},
};

pub async fn init_db(config: &Config) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

pub async fn run_migrations(pool: &MySqlPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to apply database migrations")?;

    info!("Database schema up to date");
    Ok(())
}

/// Creates the configured admin account unless an admin already exists.
pub async fn bootstrap_admin(pool: &MySqlPool, config: &Config) -> Result<()> {
    let Some(admin) = &config.bootstrap_admin else {
        debug!("No bootstrap admin configured");
        return Ok(());
    };

    if users::admin_exists(pool).await? {
        debug!("Admin account present, skipping bootstrap");
        return Ok(());
    }

    let account = bootstrap_account(admin).context("Invalid BOOTSTRAP_ADMIN_* settings")?;
    let hashed = hash_password(&account.password)
        .map_err(|e| anyhow!("Failed to hash admin password: {e}"))?;
    let user_id =
        users::insert_user(pool, &account.username, &hashed, &account.full_name, account.role)
            .await?;

    info!(user_id, username = %account.username, "Bootstrap admin created");
    Ok(())
}

/// Runs the bootstrap credentials through the same checks as an admin-created account.
fn bootstrap_account(admin: &BootstrapAdmin) -> Result<NewEmployee, AppError> {
    CreateEmployee {
        username: Some(admin.username.clone()),
        password: Some(admin.password.clone()),
        full_name: Some(admin.full_name.clone()),
        role: Some("admin".to_string()),
    }
    .validate()
}
