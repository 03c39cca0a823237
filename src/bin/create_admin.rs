//! Bootstrap tool: admin accounts are never self-registered, they are
//! created here (or later from the dashboard by an existing admin).
//!
//! Usage: `create-admin <email> <password> <name> [--super]`

use anyhow::{bail, Context};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use hoamai_server::auth::hash_password;
use hoamai_server::models::{AdminAccount, AdminRole};
use hoamai_server::store::{ContentStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (email, password, name) = match (args.next(), args.next(), args.next()) {
        (Some(email), Some(password), Some(name)) => (email, password, name),
        _ => {
            eprintln!("usage: create-admin <email> <password> <name> [--super]");
            std::process::exit(2);
        }
    };
    let role = if args.next().as_deref() == Some("--super") {
        AdminRole::SuperAdmin
    } else {
        AdminRole::Admin
    };
    if password.chars().count() < 6 {
        bail!("password must be at least 6 characters");
    }

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;
    let store = PgStore::new(pool);

    let admin = AdminAccount {
        id: Uuid::new_v4(),
        email,
        password_hash: hash_password(&password)
            .map_err(|_| anyhow::anyhow!("failed to hash password"))?,
        name,
        role,
        is_active: true,
        last_login_at: None,
        created_at: Utc::now(),
    };
    store.create_admin(&admin).await?;
    println!("created admin account {} ({})", admin.email, admin.id);
    Ok(())
}
