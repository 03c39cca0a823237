//! Process-wide configuration, read once at startup. Anything missing or
//! malformed aborts the boot; in particular a session key of the wrong
//! length must never be "fixed up" into a weaker one.

use std::net::SocketAddr;

use anyhow::{bail, Context};

pub const ADMIN_COOKIE: &str = "hoamai_session";
pub const PARENT_COOKIE: &str = "hoamai_parent_session";
pub const TEACHER_COOKIE: &str = "hoamai_teacher_session";

/// One AES-256-GCM key per portal, so an admin cookie can never be replayed
/// against the parent or teacher stack.
pub struct SessionKeys {
    pub admin: Vec<u8>,
    pub parent: Vec<u8>,
    pub teacher: Vec<u8>,
}

pub struct Config {
    pub bind: SocketAddr,
    pub database_url: String,
    pub production: bool,
    pub session_keys: SessionKeys,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let bind = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .context("BIND_ADDR is not a valid socket address")?;
        let production = matches!(std::env::var("APP_ENV").as_deref(), Ok("production"));
        Ok(Self {
            bind,
            database_url,
            production,
            session_keys: SessionKeys {
                admin: session_key("HOAMAI_ADMIN_SESSION_KEY")?,
                parent: session_key("HOAMAI_PARENT_SESSION_KEY")?,
                teacher: session_key("HOAMAI_TEACHER_SESSION_KEY")?,
            },
        })
    }
}

fn session_key(var: &str) -> anyhow::Result<Vec<u8>> {
    let hex_key = std::env::var(var).with_context(|| format!("{var} is not set"))?;
    let bytes =
        hex::decode(hex_key.trim()).with_context(|| format!("{var} is not valid hex"))?;
    if bytes.len() != 32 {
        bail!("{var} must be 64 hex chars (32 bytes), got {} bytes", bytes.len());
    }
    Ok(bytes)
}
