use anyhow::Context;
use std::net::SocketAddr;

use crate::render::export::{DEFAULT_SCALE, MAX_SCALE, MIN_SCALE};

/// Server settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// PostgreSQL URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub skip_migrations: bool,
    /// Permissive CORS for local development.
    pub debug_mode: bool,
    pub allowed_origins: Vec<String>,
    /// Directory with the built client, served for non-API paths.
    pub static_dir: Option<String>,
    pub export_scale: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            database_url: None,
            skip_migrations: false,
            debug_mode: false,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            static_dir: None,
            export_scale: DEFAULT_SCALE,
        }
    }
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v.parse::<u16>().context("PORT must be a valid number")?,
            None => defaults.port,
        };

        let export_scale = match lookup("EXPORT_SCALE") {
            Some(v) => {
                let scale = v.parse::<u32>().context("EXPORT_SCALE must be a number")?;
                anyhow::ensure!(
                    (MIN_SCALE..=MAX_SCALE).contains(&scale),
                    "EXPORT_SCALE must be between {} and {}",
                    MIN_SCALE,
                    MAX_SCALE
                );
                scale
            }
            None => defaults.export_scale,
        };

        let allowed_origins = match lookup("ALLOWED_ORIGINS") {
            Some(v) => v
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None => defaults.allowed_origins,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            skip_migrations: lookup("SKIP_MIGRATIONS").map(|v| flag(&v)).unwrap_or(false),
            debug_mode: lookup("DEBUG_MODE").map(|v| flag(&v)).unwrap_or(false),
            allowed_origins,
            static_dir: lookup("STATIC_DIR").filter(|v| !v.is_empty()),
            export_scale,
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
