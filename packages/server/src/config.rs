use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::domains::reviews::{MatchMode, DEFAULT_BLOCKLIST};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub bind_address: String,
    pub port: u16,
    /// Tokens that cause a review to be rejected.
    pub moderation_blocklist: Vec<String>,
    pub moderation_match_mode: MatchMode,
    /// Per-message moderation deadline, measured from dequeue.
    pub moderation_timeout: Duration,
    /// Server-side timeout for each blocking pop.
    pub queue_poll_timeout: Duration,
    /// Time given to in-flight HTTP requests after shutdown starts.
    pub shutdown_grace: Duration,
    /// Run the pipeline consumers inside the HTTP server process.
    pub run_workers: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8888)?,
            moderation_blocklist: env::var("MODERATION_BLOCKLIST")
                .map(|raw| parse_list(&raw))
                .unwrap_or_else(|_| DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect()),
            moderation_match_mode: parse_var("MODERATION_MATCH_MODE", MatchMode::WordBoundary)?,
            moderation_timeout: Duration::from_secs(parse_var("MODERATION_TIMEOUT_SECS", 15)?),
            queue_poll_timeout: Duration::from_secs(parse_var("QUEUE_POLL_TIMEOUT_SECS", 1)?),
            shutdown_grace: Duration::from_secs(parse_var("SHUTDOWN_GRACE_SECS", 5)?),
            run_workers: parse_var("RUN_WORKERS", true)?,
        })
    }

    /// Time a consumer may need to finish after shutdown starts: one pop
    /// window plus a full moderation deadline, with a second of slack.
    pub fn worker_grace(&self) -> Duration {
        self.queue_poll_timeout + self.moderation_timeout + Duration::from_secs(1)
    }

    /// Shutdown grace for a host running the HTTP listener, and optionally
    /// the consumers alongside it.
    pub fn host_grace(&self, with_workers: bool) -> Duration {
        let http = self.shutdown_grace + Duration::from_secs(1);
        if with_workers {
            http.max(self.worker_grace())
        } else {
            http
        }
    }

    /// Address the HTTP listener binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        _ => Ok(default),
    }
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
