use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;
use sqlx::mysql::MySqlConnectOptions;

pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_LLM_MODEL: &str = "gemini-1.5-flash";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub api_prefix: String,
    pub database: MySqlConnectOptions,

    // Model endpoint
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub prompt_template_path: Option<String>,

    pub roster_ttl: Duration,
    pub late_threshold: NaiveTime,

    // Rate limiting
    pub rate_ask_per_min: u32,
    pub rate_refresh_per_min: u32,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    /// Load `.env`, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let llm_api_key = get("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("GEMINI_API_KEY must be set"))?;

        let database = match get("DATABASE_URL") {
            Some(url) => MySqlConnectOptions::from_str(&url).context("DATABASE_URL is not a valid MySQL URL")?,
            None => database_from_parts(&get)?,
        };

        let late_threshold = NaiveTime::parse_from_str(&var("LATE_THRESHOLD", "09:00:00"), "%H:%M:%S")
            .context("LATE_THRESHOLD must be HH:MM:SS")?;

        Ok(Self {
            server_addr: var("SERVER_ADDR", "127.0.0.1:8080"),
            api_prefix: var("API_PREFIX", "/api"),
            database,

            llm_api_key,
            llm_base_url: var("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: var("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_timeout: Duration::from_secs(parse(&get, "LLM_TIMEOUT_SECS", 30)?),
            prompt_template_path: get("PROMPT_TEMPLATE_PATH"),

            roster_ttl: Duration::from_secs(parse(&get, "ROSTER_TTL_SECS", 300)?), // 5 min
            late_threshold,

            rate_ask_per_min: parse(&get, "RATE_ASK_PER_MIN", 60)?,
            rate_refresh_per_min: parse(&get, "RATE_REFRESH_PER_MIN", 6)?,

            log_dir: var("LOG_DIR", "logs"),
            log_level: parse(&get, "LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

/// Connection options from the separate `DB_*` settings.
fn database_from_parts(get: &impl Fn(&str) -> Option<String>) -> Result<MySqlConnectOptions> {
    let required = |key: &str| get(key).ok_or_else(|| anyhow!("DATABASE_URL or {} must be set", key));

    let host = required("DB_HOST")?;
    let name = required("DB_NAME")?;
    let user = required("DB_USER")?;
    let password = required("DB_PASSWORD")?;
    let port: u16 = parse(get, "DB_PORT", 3306)?;

    Ok(MySqlConnectOptions::new()
        .host(&host)
        .port(port)
        .username(&user)
        .password(&password)
        .database(&name))
}
