use anyhow::{bail, Context, Result};

use crate::translation::{DEFAULT_API_URL, MAX_ATTEMPTS_LIMIT};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Sender address for every notification; also the operator inbox.
    pub default_from_email: String,
    /// When false, notifications report success without transmitting.
    pub email_delivery_enabled: bool,
    pub smtp: Option<SmtpConfig>,
    pub translation: TranslationConfig,
    /// Staff account created at startup when missing.
    pub staff_account: Option<StaffAccount>,
}

#[derive(Debug, Clone)]
pub struct StaffAccount {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub api_url: String,
    pub target_lang: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let email_delivery_enabled = match get("EMAIL_DELIVERY_ENABLED") {
            Some(v) => parse_bool(&v).context("EMAIL_DELIVERY_ENABLED must be true or false")?,
            None => true,
        };

        let smtp = match get("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_or(get("SMTP_PORT"), 587, "SMTP_PORT")?,
                username: get("SMTP_USERNAME"),
                password: get("SMTP_PASSWORD"),
                timeout_secs: parse_or(get("SMTP_TIMEOUT_SECS"), 10, "SMTP_TIMEOUT_SECS")?,
            }),
            None => None,
        };
        if email_delivery_enabled && smtp.is_none() {
            bail!("SMTP_HOST must be set when EMAIL_DELIVERY_ENABLED is true");
        }

        let max_attempts: u32 =
            parse_or(get("TRANSLATION_MAX_ATTEMPTS"), 2, "TRANSLATION_MAX_ATTEMPTS")?;
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&max_attempts) {
            bail!("TRANSLATION_MAX_ATTEMPTS must be between 1 and {MAX_ATTEMPTS_LIMIT}");
        }

        let staff_account = match (get("STAFF_USERNAME"), get("STAFF_PASSWORD")) {
            (Some(username), Some(password)) => Some(StaffAccount { username, password }),
            (None, None) => None,
            _ => bail!("STAFF_USERNAME and STAFF_PASSWORD must be set together"),
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            port: parse_or(get("PORT"), 8080, "PORT")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            default_from_email: require("DEFAULT_FROM_EMAIL")?,
            email_delivery_enabled,
            smtp,
            translation: TranslationConfig {
                api_url: get("TRANSLATION_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                target_lang: get("TRANSLATION_TARGET_LANG").unwrap_or_else(|| "en".to_string()),
                timeout_secs: parse_or(get("TRANSLATION_TIMEOUT_SECS"), 5, "TRANSLATION_TIMEOUT_SECS")?,
                max_attempts,
            },
            staff_account,
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T, key: &str) -> Result<T> {
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} must be a valid number")),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
