use std::collections::BTreeMap;
use std::env;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::Weekday;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::services::report::ReportSettings;

/// Hourly rate and seed password for one rostered employee.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmployeeConfig {
    pub rate: f64,
    pub password: String,
}

/// Employee name -> rate/password, as read from the roster file.
pub type Roster = BTreeMap<String, EmployeeConfig>;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub jwt_secret: String,
    pub session_expiration_hours: i64,
    pub cors_origin: String,
    pub timezone: Tz,
    pub week_start: Weekday,
    pub flat_weekly_tax: f64,
    pub fallback_hourly_rate: f64,
    pub reset_pin: String,
    pub admin_username: String,
    pub admin_password: String,
    pub roster: Roster,
    pub max_upload_bytes: usize,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let timezone_name = var_or("TIMEZONE", "America/Chicago");
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid TIMEZONE {}: {}", timezone_name, e))?;

        let week_start_name = var_or("WEEK_START", "monday");
        let week_start = week_start_name
            .parse::<Weekday>()
            .map_err(|e| anyhow!("Invalid WEEK_START {}: {:?}", week_start_name, e))?;

        let roster_file = var_or("ROSTER_FILE", "roster.json");

        Ok(Config {
            database_url: var_or("DATABASE_URL", "sqlite://payroll_clock.db"),
            host: var_or("HOST", "127.0.0.1"),
            port: parse_var("PORT", "8080")?,
            environment: var_or("ENVIRONMENT", "development"),
            jwt_secret: var_or(
                "JWT_SECRET",
                "payroll-clock-development-secret-change-this-in-production",
            ),
            session_expiration_hours: parse_var("SESSION_EXPIRATION_HOURS", "12")?,
            cors_origin: var_or("CORS_ORIGIN", "http://localhost:3000"),
            timezone,
            week_start,
            flat_weekly_tax: parse_var("FLAT_WEEKLY_TAX", "20")?,
            fallback_hourly_rate: parse_var("FALLBACK_HOURLY_RATE", "15")?,
            reset_pin: var_or("RESET_PIN", "2003"),
            admin_username: var_or("ADMIN_USERNAME", "admin"),
            admin_password: var_or("ADMIN_PASSWORD", "admin123"),
            roster: load_roster(Path::new(&roster_file))?,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", "10485760")?,
            bcrypt_cost: parse_var("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Hourly rate for a rostered employee, or the fallback rate for anyone else.
    pub fn rate_for(&self, username: &str) -> f64 {
        self.roster
            .get(username)
            .map(|employee| employee.rate)
            .unwrap_or(self.fallback_hourly_rate)
    }

    pub fn employee_names(&self) -> Vec<String> {
        self.roster.keys().cloned().collect()
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            timezone: self.timezone,
            week_start: self.week_start,
            flat_tax: self.flat_weekly_tax,
        }
    }
}

/// Read the roster JSON file. A missing file yields an empty roster.
pub fn load_roster(path: &Path) -> Result<Roster> {
    if !path.exists() {
        log::warn!(
            "Roster file {} not found, starting with an empty roster",
            path.display()
        );
        return Ok(Roster::new());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster file {}", path.display()))?;
    parse_roster(&raw).with_context(|| format!("Invalid roster file {}", path.display()))
}

pub fn parse_roster(raw: &str) -> Result<Roster> {
    let roster: Roster = serde_json::from_str(raw)?;

    if let Some((name, _)) = roster
        .iter()
        .find(|(_, employee)| !employee.rate.is_finite() || employee.rate < 0.0)
    {
        return Err(anyhow!("Employee {} has an invalid hourly rate", name));
    }

    Ok(roster)
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = var_or(key, default);
    raw.parse::<T>()
        .map_err(|e| anyhow!("Invalid value for {}: {} ({})", key, raw, e))
}
