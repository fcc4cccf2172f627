use std::collections::HashMap;
use std::env;
use std::str::FromStr;

pub const DEFAULT_JWT_ISSUER: &str = "budget-tracker";
pub const DEFAULT_JWT_AUDIENCE: &str = "budget-tracker-clients";
pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 60;
/// One year
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 60 * 24 * 365;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("expected development or production, got {}", other)),
        }
    }
}

/// Signing parameters for access tokens
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub jwt: JwtSettings,
    pub bcrypt_cost: u32,
    pub log_level: String,
}

impl Settings {
    /// Read settings from the process environment, after loading `.env` if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(&env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let access_token_minutes =
            parse_or(vars, "JWT_ACCESS_TOKEN_MINUTES", DEFAULT_ACCESS_TOKEN_MINUTES)?;
        if !(1..=MAX_ACCESS_TOKEN_MINUTES).contains(&access_token_minutes) {
            return Err(ConfigError::Invalid {
                name: "JWT_ACCESS_TOKEN_MINUTES",
                value: access_token_minutes.to_string(),
                reason: format!("must be between 1 and {}", MAX_ACCESS_TOKEN_MINUTES),
            });
        }

        let bcrypt_cost = parse_or(vars, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }

        Ok(Self {
            database_url: required(vars, "DATABASE_URL")?,
            database_max_connections: parse_or(vars, "DATABASE_MAX_CONNECTIONS", 5)?,
            host: optional(vars, "HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(vars, "PORT", 8080)?,
            environment: parse_or(vars, "APP_ENV", Environment::Production)?,
            jwt: JwtSettings {
                secret: required(vars, "JWT_SECRET")?,
                issuer: optional(vars, "JWT_ISSUER")
                    .unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
                audience: optional(vars, "JWT_AUDIENCE")
                    .unwrap_or_else(|| DEFAULT_JWT_AUDIENCE.to_string()),
                access_token_minutes,
            },
            bcrypt_cost,
            log_level: optional(vars, "LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(vars: &HashMap<String, String>, name: &'static str) -> Result<String, ConfigError> {
    optional(vars, name).ok_or(ConfigError::Missing(name))
}

fn parse_or<T>(vars: &HashMap<String, String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(vars, name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
