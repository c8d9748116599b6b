//! Application settings loaded from the environment (and `.env` via `dotenv`).
//!
//! | Env Var                        | Required | Default   |
//! |--------------------------------|----------|-----------|
//! | `ENVIRONMENT`                  | **yes**  | --        |
//! | `DATABASE_URL`                 | **yes**  | --        |
//! | `LOG_LEVEL`                    | **yes**  | --        |
//! | `SECRET_KEY`                   | **yes**  | --        |
//! | `ALGORITHM`                    | no       | `HS256`   |
//! | `ACCESS_TOKEN_EXPIRE_MINUTES`  | no       | `30`      |
//! | `DATABASE_POOL_SIZE`           | no       | `10`      |
//! | `FIRST_SUPERUSER_USERNAME`     | no       | --        |
//! | `FIRST_SUPERUSER_EMAIL`        | no       | --        |
//! | `FIRST_SUPERUSER_PASSWORD`     | no       | --        |
//! | `HIERARCHY_NORMALIZE_NAMES`    | no       | `true`    |
//! | `HIERARCHY_EMPTY_PATH`         | no       | `reject`  |

use jsonwebtoken::Algorithm;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("FIRST_SUPERUSER_USERNAME, FIRST_SUPERUSER_EMAIL and FIRST_SUPERUSER_PASSWORD must be set together")]
    IncompleteSuperuser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// The `tracing` filter directive for this level. `tracing` has no
    /// critical level, so it collapses onto `error`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            _ => Err(()),
        }
    }
}

/// What to do when a hierarchy path contains no usable components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPathPolicy {
    Reject,
    Allow,
}

impl FromStr for EmptyPathPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(EmptyPathPolicy::Reject),
            "allow" => Ok(EmptyPathPolicy::Allow),
            _ => Err(()),
        }
    }
}

/// Rules applied when splitting a tag path into component names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyPolicy {
    /// Trim and lower-case every component.
    pub normalize_names: bool,
    pub empty_path: EmptyPathPolicy,
}

impl Default for HierarchyPolicy {
    fn default() -> Self {
        Self {
            normalize_names: true,
            empty_path: EmptyPathPolicy::Reject,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FirstSuperuser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub database_url: String,
    pub database_pool_size: u32,
    pub log_level: LogLevel,
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub first_superuser: Option<FirstSuperuser>,
    pub hierarchy: HierarchyPolicy,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let environment = parse_required(&require, "ENVIRONMENT")?;
        let database_url = require("DATABASE_URL")?;
        let log_level = parse_required(&require, "LOG_LEVEL")?;
        let secret_key = require("SECRET_KEY")?;

        let algorithm = match get("ALGORITHM") {
            None => Algorithm::HS256,
            Some(value) => match value.as_str() {
                "HS256" => Algorithm::HS256,
                "HS384" => Algorithm::HS384,
                "HS512" => Algorithm::HS512,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "ALGORITHM",
                        value,
                    })
                }
            },
        };

        let access_token_expire_minutes = parse_optional(
            &get,
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
        )?;
        let database_pool_size = parse_optional(&get, "DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?;

        let first_superuser = match (
            get("FIRST_SUPERUSER_USERNAME"),
            get("FIRST_SUPERUSER_EMAIL"),
            get("FIRST_SUPERUSER_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(FirstSuperuser {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::IncompleteSuperuser),
        };

        let defaults = HierarchyPolicy::default();
        let hierarchy = HierarchyPolicy {
            normalize_names: parse_optional(
                &get,
                "HIERARCHY_NORMALIZE_NAMES",
                defaults.normalize_names,
            )?,
            empty_path: parse_optional(&get, "HIERARCHY_EMPTY_PATH", defaults.empty_path)?,
        };

        Ok(Self {
            environment,
            database_url,
            database_pool_size,
            log_level,
            secret_key,
            algorithm,
            access_token_expire_minutes,
            first_superuser,
            hierarchy,
        })
    }
}

fn parse_required<T, R>(require: &R, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    R: Fn(&'static str) -> Result<String, ConfigError>,
{
    let value = require(key)?;
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn parse_optional<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("ENVIRONMENT", "development".to_string()),
            ("DATABASE_URL", "postgres://localhost/notekeeper".to_string()),
            ("LOG_LEVEL", "info".to_string()),
            ("SECRET_KEY", "not-a-real-secret".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let settings = load(&base_env()).expect("base env should load");

        assert_eq!(settings.environment, Environment::Development);
        assert_eq!(settings.log_level, LogLevel::Info);
        assert_eq!(settings.algorithm, Algorithm::HS256);
        assert_eq!(settings.access_token_expire_minutes, 30);
        assert_eq!(settings.database_pool_size, 10);
        assert!(settings.first_superuser.is_none());
        assert_eq!(settings.hierarchy, HierarchyPolicy::default());
    }

    #[test]
    fn test_missing_secret_key() {
        let mut env = base_env();
        env.remove("SECRET_KEY");
        assert_eq!(load(&env).unwrap_err(), ConfigError::Missing("SECRET_KEY"));

        // Blank values count as missing
        env.insert("SECRET_KEY", "   ".to_string());
        assert_eq!(load(&env).unwrap_err(), ConfigError::Missing("SECRET_KEY"));
    }

    #[test]
    fn test_invalid_environment() {
        let mut env = base_env();
        env.insert("ENVIRONMENT", "moon".to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid {
                key: "ENVIRONMENT",
                ..
            })
        ));
    }

    #[test]
    fn test_hierarchy_policy_overrides() {
        let mut env = base_env();
        env.insert("HIERARCHY_NORMALIZE_NAMES", "false".to_string());
        env.insert("HIERARCHY_EMPTY_PATH", "Allow".to_string());

        let settings = load(&env).unwrap();
        assert!(!settings.hierarchy.normalize_names);
        assert_eq!(settings.hierarchy.empty_path, EmptyPathPolicy::Allow);

        env.insert("HIERARCHY_EMPTY_PATH", "sometimes".to_string());
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_first_superuser_requires_all_fields() {
        let mut env = base_env();
        env.insert("FIRST_SUPERUSER_USERNAME", "admin".to_string());
        assert_eq!(load(&env).unwrap_err(), ConfigError::IncompleteSuperuser);

        env.insert("FIRST_SUPERUSER_EMAIL", "admin@example.com".to_string());
        env.insert("FIRST_SUPERUSER_PASSWORD", "Password123!".to_string());
        let superuser = load(&env).unwrap().first_superuser.unwrap();
        assert_eq!(superuser.username, "admin");
        assert_eq!(superuser.email, "admin@example.com");
    }

    #[test]
    fn test_log_level_filters() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap().as_filter(), "warn");
        assert_eq!("critical".parse::<LogLevel>().unwrap().as_filter(), "error");
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_unsupported_algorithm() {
        let mut env = base_env();
        env.insert("ALGORITHM", "RS256".to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid {
                key: "ALGORITHM",
                ..
            })
        ));
    }
}
