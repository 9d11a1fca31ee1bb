use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    /// Forces JSON (`true`) or pretty (`false`) log output; unset follows `env`.
    pub log_json: Option<bool>,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Persistence slot
    pub profiles_store_path: PathBuf,
    pub persist_retry_max_elapsed_ms: u64,

    // Seed dataset
    pub seed_data: String,
    pub seed_fetch_timeout_seconds: u64,

    // Geocoding
    pub mapbox_token: Option<String>,
    pub geocoding_url: String,
    pub geocoding_timeout_seconds: u64,
    pub geocoding_debounce_ms: u64,
    pub geocoding_session_ttl_seconds: u64,
}

pub const DEFAULT_GEOCODING_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let log_json = match env::var("LOG_FORMAT").ok().as_deref().map(str::trim) {
            Some("json") => Some(true),
            Some("pretty") | Some("text") => Some(false),
            _ => None,
        };

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Persistence slot
        let profiles_store_path = env::var("PROFILES_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/profiles.json"));
        let persist_retry_max_elapsed_ms = parse_var("PERSIST_RETRY_MAX_ELAPSED_MS", 2000)?;

        // Seed dataset
        let seed_data =
            env::var("SEED_DATA").unwrap_or_else(|_| "mock-data/profiles.json".to_string());
        let seed_fetch_timeout_seconds = parse_var("SEED_FETCH_TIMEOUT_SECONDS", 10)?;

        // Geocoding (a missing token disables suggestions, it is not a startup error)
        let mapbox_token = env::var("MAPBOX_TOKEN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let geocoding_url =
            env::var("GEOCODING_URL").unwrap_or_else(|_| DEFAULT_GEOCODING_URL.to_string());
        let geocoding_timeout_seconds = parse_var("GEOCODING_TIMEOUT_SECONDS", 10)?;
        let geocoding_debounce_ms = parse_var("GEOCODING_DEBOUNCE_MS", 300)?;
        let geocoding_session_ttl_seconds = parse_var("GEOCODING_SESSION_TTL_SECONDS", 600)?;

        Ok(Settings {
            env,
            server_addr,
            log_json,
            cors_allow_origins,
            profiles_store_path,
            persist_retry_max_elapsed_ms,
            seed_data,
            seed_fetch_timeout_seconds,
            mapbox_token,
            geocoding_url,
            geocoding_timeout_seconds,
            geocoding_debounce_ms,
            geocoding_session_ttl_seconds,
        })
    }
}

/// Read a numeric variable, falling back to `default` when unset.
/// A set-but-malformed value is a configuration error.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Settings {
    /// Settings suitable for unit tests; nothing here touches the process environment.
    pub fn for_tests() -> Self {
        Settings {
            env: Environment::Dev,
            server_addr: "127.0.0.1:0".to_string(),
            log_json: None,
            cors_allow_origins: vec!["http://localhost:5173".to_string()],
            profiles_store_path: PathBuf::from("profiles.json"),
            persist_retry_max_elapsed_ms: 0,
            seed_data: "mock-data/profiles.json".to_string(),
            seed_fetch_timeout_seconds: 5,
            mapbox_token: None,
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            geocoding_timeout_seconds: 5,
            geocoding_debounce_ms: 0,
            geocoding_session_ttl_seconds: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing_is_lenient() {
        assert_eq!(Environment::from_str("PRODUCTION"), Environment::Prod);
        assert_eq!(Environment::from_str("staging"), Environment::Staging);
        assert_eq!(Environment::from_str("anything"), Environment::Dev);
    }

    #[test]
    fn unset_numeric_var_uses_default() {
        let value: u64 = parse_var("PROFILE_ATLAS_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
