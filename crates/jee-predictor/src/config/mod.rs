use crate::colleges::DEFAULT_TOP_N;
use crate::estimation::RankModelKind;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Candidate count used when a request does not supply one.
pub const DEFAULT_TOTAL_CANDIDATES: u32 = 1_400_000;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub prediction: PredictionSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            prediction: PredictionSettings::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Estimation defaults and where to find reference data.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSettings {
    pub data_dir: Option<PathBuf>,
    pub total_candidates: u32,
    pub top_n: usize,
    pub rank_model: RankModelKind,
}

impl PredictionSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let data_dir = env::var("PREDICTOR_DATA_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let total_candidates = match env::var("PREDICTOR_TOTAL_CANDIDATES") {
            Ok(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or(ConfigError::InvalidTotalCandidates)?,
            Err(_) => DEFAULT_TOTAL_CANDIDATES,
        };

        let top_n = match env::var("PREDICTOR_TOP_N") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidTopN)?,
            Err(_) => DEFAULT_TOP_N,
        };

        let rank_model = match env::var("PREDICTOR_RANK_MODEL") {
            Ok(value) => value
                .parse::<RankModelKind>()
                .map_err(|_| ConfigError::InvalidRankModel { value })?,
            Err(_) => RankModelKind::default(),
        };

        Ok(Self {
            data_dir,
            total_candidates,
            top_n,
            rank_model,
        })
    }
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            total_candidates: DEFAULT_TOTAL_CANDIDATES,
            top_n: DEFAULT_TOP_N,
            rank_model: RankModelKind::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTotalCandidates,
    InvalidTopN,
    InvalidRankModel { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTotalCandidates => {
                write!(f, "PREDICTOR_TOTAL_CANDIDATES must be a positive integer")
            }
            ConfigError::InvalidTopN => write!(f, "PREDICTOR_TOP_N must be a valid usize"),
            ConfigError::InvalidRankModel { value } => write!(
                f,
                "PREDICTOR_RANK_MODEL '{}' must be 'proportional' or 'historical'",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTotalCandidates
            | ConfigError::InvalidTopN
            | ConfigError::InvalidRankModel { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "PREDICTOR_DATA_DIR",
            "PREDICTOR_TOTAL_CANDIDATES",
            "PREDICTOR_TOP_N",
            "PREDICTOR_RANK_MODEL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.prediction, PredictionSettings::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_prediction_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PREDICTOR_DATA_DIR", "/srv/predictor");
        env::set_var("PREDICTOR_TOTAL_CANDIDATES", "1250000");
        env::set_var("PREDICTOR_TOP_N", "12");
        env::set_var("PREDICTOR_RANK_MODEL", "Historical");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(
            config.prediction.data_dir.as_deref(),
            Some(std::path::Path::new("/srv/predictor"))
        );
        assert_eq!(config.prediction.total_candidates, 1_250_000);
        assert_eq!(config.prediction.top_n, 12);
        assert_eq!(config.prediction.rank_model, RankModelKind::Historical);
    }

    #[test]
    fn rejects_zero_candidates_and_unknown_model() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PREDICTOR_TOTAL_CANDIDATES", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTotalCandidates)
        ));

        reset_env();
        env::set_var("PREDICTOR_RANK_MODEL", "neural");
        let error = AppConfig::load().expect_err("unknown model");
        reset_env();
        assert!(error.to_string().contains("neural"));
    }
}
