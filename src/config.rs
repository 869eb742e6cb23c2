//! Configuration from environment variables
//!
//! Each stage of the pipeline reads only the section it needs:
//! - `DataPaths` - artifact locations shared by every binary
//! - `FetchConfig` - RTMS API access for `fetch_deals`
//! - `TrainConfig` - split/seed/forest settings for `train_model`
//! - `ServerConfig` - bind address and location label for `forecast_server`

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Csv,
    Sqlite,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Csv => "csv",
            BackendType::Sqlite => "sqlite",
        }
    }

    /// Parse `--backend csv|sqlite` from the command line (default: csv)
    pub fn parse_from_args() -> BackendType {
        let args: Vec<String> = env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> BackendType {
        if let Some(idx) = args.iter().position(|x| x == "--backend") {
            match args.get(idx + 1).map(|s| s.as_str()) {
                Some("sqlite") => return BackendType::Sqlite,
                Some("csv") => return BackendType::Csv,
                _ => {}
            }
        }

        BackendType::Csv
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Locations of every persisted artifact
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Raw transaction CSV written by the fetcher
    pub raw_csv: String,

    /// Raw transaction SQLite database (used with `--backend sqlite`)
    pub raw_db: String,

    /// Labeled training table
    pub training_csv: String,

    /// Drop histogram written next to the training table
    pub drop_report: String,

    /// Serialized model bundle
    pub model: String,
}

impl DataPaths {
    /// Environment variables:
    /// - `ESTATE_RAW_PATH` (default: data/sangdo_raw.csv)
    /// - `ESTATE_DB_PATH` (default: data/sangdo_raw.db)
    /// - `ESTATE_TRAINING_PATH` (default: data/sangdo_training.csv)
    /// - `ESTATE_DROP_REPORT_PATH` (default: data/sangdo_drop_report.json)
    /// - `ESTATE_MODEL_PATH` (default: ml/model.json)
    pub fn from_env() -> Self {
        Self {
            raw_csv: var_or("ESTATE_RAW_PATH", "data/sangdo_raw.csv"),
            raw_db: var_or("ESTATE_DB_PATH", "data/sangdo_raw.db"),
            training_csv: var_or("ESTATE_TRAINING_PATH", "data/sangdo_training.csv"),
            drop_report: var_or("ESTATE_DROP_REPORT_PATH", "data/sangdo_drop_report.json"),
            model: var_or("ESTATE_MODEL_PATH", "ml/model.json"),
        }
    }

    /// Raw dataset location for the selected backend
    pub fn raw_for(&self, backend: BackendType) -> &str {
        match backend {
            BackendType::Csv => &self.raw_csv,
            BackendType::Sqlite => &self.raw_db,
        }
    }
}

/// RTMS apartment-trade API settings
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub service_key: String,
    pub base_url: String,
    /// 5-digit 시군구 code (11590 = 서울 동작구)
    pub lawd_cd: String,
    /// 법정동 kept after fetching; everything else in the 구 is discarded
    pub dong: String,
    pub rows_per_page: u32,
    pub start_year: i32,
    pub end_year: i32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

pub const DEFAULT_RTMS_BASE_URL: &str =
    "https://apis.data.go.kr/1613000/RTMSDataSvcAptTradeDev/getRTMSDataSvcAptTradeDev";

impl FetchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let service_key = env::var("RTMS_SERVICE_KEY")
            .map_err(|_| ConfigError::MissingVariable("RTMS_SERVICE_KEY".to_string()))?;

        let base_url = var_or("RTMS_BASE_URL", DEFAULT_RTMS_BASE_URL);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "RTMS_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let lawd_cd = var_or("RTMS_LAWD_CD", "11590");
        if lawd_cd.len() != 5 || !lawd_cd.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidValue(format!(
                "RTMS_LAWD_CD must be a 5-digit region code, got '{}'",
                lawd_cd
            )));
        }

        let start_year = parsed_or("FETCH_START_YEAR", 2020);
        let end_year = parsed_or("FETCH_END_YEAR", 2025);
        if start_year > end_year {
            return Err(ConfigError::InvalidValue(format!(
                "FETCH_START_YEAR ({}) is after FETCH_END_YEAR ({})",
                start_year, end_year
            )));
        }

        Ok(Self {
            service_key,
            base_url,
            lawd_cd,
            dong: var_or("RTMS_DONG", "상도동"),
            rows_per_page: parsed_or("RTMS_ROWS_PER_PAGE", 1000),
            start_year,
            end_year,
            timeout_secs: parsed_or("FETCH_TIMEOUT_SECS", 10),
            max_retries: parsed_or("FETCH_MAX_RETRIES", 3),
        })
    }
}

/// Trainer settings
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Held-out fraction of labeled examples
    pub test_ratio: f64,
    pub seed: u64,
    pub forest_trees: usize,
    /// `usize::MAX` grows every tree until its leaves are pure
    pub forest_max_depth: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            forest_trees: 300,
            forest_max_depth: usize::MAX,
        }
    }
}

impl TrainConfig {
    /// Environment variables:
    /// - `TRAIN_TEST_RATIO` (default: 0.2)
    /// - `TRAIN_SEED` (default: 42)
    /// - `FOREST_TREES` (default: 300)
    /// - `FOREST_MAX_DEPTH` (default: unbounded)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let test_ratio = parsed_or("TRAIN_TEST_RATIO", defaults.test_ratio);

        if !(test_ratio > 0.0 && test_ratio < 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "TRAIN_TEST_RATIO must be in (0, 1), got {}",
                test_ratio
            )));
        }

        Ok(Self {
            test_ratio,
            seed: parsed_or("TRAIN_SEED", defaults.seed),
            forest_trees: parsed_or("FOREST_TREES", defaults.forest_trees).max(1),
            forest_max_depth: parsed_or("FOREST_MAX_DEPTH", defaults.forest_max_depth).max(1),
        })
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 법정동 the served dataset is restricted to
    pub dong: String,
    /// Human-readable address shown in search results
    pub location: String,
}

impl ServerConfig {
    /// Environment variables:
    /// - `SERVER_HOST` (default: 0.0.0.0)
    /// - `SERVER_PORT` (default: 5000)
    /// - `RTMS_DONG` (default: 상도동)
    /// - `SERVER_LOCATION` (default: 서울 동작구 상도동)
    pub fn from_env() -> Self {
        Self {
            host: var_or("SERVER_HOST", "0.0.0.0"),
            port: parsed_or("SERVER_PORT", 5000),
            dong: var_or("RTMS_DONG", "상도동"),
            location: var_or("SERVER_LOCATION", "서울 동작구 상도동"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_args() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(BackendType::from_args(&args(&["bin"])), BackendType::Csv);
        assert_eq!(
            BackendType::from_args(&args(&["bin", "--backend", "sqlite"])),
            BackendType::Sqlite
        );
        assert_eq!(
            BackendType::from_args(&args(&["bin", "--backend", "parquet"])),
            BackendType::Csv
        );
        assert_eq!(BackendType::from_args(&args(&["bin", "--backend"])), BackendType::Csv);
    }

    #[test]
    fn test_default_data_paths() {
        env::remove_var("ESTATE_RAW_PATH");
        env::remove_var("ESTATE_MODEL_PATH");

        let paths = DataPaths::from_env();

        assert_eq!(paths.raw_csv, "data/sangdo_raw.csv");
        assert_eq!(paths.model, "ml/model.json");
        assert_eq!(paths.raw_for(BackendType::Csv), "data/sangdo_raw.csv");
    }

    #[test]
    fn test_fetch_config_requires_service_key() {
        env::remove_var("RTMS_SERVICE_KEY");

        match FetchConfig::from_env() {
            Err(ConfigError::MissingVariable(var)) => assert_eq!(var, "RTMS_SERVICE_KEY"),
            other => panic!("expected MissingVariable, got {:?}", other),
        }
    }

    #[test]
    fn test_train_config_defaults() {
        let config = TrainConfig::default();

        assert_eq!(config.test_ratio, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.forest_trees, 300);
        assert_eq!(config.forest_max_depth, usize::MAX);
    }

    #[test]
    fn test_server_bind_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dong: "상도동".to_string(),
            location: "서울 동작구 상도동".to_string(),
        };

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
