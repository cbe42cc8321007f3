use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

fn default_page_size() -> usize {
    10
}

fn default_log_file() -> String {
    "projement.log".to_string()
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Projects shown per dashboard page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Where logs go while the dashboard owns the terminal
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Apply pending migrations when connecting
    #[serde(default)]
    pub run_migrations: bool,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build a config from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = envy::from_iter::<_, Config>(vars)?;

        // A zero page size would make every page empty
        if config.page_size == 0 {
            config.page_size = default_page_size();
        }

        Ok(config)
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    Config::load()
}

/// Record the loaded settings; call once a subscriber is installed.
pub fn log_loaded(config: &Config) {
    tracing::debug!(
        page_size = config.page_size,
        log_file = %config.log_file,
        run_migrations = config.run_migrations,
        "configuration loaded"
    );
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn loads_defaults_with_only_database_url() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/projement")])).unwrap();
        assert_eq!(config.database_url(), "postgres://localhost/projement");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.log_file, "projement.log");
        assert!(!config.run_migrations);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://db/projects"),
            ("PAGE_SIZE", "25"),
            ("LOG_FILE", "/tmp/projement.log"),
            ("RUN_MIGRATIONS", "true"),
        ]))
        .unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.log_file, "/tmp/projement.log");
        assert!(config.run_migrations);
    }

    #[test]
    fn zero_page_size_falls_back_to_default() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://db"), ("PAGE_SIZE", "0")])).unwrap();
        assert_eq!(config.page_size, 10);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn loaded_settings_reach_the_installed_subscriber() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://db"), ("PAGE_SIZE", "7")])).unwrap();
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || log_loaded(&config));

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("configuration loaded"), "{}", output);
        assert!(output.contains("page_size=7"), "{}", output);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Config::from_vars(vars(&[("PAGE_SIZE", "5")])).is_err());
    }
}
