//! Configuration management for the dashboard worker

use crate::error::{DashboardError, Result};
use worker::Env;

/// Dashboard worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment (production, staging, development)
    pub environment: String,

    /// Log level
    pub log_level: String,

    /// Base URL of the remote dashboard API
    pub api_base_url: String,

    /// Default items per page for projected list screens
    pub default_page_size: usize,

    /// Upper bound on items per page accepted from view events
    pub max_page_size: usize,

    /// Articles requested for the dashboard news section
    pub news_page_size: usize,
}

impl Config {
    /// Load configuration from Cloudflare environment variables
    pub fn from_env(env: &Env) -> Result<Self> {
        Ok(Self {
            environment: env.var("ENVIRONMENT").map_or_else(|_| "production".to_string(), |v| v.to_string()),

            log_level: env.var("LOG_LEVEL").map_or_else(|_| "info".to_string(), |v| v.to_string()),

            api_base_url: env.var("API_BASE_URL")
                .map(|v| v.to_string())
                .map_err(|_| DashboardError::Config("API_BASE_URL must be set".into()))?,

            default_page_size: env.var("DEFAULT_PAGE_SIZE")
                .map(|v| v.to_string().parse().unwrap_or(10))
                .unwrap_or(10),

            max_page_size: env.var("MAX_PAGE_SIZE")
                .map(|v| v.to_string().parse().unwrap_or(100))
                .unwrap_or(100),

            news_page_size: env.var("NEWS_PAGE_SIZE")
                .map(|v| v.to_string().parse().unwrap_or(10))
                .unwrap_or(10),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(DashboardError::Config("api_base_url must not be empty".into()));
        }
        if self.default_page_size == 0 {
            return Err(DashboardError::Config("default_page_size must be positive".into()));
        }
        if self.max_page_size < self.default_page_size {
            return Err(DashboardError::Config("max_page_size must be >= default_page_size".into()));
        }
        if self.news_page_size == 0 {
            return Err(DashboardError::Config("news_page_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            api_base_url: "https://api.example.com/api/v1".to_string(),
            default_page_size: 10,
            max_page_size: 100,
            news_page_size: 10,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = sample();
        config.default_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut config = sample();
        config.api_base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_below_default_rejected() {
        let mut config = sample();
        config.max_page_size = 5;
        assert!(config.validate().is_err());
    }
}
