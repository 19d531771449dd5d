use anyhow::{Context, Result};
use std::env;

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

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Payment service
    pub payment_service_url: String,
    pub payment_service_token: String,
    pub payment_service_timeout_seconds: u64,

    // Recurrence materializer
    pub materializer_interval_seconds: u64,

    // Availability
    pub slot_granularity_minutes: u32,
    pub default_job_duration_minutes: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Payment service
        let payment_service_url = env::var("PAYMENT_SERVICE_URL")
            .unwrap_or_else(|_| "http://payments:8400".to_string());
        let payment_service_token =
            env::var("PAYMENT_SERVICE_TOKEN").context("PAYMENT_SERVICE_TOKEN must be set")?;
        let payment_service_timeout_seconds = env::var("PAYMENT_SERVICE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        // Recurrence materializer
        let materializer_interval_seconds = env::var("MATERIALIZER_INTERVAL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400); // daily default

        // Availability
        let slot_granularity_minutes = env::var("SLOT_GRANULARITY_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        let default_job_duration_minutes = env::var("DEFAULT_JOB_DURATION_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120); // 2 hours when a booking carries no explicit duration

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            cors_allow_origins,
            payment_service_url,
            payment_service_token,
            payment_service_timeout_seconds,
            materializer_interval_seconds,
            slot_granularity_minutes,
            default_job_duration_minutes,
        })
    }
}
