//! Environment-driven configuration.
//!
//! A `.env` file is loaded only when present, matching how the service is
//! run locally versus in a container where the variables come from the
//! orchestrator.

use std::env;
use std::path::Path;

use tracing::{info, warn};

const DEFAULT_DATABASE_URL: &str = "sqlite:family_records.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        if Path::new(".env").exists() {
            match dotenvy::dotenv() {
                Ok(_) => info!("Loaded .env file"),
                Err(e) => warn!("Error loading .env file: {}", e),
            }
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using insecure default");
            "insecure-dev-secret".to_string()
        });

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        Config {
            port,
            database_url,
            jwt_secret,
            admin_username,
            admin_password,
        }
    }
}
