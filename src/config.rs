use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub lenco: LencoConfig,
    pub donations: DonationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LencoConfig {
    pub secret_key: String,
    pub api_key: String,
    pub webhook_secret: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationsConfig {
    pub currency: String,
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .context("PORT not set")?
                .parse()
                .context("PORT must be a valid number")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
        };

        let lenco = LencoConfig {
            secret_key: env::var("LENCO_SECRET_KEY").context("LENCO_SECRET_KEY not set")?,
            api_key: env::var("LENCO_API_KEY").context("LENCO_API_KEY not set")?,
            webhook_secret: env::var("LENCO_WEBHOOK_SECRET")
                .context("LENCO_WEBHOOK_SECRET not set")?,
            base_url: env::var("LENCO_BASE_URL")
                .unwrap_or_else(|_| "https://api.lenco.co/access/v2".to_string()),
            timeout_secs: env::var("LENCO_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("LENCO_TIMEOUT_SECS must be a valid number")?,
        };

        let donations = DonationsConfig {
            currency: env::var("DONATION_CURRENCY").unwrap_or_else(|_| "NGN".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL").context("PUBLIC_BASE_URL not set")?,
        };

        let config = Config {
            server,
            database,
            lenco,
            donations,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Validate port range
        if self.server.port < 1024 {
            return Err(anyhow!(
                "Port must be at least 1024, got {}",
                self.server.port
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.server.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                valid_environments,
                self.server.environment
            ));
        }

        if self.database.url.trim().is_empty() {
            return Err(anyhow!("DATABASE_URL cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow!("DATABASE_MAX_CONNECTIONS must be greater than 0"));
        }

        // Validate Lenco credentials
        if self.lenco.secret_key.trim().is_empty() {
            return Err(anyhow!("LENCO_SECRET_KEY cannot be empty"));
        }

        if self.lenco.api_key.trim().is_empty() {
            return Err(anyhow!("LENCO_API_KEY cannot be empty"));
        }

        if self.lenco.webhook_secret.trim().is_empty() {
            return Err(anyhow!("LENCO_WEBHOOK_SECRET cannot be empty"));
        }

        if !self.lenco.base_url.starts_with("http") {
            return Err(anyhow!(
                "LENCO_BASE_URL must be an http(s) URL, got {}",
                self.lenco.base_url
            ));
        }

        if self.lenco.timeout_secs == 0 {
            return Err(anyhow!("LENCO_TIMEOUT_SECS must be greater than 0"));
        }

        // Validate donation settings
        if self.donations.currency.len() != 3
            || !self
                .donations
                .currency
                .chars()
                .all(|c| c.is_ascii_uppercase())
        {
            return Err(anyhow!(
                "DONATION_CURRENCY must be a 3-letter ISO code, got {}",
                self.donations.currency
            ));
        }

        if !self.donations.public_base_url.starts_with("http") {
            return Err(anyhow!(
                "PUBLIC_BASE_URL must be an http(s) URL, got {}",
                self.donations.public_base_url
            ));
        }

        Ok(())
    }

    /// URL the gateway redirects the donor back to after checkout.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/donate/thank-you",
            self.donations.public_base_url.trim_end_matches('/')
        )
    }
}
