//! Configuration module for the shinime gateway and client
//!
//! Handles loading environment variables into explicit configuration
//! structs. Nothing here is global: the server builds a [`Config`] once and
//! hands the pieces to the gateway and client constructors.

use std::env;

use thiserror::Error;

use crate::constants::defaults;

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials and fixed headers for the upstream anime API
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamConfig {
    /// Base URL every logical endpoint is appended to
    pub base_url: String,
    /// Value sent in the `x-api-key` header
    pub api_key: String,
    /// Value sent in the `host` header
    pub host: String,
    /// Value sent in the `user-agent` header
    pub user_agent: String,
}

impl UpstreamConfig {
    /// Create an upstream config, deriving the `host` header from the base URL
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let host = host_of(&base_url);

        Self {
            base_url,
            api_key: api_key.into(),
            host,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }

    /// Override the `host` header
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Override the `user-agent` header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Where the client reaches the forwarding gateway
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Full URL of the gateway proxy endpoint
    pub gateway_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: defaults::GATEWAY_URL.to_string(),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Upstream API settings
    pub upstream: UpstreamConfig,
    /// Client-side gateway settings
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from environment variables (and a `.env` file if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => defaults::PORT,
        };

        let base_url =
            lookup("UPSTREAM_BASE_URL").unwrap_or_else(|| defaults::UPSTREAM_BASE_URL.to_string());
        let api_key = lookup("UPSTREAM_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("UPSTREAM_API_KEY"))?;

        let mut upstream = UpstreamConfig::new(base_url, api_key);
        if let Some(host) = lookup("UPSTREAM_HOST") {
            upstream = upstream.with_host(host);
        }
        if let Some(user_agent) = lookup("UPSTREAM_USER_AGENT") {
            upstream = upstream.with_user_agent(user_agent);
        }

        let client = ClientConfig {
            gateway_url: lookup("GATEWAY_URL").unwrap_or_else(|| defaults::GATEWAY_URL.to_string()),
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| defaults::HOST.to_string()),
            port,
            upstream,
            client,
        })
    }

    /// Address the gateway server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Host (and port, if any) part of a URL like `https://example.com:8443/api`
fn host_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or("")
        .to_string()
}
