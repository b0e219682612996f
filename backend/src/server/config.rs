//! Runtime settings and the server configuration object.
//!
//! [`ServerSettings`] is loaded through OrthoConfig from CLI flags,
//! `CARBONTRACK_*` environment variables and an optional config file.
//! [`ServerConfig`] is the resolved, builder-style value handed to
//! [`super::create_server`].

use std::net::SocketAddr;

use carbontrack::domain::offsets::{AllocationPolicy, ParsePolicyError};
use carbontrack::outbound::persistence::{DbPool, PoolConfig};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Invalid values found while resolving [`ServerSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address `{value}`: {source}")]
    BindAddr {
        /// Raw configured value.
        value: String,
        /// Parser failure.
        #[source]
        source: std::net::AddrParseError,
    },
    /// `allocation_policy` names no known policy.
    #[error(transparent)]
    AllocationPolicy(#[from] ParsePolicyError),
    /// `db_max_connections` was zero.
    #[error("db_max_connections must be at least 1")]
    MaxConnections,
}

/// Settings controlling the HTTP server and its adapters.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CARBONTRACK")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; in-memory adapters are used when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Offset draw-down order: `oldest_first` or `cheapest_first`.
    pub allocation_policy: Option<String>,
    /// Apply embedded migrations before serving.
    pub run_migrations: Option<bool>,
}

impl ServerSettings {
    /// Listen address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self
            .bind_addr
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    /// Database URL, treating a blank value as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool size, defaulting to ten.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MaxConnections`] for zero.
    pub fn db_max_connections(&self) -> Result<u32, SettingsError> {
        match self.db_max_connections {
            Some(0) => Err(SettingsError::MaxConnections),
            Some(size) => Ok(size),
            None => Ok(DEFAULT_MAX_CONNECTIONS),
        }
    }

    /// Allocation policy, defaulting to oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::AllocationPolicy`] for unknown names.
    pub fn allocation_policy(&self) -> Result<AllocationPolicy, SettingsError> {
        match self.allocation_policy.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Ok(raw.parse()?),
            _ => Ok(AllocationPolicy::default()),
        }
    }

    /// Whether to apply migrations at startup, defaulting to `true`.
    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    /// Pool configuration when a database URL is set.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::db_max_connections`] failures.
    pub fn pool_config(&self) -> Result<Option<PoolConfig>, SettingsError> {
        let max_size = self.db_max_connections()?;
        Ok(self
            .database_url()
            .map(|url| PoolConfig::new(url).with_max_size(max_size)))
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) allocation_policy: AllocationPolicy,
    pub(crate) db_pool: Option<DbPool>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a configuration that uses in-memory adapters.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            allocation_policy: AllocationPolicy::default(),
            db_pool: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool; Diesel adapters replace the
    /// in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Select the offset allocation policy.
    #[must_use]
    pub fn with_allocation_policy(mut self, policy: AllocationPolicy) -> Self {
        self.allocation_policy = policy;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
