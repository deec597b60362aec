//! Settings and connection configuration. The CLI populates
//! [`ConnectionConfig`] from environment variables (spec §6); the core
//! itself never reads the environment directly.

use std::time::Duration;

use crate::election::ElectionTiming;
use crate::models::Namespace;

/// Per-coordinator configuration: which namespace it participates in, and
/// the electoral loop's timing.
#[derive(Debug, Clone)]
pub struct Settings {
    pub namespace: Namespace,
    pub timing: ElectionTiming,
    /// Prefix applied uniformly to the channel and sequence names.
    pub prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: Namespace(String::new()),
            timing: ElectionTiming::default(),
            prefix: String::new(),
        }
    }
}

impl Settings {
    pub fn with_timing(mut self, election_interval: Duration, election_timeout: Duration) -> Self {
        self.timing = ElectionTiming {
            election_interval,
            election_timeout,
        };
        self
    }
}

/// Connection parameters for the database client library (an external
/// collaborator to the core). Mirrors the `PGDSN`/`PGHOST`/`PGPORT`/
/// `PGUSER`/`PGDATABASE`/`PGPASSWORD` environment inputs from spec §6.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    pub dsn: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub database: Option<String>,
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Renders a libpq-style connection string, preferring an explicit
    /// DSN over the discrete host/port/user/database/password fields.
    pub fn to_dsn(&self) -> String {
        if let Some(dsn) = &self.dsn {
            return dsn.clone();
        }

        let mut url = url::Url::parse("postgres://").expect("static scheme always parses");
        if let Some(user) = &self.user {
            let _ = url.set_username(user);
        }
        if let Some(password) = &self.password {
            let _ = url.set_password(Some(password));
        }
        if let Some(host) = &self.host {
            let _ = url.set_host(Some(host));
        }
        if let Some(port) = self.port {
            let _ = url.set_port(Some(port));
        }
        if let Some(database) = &self.database {
            url.set_path(database);
        }
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dsn_wins_over_discrete_fields() {
        let cfg = ConnectionConfig {
            dsn: Some("postgres://example/db".to_string()),
            host: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.to_dsn(), "postgres://example/db");
    }

    #[test]
    fn discrete_fields_assemble_a_dsn() {
        let cfg = ConnectionConfig {
            host: Some("localhost".to_string()),
            port: Some(5432),
            user: Some("alice".to_string()),
            database: Some("notifelect".to_string()),
            ..Default::default()
        };
        let dsn = cfg.to_dsn();
        assert!(dsn.contains("localhost"));
        assert!(dsn.contains("alice"));
        assert!(dsn.ends_with("notifelect"));
    }
}
