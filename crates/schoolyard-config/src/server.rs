use crate::env::{flag_or, parse_or, string_or};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
    /// Apply pending migrations at startup.
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            metrics_port: 9090,
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT`, `METRICS_PORT` and `RUN_MIGRATIONS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: string_or("HOST", &defaults.host),
            port: parse_or("PORT", defaults.port),
            metrics_port: parse_or("METRICS_PORT", defaults.metrics_port),
            run_migrations: flag_or("RUN_MIGRATIONS", defaults.run_migrations),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "0.0.0.0:5000");
        assert_eq!(config.metrics_address(), "0.0.0.0:9090");
        assert!(config.run_migrations);
    }
}
