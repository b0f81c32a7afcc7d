use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Seconds after which an untouched widget is unmounted.
    pub widget_idle_secs: u64,
}

impl ServerConfig {
    pub fn widget_idle(&self) -> Duration {
        Duration::from_secs(self.widget_idle_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the Meilisearch instance, without a trailing slash.
    pub base_url: String,
    pub index: String,
    /// Page size of the result set.
    pub limit: usize,
    pub timeout_ms: u64,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5733,
                workers: num_cpus::get(),
                widget_idle_secs: 1_800,
            },
            search: SearchConfig {
                base_url: "http://127.0.0.1:7700".to_string(),
                index: "questions".to_string(),
                limit: 5,
                timeout_ms: 5_000,
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
            },
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source on top of the defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        // Server configuration
        if let Some(host) = lookup("HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.server.port = port.parse()?;
        }
        if let Some(workers) = lookup("WORKERS") {
            config.server.workers = workers.parse()?;
        }
        if let Some(idle) = lookup("WIDGET_IDLE_SECS") {
            config.server.widget_idle_secs = idle.parse()?;
            anyhow::ensure!(
                config.server.widget_idle_secs > 0,
                "WIDGET_IDLE_SECS must be positive"
            );
        }

        // Search configuration
        if let Some(url) = lookup("MEILI_URL") {
            config.search.base_url = url.trim_end_matches('/').to_string();
        } else if lookup("MEILI_HOST").is_some() || lookup("MEILI_PORT").is_some() {
            let host = lookup("MEILI_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
            let port: u16 = match lookup("MEILI_PORT") {
                Some(port) => port.parse()?,
                None => 7700,
            };
            config.search.base_url = format!("http://{}:{}", host, port);
        }
        if let Some(index) = lookup("MEILI_INDEX") {
            config.search.index = index;
        }
        if let Some(limit) = lookup("SEARCH_LIMIT") {
            config.search.limit = limit.parse()?;
            anyhow::ensure!(config.search.limit > 0, "SEARCH_LIMIT must be positive");
        }
        if let Some(timeout_ms) = lookup("SEARCH_TIMEOUT_MS") {
            config.search.timeout_ms = timeout_ms.parse()?;
            anyhow::ensure!(config.search.timeout_ms > 0, "SEARCH_TIMEOUT_MS must be positive");
        }

        // Security configuration
        if let Some(allowed_origins) = lookup("ALLOWED_ORIGINS") {
            config.security.allowed_origins = allowed_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_target_local_questions_index() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.search.base_url, "http://127.0.0.1:7700");
        assert_eq!(config.search.index, "questions");
        assert_eq!(config.search.limit, 5);
        assert_eq!(config.search.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn meili_host_and_port_build_base_url() {
        let config =
            Config::from_lookup(lookup_from(&[("MEILI_HOST", "meili"), ("MEILI_PORT", "7701")]))
                .unwrap();
        assert_eq!(config.search.base_url, "http://meili:7701");
    }

    #[test]
    fn explicit_url_wins_and_drops_trailing_slash() {
        let config = Config::from_lookup(lookup_from(&[
            ("MEILI_URL", "https://search.example.com/"),
            ("MEILI_HOST", "ignored"),
        ]))
        .unwrap();
        assert_eq!(config.search.base_url, "https://search.example.com");
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SEARCH_LIMIT", "0")])).is_err());
    }

    #[test]
    fn zero_durations_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SEARCH_TIMEOUT_MS", "0")])).unwrap_err();
        assert!(err.to_string().contains("SEARCH_TIMEOUT_MS"));
        assert!(Config::from_lookup(lookup_from(&[("WIDGET_IDLE_SECS", "0")])).is_err());

        let config = Config::from_lookup(lookup_from(&[
            ("SEARCH_TIMEOUT_MS", "250"),
            ("WIDGET_IDLE_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.search.timeout(), Duration::from_millis(250));
        assert_eq!(config.server.widget_idle(), Duration::from_secs(60));
    }

    #[test]
    fn allowed_origins_are_split_and_trimmed() {
        let config = Config::from_lookup(lookup_from(&[(
            "ALLOWED_ORIGINS",
            "https://a.example, https://b.example,",
        )]))
        .unwrap();
        assert_eq!(
            config.security.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }
}
