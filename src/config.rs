#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// CSV file with one label column followed by score columns.
    pub data_path: String,
    pub host: String,
    pub port: u16,
    pub title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: "data.csv".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8050,
            title: "24GB VRAM LLM Models Performance".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset or unparseable
    /// values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            data_path: lookup("BENCH_DATA").unwrap_or(defaults.data_path),
            host: lookup("BENCH_HOST").unwrap_or(defaults.host),
            port: lookup("BENCH_PORT").and_then(|v| v.parse().ok()).unwrap_or(defaults.port),
            title: lookup("BENCH_TITLE").unwrap_or(defaults.title),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let cfg = Config::from_lookup(|_| None);
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8050");
    }

    #[test]
    fn test_overrides_and_bad_port() {
        let env: HashMap<&str, &str> = [
            ("BENCH_DATA", "scores.csv"),
            ("BENCH_HOST", "0.0.0.0"),
            ("BENCH_PORT", "not-a-port"),
            ("BENCH_TITLE", "Scores"),
        ]
        .into_iter()
        .collect();
        let cfg = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.data_path, "scores.csv");
        assert_eq!(cfg.title, "Scores");
        assert_eq!(cfg.port, 8050);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8050");
    }
}
