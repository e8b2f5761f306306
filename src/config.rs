use std::{fs, path::Path};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// number of async worker threads, range [1, 32768), defaults to 16
    #[serde(default = "default_worker_threads")]
    pub async_worker_thread_number: u16,
    /// engine-wide node execution timeout in milliseconds; a nexus may
    /// override it, `None` leaves executions unbounded
    #[serde(default)]
    pub default_node_timeout_ms: Option<u64>,
}

fn default_worker_threads() -> u16 {
    16
}

impl Default for Config {
    fn default() -> Self {
        Self {
            async_worker_thread_number: default_worker_threads(),
            default_node_timeout_ms: None,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Self {
        let data = fs::read_to_string(path.as_ref()).unwrap_or_else(|_| panic!("failed to load config file {:?}", path.as_ref()));

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Self {
        let config = toml::from_str::<Config>(toml_str).expect("failed to parse the toml str");
        config
    }
}

#[cfg(test)]
mod test {
    use crate::Config;

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        async_worker_thread_number = 10
        default_node_timeout_ms = 30000
        "#;
        let config = Config::load_from_str(toml_str);
        assert_eq!(config.async_worker_thread_number, 10);
        assert_eq!(config.default_node_timeout_ms, Some(30000));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("");
        assert_eq!(config.async_worker_thread_number, 16);
        assert_eq!(config.default_node_timeout_ms, None);
    }
}
