//! Per-thread runtime configuration.

use std::env;

/// Stack size used by `create` unless configured otherwise.
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

/// Smallest stack a coroutine will ever be given.
pub const MIN_STACK_SIZE: usize = 4096;

/// Environment variable read by `Config::from_env`.
pub const STACK_SIZE_ENV: &str = "LIGHTCORO_STACK_SIZE";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub default_stack_size: usize
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_stack_size: DEFAULT_STACK_SIZE
        }
    }
}

impl Config {
    /// Builds a config from `LIGHTCORO_STACK_SIZE`, falling back to the
    /// defaults when the variable is unset or not a number.
    pub fn from_env() -> Config {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<L: Fn(&str) -> Option<String>>(lookup: L) -> Config {
        let mut config = Config::default();
        if let Some(size) = lookup(STACK_SIZE_ENV).and_then(|v| v.trim().parse::<usize>().ok()) {
            config.default_stack_size = size;
        }
        config
    }

    pub fn with_stack_size(mut self, size: usize) -> Config {
        self.default_stack_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stack_is_64k() {
        assert_eq!(Config::default().default_stack_size, 65536);
    }

    #[test]
    fn env_override_is_parsed() {
        let config = Config::from_lookup(|key| {
            assert_eq!(key, STACK_SIZE_ENV);
            Some(" 131072 ".to_string())
        });
        assert_eq!(config.default_stack_size, 131072);
    }

    #[test]
    fn garbage_env_falls_back_to_default() {
        let config = Config::from_lookup(|_| Some("lots".to_string()));
        assert_eq!(config, Config::default());

        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
    }
}
