// ⚙️ Configuration - file locations and bind address from the environment

use std::env;
use std::path::PathBuf;

pub const ENV_COSTS_CSV: &str = "UPGRADE_PLANNER_COSTS_CSV";
pub const ENV_MATERIALS_CSV: &str = "UPGRADE_PLANNER_MATERIALS_CSV";
pub const ENV_DB: &str = "UPGRADE_PLANNER_DB";
pub const ENV_ADDR: &str = "UPGRADE_PLANNER_ADDR";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub costs_csv: PathBuf,
    pub materials_csv: PathBuf,
    pub db_path: PathBuf,
    pub server_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            costs_csv: PathBuf::from("data/upgrade-costs.csv"),
            materials_csv: PathBuf::from("data/materials.csv"),
            db_path: PathBuf::from("heroes.db"),
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by any UPGRADE_PLANNER_* variable that is set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Config {
            costs_csv: non_empty(ENV_COSTS_CSV)
                .map(PathBuf::from)
                .unwrap_or(defaults.costs_csv),
            materials_csv: non_empty(ENV_MATERIALS_CSV)
                .map(PathBuf::from)
                .unwrap_or(defaults.materials_csv),
            db_path: non_empty(ENV_DB)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            server_addr: non_empty(ENV_ADDR).unwrap_or(defaults.server_addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let vars: HashMap<&str, &str> = [
            (ENV_DB, "/tmp/heroes.db"),
            (ENV_ADDR, "127.0.0.1:8080"),
            (ENV_COSTS_CSV, "   "),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_path, PathBuf::from("/tmp/heroes.db"));
        assert_eq!(config.server_addr, "127.0.0.1:8080");
        assert_eq!(config.costs_csv, PathBuf::from("data/upgrade-costs.csv"));
        assert_eq!(config.materials_csv, PathBuf::from("data/materials.csv"));
    }
}
