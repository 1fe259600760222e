// ⚠️ Planner errors
// Core modules return PlannerError; application code wraps it in anyhow.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Error, Debug)]
pub enum PlannerError {
    /// Cost table unreachable or unparseable
    #[error("Cost data unavailable: {0}")]
    DataUnavailable(String),

    /// Upgrade paths the loaded cost table has no rows for
    #[error("Cost table has no rows for path(s): {}", .0.join(", "))]
    UnknownPath(Vec<String>),

    #[error("Invalid hero: {0}")]
    InvalidHero(String),

    #[error("Hero not found: {0}")]
    HeroNotFound(String),

    /// Stored row that no longer parses
    #[error("Corrupt hero record: {0}")]
    CorruptRecord(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlannerError {
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, PlannerError::DataUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_path_lists_every_path() {
        let err = PlannerError::UnknownPath(vec!["boost".to_string(), "mod 3".to_string()]);
        assert_eq!(
            err.to_string(),
            "Cost table has no rows for path(s): boost, mod 3"
        );
    }

    #[test]
    fn test_data_unavailable_flag() {
        assert!(PlannerError::DataUnavailable("offline".to_string()).is_data_unavailable());
        assert!(!PlannerError::HeroNotFound("hero-1".to_string()).is_data_unavailable());
    }
}
