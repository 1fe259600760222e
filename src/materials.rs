// 🧱 Materials catalog - the list of known material names

use crate::error::{PlannerError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct MaterialRecord {
    material: String,
}

#[derive(Debug, Clone, Default)]
pub struct MaterialCatalog {
    names: Vec<String>,
    lookup: HashSet<String>,
}

impl MaterialCatalog {
    /// Build from names, dropping blanks and duplicates (first one wins)
    pub fn from_names(names: Vec<String>) -> Self {
        let mut catalog = MaterialCatalog::default();
        for name in names {
            let name = name.trim().to_string();
            if !name.is_empty() && catalog.lookup.insert(name.clone()) {
                catalog.names.push(name);
            }
        }
        catalog
    }

    /// Load from a CSV file with a single `material` column
    pub fn load_csv(csv_path: &Path) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(csv_path)
            .map_err(|e| {
                PlannerError::DataUnavailable(format!(
                    "Failed to open materials {}: {}",
                    csv_path.display(),
                    e
                ))
            })?;

        let mut names = Vec::new();
        for (line_num, result) in rdr.deserialize::<MaterialRecord>().enumerate() {
            let record = result.map_err(|e| {
                PlannerError::DataUnavailable(format!(
                    "Failed to parse materials line {}: {}",
                    line_num + 2,
                    e
                ))
            })?;
            names.push(record.material);
        }

        Ok(MaterialCatalog::from_names(names))
    }

    pub fn contains(&self, material: &str) -> bool {
        self.lookup.contains(material)
    }

    /// All material names in file order
    pub fn all(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_names_dedups_and_keeps_order() {
        let catalog = MaterialCatalog::from_names(vec![
            "Glimmer".to_string(),
            " Ether ".to_string(),
            "".to_string(),
            "Glimmer".to_string(),
        ]);

        assert_eq!(catalog.all(), &["Glimmer".to_string(), "Ether".to_string()]);
        assert!(catalog.contains("Ether"));
        assert!(!catalog.contains("ether"));
    }

    #[test]
    fn test_load_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "material").unwrap();
        writeln!(file, "Glimmer").unwrap();
        writeln!(file, "\"Enhancement Core\"").unwrap();

        let catalog = MaterialCatalog::load_csv(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("Enhancement Core"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MaterialCatalog::load_csv(Path::new("/nonexistent/materials.csv")).unwrap_err();
        assert!(err.is_data_unavailable());
    }
}
