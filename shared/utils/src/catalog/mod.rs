//! Catalog Processing Module
//!
//! Loads labware catalog tables into an identifier-keyed index.
//! Multi-format parser (CSV, XLSX, Markdown), schema validator, and
//! indexer with duplicate rejection.

pub mod indexer;
pub mod parser;
pub mod validator;

pub use indexer::{CatalogIndex, CatalogIndexer, IndexStats, RejectedRow};
pub use parser::{CatalogFormat, CatalogParser, ParsedCatalog};
pub use validator::{CatalogValidator, ValidationResult, ValidationSeverity};

use anyhow::{Context, Result};
use std::path::Path;

/// Parse, validate, and index a catalog file in one pass.
///
/// `strict` fails the load when validation reports Error-severity issues;
/// otherwise the surviving rows are indexed and the issues are returned
/// alongside.
pub fn load_path(
    path: &Path,
    validator: &CatalogValidator,
    strict: bool,
) -> Result<(ParsedCatalog, ValidationResult, CatalogIndex)> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("catalog")
        .to_string();

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read catalog source {}", path.display()))?;

    let parsed = CatalogParser::new()
        .parse_bytes(&filename, &bytes, None)
        .with_context(|| format!("Failed to parse catalog source {}", path.display()))?;

    let validation = validator.validate(&parsed);
    if strict && !validation.is_valid {
        anyhow::bail!(
            "Catalog {} failed validation with {} error(s)",
            path.display(),
            validation.error_count
        );
    }

    let index = CatalogIndexer::new().index(&parsed);
    Ok((parsed, validation, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn bundled(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../data")
            .join(name)
    }

    #[test]
    fn test_bundled_catalog_yields_one_record_per_plate() {
        let (parsed, validation, index) =
            load_path(&bundled("corning_costar.md"), &CatalogValidator::new(), true).unwrap();

        assert_eq!(parsed.total_rows, 9);
        assert_eq!(index.len(), 9);
        assert!(validation.is_valid);
        assert!(index.rejected.is_empty());
    }

    #[test]
    fn test_bundled_catalog_identifiers_are_unique() {
        let (_, _, index) =
            load_path(&bundled("corning_costar.md"), &CatalogValidator::new(), true).unwrap();

        let unique: HashSet<&String> = index.identifiers().iter().collect();
        assert_eq!(unique.len(), index.len());
    }

    #[test]
    fn test_bundled_catalog_load_is_idempotent() {
        let validator = CatalogValidator::new();
        let (_, _, first) = load_path(&bundled("corning_costar.md"), &validator, true).unwrap();
        let (_, _, second) = load_path(&bundled("corning_costar.md"), &validator, true).unwrap();

        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.identifiers(), second.identifiers());
        for identifier in first.identifiers() {
            assert_eq!(first.lookup(identifier), second.lookup(identifier));
        }
    }

    #[test]
    fn test_markdown_and_csv_renditions_agree() {
        let validator = CatalogValidator::new();
        let (_, _, from_md) = load_path(&bundled("corning_costar.md"), &validator, true).unwrap();
        let (_, _, from_csv) = load_path(&bundled("corning_costar.csv"), &validator, true).unwrap();

        assert_eq!(from_md.identifiers(), from_csv.identifiers());
        for identifier in from_md.identifiers() {
            assert_eq!(from_md.lookup(identifier), from_csv.lookup(identifier));
        }
    }

    #[test]
    fn test_excel_rendition_agrees_with_markdown() {
        let validator = CatalogValidator::new();
        let (_, _, from_md) = load_path(&bundled("corning_costar.md"), &validator, true).unwrap();
        let (_, _, from_xlsx) =
            load_path(&bundled("corning_costar.xlsx"), &validator, true).unwrap();

        assert_eq!(from_md.identifiers(), from_xlsx.identifiers());
        for identifier in from_md.identifiers() {
            assert_eq!(from_md.lookup(identifier), from_xlsx.lookup(identifier));
        }
    }
}
