//! Catalog Indexer
//!
//! Builds the identifier-to-record index from parsed catalog data. Rows
//! with a missing, malformed, or duplicate identifier are rejected with a
//! reason; the first occurrence of an identifier wins.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use super::parser::{CatalogRow, ParsedCatalog};
use platebook_models::{is_well_formed, Material, PlateRecord};

/// A row excluded from the index, with the reason.
#[derive(Debug, Clone)]
pub struct RejectedRow {
    pub row_number: usize,
    pub identifier: Option<String>,
    pub reason: String,
}

/// Index build statistics.
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    pub indexed: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Immutable identifier-to-record mapping built from one catalog source.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    pub catalog_id: Uuid,
    pub source: String,
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
    entries: HashMap<String, PlateRecord>,
    /// Identifiers in source order, for stable listings.
    identifiers: Vec<String>,
    pub rejected: Vec<RejectedRow>,
    duplicate_count: usize,
}

impl CatalogIndex {
    /// Lookup a record by its PLR definition identifier.
    pub fn lookup(&self, identifier: &str) -> Option<&PlateRecord> {
        self.entries.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers in source order.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Records in source order.
    pub fn records(&self) -> Vec<&PlateRecord> {
        self.identifiers
            .iter()
            .filter_map(|id| self.entries.get(id))
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            indexed: self.entries.len(),
            rejected: self.rejected.len(),
            duplicates: self.duplicate_count,
        }
    }
}

/// Catalog indexer with duplicate rejection
pub struct CatalogIndexer;

impl Default for CatalogIndexer {
    fn default() -> Self {
        Self
    }
}

impl CatalogIndexer {
    pub fn new() -> Self {
        Self
    }

    /// Build an index from a parsed catalog.
    pub fn index(&self, catalog: &ParsedCatalog) -> CatalogIndex {
        let mut entries: HashMap<String, PlateRecord> = HashMap::new();
        let mut identifiers: Vec<String> = Vec::new();
        let mut rejected = Vec::new();
        let mut duplicate_count = 0;

        for row in &catalog.rows {
            let identifier = match row.identifier.as_deref() {
                Some(id) => id,
                None => {
                    rejected.push(RejectedRow {
                        row_number: row.row_number,
                        identifier: None,
                        reason: "Missing identifier".to_string(),
                    });
                    continue;
                }
            };

            if !is_well_formed(identifier) {
                rejected.push(RejectedRow {
                    row_number: row.row_number,
                    identifier: Some(identifier.to_string()),
                    reason: format!("Malformed identifier: {}", identifier),
                });
                continue;
            }

            if entries.contains_key(identifier) {
                duplicate_count += 1;
                rejected.push(RejectedRow {
                    row_number: row.row_number,
                    identifier: Some(identifier.to_string()),
                    reason: format!(
                        "Duplicate identifier: {} (first occurrence kept)",
                        identifier
                    ),
                });
                continue;
            }

            let record = self.to_record(row);
            identifiers.push(identifier.to_string());
            entries.insert(identifier.to_string(), record);
        }

        CatalogIndex {
            catalog_id: catalog.id,
            source: catalog.filename.clone(),
            fingerprint: catalog.fingerprint.clone(),
            loaded_at: Utc::now(),
            entries,
            identifiers,
            rejected,
            duplicate_count,
        }
    }

    /// Convert a surviving catalog row to the domain record.
    fn to_record(&self, row: &CatalogRow) -> PlateRecord {
        let mut record = PlateRecord::new(row.identifier.clone().unwrap_or_default());
        record.part_number = row.part_number.clone();
        record.description = row.description.clone();
        record.material = row.material.as_deref().map(Material::from_label);
        record.total_volume = row.total_volume;
        record.working_volume_range = row.working_volume_range;
        record.manufacturer = row.manufacturer.clone();
        record.manufacturer_url = row.manufacturer_url.clone();
        record.image_path = row.image_path.clone();
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parser::CatalogParser;
    use platebook_models::BottomShape;

    fn parse(csv: &[u8]) -> ParsedCatalog {
        CatalogParser::new()
            .parse_bytes("catalog.csv", csv, None)
            .unwrap()
    }

    #[test]
    fn test_index_builds_one_record_per_row() {
        let catalog = parse(
            b"plr definition,part number,material,total volume\n\
Cos_6_wellplate_16800ul_Fb,3516,TC-treated polystyrene,16.8 mL\n\
Cos_96_wellplate_2mL_Vb,3960,Polypropylene,2 mL",
        );
        let index = CatalogIndexer::new().index(&catalog);

        assert_eq!(index.len(), 2);
        assert!(index.rejected.is_empty());

        let plate = index.lookup("Cos_6_wellplate_16800ul_Fb").unwrap();
        assert_eq!(plate.part_number, Some("3516".to_string()));
        assert_eq!(plate.material, Some(Material::Polystyrene));
        assert_eq!(plate.num_wells, Some(6));
        assert_eq!(plate.bottom, Some(BottomShape::Flat));
    }

    #[test]
    fn test_missing_identifier_rows_are_rejected() {
        let catalog = parse(
            b"plr definition,part number\n\
Cos_6_wellplate_16800ul_Fb,3516\n\
,3517",
        );
        let index = CatalogIndexer::new().index(&catalog);

        assert_eq!(index.len(), 1);
        assert_eq!(index.rejected.len(), 1);
        assert_eq!(index.rejected[0].row_number, 3);
        assert!(index.rejected[0].identifier.is_none());
    }

    #[test]
    fn test_duplicate_keeps_first_occurrence() {
        let catalog = parse(
            b"plr definition,part number\n\
Cos_6_wellplate_16800ul_Fb,3516\n\
Cos_6_wellplate_16800ul_Fb,9999",
        );
        let index = CatalogIndexer::new().index(&catalog);

        assert_eq!(index.len(), 1);
        assert_eq!(index.stats().duplicates, 1);
        assert_eq!(
            index
                .lookup("Cos_6_wellplate_16800ul_Fb")
                .unwrap()
                .part_number,
            Some("3516".to_string())
        );
    }

    #[test]
    fn test_malformed_identifier_rows_are_rejected() {
        let catalog = parse(b"plr definition\nsix-well-plate");
        let index = CatalogIndexer::new().index(&catalog);

        assert!(index.is_empty());
        assert_eq!(index.rejected.len(), 1);
    }

    #[test]
    fn test_reindexing_same_source_yields_identical_records() {
        let csv: &[u8] = b"plr definition,part number,total volume\n\
Cos_6_wellplate_16800ul_Fb,3516,16.8 mL\n\
Cos_96_wellplate_2mL_Vb,3960,2 mL";

        let first = CatalogIndexer::new().index(&parse(csv));
        let second = CatalogIndexer::new().index(&parse(csv));

        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.identifiers(), second.identifiers());
        for identifier in first.identifiers() {
            assert_eq!(first.lookup(identifier), second.lookup(identifier));
        }
    }

    #[test]
    fn test_records_preserve_source_order() {
        let catalog = parse(
            b"plr definition\n\
Cos_96_wellplate_2mL_Vb\n\
Cos_6_wellplate_16800ul_Fb",
        );
        let index = CatalogIndexer::new().index(&catalog);

        let order: Vec<&str> = index
            .records()
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        assert_eq!(
            order,
            vec!["Cos_96_wellplate_2mL_Vb", "Cos_6_wellplate_16800ul_Fb"]
        );
    }
}
