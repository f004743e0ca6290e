//! Catalog File Parser
//!
//! Multi-format parser for labware catalog tables. Supports CSV, Excel
//! (XLSX), and the Markdown tables the catalog is originally published in.
//! Column headers are matched against candidate-name lists so differently
//! labelled exports of the same catalog parse identically.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use platebook_models::{Volume, WorkingVolumeRange};

/// Supported catalog file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Csv,
    Excel, // XLSX/XLS
    Markdown,
}

impl CatalogFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Detect format from content type header
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "text/csv" | "application/csv" => Some(Self::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(Self::Excel)
            }
            "application/vnd.ms-excel" => Some(Self::Excel),
            "text/markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

/// Parsed catalog row representing a single plate product entry
#[derive(Debug, Clone)]
pub struct CatalogRow {
    pub row_number: usize,
    pub identifier: Option<String>,
    pub part_number: Option<String>,
    pub description: Option<String>,
    pub material: Option<String>,
    pub total_volume: Option<Volume>,
    pub working_volume_range: Option<WorkingVolumeRange>,
    /// Raw measurement cells, kept so validation can tell a missing cell
    /// from one that failed to parse.
    pub raw_total_volume: Option<String>,
    pub raw_working_volume: Option<String>,
    pub manufacturer: Option<String>,
    pub manufacturer_url: Option<String>,
    pub image_path: Option<String>,
    pub raw_data: HashMap<String, String>,
}

/// Complete parsed catalog with metadata
#[derive(Debug, Clone)]
pub struct ParsedCatalog {
    pub id: Uuid,
    pub filename: String,
    pub format: CatalogFormat,
    pub rows: Vec<CatalogRow>,
    pub column_headers: Vec<String>,
    pub total_rows: usize,
    /// SHA-256 of the source bytes; equal fingerprints mean equal records.
    pub fingerprint: String,
    pub parse_warnings: Vec<String>,
}

/// Main catalog parser
pub struct CatalogParser {
    /// Column name mappings for different catalog exports
    identifier_columns: Vec<String>,
    part_number_columns: Vec<String>,
    description_columns: Vec<String>,
    material_columns: Vec<String>,
    total_volume_columns: Vec<String>,
    working_volume_columns: Vec<String>,
    manufacturer_columns: Vec<String>,
    url_columns: Vec<String>,
    image_columns: Vec<String>,
}

impl Default for CatalogParser {
    fn default() -> Self {
        Self {
            identifier_columns: vec![
                "plr definition".to_string(),
                "plr_definition".to_string(),
                "identifier".to_string(),
                "definition".to_string(),
                "name".to_string(),
            ],
            part_number_columns: vec![
                "part number".to_string(),
                "part_number".to_string(),
                "part no".to_string(),
                "cat. no.".to_string(),
                "catalog number".to_string(),
                "product number".to_string(),
                "sku".to_string(),
            ],
            description_columns: vec![
                "description".to_string(),
                "desc".to_string(),
                "product description".to_string(),
            ],
            material_columns: vec![
                "material".to_string(),
                "material type".to_string(),
                "well material".to_string(),
            ],
            total_volume_columns: vec![
                "total volume".to_string(),
                "total_volume".to_string(),
                "total well volume".to_string(),
                "well volume".to_string(),
            ],
            working_volume_columns: vec![
                "working volume".to_string(),
                "working_volume".to_string(),
                "working volume range".to_string(),
                "recommended working volume".to_string(),
            ],
            manufacturer_columns: vec![
                "manufacturer".to_string(),
                "brand".to_string(),
                "vendor".to_string(),
            ],
            url_columns: vec![
                "manufacturer url".to_string(),
                "manufacturer_url".to_string(),
                "link".to_string(),
                "url".to_string(),
                "product page".to_string(),
            ],
            image_columns: vec![
                "image".to_string(),
                "image path".to_string(),
                "image_path".to_string(),
                "picture".to_string(),
            ],
        }
    }
}

impl CatalogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse catalog file from bytes
    pub fn parse_bytes(
        &self,
        filename: &str,
        data: &[u8],
        format: Option<CatalogFormat>,
    ) -> Result<ParsedCatalog> {
        let format = format
            .or_else(|| CatalogFormat::from_extension(Path::new(filename)))
            .context("Could not determine file format")?;

        let mut parsed = match format {
            CatalogFormat::Csv => self.parse_csv(filename, data),
            CatalogFormat::Excel => self.parse_excel(filename, data),
            CatalogFormat::Markdown => self.parse_markdown(filename, data),
        }?;

        parsed.fingerprint = fingerprint_bytes(data);
        Ok(parsed)
    }

    /// Parse CSV format
    fn parse_csv(&self, filename: &str, data: &[u8]) -> Result<ParsedCatalog> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|h| h.to_lowercase().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        let mut warnings = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    let raw_data: HashMap<String, String> = headers
                        .iter()
                        .enumerate()
                        .filter_map(|(i, h)| record.get(i).map(|v| (h.clone(), v.to_string())))
                        .collect();

                    let row = self.map_row(idx + 2, &raw_data, &mut warnings);
                    rows.push(row);
                }
                Err(e) => {
                    warnings.push(format!("Row {}: Parse error - {}", idx + 2, e));
                }
            }
        }

        Ok(ParsedCatalog {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            format: CatalogFormat::Csv,
            total_rows: rows.len(),
            rows,
            column_headers: headers,
            fingerprint: String::new(),
            parse_warnings: warnings,
        })
    }

    /// Parse Excel format
    fn parse_excel(&self, filename: &str, data: &[u8]) -> Result<ParsedCatalog> {
        use calamine::{open_workbook_from_rs, DataType, Reader, Xlsx};

        let cursor = std::io::Cursor::new(data);
        let mut workbook: Xlsx<_> =
            open_workbook_from_rs(cursor).context("Failed to open Excel workbook")?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .context("No sheets found in workbook")?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .context("Failed to read worksheet")??;

        let mut rows_iter = range.rows();

        // First row is headers
        let headers: Vec<String> = rows_iter
            .next()
            .context("Empty worksheet")?
            .iter()
            .map(|cell: &DataType| cell.to_string().to_lowercase().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        let mut warnings = Vec::new();

        for (idx, row) in rows_iter.enumerate() {
            let raw_data: HashMap<String, String> = headers
                .iter()
                .enumerate()
                .filter_map(|(i, h): (usize, &String)| {
                    row.get(i).map(|v: &DataType| (h.clone(), v.to_string()))
                })
                .collect();

            let parsed_row = self.map_row(idx + 2, &raw_data, &mut warnings);
            rows.push(parsed_row);
        }

        Ok(ParsedCatalog {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            format: CatalogFormat::Excel,
            total_rows: rows.len(),
            rows,
            column_headers: headers,
            fingerprint: String::new(),
            parse_warnings: warnings,
        })
    }

    /// Parse Markdown tables, the catalog's original publication format.
    fn parse_markdown(&self, filename: &str, data: &[u8]) -> Result<ParsedCatalog> {
        use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

        let content = std::str::from_utf8(data).context("Markdown source is not valid UTF-8")?;
        let parser = Parser::new_ext(content, Options::ENABLE_TABLES);

        let mut headers: Vec<String> = Vec::new();
        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        let mut warnings = Vec::new();

        let mut in_head = false;
        let mut in_cell = false;
        let mut skip_table = false;
        let mut pending_head: Vec<String> = Vec::new();
        let mut current_row: Vec<String> = Vec::new();
        let mut cell_text = String::new();
        let mut cell_link: Option<String> = None;
        let mut cell_image: Option<String> = None;

        for event in parser {
            match event {
                Event::Start(Tag::Table(_)) => {
                    skip_table = false;
                }
                Event::Start(Tag::TableHead) => {
                    in_head = true;
                    pending_head.clear();
                }
                Event::End(TagEnd::TableHead) => {
                    in_head = false;
                    if headers.is_empty() {
                        headers = pending_head.clone();
                    } else if pending_head != headers {
                        // A later table with different columns is not part
                        // of this catalog.
                        warnings
                            .push("Skipping additional table with different columns".to_string());
                        skip_table = true;
                    }
                }
                Event::Start(Tag::TableRow) => {
                    current_row.clear();
                }
                Event::End(TagEnd::TableRow) => {
                    if !skip_table && !current_row.is_empty() {
                        raw_rows.push(current_row.clone());
                    }
                }
                Event::Start(Tag::TableCell) => {
                    in_cell = true;
                    cell_text.clear();
                    cell_link = None;
                    cell_image = None;
                }
                Event::End(TagEnd::TableCell) => {
                    in_cell = false;
                    let value = finalize_cell(&cell_text, cell_link.take(), cell_image.take());
                    if in_head {
                        pending_head.push(value.to_lowercase());
                    } else {
                        current_row.push(value);
                    }
                }
                Event::Start(Tag::Link { dest_url, .. }) if in_cell => {
                    cell_link = Some(dest_url.to_string());
                }
                Event::Start(Tag::Image { dest_url, .. }) if in_cell => {
                    cell_image = Some(dest_url.to_string());
                }
                Event::Text(text) | Event::Code(text) if in_cell => {
                    cell_text.push_str(&text);
                }
                _ => {}
            }
        }

        if headers.is_empty() {
            warnings.push("No table found in Markdown source".to_string());
        }

        let mut rows = Vec::new();
        for (idx, raw_row) in raw_rows.iter().enumerate() {
            let raw_data: HashMap<String, String> = headers
                .iter()
                .enumerate()
                .filter_map(|(i, h)| raw_row.get(i).map(|v| (h.clone(), v.clone())))
                .collect();

            let row = self.map_row(idx + 2, &raw_data, &mut warnings);
            rows.push(row);
        }

        Ok(ParsedCatalog {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            format: CatalogFormat::Markdown,
            total_rows: rows.len(),
            rows,
            column_headers: headers,
            fingerprint: String::new(),
            parse_warnings: warnings,
        })
    }

    /// Map raw data to a structured CatalogRow
    fn map_row(
        &self,
        row_number: usize,
        raw_data: &HashMap<String, String>,
        warnings: &mut Vec<String>,
    ) -> CatalogRow {
        let raw_total_volume = self.find_value(&self.total_volume_columns, raw_data);
        let raw_working_volume = self.find_value(&self.working_volume_columns, raw_data);

        let total_volume = raw_total_volume.as_deref().and_then(|cell| {
            match Volume::parse(cell) {
                Ok(v) => Some(v),
                Err(e) => {
                    warnings.push(format!("Row {}: {}", row_number, e));
                    None
                }
            }
        });

        let working_volume_range = raw_working_volume.as_deref().and_then(|cell| {
            match WorkingVolumeRange::parse(cell) {
                Ok(r) => Some(r),
                Err(e) => {
                    warnings.push(format!("Row {}: working volume - {}", row_number, e));
                    None
                }
            }
        });

        CatalogRow {
            row_number,
            identifier: self.find_value(&self.identifier_columns, raw_data),
            part_number: self.find_value(&self.part_number_columns, raw_data),
            description: self.find_value(&self.description_columns, raw_data),
            material: self.find_value(&self.material_columns, raw_data),
            total_volume,
            working_volume_range,
            raw_total_volume,
            raw_working_volume,
            manufacturer: self.find_value(&self.manufacturer_columns, raw_data),
            manufacturer_url: self.find_value(&self.url_columns, raw_data),
            image_path: self.find_value(&self.image_columns, raw_data),
            raw_data: raw_data.clone(),
        }
    }

    /// Find value by checking multiple possible column names
    fn find_value(
        &self,
        candidates: &[String],
        data: &HashMap<String, String>,
    ) -> Option<String> {
        for candidate in candidates {
            if let Some(value) = data.get(candidate) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }
}

/// SHA-256 fingerprint of the catalog source bytes, hex-encoded.
pub fn fingerprint_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Resolve a Markdown cell to its scalar value. Image cells yield the
/// image path, link-only cells yield the target URL, everything else
/// yields the plain text.
fn finalize_cell(text: &str, link: Option<String>, image: Option<String>) -> String {
    let text = text.trim();
    if let Some(image) = image {
        return image;
    }
    if let Some(link) = link {
        let label_is_generic = text.is_empty()
            || matches!(
                text.to_lowercase().as_str(),
                "link" | "website" | "product page" | "manufacturer website"
            );
        if label_is_generic {
            return link;
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV_SAMPLE: &[u8] = b"plr definition,part number,material,total volume,working volume,manufacturer url\n\
Cos_6_wellplate_16800ul_Fb,3516,TC-treated polystyrene,16.8 mL,1900 - 2900 uL,https://ecatalog.corning.com/3516\n\
Cos_96_wellplate_2mL_Vb,3960,Polypropylene,2 mL,,https://ecatalog.corning.com/3960";

    #[test]
    fn test_format_detection() {
        assert_eq!(
            CatalogFormat::from_extension(Path::new("catalog.csv")),
            Some(CatalogFormat::Csv)
        );
        assert_eq!(
            CatalogFormat::from_extension(Path::new("catalog.xlsx")),
            Some(CatalogFormat::Excel)
        );
        assert_eq!(
            CatalogFormat::from_extension(Path::new("catalog.md")),
            Some(CatalogFormat::Markdown)
        );
        assert_eq!(CatalogFormat::from_extension(Path::new("catalog.txt")), None);
    }

    #[test]
    fn test_csv_parsing() {
        let parser = CatalogParser::new();
        let result = parser
            .parse_bytes("catalog.csv", CSV_SAMPLE, None)
            .unwrap();

        assert_eq!(result.total_rows, 2);
        assert_eq!(
            result.rows[0].identifier,
            Some("Cos_6_wellplate_16800ul_Fb".to_string())
        );
        assert_eq!(result.rows[0].part_number, Some("3516".to_string()));
        assert_eq!(
            result.rows[0].total_volume.map(|v| v.as_microliters()),
            Some(16800.0)
        );
        let range = result.rows[0].working_volume_range.unwrap();
        assert_eq!(range.min.as_microliters(), 1900.0);
        assert_eq!(range.max.as_microliters(), 2900.0);
        assert!(result.rows[1].working_volume_range.is_none());
        assert!(!result.fingerprint.is_empty());
    }

    #[test]
    fn test_excel_parsing() {
        let bytes = include_bytes!("../../../../data/corning_costar.xlsx");
        let parser = CatalogParser::new();
        let result = parser
            .parse_bytes("corning_costar.xlsx", bytes, None)
            .unwrap();

        assert_eq!(result.format, CatalogFormat::Excel);
        assert_eq!(result.total_rows, 9);
        assert!(result.column_headers.contains(&"plr definition".to_string()));
        assert_eq!(
            result.rows[0].identifier,
            Some("Cos_6_wellplate_16800ul_Fb".to_string())
        );
        assert_eq!(result.rows[0].part_number, Some("3516".to_string()));
        assert_eq!(
            result.rows[0].total_volume.map(|v| v.as_microliters()),
            Some(16800.0)
        );
        let range = result.rows[0].working_volume_range.unwrap();
        assert_eq!(range.min.as_microliters(), 1900.0);
        assert_eq!(range.max.as_microliters(), 2900.0);
        assert_eq!(
            result.rows[6].identifier,
            Some("Cos_96_wellplate_2mL_Vb".to_string())
        );
        assert!(result.parse_warnings.is_empty());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let parser = CatalogParser::new();
        let a = parser.parse_bytes("catalog.csv", CSV_SAMPLE, None).unwrap();
        let b = parser.parse_bytes("catalog.csv", CSV_SAMPLE, None).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);

        let c = parser
            .parse_bytes("catalog.csv", &CSV_SAMPLE[..CSV_SAMPLE.len() - 1], None)
            .unwrap();
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn test_malformed_volume_yields_warning_not_failure() {
        let csv = b"plr definition,total volume\nCos_6_wellplate_16800ul_Fb,lots";
        let parser = CatalogParser::new();
        let result = parser.parse_bytes("catalog.csv", csv, None).unwrap();

        assert_eq!(result.total_rows, 1);
        assert!(result.rows[0].total_volume.is_none());
        assert_eq!(result.rows[0].raw_total_volume, Some("lots".to_string()));
        assert_eq!(result.parse_warnings.len(), 1);
    }

    #[test]
    fn test_markdown_table_parsing() {
        let md = b"# Corning Costar plates\n\n\
Some introduction text.\n\n\
| PLR definition | Part number | Material | Total volume | Manufacturer URL | Image |\n\
|---|---|---|---|---|---|\n\
| Cos_6_wellplate_16800ul_Fb | 3516 | TC-treated polystyrene | 16.8 mL | [link](https://ecatalog.corning.com/3516) | ![](img/cos_6_fb.jpg) |\n\
| Cos_96_wellplate_2mL_Vb | 3960 | Polypropylene | 2 mL | https://ecatalog.corning.com/3960 | |\n";

        let parser = CatalogParser::new();
        let result = parser.parse_bytes("catalog.md", md, None).unwrap();

        assert_eq!(result.total_rows, 2);
        assert_eq!(
            result.rows[0].identifier,
            Some("Cos_6_wellplate_16800ul_Fb".to_string())
        );
        assert_eq!(
            result.rows[0].manufacturer_url,
            Some("https://ecatalog.corning.com/3516".to_string())
        );
        assert_eq!(
            result.rows[0].image_path,
            Some("img/cos_6_fb.jpg".to_string())
        );
        assert_eq!(
            result.rows[1].manufacturer_url,
            Some("https://ecatalog.corning.com/3960".to_string())
        );
    }

    use proptest::prelude::*;

    proptest! {
        /// Every input row comes out as exactly one parsed row, with the
        /// identifier column mapped.
        #[test]
        fn prop_parsing_completeness(
            wells in 1u32..10000,
            volume in 1u32..100000,
            part_no in "[0-9]{4}",
        ) {
            let identifier = format!("Cos_{}_wellplate_{}ul_Fb", wells, volume);
            let csv = format!("plr definition,part number\n{},{}", identifier, part_no);
            let parser = CatalogParser::new();
            let result = parser.parse_bytes("catalog.csv", csv.as_bytes(), None).unwrap();

            prop_assert_eq!(result.total_rows, 1);
            prop_assert_eq!(result.rows[0].identifier.clone(), Some(identifier));
            prop_assert_eq!(result.rows[0].part_number.clone(), Some(part_no));
        }
    }

    #[test]
    fn test_markdown_without_table() {
        let parser = CatalogParser::new();
        let result = parser
            .parse_bytes("notes.md", b"# Nothing here\n\nJust prose.", None)
            .unwrap();
        assert_eq!(result.total_rows, 0);
        assert!(!result.parse_warnings.is_empty());
    }
}
