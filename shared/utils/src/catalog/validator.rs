//! Catalog Validator
//!
//! Validates parsed catalog data for completeness and correctness before
//! indexing: identifier naming convention and uniqueness, measurement
//! well-formedness, and URL format.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::parser::ParsedCatalog;
use platebook_models::{is_well_formed, PlateIdentifier};

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"^https?://\S+$").unwrap())
}

/// Validation severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

/// Single validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub row: Option<usize>,
    pub field: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Validation result for a catalog
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub issues: Vec<ValidationIssue>,
    pub summary: ValidationSummary,
}

/// Summary statistics for validation
#[derive(Debug, Clone)]
pub struct ValidationSummary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub missing_identifiers: usize,
    pub malformed_identifiers: usize,
    pub duplicate_identifiers: usize,
    pub missing_part_numbers: usize,
    pub malformed_volumes: usize,
    pub inconsistent_ranges: usize,
    pub malformed_urls: usize,
}

/// Catalog validator
pub struct CatalogValidator {
    require_part_number: bool,
    check_volumes: bool,
    check_urls: bool,
    /// Relative tolerance for the nominal-vs-total volume cross-check.
    volume_tolerance: f64,
}

impl Default for CatalogValidator {
    fn default() -> Self {
        Self {
            require_part_number: false,
            check_volumes: true,
            check_urls: true,
            volume_tolerance: 0.05,
        }
    }
}

impl CatalogValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure part number requirement
    pub fn with_part_number_required(mut self, required: bool) -> Self {
        self.require_part_number = required;
        self
    }

    /// Configure the nominal-vs-total volume tolerance
    pub fn with_volume_tolerance(mut self, tolerance: f64) -> Self {
        self.volume_tolerance = tolerance;
        self
    }

    /// Validate a parsed catalog
    pub fn validate(&self, catalog: &ParsedCatalog) -> ValidationResult {
        let mut issues = Vec::new();
        let mut missing_identifiers = 0;
        let mut malformed_identifiers = 0;
        let mut duplicate_identifiers = 0;
        let mut missing_part_numbers = 0;
        let mut malformed_volumes = 0;
        let mut inconsistent_ranges = 0;
        let mut malformed_urls = 0;

        let mut seen: HashSet<&str> = HashSet::new();
        let mut invalid_rows = 0;

        for row in &catalog.rows {
            let mut row_has_error = false;

            // Identifier: required, well-formed, unique
            match row.identifier.as_deref() {
                None => {
                    missing_identifiers += 1;
                    row_has_error = true;
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Error,
                        row: Some(row.row_number),
                        field: Some("identifier".to_string()),
                        message: "Missing PLR definition identifier".to_string(),
                        suggestion: Some("Add the identifier this row is keyed by".to_string()),
                    });
                }
                Some(identifier) if !is_well_formed(identifier) => {
                    malformed_identifiers += 1;
                    row_has_error = true;
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Error,
                        row: Some(row.row_number),
                        field: Some("identifier".to_string()),
                        message: format!("Malformed identifier: {}", identifier),
                        suggestion: Some(
                            "Expected <Vendor>_<wells>_wellplate_<volume><unit>_<bottom>"
                                .to_string(),
                        ),
                    });
                }
                Some(identifier) => {
                    if !seen.insert(identifier) {
                        duplicate_identifiers += 1;
                        row_has_error = true;
                        issues.push(ValidationIssue {
                            severity: ValidationSeverity::Error,
                            row: Some(row.row_number),
                            field: Some("identifier".to_string()),
                            message: format!("Duplicate identifier: {}", identifier),
                            suggestion: Some(
                                "Identifiers must be unique across the catalog; the first \
                                 occurrence is kept"
                                    .to_string(),
                            ),
                        });
                    }
                }
            }

            // Part number presence
            if self.require_part_number && row.part_number.is_none() {
                missing_part_numbers += 1;
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Warning,
                    row: Some(row.row_number),
                    field: Some("part_number".to_string()),
                    message: "Missing part number".to_string(),
                    suggestion: Some("Add the manufacturer SKU for ordering".to_string()),
                });
            }

            if self.check_volumes {
                // A measurement cell that was present but failed to parse
                if row.raw_total_volume.is_some() && row.total_volume.is_none() {
                    malformed_volumes += 1;
                    row_has_error = true;
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Error,
                        row: Some(row.row_number),
                        field: Some("total_volume".to_string()),
                        message: format!(
                            "Malformed total volume: {}",
                            row.raw_total_volume.as_deref().unwrap_or_default()
                        ),
                        suggestion: Some("Use a value plus unit, e.g. 16.8 mL".to_string()),
                    });
                }
                if row.raw_working_volume.is_some() && row.working_volume_range.is_none() {
                    malformed_volumes += 1;
                    row_has_error = true;
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Error,
                        row: Some(row.row_number),
                        field: Some("working_volume_range".to_string()),
                        message: format!(
                            "Malformed working volume range: {}",
                            row.raw_working_volume.as_deref().unwrap_or_default()
                        ),
                        suggestion: Some("Use a min - max pair, e.g. 1900 - 2900 uL".to_string()),
                    });
                }

                // Range consistency
                if let Some(range) = &row.working_volume_range {
                    if !range.is_ordered() {
                        inconsistent_ranges += 1;
                        issues.push(ValidationIssue {
                            severity: ValidationSeverity::Warning,
                            row: Some(row.row_number),
                            field: Some("working_volume_range".to_string()),
                            message: format!("Working volume minimum exceeds maximum: {}", range),
                            suggestion: None,
                        });
                    } else if let Some(total) = &row.total_volume {
                        if !range.fits_within(total) {
                            inconsistent_ranges += 1;
                            issues.push(ValidationIssue {
                                severity: ValidationSeverity::Warning,
                                row: Some(row.row_number),
                                field: Some("working_volume_range".to_string()),
                                message: format!(
                                    "Working volume range {} exceeds total volume {}",
                                    range, total
                                ),
                                suggestion: None,
                            });
                        }
                    }
                }

                // Nominal volume encoded in the identifier vs the catalog column
                if let (Some(identifier), Some(total)) =
                    (row.identifier.as_deref(), &row.total_volume)
                {
                    if let Ok(parsed) = PlateIdentifier::parse(identifier) {
                        let nominal = parsed.nominal_volume.as_microliters();
                        let total_ul = total.as_microliters();
                        if total_ul > 0.0
                            && ((nominal - total_ul) / total_ul).abs() > self.volume_tolerance
                        {
                            issues.push(ValidationIssue {
                                severity: ValidationSeverity::Info,
                                row: Some(row.row_number),
                                field: Some("total_volume".to_string()),
                                message: format!(
                                    "Identifier encodes {} but total volume column says {}",
                                    parsed.nominal_volume, total
                                ),
                                suggestion: None,
                            });
                        }
                    }
                }
            }

            // URL format
            if self.check_urls {
                if let Some(url) = row.manufacturer_url.as_deref() {
                    if !url_regex().is_match(url) {
                        malformed_urls += 1;
                        issues.push(ValidationIssue {
                            severity: ValidationSeverity::Warning,
                            row: Some(row.row_number),
                            field: Some("manufacturer_url".to_string()),
                            message: format!("Malformed manufacturer URL: {}", url),
                            suggestion: Some("Use an absolute http(s) URL".to_string()),
                        });
                    }
                }
            }

            if row_has_error {
                invalid_rows += 1;
            }
        }

        let error_count = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Error)
            .count();
        let warning_count = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Warning)
            .count();

        ValidationResult {
            is_valid: error_count == 0,
            error_count,
            warning_count,
            issues,
            summary: ValidationSummary {
                total_rows: catalog.total_rows,
                valid_rows: catalog.total_rows - invalid_rows,
                invalid_rows,
                missing_identifiers,
                malformed_identifiers,
                duplicate_identifiers,
                missing_part_numbers,
                malformed_volumes,
                inconsistent_ranges,
                malformed_urls,
            },
        }
    }
}
