//! Catalog Service
//!
//! Core business logic for the catalog API: holds the loaded index behind
//! a read/write lock, serves lookups, and reloads the source when its
//! content changes.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use platebook_models::{PlateIdentifier, PlateRecord};
use platebook_utils::catalog::parser::fingerprint_bytes;
use platebook_utils::catalog::{self, CatalogIndex, CatalogValidator, ValidationResult};
use platebook_utils::config::CatalogConfig;

/// Catalog load outcome served by the stats endpoint.
#[derive(Debug, Clone)]
pub struct CatalogStats {
    pub source: String,
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
    pub indexed: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub validation_errors: usize,
    pub validation_warnings: usize,
}

/// Result of a reload request.
#[derive(Debug, Clone)]
pub struct ReloadOutcome {
    /// False when the source fingerprint was unchanged and the index kept.
    pub reloaded: bool,
    pub fingerprint: String,
    pub indexed: usize,
}

/// Identifier validation served without touching the index contents.
#[derive(Debug, Clone)]
pub struct IdentifierValidation {
    pub identifier: String,
    pub is_well_formed: bool,
    pub in_catalog: bool,
    pub parsed: Option<PlateIdentifier>,
    pub errors: Vec<String>,
}

struct CatalogState {
    index: CatalogIndex,
    validation: ValidationResult,
}

/// Catalog API service state
#[derive(Clone)]
pub struct CatalogService {
    state: Arc<RwLock<CatalogState>>,
    source_path: PathBuf,
    validator_config: CatalogConfig,
}

impl CatalogService {
    /// Load the configured catalog source and build the serving index.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::from_path(Path::new(&config.source_path), config.clone())
    }

    pub fn from_path(path: &Path, config: CatalogConfig) -> Result<Self> {
        let validator = Self::build_validator(&config);
        let (parsed, validation, index) = catalog::load_path(path, &validator, config.strict)?;

        info!(
            source = %path.display(),
            rows = parsed.total_rows,
            indexed = index.len(),
            rejected = index.rejected.len(),
            errors = validation.error_count,
            warnings = validation.warning_count,
            "Catalog loaded"
        );

        Ok(Self {
            state: Arc::new(RwLock::new(CatalogState { index, validation })),
            source_path: path.to_path_buf(),
            validator_config: config,
        })
    }

    fn build_validator(config: &CatalogConfig) -> CatalogValidator {
        CatalogValidator::new()
            .with_part_number_required(config.require_part_number)
            .with_volume_tolerance(config.volume_tolerance)
    }

    /// Lookup a record by its PLR definition identifier.
    pub async fn lookup(&self, identifier: &str) -> Option<PlateRecord> {
        let state = self.state.read().await;
        state.index.lookup(identifier).cloned()
    }

    /// All records in source order.
    pub async fn list(&self) -> Vec<PlateRecord> {
        let state = self.state.read().await;
        state.index.records().into_iter().cloned().collect()
    }

    /// Load and validation statistics for the currently served catalog.
    pub async fn stats(&self) -> CatalogStats {
        let state = self.state.read().await;
        let index_stats = state.index.stats();

        CatalogStats {
            source: state.index.source.clone(),
            fingerprint: state.index.fingerprint.clone(),
            loaded_at: state.index.loaded_at,
            indexed: index_stats.indexed,
            rejected: index_stats.rejected,
            duplicates: index_stats.duplicates,
            validation_errors: state.validation.error_count,
            validation_warnings: state.validation.warning_count,
        }
    }

    /// Validate an identifier against the naming convention and report
    /// whether the catalog knows it.
    pub async fn validate_identifier(&self, identifier: &str) -> IdentifierValidation {
        let (parsed, errors) = match PlateIdentifier::parse(identifier) {
            Ok(parsed) => (Some(parsed), Vec::new()),
            Err(e) => (None, vec![e.to_string()]),
        };

        let state = self.state.read().await;
        IdentifierValidation {
            identifier: identifier.to_string(),
            is_well_formed: parsed.is_some(),
            in_catalog: state.index.contains(identifier),
            parsed,
            errors,
        }
    }

    /// Re-read the source file. Skips the rebuild when the content
    /// fingerprint is unchanged.
    pub async fn reload(&self) -> Result<ReloadOutcome> {
        let bytes = std::fs::read(&self.source_path).with_context(|| {
            format!(
                "Failed to read catalog source {}",
                self.source_path.display()
            )
        })?;
        let fingerprint = fingerprint_bytes(&bytes);

        {
            let state = self.state.read().await;
            if state.index.fingerprint == fingerprint {
                info!(source = %self.source_path.display(), "Catalog unchanged, reload skipped");
                return Ok(ReloadOutcome {
                    reloaded: false,
                    fingerprint,
                    indexed: state.index.len(),
                });
            }
        }

        let validator = Self::build_validator(&self.validator_config);
        let (_, validation, index) = catalog::load_path(
            &self.source_path,
            &validator,
            self.validator_config.strict,
        )?;
        let indexed = index.len();

        let mut state = self.state.write().await;
        *state = CatalogState { index, validation };
        info!(source = %self.source_path.display(), indexed, "Catalog reloaded");

        Ok(ReloadOutcome {
            reloaded: true,
            fingerprint,
            indexed,
        })
    }
}
