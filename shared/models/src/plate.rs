//! Plate domain models for the Platebook catalog system.
//!
//! This module defines the catalog record for a multi-well plate product,
//! including manufacturer metadata, capacity measurements, and the
//! canonical PLR definition identifier used as its stable key.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::identifier::{is_well_formed, BottomShape, PlateIdentifier};
use crate::volume::{Volume, WorkingVolumeRange};

/// Namespace for deriving record ids from identifiers (UUID v5), so that
/// loading the same catalog twice yields identical records.
pub const RECORD_NAMESPACE: Uuid = Uuid::from_bytes([
    0x9c, 0x1e, 0x4f, 0x0a, 0x6b, 0x2d, 0x4c, 0x8e, 0x9f, 0x31, 0x57, 0xa2, 0xd4, 0x0b, 0x7c, 0x15,
]);

/// Plate body material quoted by the manufacturer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Material {
    Polystyrene,
    Polypropylene,
    Glass,
    CycloOlefinCopolymer,
    Other(String),
}

impl Material {
    /// Map a free-text material cell to a known material where possible.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            s if s.contains("polystyrene") || s == "ps" => Self::Polystyrene,
            s if s.contains("polypropylene") || s == "pp" => Self::Polypropylene,
            s if s.contains("glass") => Self::Glass,
            s if s.contains("cyclo-olefin") || s.contains("cyclic olefin") || s == "coc" => {
                Self::CycloOlefinCopolymer
            }
            _ => Self::Other(label.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Polystyrene => "Polystyrene",
            Self::Polypropylene => "Polypropylene",
            Self::Glass => "Glass",
            Self::CycloOlefinCopolymer => "Cyclo-olefin copolymer",
            Self::Other(label) => label,
        }
    }
}

/// Represents one plate product in the catalog, keyed by its PLR
/// definition identifier. Records are immutable once indexed.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct PlateRecord {
    pub id: Uuid,
    #[validate(
        length(min = 1, max = 120, message = "Identifier must be between 1 and 120 characters"),
        custom = "validate_identifier_format"
    )]
    pub identifier: String,
    #[validate(length(min = 1, max = 100, message = "Part number must be between 1 and 100 characters"))]
    pub part_number: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub material: Option<Material>,
    pub total_volume: Option<Volume>,
    #[validate(custom = "validate_working_range")]
    pub working_volume_range: Option<WorkingVolumeRange>,
    #[validate(length(max = 200))]
    pub manufacturer: Option<String>,
    #[validate(url(message = "Manufacturer URL must be a valid URL"))]
    pub manufacturer_url: Option<String>,
    pub image_path: Option<String>,
    /// Derived from the identifier when it parses.
    pub num_wells: Option<u32>,
    pub bottom: Option<BottomShape>,
}

fn validate_identifier_format(identifier: &str) -> Result<(), ValidationError> {
    if !is_well_formed(identifier) {
        return Err(ValidationError::new("identifier_naming_convention"));
    }
    Ok(())
}

fn validate_working_range(range: &WorkingVolumeRange) -> Result<(), ValidationError> {
    if !range.is_ordered() {
        return Err(ValidationError::new("working_range_unordered"));
    }
    Ok(())
}

impl PlateRecord {
    /// Creates a record for the given identifier. The id is derived from
    /// the identifier, and well count / bottom shape are filled in when
    /// the identifier follows the naming convention.
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let id = Uuid::new_v5(&RECORD_NAMESPACE, identifier.as_bytes());

        let (num_wells, bottom) = match PlateIdentifier::parse(&identifier) {
            Ok(parsed) => (Some(parsed.num_wells), Some(parsed.bottom)),
            Err(_) => (None, None),
        };

        Self {
            id,
            identifier,
            part_number: None,
            description: None,
            material: None,
            total_volume: None,
            working_volume_range: None,
            manufacturer: None,
            manufacturer_url: None,
            image_path: None,
            num_wells,
            bottom,
        }
    }

    /// Structured form of the identifier, when well-formed.
    pub fn plate_identifier(&self) -> Option<PlateIdentifier> {
        PlateIdentifier::parse(&self.identifier).ok()
    }

    /// Per-well nominal volume encoded in the identifier.
    pub fn nominal_well_volume(&self) -> Option<Volume> {
        self.plate_identifier().map(|p| p.nominal_volume)
    }

    /// Compares the identifier's nominal volume against the catalog's
    /// total volume column. Catalogs round inconsistently, so a relative
    /// tolerance applies. `None` when either side is unknown.
    pub fn nominal_matches_total(&self, tolerance: f64) -> Option<bool> {
        let nominal = self.nominal_well_volume()?.as_microliters();
        let total = self.total_volume?.as_microliters();
        if total == 0.0 {
            return Some(false);
        }
        Some(((nominal - total) / total).abs() <= tolerance)
    }

    /// True when the working range is ordered and fits inside the total
    /// volume (vacuously true for missing fields).
    pub fn working_range_consistent(&self) -> bool {
        match (&self.working_volume_range, &self.total_volume) {
            (Some(range), Some(total)) => range.is_ordered() && range.fits_within(total),
            (Some(range), None) => range.is_ordered(),
            _ => true,
        }
    }
}
