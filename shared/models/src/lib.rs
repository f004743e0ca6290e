//! # Platebook Core Domain Models
//!
//! This module contains the core domain models for the Platebook labware
//! catalog system. All models implement serialization/deserialization with
//! serde and validation with the validator crate.
//!
//! ## Key Models
//!
//! - **PlateRecord**: One plate product in the catalog, keyed by its PLR
//!   definition identifier
//! - **PlateIdentifier**: Structured form of the identifier naming
//!   convention (vendor, well count, nominal volume, bottom shape)
//! - **Volume / WorkingVolumeRange**: Capacity measurements with canonical
//!   microliter comparison
//!
//! ## Validation
//!
//! Records validate the identifier naming convention, measurement
//! well-formedness, URL format, and string length limits. Catalog-level
//! invariants (identifier uniqueness) live in the indexing layer.

pub mod identifier;
pub mod plate;
pub mod volume;

#[cfg(test)]
pub mod property_tests;

pub use identifier::{
    is_well_formed, BottomShape, IdentifierError, PlateIdentifier, IDENTIFIER_PATTERN,
};
pub use plate::{Material, PlateRecord, RECORD_NAMESPACE};
pub use volume::{Volume, VolumeParseError, VolumeUnit, WorkingVolumeRange};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = PlateRecord::new("Cos_6_wellplate_16800ul_Fb");
        assert_eq!(record.identifier, "Cos_6_wellplate_16800ul_Fb");
        assert_eq!(record.num_wells, Some(6));
    }

    #[test]
    fn test_identifier_convention() {
        assert!(is_well_formed("Cos_96_wellplate_2mL_Vb"));
        assert!(!is_well_formed("96-well plate"));
    }

    #[test]
    fn test_volume_canonicalization() {
        let total = Volume::parse("16.8 mL").unwrap();
        let nominal = Volume::parse("16800 ul").unwrap();
        assert_eq!(total.as_microliters(), nominal.as_microliters());
    }
}
