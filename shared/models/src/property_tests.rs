//! Property-based tests for Platebook core domain models
//!
//! These validate universal properties of identifiers, volumes, and plate
//! records: parse/serialize round-trips, unit arithmetic, and record
//! identity determinism.

use proptest::prelude::*;

use crate::{BottomShape, PlateIdentifier, PlateRecord, Volume, VolumeUnit, WorkingVolumeRange};

// Property test generators

prop_compose! {
    fn arb_vendor_code()(
        first in "[A-Z]",
        rest in "[A-Za-z]{1,3}"
    ) -> String {
        format!("{}{}", first, rest)
    }
}

fn arb_bottom() -> impl Strategy<Value = BottomShape> {
    prop_oneof![
        Just(BottomShape::Flat),
        Just(BottomShape::Round),
        Just(BottomShape::VShaped),
        Just(BottomShape::UShaped),
    ]
}

prop_compose! {
    fn arb_identifier()(
        vendor in arb_vendor_code(),
        wells in 1u32..10000,
        volume in 1u32..100000,
        unit in prop_oneof![Just("ul"), Just("mL")],
        bottom in arb_bottom()
    ) -> String {
        format!("{}_{}_wellplate_{}{}_{}", vendor, wells, volume, unit, bottom.code())
    }
}

proptest! {
    /// Every identifier produced by the grammar parses, and the structured
    /// form reassembles to the same string.
    #[test]
    fn prop_identifier_round_trip(identifier in arb_identifier()) {
        let parsed = PlateIdentifier::parse(&identifier).unwrap();
        prop_assert_eq!(parsed.canonical(), identifier.clone());
        prop_assert_eq!(parsed.raw, identifier);
    }

    /// Record ids are a pure function of the identifier.
    #[test]
    fn prop_record_id_deterministic(identifier in arb_identifier()) {
        let a = PlateRecord::new(identifier.clone());
        let b = PlateRecord::new(identifier);
        prop_assert_eq!(a.id, b.id);
        prop_assert_eq!(a, b);
    }

    /// Milliliter and microliter renditions of the same quantity compare
    /// equal through the canonical value.
    #[test]
    fn prop_volume_unit_conversion(ml in 1u32..100000) {
        let in_ml = Volume::milliliters(ml as f64);
        let in_ul = Volume::microliters(ml as f64 * 1000.0);
        prop_assert_eq!(in_ml.as_microliters(), in_ul.as_microliters());
    }

    /// Volume display output parses back to the same quantity.
    #[test]
    fn prop_volume_display_round_trip(
        value in 1u32..1000000,
        unit in prop_oneof![Just(VolumeUnit::Microliter), Just(VolumeUnit::Milliliter)]
    ) {
        let volume = Volume { value: value as f64, unit };
        let reparsed = Volume::parse(&volume.to_string()).unwrap();
        prop_assert_eq!(reparsed.as_microliters(), volume.as_microliters());
    }

    /// A range built from ordered bounds reports as ordered regardless of
    /// the unit mix.
    #[test]
    fn prop_ordered_range(min_ul in 1u32..1000, span_ul in 0u32..100000) {
        let range = WorkingVolumeRange::new(
            Volume::microliters(min_ul as f64),
            Volume::milliliters((min_ul + span_ul) as f64 / 1000.0),
        );
        prop_assert!(range.is_ordered());
    }

    /// Records survive a serde round trip unchanged.
    #[test]
    fn prop_record_serde_round_trip(identifier in arb_identifier()) {
        let mut record = PlateRecord::new(identifier);
        record.total_volume = Some(Volume::microliters(360.0));
        let json = serde_json::to_string(&record).unwrap();
        let back: PlateRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, record);
    }
}
