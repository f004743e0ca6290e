//! Volume measurements for labware capacities.
//!
//! Catalog sources quote capacities in microliters or milliliters,
//! frequently with inconsistent unit spellings. Everything is comparable
//! through the canonical microliter value.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Units accepted in catalog volume cells.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VolumeUnit {
    Microliter,
    Milliliter,
}

impl VolumeUnit {
    /// Multiplier to convert a value in this unit to microliters.
    pub fn microliter_factor(&self) -> f64 {
        match self {
            Self::Microliter => 1.0,
            Self::Milliliter => 1000.0,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Microliter => "uL",
            Self::Milliliter => "mL",
        }
    }

    /// Parse a unit token. Accepts the ASCII and micro-sign spellings
    /// seen in manufacturer tables.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "ul" | "µl" | "μl" | "microliter" | "microliters" => Some(Self::Microliter),
            "ml" | "milliliter" | "milliliters" => Some(Self::Milliliter),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolumeParseError {
    #[error("Empty volume value")]
    Empty,

    #[error("Invalid numeric value: {value}")]
    InvalidNumber { value: String },

    #[error("Unknown volume unit: {unit}")]
    UnknownUnit { unit: String },

    #[error("Volume must be positive: {value}")]
    NonPositive { value: f64 },
}

/// A measured volume: value plus unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Volume {
    pub value: f64,
    pub unit: VolumeUnit,
}

impl Volume {
    pub fn microliters(value: f64) -> Self {
        Self {
            value,
            unit: VolumeUnit::Microliter,
        }
    }

    pub fn milliliters(value: f64) -> Self {
        Self {
            value,
            unit: VolumeUnit::Milliliter,
        }
    }

    /// Canonical comparison value.
    pub fn as_microliters(&self) -> f64 {
        self.value * self.unit.microliter_factor()
    }

    /// Parse a catalog volume cell such as `16800 µL`, `16.8 mL`, or `2mL`.
    pub fn parse(input: &str) -> Result<Self, VolumeParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VolumeParseError::Empty);
        }

        // Split the numeric prefix from the unit suffix.
        let split_at = trimmed
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == ','))
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());

        let (number_part, unit_part) = trimmed.split_at(split_at);
        let number_part = number_part.replace(',', "");

        let value: f64 = number_part
            .parse()
            .map_err(|_| VolumeParseError::InvalidNumber {
                value: trimmed.to_string(),
            })?;

        if value <= 0.0 {
            return Err(VolumeParseError::NonPositive { value });
        }

        let unit = VolumeUnit::from_token(unit_part).ok_or_else(|| VolumeParseError::UnknownUnit {
            unit: unit_part.trim().to_string(),
        })?;

        Ok(Self { value, unit })
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.symbol())
    }
}

/// Usable fill range quoted by the manufacturer, (min, max) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorkingVolumeRange {
    pub min: Volume,
    pub max: Volume,
}

impl WorkingVolumeRange {
    pub fn new(min: Volume, max: Volume) -> Self {
        Self { min, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min.as_microliters() <= self.max.as_microliters()
    }

    /// True when the range fits inside the given total well volume.
    pub fn fits_within(&self, total: &Volume) -> bool {
        self.max.as_microliters() <= total.as_microliters()
    }

    /// Parse a range cell such as `1900 - 2900 µL` or `0.1-2 mL`.
    ///
    /// A trailing unit applies to both bounds when the first bound carries
    /// no unit of its own.
    pub fn parse(input: &str) -> Result<Self, VolumeParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VolumeParseError::Empty);
        }

        let (min_raw, max_raw) = trimmed
            .split_once(&['-', '–'][..])
            .ok_or_else(|| VolumeParseError::InvalidNumber {
                value: trimmed.to_string(),
            })?;

        let max = Volume::parse(max_raw)?;
        let min = match Volume::parse(min_raw) {
            Ok(v) => v,
            // Bare number: borrow the unit from the max bound.
            Err(VolumeParseError::UnknownUnit { .. }) => {
                let value: f64 = min_raw
                    .trim()
                    .replace(',', "")
                    .parse()
                    .map_err(|_| VolumeParseError::InvalidNumber {
                        value: min_raw.trim().to_string(),
                    })?;
                Volume {
                    value,
                    unit: max.unit,
                }
            }
            Err(e) => return Err(e),
        };

        Ok(Self { min, max })
    }
}

impl fmt::Display for WorkingVolumeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_microliters() {
        let v = Volume::parse("16800 µL").unwrap();
        assert_eq!(v.unit, VolumeUnit::Microliter);
        assert_eq!(v.as_microliters(), 16800.0);

        let v = Volume::parse("360ul").unwrap();
        assert_eq!(v.as_microliters(), 360.0);
    }

    #[test]
    fn test_parse_milliliters() {
        let v = Volume::parse("16.8 mL").unwrap();
        assert_eq!(v.unit, VolumeUnit::Milliliter);
        assert_eq!(v.as_microliters(), 16800.0);

        let v = Volume::parse("2mL").unwrap();
        assert_eq!(v.as_microliters(), 2000.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Volume::parse(""), Err(VolumeParseError::Empty)));
        assert!(matches!(
            Volume::parse("lots"),
            Err(VolumeParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            Volume::parse("12 parsecs"),
            Err(VolumeParseError::UnknownUnit { .. })
        ));
        assert!(matches!(
            Volume::parse("0 uL"),
            Err(VolumeParseError::NonPositive { .. })
        ));
    }

    #[test]
    fn test_parse_range_with_shared_unit() {
        let r = WorkingVolumeRange::parse("1900 - 2900 µL").unwrap();
        assert_eq!(r.min.as_microliters(), 1900.0);
        assert_eq!(r.max.as_microliters(), 2900.0);
        assert!(r.is_ordered());
    }

    #[test]
    fn test_parse_range_with_explicit_units() {
        let r = WorkingVolumeRange::parse("0.5 mL - 2 mL").unwrap();
        assert_eq!(r.min.as_microliters(), 500.0);
        assert_eq!(r.max.as_microliters(), 2000.0);
    }

    #[test]
    fn test_range_containment() {
        let r = WorkingVolumeRange::parse("100 - 300 uL").unwrap();
        assert!(r.fits_within(&Volume::microliters(360.0)));
        assert!(!r.fits_within(&Volume::microliters(250.0)));
    }
}
