//! PLR definition identifiers.
//!
//! Every catalog entry is keyed by a canonical identifier such as
//! `Cos_6_wellplate_16800ul_Fb`: vendor code, well count, the literal
//! `wellplate` marker, nominal well volume, and a bottom-shape code. The
//! identifier is the stable key handed to external labware-description
//! systems, so its grammar is enforced at load time.

use crate::volume::{Volume, VolumeUnit};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Grammar for a well-formed PLR definition identifier.
pub const IDENTIFIER_PATTERN: &str =
    r"^[A-Z][A-Za-z]{1,3}_\d+_wellplate_\d+(?:_\d+)?(?:ul|mL)_(?:Fb|Rb|Vb|Ub)$";

/// Quick grammar check without building the structured form. The
/// pattern is compiled once; this runs per catalog row.
pub fn is_well_formed(identifier: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN).unwrap())
        .is_match(identifier)
}

/// Well bottom geometry, encoded as the identifier suffix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BottomShape {
    Flat,
    Round,
    VShaped,
    UShaped,
}

impl BottomShape {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Flat => "Fb",
            Self::Round => "Rb",
            Self::VShaped => "Vb",
            Self::UShaped => "Ub",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Fb" => Some(Self::Flat),
            "Rb" => Some(Self::Round),
            "Vb" => Some(Self::VShaped),
            "Ub" => Some(Self::UShaped),
            _ => None,
        }
    }
}

impl fmt::Display for BottomShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentifierError {
    #[error("Identifier does not match naming convention: {identifier}")]
    Malformed { identifier: String },

    #[error("Identifier has invalid well count: {identifier}")]
    InvalidWellCount { identifier: String },

    #[error("Identifier has invalid volume token: {identifier}")]
    InvalidVolume { identifier: String },
}

/// Structured form of a PLR definition identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlateIdentifier {
    pub raw: String,
    pub vendor_code: String,
    pub num_wells: u32,
    pub nominal_volume: Volume,
    pub bottom: BottomShape,
}

impl PlateIdentifier {
    /// Parse an identifier into its structured components.
    pub fn parse(identifier: &str) -> Result<Self, IdentifierError> {
        if !is_well_formed(identifier) {
            return Err(IdentifierError::Malformed {
                identifier: identifier.to_string(),
            });
        }

        // Grammar is checked; segment layout is fixed from here on.
        let segments: Vec<&str> = identifier.split('_').collect();
        let vendor_code = segments[0].to_string();

        let num_wells: u32 =
            segments[1]
                .parse()
                .map_err(|_| IdentifierError::InvalidWellCount {
                    identifier: identifier.to_string(),
                })?;
        if num_wells == 0 {
            return Err(IdentifierError::InvalidWellCount {
                identifier: identifier.to_string(),
            });
        }

        // Volume spans one or two segments: `16800ul` or `1_5mL`.
        let bottom_code = segments[segments.len() - 1];
        let volume_segments = &segments[3..segments.len() - 1];
        let nominal_volume = Self::parse_volume_token(&volume_segments.join("_")).ok_or_else(
            || IdentifierError::InvalidVolume {
                identifier: identifier.to_string(),
            },
        )?;

        let bottom = BottomShape::from_code(bottom_code).ok_or_else(|| {
            IdentifierError::Malformed {
                identifier: identifier.to_string(),
            }
        })?;

        Ok(Self {
            raw: identifier.to_string(),
            vendor_code,
            num_wells,
            nominal_volume,
            bottom,
        })
    }

    /// Parse a volume token such as `16800ul`, `2mL`, or `1_5mL` (the
    /// underscore stands in for a decimal point).
    fn parse_volume_token(token: &str) -> Option<Volume> {
        let (digits, unit_token) = token.split_at(token.find(|c: char| c.is_alphabetic())?);
        let unit = VolumeUnit::from_token(unit_token)?;
        let value: f64 = digits.replace('_', ".").parse().ok()?;
        if value <= 0.0 {
            return None;
        }
        Some(Volume { value, unit })
    }

    /// Reassemble the canonical identifier string from components.
    pub fn canonical(&self) -> String {
        let volume_token = if self.nominal_volume.value.fract() == 0.0 {
            format!(
                "{}{}",
                self.nominal_volume.value as u64,
                match self.nominal_volume.unit {
                    VolumeUnit::Microliter => "ul",
                    VolumeUnit::Milliliter => "mL",
                }
            )
        } else {
            format!(
                "{}{}",
                format!("{}", self.nominal_volume.value).replace('.', "_"),
                match self.nominal_volume.unit {
                    VolumeUnit::Microliter => "ul",
                    VolumeUnit::Milliliter => "mL",
                }
            )
        };

        format!(
            "{}_{}_wellplate_{}_{}",
            self.vendor_code, self.num_wells, volume_token, self.bottom
        )
    }
}

impl FromStr for PlateIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PlateIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
