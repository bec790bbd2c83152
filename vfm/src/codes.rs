//! Feature classification flag fields.
//!
//! Every decoded bin is a 16-bit flag word. This crate only reads two
//! of its fields:
//!
//! | bits  | field        |
//! |-------|--------------|
//! | 0-2   | feature type |
//! | 9-11  | subtype      |

use serde::Serialize;

const FEATURE_TYPE_MASK: u16 = 0x7;
const SUBTYPE_SHIFT: u16 = 9;
const SUBTYPE_MASK: u16 = 0x7;

/// Offset added to stratospheric subtypes in combined type codes.
pub const STRATOSPHERIC_OFFSET: u8 = 8;

/// Returns the feature type field of `code`.
#[allow(clippy::cast_possible_truncation)]
pub fn feature_type(code: u16) -> u8 {
    (code & FEATURE_TYPE_MASK) as u8
}

/// Returns the raw subtype field of `code`.
#[allow(clippy::cast_possible_truncation)]
pub fn subtype(code: u16) -> u8 {
    ((code >> SUBTYPE_SHIFT) & SUBTYPE_MASK) as u8
}

/// Returns the combined aerosol type code of `code`.
///
/// - tropospheric aerosol: subtype, `0..=7`
/// - stratospheric aerosol: subtype + 8, kept only in `9..=11`
/// - anything else: 0
pub fn combined_type(code: u16) -> u8 {
    match FeatureType::from_code(code) {
        FeatureType::TroposphericAerosol => subtype(code),
        FeatureType::StratosphericAerosol => {
            let offset = subtype(code) + STRATOSPHERIC_OFFSET;
            if offset > STRATOSPHERIC_OFFSET && offset <= STRATOSPHERIC_OFFSET + 3 {
                offset
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Returns the tropospheric aerosol subtype of `code`, or 0 for any
/// other feature.
pub fn tropospheric_subtype(code: u16) -> u8 {
    if FeatureType::from_code(code) == FeatureType::TroposphericAerosol {
        subtype(code)
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FeatureType {
    Invalid,
    ClearAir,
    Cloud,
    TroposphericAerosol,
    StratosphericAerosol,
    Surface,
    Subsurface,
    NoSignal,
}

impl FeatureType {
    pub fn from_code(code: u16) -> Self {
        match feature_type(code) {
            1 => Self::ClearAir,
            2 => Self::Cloud,
            3 => Self::TroposphericAerosol,
            4 => Self::StratosphericAerosol,
            5 => Self::Surface,
            6 => Self::Subsurface,
            7 => Self::NoSignal,
            _ => Self::Invalid,
        }
    }
}

/// Combined tropospheric/stratospheric aerosol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum AerosolType {
    NotDetermined = 0,
    CleanMarine = 1,
    Dust = 2,
    PollutedContinental = 3,
    CleanContinental = 4,
    PollutedDust = 5,
    Smoke = 6,
    DustyMarine = 7,
    PscAerosol = 9,
    VolcanicAsh = 10,
    SulfateOther = 11,
}

impl AerosolType {
    pub const ALL: [Self; 11] = [
        Self::NotDetermined,
        Self::CleanMarine,
        Self::Dust,
        Self::PollutedContinental,
        Self::CleanContinental,
        Self::PollutedDust,
        Self::Smoke,
        Self::DustyMarine,
        Self::PscAerosol,
        Self::VolcanicAsh,
        Self::SulfateOther,
    ];

    /// Returns the type for a combined code, `None` for codes that can
    /// not occur (8 and anything above 11).
    pub fn from_combined(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| *t as u8 == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NotDetermined => "Not Determined",
            Self::CleanMarine => "Clean Marine",
            Self::Dust => "Dust",
            Self::PollutedContinental => "Polluted Continental",
            Self::CleanContinental => "Clean Continental",
            Self::PollutedDust => "Polluted Dust",
            Self::Smoke => "Smoke",
            Self::DustyMarine => "Dusty Marine",
            Self::PscAerosol => "PSC Aerosol",
            Self::VolcanicAsh => "Volcanic Ash",
            Self::SulfateOther => "Sulfate/Other",
        }
    }
}

impl std::fmt::Display for AerosolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        combined_type, feature_type, subtype, tropospheric_subtype, AerosolType, FeatureType,
    };

    fn code(ft: u16, st: u16) -> u16 {
        // Set some unrelated bits to make sure they are ignored.
        ft | (st << 9) | (1 << 3) | (1 << 12) | (1 << 13)
    }

    #[test]
    fn test_fields() {
        let c = code(3, 6);
        assert_eq!(feature_type(c), 3);
        assert_eq!(subtype(c), 6);
        assert_eq!(FeatureType::from_code(c), FeatureType::TroposphericAerosol);
        assert_eq!(FeatureType::from_code(0), FeatureType::Invalid);
    }

    #[test]
    fn test_combined_type() {
        assert_eq!(combined_type(code(3, 6)), 6);
        assert_eq!(combined_type(code(3, 0)), 0);
        assert_eq!(combined_type(code(4, 1)), 9);
        assert_eq!(combined_type(code(4, 3)), 11);
        // Out of range stratospheric subtypes collapse to 0.
        assert_eq!(combined_type(code(4, 0)), 0);
        assert_eq!(combined_type(code(4, 4)), 0);
        assert_eq!(combined_type(code(4, 7)), 0);
        // Clouds carry subtypes too, but they are not aerosol.
        assert_eq!(combined_type(code(2, 5)), 0);
    }

    #[test]
    fn test_combined_type_never_8() {
        for raw in 0..=u16::MAX {
            let t = combined_type(raw);
            assert!(t != 8 && t <= 11, "{raw:#06x} -> {t}");
            assert!(AerosolType::from_combined(t).is_some());
        }
    }

    #[test]
    fn test_tropospheric_subtype() {
        assert_eq!(tropospheric_subtype(code(3, 2)), 2);
        assert_eq!(tropospheric_subtype(code(4, 2)), 0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(AerosolType::from_combined(6), Some(AerosolType::Smoke));
        assert_eq!(AerosolType::from_combined(8), None);
        assert_eq!(AerosolType::VolcanicAsh.to_string(), "Volcanic Ash");
    }
}
