//! Per-bin derivations and ranking statistics.

use crate::math::mean;
use serde::{Deserialize, Serialize};

/// Maps the raw science values of one altitude bin to a derived
/// scalar.
///
/// `bin` holds one value per input array, in input order, and never
/// contains the missing data sentinel.
pub trait Derivation: Sync {
    /// Number of parallel science arrays consumed.
    fn inputs(&self) -> usize;

    fn derive(&self, bin: &[f64]) -> f64;
}

/// Passes a single science value through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl Derivation for Identity {
    fn inputs(&self) -> usize {
        1
    }

    fn derive(&self, bin: &[f64]) -> f64 {
        bin[0]
    }
}

/// Ångström exponent from extinction at two wavelengths.
///
/// Inputs are `[short, long]` extinction coefficients; the result is
/// `ln(short / long) / ln(long_nm / short_nm)`. Bins where either
/// coefficient is not positive yield NaN or an infinity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angstrom {
    pub short_nm: f64,
    pub long_nm: f64,
}

impl Angstrom {
    /// CALIPSO's 532 nm and 1064 nm channels.
    pub const CALIPSO: Self = Self {
        short_nm: 532.0,
        long_nm: 1064.0,
    };

    pub fn exponent(&self, short: f64, long: f64) -> f64 {
        (short / long).ln() / (self.long_nm / self.short_nm).ln()
    }
}

impl Default for Angstrom {
    fn default() -> Self {
        Self::CALIPSO
    }
}

impl Derivation for Angstrom {
    fn inputs(&self) -> usize {
        2
    }

    fn derive(&self, bin: &[f64]) -> f64 {
        self.exponent(bin[0], bin[1])
    }
}

impl<D: Derivation + ?Sized> Derivation for &D {
    fn inputs(&self) -> usize {
        (**self).inputs()
    }

    fn derive(&self, bin: &[f64]) -> f64 {
        (**self).derive(bin)
    }
}

impl<D: Derivation + ?Sized> Derivation for Box<D> {
    fn inputs(&self) -> usize {
        (**self).inputs()
    }

    fn derive(&self, bin: &[f64]) -> f64 {
        (**self).derive(bin)
    }
}

/// Summary statistic used to rank candidate profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    #[default]
    Mean,
    Median,
    Max,
}

impl Statistic {
    /// Returns the statistic of `profile`, `None` when it is empty.
    ///
    /// NaN values propagate for `Mean`; `Median` and `Max` order NaN
    /// above every number, as `f64::total_cmp` does.
    pub fn apply(self, profile: &[f64]) -> Option<f64> {
        match self {
            Self::Mean => mean(profile),
            Self::Max => profile.iter().copied().max_by(f64::total_cmp),
            Self::Median => {
                if profile.is_empty() {
                    return None;
                }
                let mut sorted = profile.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
                } else {
                    Some(sorted[mid])
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Angstrom, Derivation, Identity, Statistic};
    use approx::assert_relative_eq;

    #[test]
    fn test_angstrom() {
        let a = Angstrom::CALIPSO;
        assert_eq!(a.inputs(), 2);
        // Extinction falling with the inverse square of wavelength.
        assert_relative_eq!(a.derive(&[0.004, 0.001]), 2.0, epsilon = 1e-12);
        assert_relative_eq!(a.derive(&[0.002, 0.002]), 0.0);
        assert!(a.derive(&[0.0, 0.0]).is_nan());
        assert!(a.derive(&[-0.001, 0.001]).is_nan());
    }

    #[test]
    fn test_identity() {
        assert_eq!(Identity.inputs(), 1);
        assert_relative_eq!(Identity.derive(&[0.25]), 0.25);
        let boxed: Box<dyn Derivation + Send> = Box::new(Identity);
        assert_relative_eq!(boxed.derive(&[1.5]), 1.5);
    }

    #[test]
    fn test_statistics() {
        let profile = [3.0, 1.0, 2.0, 10.0];
        assert_relative_eq!(Statistic::Mean.apply(&profile).unwrap(), 4.0);
        assert_relative_eq!(Statistic::Median.apply(&profile).unwrap(), 2.5);
        assert_relative_eq!(Statistic::Max.apply(&profile).unwrap(), 10.0);
        assert_relative_eq!(Statistic::Median.apply(&[5.0, 1.0, 3.0]).unwrap(), 3.0);
        for stat in [Statistic::Mean, Statistic::Median, Statistic::Max] {
            assert_eq!(stat.apply(&[]), None);
        }
    }
}
