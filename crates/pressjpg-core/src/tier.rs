//! Compression tiers and JPEG quality values.
//!
//! A [`Tier`] is a named preset that resolves to a fixed starting quality and a
//! byte-size ceiling. The mapping is total: every tier has exactly one
//! [`TierPreset`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest quality the compression search will try.
pub const QUALITY_FLOOR: Quality = Quality(10);

/// Amount the quality drops between two search iterations (0.05).
pub const QUALITY_STEP: u8 = 5;

/// JPEG quality stored as an integer percentage (1-100).
///
/// Keeping the value integral means repeated 0.05 decrements land exactly on
/// the 0.10 floor instead of drifting past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(u8);

impl Quality {
    /// Create a quality from a percentage, clamped to 1-100.
    pub fn from_percent(percent: u8) -> Self {
        Self(percent.clamp(1, 100))
    }

    /// Create a quality from a normalized fraction in (0, 1].
    ///
    /// The fraction is rounded to the nearest whole percent.
    pub fn from_fraction(fraction: f32) -> Self {
        let percent = (fraction * 100.0).round().clamp(1.0, 100.0);
        Self(percent as u8)
    }

    /// Quality as a percentage (1-100), the scale JPEG encoders expect.
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Quality as a normalized fraction in (0, 1].
    pub fn as_fraction(self) -> f32 {
        f32::from(self.0) / 100.0
    }

    /// True once the search has reached the minimum quality.
    pub fn is_at_floor(self) -> bool {
        self <= QUALITY_FLOOR
    }

    /// The next quality in the search, one step lower.
    pub fn step_down(self) -> Self {
        Self::from_percent(self.0.saturating_sub(QUALITY_STEP))
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_fraction())
    }
}

/// Starting quality and byte ceiling for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPreset {
    /// Quality of the first encode attempt.
    pub initial_quality: Quality,
    /// Target size in bytes. A soft target: the search stops at the quality
    /// floor even when the output is still larger.
    pub size_ceiling: u32,
}

/// Named compression preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Up to 1 MiB, starting at quality 0.90.
    Large,
    /// Up to 500 KiB, starting at quality 0.80.
    #[default]
    Medium,
    /// Up to 250 KiB, starting at quality 0.60.
    Small,
    /// Up to 125 KiB, starting at quality 0.40.
    VerySmall,
}

impl Tier {
    /// Every tier, from largest output to smallest.
    pub const ALL: [Tier; 4] = [Tier::Large, Tier::Medium, Tier::Small, Tier::VerySmall];

    /// Resolve the tier to its quality/ceiling pair.
    pub const fn preset(self) -> TierPreset {
        match self {
            Tier::Large => TierPreset {
                initial_quality: Quality(90),
                size_ceiling: 1_048_576,
            },
            Tier::Medium => TierPreset {
                initial_quality: Quality(80),
                size_ceiling: 512_000,
            },
            Tier::Small => TierPreset {
                initial_quality: Quality(60),
                size_ceiling: 256_000,
            },
            Tier::VerySmall => TierPreset {
                initial_quality: Quality(40),
                size_ceiling: 128_000,
            },
        }
    }

    /// Short label used when naming output files (`photo_verysmall.jpg`).
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Large => "large",
            Tier::Medium => "medium",
            Tier::Small => "small",
            Tier::VerySmall => "verysmall",
        }
    }

    /// Human readable name as shown in the size menu.
    pub const fn display_name(self) -> &'static str {
        match self {
            Tier::Large => "Large",
            Tier::Medium => "Medium",
            Tier::Small => "Small",
            Tier::VerySmall => "Very Small",
        }
    }

    /// Upper bound on the number of encodes a search at this tier can run.
    pub fn max_iterations(self) -> usize {
        let initial = self.preset().initial_quality.percent();
        usize::from((initial - QUALITY_FLOOR.percent()) / QUALITY_STEP) + 1
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string does not name a tier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown compression tier: {0:?}")]
pub struct ParseTierError(pub String);

impl FromStr for Tier {
    type Err = ParseTierError;

    /// Accepts `very small`, `very_small`, `very-small` and `verysmall` for the
    /// smallest tier, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "large" => Ok(Tier::Large),
            "medium" => Ok(Tier::Medium),
            "small" => Ok(Tier::Small),
            "verysmall" => Ok(Tier::VerySmall),
            _ => Err(ParseTierError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_presets() {
        assert_eq!(Tier::Large.preset().initial_quality, Quality::from_percent(90));
        assert_eq!(Tier::Large.preset().size_ceiling, 1_048_576);
        assert_eq!(Tier::Medium.preset().initial_quality, Quality::from_percent(80));
        assert_eq!(Tier::Medium.preset().size_ceiling, 512_000);
        assert_eq!(Tier::Small.preset().initial_quality, Quality::from_percent(60));
        assert_eq!(Tier::Small.preset().size_ceiling, 256_000);
        assert_eq!(Tier::VerySmall.preset().initial_quality, Quality::from_percent(40));
        assert_eq!(Tier::VerySmall.preset().size_ceiling, 128_000);
    }

    #[test]
    fn test_default_tier_is_medium() {
        assert_eq!(Tier::default(), Tier::Medium);
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(Tier::Large.label(), "large");
        assert_eq!(Tier::VerySmall.label(), "verysmall");
        assert_eq!(Tier::VerySmall.to_string(), "verysmall");
    }

    #[test]
    fn test_tier_parse_variants() {
        assert_eq!("large".parse::<Tier>(), Ok(Tier::Large));
        assert_eq!("Medium".parse::<Tier>(), Ok(Tier::Medium));
        assert_eq!("very small".parse::<Tier>(), Ok(Tier::VerySmall));
        assert_eq!("very_small".parse::<Tier>(), Ok(Tier::VerySmall));
        assert_eq!("Very-Small".parse::<Tier>(), Ok(Tier::VerySmall));
        assert_eq!("verysmall".parse::<Tier>(), Ok(Tier::VerySmall));
        assert!("tiny".parse::<Tier>().is_err());
        assert!("".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_serde_snake_case() {
        let json = serde_json::to_string(&Tier::VerySmall).unwrap();
        assert_eq!(json, "\"very_small\"");
        let tier: Tier = serde_json::from_str("\"small\"").unwrap();
        assert_eq!(tier, Tier::Small);
    }

    #[test]
    fn test_max_iterations() {
        // 0.90 -> 0.10 in 0.05 steps is 17 encodes
        assert_eq!(Tier::Large.max_iterations(), 17);
        assert_eq!(Tier::Medium.max_iterations(), 15);
        assert_eq!(Tier::Small.max_iterations(), 11);
        assert_eq!(Tier::VerySmall.max_iterations(), 7);
    }

    #[test]
    fn test_quality_step_lands_on_floor() {
        let mut quality = Tier::VerySmall.preset().initial_quality;
        let mut steps = 0;
        while !quality.is_at_floor() {
            quality = quality.step_down();
            steps += 1;
        }
        assert_eq!(quality, QUALITY_FLOOR);
        assert_eq!(steps, 6);
    }

    #[test]
    fn test_quality_fraction_conversion() {
        assert_eq!(Quality::from_fraction(0.9).percent(), 90);
        assert_eq!(Quality::from_fraction(0.05).percent(), 5);
        assert_eq!(Quality::from_fraction(0.0).percent(), 1);
        assert_eq!(Quality::from_fraction(2.0).percent(), 100);
        assert!((Quality::from_percent(35).as_fraction() - 0.35).abs() < f32::EPSILON);
        assert_eq!(Quality::from_percent(35).to_string(), "0.35");
    }

    #[test]
    fn test_quality_clamps_percent() {
        assert_eq!(Quality::from_percent(0).percent(), 1);
        assert_eq!(Quality::from_percent(250).percent(), 100);
        assert_eq!(Quality::from_percent(3).step_down().percent(), 1);
    }
}
