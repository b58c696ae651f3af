use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned when a condition string is not on the grading ladder
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown card condition: {0}")]
pub struct UnknownCondition(pub String);

/// Card condition grades, best first
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Condition {
    #[default]
    NearMint,
    LightlyPlayed,
    ModeratelyPlayed,
    HeavilyPlayed,
    Damaged,
}

impl Condition {
    /// Returns the marketplace label (e.g., "Near Mint")
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::NearMint => "Near Mint",
            Condition::LightlyPlayed => "Lightly Played",
            Condition::ModeratelyPlayed => "Moderately Played",
            Condition::HeavilyPlayed => "Heavily Played",
            Condition::Damaged => "Damaged",
        }
    }

    /// Returns the Manabox export code (e.g., "near_mint")
    pub fn code(&self) -> &'static str {
        match self {
            Condition::NearMint => "near_mint",
            Condition::LightlyPlayed => "lightly_played",
            Condition::ModeratelyPlayed => "moderately_played",
            Condition::HeavilyPlayed => "heavily_played",
            Condition::Damaged => "damaged",
        }
    }

    /// Position on the ladder, 0 for Near Mint
    pub fn rank(&self) -> u8 {
        match self {
            Condition::NearMint => 0,
            Condition::LightlyPlayed => 1,
            Condition::ModeratelyPlayed => 2,
            Condition::HeavilyPlayed => 3,
            Condition::Damaged => 4,
        }
    }

    /// Number of grades between two conditions
    pub fn distance(&self, other: Condition) -> u8 {
        self.rank().abs_diff(other.rank())
    }

    /// Parse a Manabox code, a marketplace label or a short grade.
    ///
    /// Underscores, hyphens and case are ignored, and a trailing "foil"
    /// word is tolerated so "Near Mint Foil" still parses as Near Mint.
    pub fn parse(s: &str) -> Option<Self> {
        let cleaned = s.trim().to_lowercase().replace(&['_', '-'][..], " ");
        let cleaned = cleaned
            .split_whitespace()
            .filter(|word| *word != "foil")
            .collect::<Vec<_>>()
            .join(" ");

        match cleaned.as_str() {
            "near mint" | "nm" | "mint" | "m" => Some(Condition::NearMint),
            "lightly played" | "lp" | "excellent" | "ex" => Some(Condition::LightlyPlayed),
            "moderately played" | "mp" | "good" | "gd" => Some(Condition::ModeratelyPlayed),
            "heavily played" | "hp" | "played" | "pl" => Some(Condition::HeavilyPlayed),
            "damaged" | "dmg" | "poor" | "po" => Some(Condition::Damaged),
            _ => None,
        }
    }

    /// Returns all grades, best first
    pub fn all() -> &'static [Condition] {
        &[
            Condition::NearMint,
            Condition::LightlyPlayed,
            Condition::ModeratelyPlayed,
            Condition::HeavilyPlayed,
            Condition::Damaged,
        ]
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::parse(s).ok_or_else(|| UnknownCondition(s.to_string()))
    }
}

/// Surface finish of a physical copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Finish {
    #[default]
    Normal,
    Foil,
    Etched,
}

impl Finish {
    /// Parse the Manabox "Foil" column ("normal", "foil", "etched")
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "foil" | "true" | "1" => Finish::Foil,
            "etched" => Finish::Etched,
            _ => Finish::Normal,
        }
    }

    /// Etched copies are listed as foil on the marketplace
    pub fn is_foil(&self) -> bool {
        !matches!(self, Finish::Normal)
    }
}

/// Condition as it appears on a marketplace listing, e.g. "Near Mint Foil"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConditionLabel {
    pub condition: Condition,
    pub foil: bool,
}

impl ConditionLabel {
    pub fn new(condition: Condition, finish: Finish) -> Self {
        Self {
            condition,
            foil: finish.is_foil(),
        }
    }

    /// Build from a Manabox condition code and foil column.
    /// Unknown codes fall back to Near Mint.
    pub fn from_manabox(code: &str, foil: &str) -> Self {
        let condition = Condition::parse(code).unwrap_or_else(|| {
            if !code.trim().is_empty() {
                log::debug!("Unknown condition code '{}', using Near Mint", code);
            }
            Condition::NearMint
        });
        Self::new(condition, Finish::parse(foil))
    }
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.foil {
            write!(f, "{} Foil", self.condition)
        } else {
            f.write_str(self.condition.as_str())
        }
    }
}
