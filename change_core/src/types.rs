//! Core types shared by every stage of change resolution

use crate::change::ChangeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bonus type of a change. Decides whether same-typed changes stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusCategory {
    Untyped,
    #[serde(alias = "untypedPerm")]
    UntypedPerm,
    Base,
    Enhancement,
    Dodge,
    Haste,
    Inherent,
    Deflection,
    Morale,
    Luck,
    Sacred,
    Insight,
    Resistance,
    Profane,
    Trait,
    Racial,
    Size,
    Competence,
    Circumstance,
    Alchemical,
    Penalty,
}

impl BonusCategory {
    /// Get all bonus categories
    pub fn all() -> &'static [BonusCategory] {
        use BonusCategory::*;
        &[
            Untyped,
            UntypedPerm,
            Base,
            Enhancement,
            Dodge,
            Haste,
            Inherent,
            Deflection,
            Morale,
            Luck,
            Sacred,
            Insight,
            Resistance,
            Profane,
            Trait,
            Racial,
            Size,
            Competence,
            Circumstance,
            Alchemical,
            Penalty,
        ]
    }

    /// Machine key, as written in rulesets and change sets
    pub fn as_str(&self) -> &'static str {
        use BonusCategory::*;
        match self {
            Untyped => "untyped",
            UntypedPerm => "untyped_perm",
            Base => "base",
            Enhancement => "enhancement",
            Dodge => "dodge",
            Haste => "haste",
            Inherent => "inherent",
            Deflection => "deflection",
            Morale => "morale",
            Luck => "luck",
            Sacred => "sacred",
            Insight => "insight",
            Resistance => "resistance",
            Profane => "profane",
            Trait => "trait",
            Racial => "racial",
            Size => "size",
            Competence => "competence",
            Circumstance => "circumstance",
            Alchemical => "alchemical",
            Penalty => "penalty",
        }
    }

    /// Human-facing label used in breakdowns
    pub fn label(&self) -> &'static str {
        use BonusCategory::*;
        match self {
            Untyped | UntypedPerm => "Untyped",
            Base => "Base",
            Enhancement => "Enhancement",
            Dodge => "Dodge",
            Haste => "Haste",
            Inherent => "Inherent",
            Deflection => "Deflection",
            Morale => "Morale",
            Luck => "Luck",
            Sacred => "Sacred",
            Insight => "Insight",
            Resistance => "Resistance",
            Profane => "Profane",
            Trait => "Trait",
            Racial => "Racial",
            Size => "Size",
            Competence => "Competence",
            Circumstance => "Circumstance",
            Alchemical => "Alchemical",
            Penalty => "Penalty",
        }
    }
}

impl FromStr for BonusCategory {
    type Err = ChangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "untypedPerm" {
            return Ok(BonusCategory::UntypedPerm);
        }
        BonusCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ChangeError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for BonusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a change combines with the running total of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Contributes to the running total, subject to stacking
    Add,
    /// Replaces the running total outright
    Set,
}

impl FromStr for Operator {
    type Err = ChangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" | "+" => Ok(Operator::Add),
            "set" | "=" => Ok(Operator::Set),
            other => Err(ChangeError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Add => f.write_str("add"),
            Operator::Set => f.write_str("set"),
        }
    }
}

/// Stable identifier of a change within a pass
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(pub String);

impl ChangeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChangeId {
    fn from(s: &str) -> Self {
        ChangeId(s.to_string())
    }
}

impl From<String> for ChangeId {
    fn from(s: String) -> Self {
        ChangeId(s)
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in BonusCategory::all() {
            assert_eq!(category.as_str().parse::<BonusCategory>().unwrap(), *category);
        }
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = "awesome".parse::<BonusCategory>().unwrap_err();
        assert!(matches!(err, ChangeError::UnknownCategory(ref c) if c == "awesome"));
    }

    #[test]
    fn test_legacy_untyped_perm_spelling() {
        assert_eq!("untypedPerm".parse::<BonusCategory>().unwrap(), BonusCategory::UntypedPerm);
        let parsed: BonusCategory = serde_json::from_str("\"untypedPerm\"").unwrap();
        assert_eq!(parsed, BonusCategory::UntypedPerm);
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!("add".parse::<Operator>().unwrap(), Operator::Add);
        assert_eq!("=".parse::<Operator>().unwrap(), Operator::Set);
        assert!("mul".parse::<Operator>().is_err());
    }
}
