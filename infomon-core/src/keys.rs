//! Fact key schema and value domain.
//!
//! Keys are lowercase dot-delimited paths (`stat.logic.bonus`,
//! `currency.silver`, `cman.krynch`). A current value and its bonus are always
//! sibling keys. Values are either integers or strings; booleans are stored
//! as `0`/`1`.

use std::fmt;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Sentinel stored for "no society" / "no citizenship".
pub const NONE_SENTINEL: &str = "None";

/// A single fact value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    /// Signed integer (also booleans as 0/1).
    Int(i64),
    /// Free text.
    Text(String),
}

impl FactValue {
    /// The integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// The text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Text(s) => Some(s),
        }
    }

    /// Interpret a boolean-as-integer fact.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_int().map(|n| n != 0)
    }

    /// Whether this is the integer zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Int(0))
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for FactValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for FactValue {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<bool> for FactValue {
    fn from(b: bool) -> Self {
        Self::Int(i64::from(b))
    }
}

impl From<&str> for FactValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FactValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl ToSql for FactValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Int(n) => ToSqlOutput::from(*n),
            Self::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl FromSql for FactValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(n) => Ok(Self::Int(n)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| Self::Text(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

// ---------------------------------------------------------------------------
// Key validation & builders
// ---------------------------------------------------------------------------

/// Whether `key` follows the `segment(.segment)*` schema with
/// `[a-z0-9_]` segments.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        })
}

/// Normalise free text into a single key segment.
///
/// Lowercases, drops apostrophes, and collapses every other run of
/// non-alphanumeric characters into one `_`.
#[must_use]
pub fn segment(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars() {
        if c == '\'' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// `stat.<name>`
#[must_use]
pub fn stat(name: &str) -> String {
    format!("stat.{}", segment(name))
}

/// `stat.<name>.bonus`
#[must_use]
pub fn stat_bonus(name: &str) -> String {
    format!("stat.{}.bonus", segment(name))
}

/// `stat.<name>.enhanced`
#[must_use]
pub fn stat_enhanced(name: &str) -> String {
    format!("stat.{}.enhanced", segment(name))
}

/// `stat.<name>.enhanced.bonus`
#[must_use]
pub fn stat_enhanced_bonus(name: &str) -> String {
    format!("stat.{}.enhanced.bonus", segment(name))
}

/// `skill.<name>` (ranks)
#[must_use]
pub fn skill(name: &str) -> String {
    format!("skill.{}", segment(name))
}

/// `skill.<name>.bonus`
#[must_use]
pub fn skill_bonus(name: &str) -> String {
    format!("skill.{}.bonus", segment(name))
}

/// `experience.<field>`
#[must_use]
pub fn experience(field: &str) -> String {
    format!("experience.{field}")
}

/// `resources.<field>`
#[must_use]
pub fn resources(field: &str) -> String {
    format!("resources.{field}")
}

/// `currency.<kind>`
#[must_use]
pub fn currency(kind: &str) -> String {
    format!("currency.{}", segment(kind))
}

/// `warcry.<short>`
#[must_use]
pub fn warcry(short: &str) -> String {
    format!("warcry.{}", segment(short))
}

/// `status.<flag>`
#[must_use]
pub fn status(flag: &str) -> String {
    format!("status.{flag}")
}

/// Key holding the citizenship town.
pub const CITIZENSHIP: &str = "citizenship";
/// Key holding the society name.
pub const SOCIETY_STATUS: &str = "society.status";
/// Key holding the society rank/step.
pub const SOCIETY_RANK: &str = "society.rank";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(is_valid_key("stat.strength.bonus"));
        assert!(is_valid_key("currency.silver_container"));
        assert!(is_valid_key("citizenship"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("stat..bonus"));
        assert!(!is_valid_key("Stat.strength"));
        assert!(!is_valid_key("stat.strength."));
        assert!(!is_valid_key("currency.ethereal scrip"));
    }

    #[test]
    fn segments_are_normalised() {
        assert_eq!(segment("Strength"), "strength");
        assert_eq!(segment("ethereal scrip"), "ethereal_scrip");
        assert_eq!(segment("Predator's Eye"), "predators_eye");
        assert_eq!(segment("  Spiritual Lore - Blessings "), "spiritual_lore_blessings");
    }

    #[test]
    fn bonus_is_a_sibling_key() {
        assert_eq!(stat("Logic"), "stat.logic");
        assert_eq!(stat_bonus("Logic"), "stat.logic.bonus");
        assert_eq!(stat_enhanced("Logic"), "stat.logic.enhanced");
        assert_eq!(stat_enhanced_bonus("Logic"), "stat.logic.enhanced.bonus");
    }

    #[test]
    fn display_quotes_text_only() {
        assert_eq!(FactValue::from(12).to_string(), "12");
        assert_eq!(FactValue::from("None").to_string(), "\"None\"");
        assert_eq!(FactValue::from(true), FactValue::Int(1));
    }

    #[test]
    fn serde_is_untagged() {
        let json = serde_json::to_string(&vec![FactValue::Int(3), FactValue::from("x")])
            .expect("serialize");
        assert_eq!(json, r#"[3,"x"]"#);
    }
}
