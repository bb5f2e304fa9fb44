//! Hand-authored zodiac compatibility table.
//!
//! Entries are keyed by ordered pair: `(Aries, Leo)` and `(Leo, Aries)` are
//! written independently and are never derived from each other.

use crate::error::{Error, Result};
use crate::zodiac::Sign;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BUNDLED_TABLE: &str = include_str!("data/compatibility.json");

static BUILTIN: OnceCell<CompatibilityTable> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityEntry {
    pub score: u8,
    /// Element pairing as displayed, e.g. `"Fire + Fire"`.
    pub element: String,
    #[serde(default)]
    pub aspect: Option<String>,
    pub summary: String,
    pub love: LoveNotes,
    pub compatibility: Ratings,
    pub advice: String,
    pub date_ideas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoveNotes {
    pub strengths: Vec<String>,
    pub challenges: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub emotional: u8,
    pub physical: u8,
    pub intellectual: u8,
    pub overall: u8,
}

#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    entries: BTreeMap<(Sign, Sign), CompatibilityEntry>,
}

impl CompatibilityTable {
    pub fn builtin() -> Result<&'static CompatibilityTable> {
        BUILTIN.get_or_try_init(|| Self::from_json(BUNDLED_TABLE))
    }

    /// Parses a `{ signA: { signB: entry } }` document and checks that all
    /// 144 ordered pairs are present with ratings in 1..=10.
    pub fn from_json(raw: &str) -> Result<Self> {
        let nested: BTreeMap<String, BTreeMap<String, CompatibilityEntry>> = serde_json::from_str(raw)?;
        let mut entries = BTreeMap::new();
        for (from, row) in nested {
            let from: Sign = from.parse().map_err(|err| data_error(format!("{err}")))?;
            for (to, entry) in row {
                let to: Sign = to.parse().map_err(|err| data_error(format!("{err}")))?;
                validate_entry(from, to, &entry)?;
                entries.insert((from, to), entry);
            }
        }

        for from in Sign::ALL {
            for to in Sign::ALL {
                if !entries.contains_key(&(from, to)) {
                    return Err(data_error(format!("missing compatibility entry {from} -> {to}")));
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn get(&self, from: Sign, to: Sign) -> Option<&CompatibilityEntry> {
        self.entries.get(&(from, to))
    }

    pub fn lookup(&self, from: &str, to: &str) -> Option<&CompatibilityEntry> {
        let from: Sign = from.parse().ok()?;
        let to: Sign = to.parse().ok()?;
        self.get(from, to)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (Sign, Sign, &CompatibilityEntry)> {
        self.entries
            .iter()
            .map(|((from, to), entry)| (*from, *to, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Case-insensitive lookup in the bundled table. Unknown sign names yield `None`.
pub fn get_compatibility(sign_a: &str, sign_b: &str) -> Option<&'static CompatibilityEntry> {
    match CompatibilityTable::builtin() {
        Ok(table) => table.lookup(sign_a, sign_b),
        Err(err) => {
            tracing::error!(error = %err, "bundled compatibility table failed to load");
            None
        }
    }
}

fn validate_entry(from: Sign, to: Sign, entry: &CompatibilityEntry) -> Result<()> {
    let ratings = [
        ("score", entry.score),
        ("emotional", entry.compatibility.emotional),
        ("physical", entry.compatibility.physical),
        ("intellectual", entry.compatibility.intellectual),
        ("overall", entry.compatibility.overall),
    ];
    for (field, value) in ratings {
        if !(1..=10).contains(&value) {
            return Err(data_error(format!(
                "{from} -> {to}: {field} {value} is outside 1..=10"
            )));
        }
    }
    Ok(())
}

fn data_error(message: String) -> Error {
    Error::Data { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_table_is_complete() {
        let table = CompatibilityTable::builtin().unwrap();
        assert_eq!(table.len(), 144);
        for from in Sign::ALL {
            for to in Sign::ALL {
                let entry = table.get(from, to).unwrap();
                for value in [
                    entry.score,
                    entry.compatibility.emotional,
                    entry.compatibility.physical,
                    entry.compatibility.intellectual,
                    entry.compatibility.overall,
                ] {
                    assert!((1..=10).contains(&value), "{from} -> {to}");
                }
                assert!(!entry.summary.is_empty());
                assert!(!entry.date_ideas.is_empty());
            }
        }
    }

    #[test]
    fn aries_and_leo_are_addressed_by_ordered_pair() {
        let forward = get_compatibility("aries", "leo").unwrap();
        assert_eq!(forward.score, 9);
        assert_eq!(forward.element, "Fire + Fire");

        let reverse = get_compatibility("LEO", " Aries ").unwrap();
        assert_eq!(reverse.score, 9);
        assert!(!std::ptr::eq(forward, reverse));
        assert_ne!(forward.summary, reverse.summary);
    }

    #[test]
    fn reverse_entries_may_differ() {
        let table = CompatibilityTable::builtin().unwrap();
        let asymmetric = table
            .pairs()
            .filter(|(from, to, entry)| table.get(*to, *from).unwrap().score != entry.score)
            .count();
        assert!(asymmetric > 0);
    }

    #[test]
    fn unknown_sign_is_not_found() {
        assert!(get_compatibility("aries", "ophiuchus").is_none());
        assert!(get_compatibility("", "leo").is_none());
    }

    #[test]
    fn rejects_incomplete_or_out_of_range_tables() {
        let one = r#"{"aries": {"leo": {"score": 9, "element": "Fire + Fire", "summary": "s",
            "love": {"strengths": [], "challenges": []},
            "compatibility": {"emotional": 9, "physical": 9, "intellectual": 9, "overall": 9},
            "advice": "a", "dateIdeas": []}}}"#;
        assert!(matches!(CompatibilityTable::from_json(one), Err(Error::Data { .. })));

        let bad = one.replace("\"score\": 9", "\"score\": 11");
        let err = CompatibilityTable::from_json(&bad).unwrap_err();
        assert!(err.to_string().contains("outside 1..=10"));
    }
}
