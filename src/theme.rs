use crate::error::{Error, Result};
use crate::gradient::{is_css_color, parse_css_gradient};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SCHEME: &str = "cosmic-blue";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScheme {
    pub name: String,
    /// CSS gradient, e.g. `linear-gradient(135deg, #0f172a 0%, #1e3a8a 100%)`.
    pub bg_gradient: String,
    pub text_color: String,
    pub accent_color: String,
}

impl ColorScheme {
    pub fn new(name: &str, bg_gradient: &str, text_color: &str, accent_color: &str) -> Self {
        Self {
            name: name.to_string(),
            bg_gradient: bg_gradient.to_string(),
            text_color: text_color.to_string(),
            accent_color: accent_color.to_string(),
        }
    }

    pub fn validate(&self, key: &str) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config(format!("scheme `{key}` has an empty name")));
        }
        for (field, value) in [("textColor", &self.text_color), ("accentColor", &self.accent_color)] {
            if !is_css_color(value.trim()) {
                return Err(Error::config(format!(
                    "scheme `{key}` has an invalid {field} `{value}`"
                )));
            }
        }
        parse_css_gradient(&self.bg_gradient).map_err(|err| {
            Error::config(format!("scheme `{key}` has an invalid background: {err}"))
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Standard,
    Premium,
}

pub fn standard_schemes() -> Vec<(&'static str, ColorScheme)> {
    vec![
        (
            "cosmic-blue",
            ColorScheme::new(
                "Cosmic Blue",
                "linear-gradient(135deg, #0f172a 0%, #1e3a8a 50%, #312e81 100%)",
                "#F8FAFC",
                "#60A5FA",
            ),
        ),
        (
            "mystic-purple",
            ColorScheme::new(
                "Mystic Purple",
                "linear-gradient(135deg, #2e1065 0%, #581c87 50%, #7e22ce 100%)",
                "#FAF5FF",
                "#C084FC",
            ),
        ),
        (
            "sunset-orange",
            ColorScheme::new(
                "Sunset Orange",
                "linear-gradient(160deg, #7c2d12 0%, #c2410c 55%, #f59e0b 100%)",
                "#FFF7ED",
                "#FDBA74",
            ),
        ),
        (
            "forest-green",
            ColorScheme::new(
                "Forest Green",
                "linear-gradient(135deg, #052e16 0%, #14532d 50%, #166534 100%)",
                "#F0FDF4",
                "#86EFAC",
            ),
        ),
        (
            "rose-quartz",
            ColorScheme::new(
                "Rose Quartz",
                "linear-gradient(135deg, #fdf2f8 0%, #fbcfe8 60%, #f9a8d4 100%)",
                "#831843",
                "#DB2777",
            ),
        ),
        (
            "midnight-black",
            ColorScheme::new(
                "Midnight Black",
                "linear-gradient(180deg, #000000 0%, #111827 100%)",
                "#E5E7EB",
                "#9CA3AF",
            ),
        ),
    ]
}

pub fn premium_schemes() -> Vec<(&'static str, ColorScheme)> {
    vec![
        (
            "celestial-gold",
            ColorScheme::new(
                "Celestial Gold",
                "linear-gradient(135deg, #1c1917 0%, #292524 40%, #78350f 100%)",
                "#FDE68A",
                "#F59E0B",
            ),
        ),
        (
            "aurora-borealis",
            ColorScheme::new(
                "Aurora Borealis",
                "linear-gradient(135deg, #042f2e 0%, #115e59 35%, #4c1d95 100%)",
                "#ECFEFF",
                "#5EEAD4",
            ),
        ),
        (
            "nebula-pink",
            ColorScheme::new(
                "Nebula Pink",
                "linear-gradient(135deg, #3b0764 0%, #86198f 50%, #db2777 100%)",
                "#FDF4FF",
                "#F0ABFC",
            ),
        ),
        (
            "emerald-night",
            ColorScheme::new(
                "Emerald Night",
                "linear-gradient(180deg, #022c22 0%, #064e3b 60%, #0f172a 100%)",
                "#D1FAE5",
                "#34D399",
            ),
        ),
        (
            "crimson-eclipse",
            ColorScheme::new(
                "Crimson Eclipse",
                "linear-gradient(135deg, #0c0a09 0%, #450a0a 50%, #991b1b 100%)",
                "#FEE2E2",
                "#F87171",
            ),
        ),
        (
            "silver-moon",
            ColorScheme::new(
                "Silver Moon",
                "linear-gradient(135deg, #f8fafc 0%, #cbd5e1 60%, #94a3b8 100%)",
                "#0F172A",
                "#475569",
            ),
        ),
    ]
}

/// Merged lookup over the standard and premium schemes.
///
/// Keys are case-insensitive. When both tiers define a key the premium scheme
/// wins, and adding a standard scheme never shadows a premium one.
#[derive(Debug, Clone, Default)]
pub struct SchemeRegistry {
    standard: BTreeMap<String, ColorScheme>,
    premium: BTreeMap<String, ColorScheme>,
}

impl SchemeRegistry {
    pub fn builtin() -> Self {
        Self::merge(standard_schemes(), premium_schemes())
    }

    pub fn merge<K: AsRef<str>>(
        standard: impl IntoIterator<Item = (K, ColorScheme)>,
        premium: impl IntoIterator<Item = (K, ColorScheme)>,
    ) -> Self {
        Self {
            standard: standard
                .into_iter()
                .map(|(key, scheme)| (normalize_key(key.as_ref()), scheme))
                .collect(),
            premium: premium
                .into_iter()
                .map(|(key, scheme)| (normalize_key(key.as_ref()), scheme))
                .collect(),
        }
    }

    pub fn insert_standard(&mut self, key: &str, scheme: ColorScheme) {
        self.standard.insert(normalize_key(key), scheme);
    }

    pub fn get(&self, key: &str) -> Result<&ColorScheme> {
        let normalized = normalize_key(key);
        self.premium
            .get(&normalized)
            .or_else(|| self.standard.get(&normalized))
            .ok_or_else(|| Error::SchemeNotFound {
                key: key.to_string(),
            })
    }

    pub fn tier(&self, key: &str) -> Option<Tier> {
        let normalized = normalize_key(key);
        if self.premium.contains_key(&normalized) {
            Some(Tier::Premium)
        } else if self.standard.contains_key(&normalized) {
            Some(Tier::Standard)
        } else {
            None
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tier(key).is_some()
    }

    /// Resolved schemes in key order. Shadowed standard entries are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Tier, &ColorScheme)> {
        let mut merged: BTreeMap<&str, (Tier, &ColorScheme)> = BTreeMap::new();
        for (key, scheme) in &self.standard {
            merged.insert(key.as_str(), (Tier::Standard, scheme));
        }
        for (key, scheme) in &self.premium {
            merged.insert(key.as_str(), (Tier::Premium, scheme));
        }
        merged
            .into_iter()
            .map(|(key, (tier, scheme))| (key, tier, scheme))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.standard.is_empty() && self.premium.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        for (key, _, scheme) in self.iter() {
            scheme.validate(key)?;
        }
        Ok(())
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_resolves_both_tiers() {
        let registry = SchemeRegistry::builtin();
        assert_eq!(registry.get("cosmic-blue").unwrap().name, "Cosmic Blue");
        assert_eq!(registry.tier("cosmic-blue"), Some(Tier::Standard));
        assert_eq!(registry.tier("celestial-gold"), Some(Tier::Premium));
        assert_eq!(registry.len(), 12);
        registry.validate().unwrap();
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let registry = SchemeRegistry::builtin();
        assert!(registry.get("  Cosmic-Blue ").is_ok());
    }

    #[test]
    fn unknown_key_is_an_explicit_error() {
        let registry = SchemeRegistry::builtin();
        let err = registry.get("plaid").unwrap_err();
        assert!(matches!(err, Error::SchemeNotFound { ref key } if key == "plaid"));
    }

    #[test]
    fn premium_wins_on_collision() {
        let standard = ColorScheme::new("Plain", "linear-gradient(#000, #111)", "#fff", "#aaa");
        let premium = ColorScheme::new("Fancy", "linear-gradient(#222, #333)", "#ffd", "#fa0");
        let mut registry =
            SchemeRegistry::merge([("shared", standard.clone())], [("shared", premium.clone())]);
        assert_eq!(registry.get("shared").unwrap(), &premium);
        assert_eq!(registry.tier("shared"), Some(Tier::Premium));

        registry.insert_standard("shared", standard);
        assert_eq!(registry.get("shared").unwrap(), &premium);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn validation_rejects_bad_gradient() {
        let bad = ColorScheme::new("Broken", "blue", "#fff", "#000");
        let registry = SchemeRegistry::merge([("broken", bad)], Vec::new());
        assert!(matches!(registry.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn validation_rejects_markup_in_colors() {
        let bad = ColorScheme::new(
            "Injected",
            "linear-gradient(#000, #111)",
            "#fff\" onload=\"x",
            "#000",
        );
        let err = bad.validate("injected").unwrap_err();
        assert!(err.to_string().contains("textColor"));

        let bad_accent = ColorScheme::new("Odd", "linear-gradient(#000, #111)", "#fff", "rgb(1,\"2,3)");
        assert!(bad_accent.validate("odd").is_err());
    }
}
