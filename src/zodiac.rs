use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

impl Sign {
    /// Zodiac order, starting at the spring equinox.
    pub const ALL: [Sign; 12] = [
        Sign::Aries,
        Sign::Taurus,
        Sign::Gemini,
        Sign::Cancer,
        Sign::Leo,
        Sign::Virgo,
        Sign::Libra,
        Sign::Scorpio,
        Sign::Sagittarius,
        Sign::Capricorn,
        Sign::Aquarius,
        Sign::Pisces,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Sign::Aries => "Aries",
            Sign::Taurus => "Taurus",
            Sign::Gemini => "Gemini",
            Sign::Cancer => "Cancer",
            Sign::Leo => "Leo",
            Sign::Virgo => "Virgo",
            Sign::Libra => "Libra",
            Sign::Scorpio => "Scorpio",
            Sign::Sagittarius => "Sagittarius",
            Sign::Capricorn => "Capricorn",
            Sign::Aquarius => "Aquarius",
            Sign::Pisces => "Pisces",
        }
    }

    pub fn element(self) -> Element {
        match self {
            Sign::Aries | Sign::Leo | Sign::Sagittarius => Element::Fire,
            Sign::Taurus | Sign::Virgo | Sign::Capricorn => Element::Earth,
            Sign::Gemini | Sign::Libra | Sign::Aquarius => Element::Air,
            Sign::Cancer | Sign::Scorpio | Sign::Pisces => Element::Water,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Sign::Aries => "\u{2648}",
            Sign::Taurus => "\u{2649}",
            Sign::Gemini => "\u{264A}",
            Sign::Cancer => "\u{264B}",
            Sign::Leo => "\u{264C}",
            Sign::Virgo => "\u{264D}",
            Sign::Libra => "\u{264E}",
            Sign::Scorpio => "\u{264F}",
            Sign::Sagittarius => "\u{2650}",
            Sign::Capricorn => "\u{2651}",
            Sign::Aquarius => "\u{2652}",
            Sign::Pisces => "\u{2653}",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl Element {
    pub fn name(self) -> &'static str {
        match self {
            Element::Fire => "Fire",
            Element::Earth => "Earth",
            Element::Air => "Air",
            Element::Water => "Water",
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown zodiac sign: {0}")]
pub struct UnknownSign(pub String);

impl FromStr for Sign {
    type Err = UnknownSign;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Sign::ALL
            .into_iter()
            .find(|sign| sign.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownSign(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("aries".parse::<Sign>().unwrap(), Sign::Aries);
        assert_eq!(" SAGITTARIUS ".parse::<Sign>().unwrap(), Sign::Sagittarius);
        assert!("ophiuchus".parse::<Sign>().is_err());
    }

    #[test]
    fn elements_cycle_through_the_zodiac() {
        let elements: Vec<Element> = Sign::ALL.iter().map(|s| s.element()).collect();
        assert_eq!(
            &elements[..4],
            &[Element::Fire, Element::Earth, Element::Air, Element::Water]
        );
        assert_eq!(elements[4..8], elements[..4]);
        assert_eq!(Sign::Pisces.index(), 11);
    }
}
