//! Western natal and transit chart facts.
//!
//! Positions come from an external ephemeris provider; this module holds the
//! typed shapes plus the small geometric helpers the extractors need.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::element::Element;
use crate::error::{EngineError, Result};

// ---------------------------
// ## Enumerations
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CelestialBody {
    Sun = 0,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl CelestialBody {
    pub const ALL: [CelestialBody; 10] = [
        CelestialBody::Sun,
        CelestialBody::Moon,
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Mars,
        CelestialBody::Jupiter,
        CelestialBody::Saturn,
        CelestialBody::Uranus,
        CelestialBody::Neptune,
        CelestialBody::Pluto,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_malefic(self) -> bool {
        matches!(
            self,
            CelestialBody::Mars
                | CelestialBody::Saturn
                | CelestialBody::Uranus
                | CelestialBody::Pluto
        )
    }
}

impl FromStr for CelestialBody {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let body = match s.trim().to_lowercase().as_str() {
            "sun" => CelestialBody::Sun,
            "moon" => CelestialBody::Moon,
            "mercury" => CelestialBody::Mercury,
            "venus" => CelestialBody::Venus,
            "mars" => CelestialBody::Mars,
            "jupiter" => CelestialBody::Jupiter,
            "saturn" => CelestialBody::Saturn,
            "uranus" => CelestialBody::Uranus,
            "neptune" => CelestialBody::Neptune,
            "pluto" => CelestialBody::Pluto,
            _ => return Err(EngineError::unknown("planet", s)),
        };
        Ok(body)
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CelestialBody::Sun => "sun",
            CelestialBody::Moon => "moon",
            CelestialBody::Mercury => "mercury",
            CelestialBody::Venus => "venus",
            CelestialBody::Mars => "mars",
            CelestialBody::Jupiter => "jupiter",
            CelestialBody::Saturn => "saturn",
            CelestialBody::Uranus => "uranus",
            CelestialBody::Neptune => "neptune",
            CelestialBody::Pluto => "pluto",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum House {
    First = 1,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Eighth,
    Ninth,
    Tenth,
    Eleventh,
    Twelfth,
}

impl House {
    pub fn from_index(index: usize) -> Option<House> {
        match index {
            1 => Some(House::First),
            2 => Some(House::Second),
            3 => Some(House::Third),
            4 => Some(House::Fourth),
            5 => Some(House::Fifth),
            6 => Some(House::Sixth),
            7 => Some(House::Seventh),
            8 => Some(House::Eighth),
            9 => Some(House::Ninth),
            10 => Some(House::Tenth),
            11 => Some(House::Eleventh),
            12 => Some(House::Twelfth),
            _ => None,
        }
    }

    pub fn number(self) -> usize {
        self as usize
    }

    pub fn all() -> impl Iterator<Item = House> {
        (1..=12).filter_map(House::from_index)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZodiacSign {
    Aries = 0,
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

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn from_longitude(longitude: f64) -> Self {
        let normalized_longitude = longitude.rem_euclid(360.0);
        let sign_index = (normalized_longitude / 30.0).floor() as usize;
        ZodiacSign::ALL[sign_index.min(11)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Five-element reading of the sign's triplicity; air signs read as wood.
    pub fn element(self) -> Element {
        match self.index() % 4 {
            0 => Element::Fire,
            1 => Element::Earth,
            2 => Element::Wood,
            _ => Element::Water,
        }
    }
}

impl FromStr for ZodiacSign {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        ZodiacSign::ALL
            .iter()
            .copied()
            .find(|sign| sign.to_string().to_lowercase() == lowered)
            .ok_or_else(|| EngineError::unknown("zodiac sign", s))
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign_str = match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        };
        write!(f, "{}", sign_str)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl Aspect {
    pub const ALL: [Aspect; 5] = [
        Aspect::Conjunction,
        Aspect::Sextile,
        Aspect::Square,
        Aspect::Trine,
        Aspect::Opposition,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn angle(self) -> f64 {
        match self {
            Aspect::Conjunction => 0.0,
            Aspect::Sextile => 60.0,
            Aspect::Square => 90.0,
            Aspect::Trine => 120.0,
            Aspect::Opposition => 180.0,
        }
    }

    pub fn is_harmonious(self) -> bool {
        matches!(self, Aspect::Sextile | Aspect::Trine)
    }

    pub fn is_tense(self) -> bool {
        matches!(self, Aspect::Square | Aspect::Opposition)
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Aspect::Conjunction => "conjunction",
            Aspect::Sextile => "sextile",
            Aspect::Square => "square",
            Aspect::Trine => "trine",
            Aspect::Opposition => "opposition",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LunarPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl LunarPhase {
    /// Phase from the Moon's elongation east of the Sun, in eight 45° sectors
    /// centered on the principal phases.
    pub fn from_longitudes(sun_longitude: f64, moon_longitude: f64) -> LunarPhase {
        let elongation = (moon_longitude - sun_longitude).rem_euclid(360.0);
        let sector = ((elongation + 22.5) / 45.0).floor() as usize % 8;
        match sector {
            0 => LunarPhase::NewMoon,
            1 => LunarPhase::WaxingCrescent,
            2 => LunarPhase::FirstQuarter,
            3 => LunarPhase::WaxingGibbous,
            4 => LunarPhase::FullMoon,
            5 => LunarPhase::WaningGibbous,
            6 => LunarPhase::LastQuarter,
            _ => LunarPhase::WaningCrescent,
        }
    }
}

impl fmt::Display for LunarPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LunarPhase::NewMoon => "new_moon",
            LunarPhase::WaxingCrescent => "waxing_crescent",
            LunarPhase::FirstQuarter => "first_quarter",
            LunarPhase::WaxingGibbous => "waxing_gibbous",
            LunarPhase::FullMoon => "full_moon",
            LunarPhase::WaningGibbous => "waning_gibbous",
            LunarPhase::LastQuarter => "last_quarter",
            LunarPhase::WaningCrescent => "waning_crescent",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------
// ## Structures
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub planet: CelestialBody,
    pub longitude: f64,
    pub sign: ZodiacSign,
    pub house: House,
    #[serde(default)]
    pub retrograde: bool,
}

impl PlanetPosition {
    pub fn new(planet: CelestialBody, longitude: f64, house: House) -> Self {
        PlanetPosition {
            planet,
            longitude,
            sign: ZodiacSign::from_longitude(longitude),
            house,
            retrograde: false,
        }
    }
}

/// `planet1` is the moving (transiting) body, `planet2` the natal point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectInfo {
    pub aspect: Aspect,
    pub planet1: CelestialBody,
    pub planet2: CelestialBody,
    pub orb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalChart {
    pub ascendant: ZodiacSign,
    pub planets: Vec<PlanetPosition>,
    #[serde(default)]
    pub aspects: Vec<AspectInfo>,
}

impl NatalChart {
    pub fn planet(&self, body: CelestialBody) -> Option<&PlanetPosition> {
        self.planets.iter().find(|p| p.planet == body)
    }

    pub fn planets_in(&self, house: House) -> impl Iterator<Item = &PlanetPosition> + '_ {
        self.planets.iter().filter(move |p| p.house == house)
    }

    /// Rejects charts whose aspects reference a body with no position.
    pub fn check_consistency(&self) -> Result<()> {
        for aspect in &self.aspects {
            for body in [aspect.planet1, aspect.planet2] {
                if self.planet(body).is_none() {
                    return Err(EngineError::InconsistentChart(format!(
                        "aspect {} {} {} references {} with no position",
                        aspect.planet1, aspect.aspect, aspect.planet2, body
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------
// ## Geometry Helpers
// ---------------------------

/// Smallest angular separation between two longitudes, in `[0, 180]`.
pub fn separation(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Aspects formed by each transiting body to each natal body, tightest aspect
/// per pair, with the true orb.
pub fn detect_aspects(
    transits: &[PlanetPosition],
    natal: &[PlanetPosition],
    max_orb: f64,
) -> Vec<AspectInfo> {
    let mut aspects = Vec::new();

    for moving in transits {
        for fixed in natal {
            let angle = separation(moving.longitude, fixed.longitude);
            let tightest = Aspect::ALL
                .iter()
                .map(|a| (*a, (angle - a.angle()).abs()))
                .filter(|(_, orb)| *orb <= max_orb)
                .min_by(|x, y| x.1.total_cmp(&y.1));

            if let Some((aspect, orb)) = tightest {
                aspects.push(AspectInfo {
                    aspect,
                    planet1: moving.planet,
                    planet2: fixed.planet,
                    orb,
                });
            }
        }
    }

    aspects
}

/// Signed days from `date` to the nearest birthday: negative before, positive after.
/// A Feb 29 birthday is kept on Feb 28 in common years.
pub fn birthday_offset(birth: NaiveDate, date: NaiveDate) -> i64 {
    let anniversary = |year: i32| {
        NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, birth.month(), birth.day() - 1))
    };

    [date.year() - 1, date.year(), date.year() + 1]
        .into_iter()
        .filter_map(anniversary)
        .map(|b| (date - b).num_days())
        .min_by_key(|d| d.abs())
        .unwrap_or(0)
}
