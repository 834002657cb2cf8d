//! Factor extraction.
//!
//! Extractors are pure functions from chart facts to small named signed
//! contributions ([`RawFactor`]), one family per scoring table. Absent facts
//! contribute nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod astro;
pub mod saju;

pub use self::astro::{astro_factors, AstroDayFacts};
pub use self::saju::{saju_factors, CycleFacts, IljinFacts, SajuDayFacts, SeunFacts, YongsinFacts};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Saju,
    Astro,
}

/// One scoring table. Five per side; each side's maxima sum to 50.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Daeun,
    Seun,
    Wolun,
    Iljin,
    Yongsin,
    TransitSun,
    TransitMoon,
    MajorPlanets,
    LunarPhase,
    SolarReturn,
}

impl Category {
    pub const SAJU: [Category; 5] = [
        Category::Daeun,
        Category::Seun,
        Category::Wolun,
        Category::Iljin,
        Category::Yongsin,
    ];

    pub const ASTRO: [Category; 5] = [
        Category::TransitSun,
        Category::TransitMoon,
        Category::MajorPlanets,
        Category::LunarPhase,
        Category::SolarReturn,
    ];

    pub const ALL: [Category; 10] = [
        Category::Daeun,
        Category::Seun,
        Category::Wolun,
        Category::Iljin,
        Category::Yongsin,
        Category::TransitSun,
        Category::TransitMoon,
        Category::MajorPlanets,
        Category::LunarPhase,
        Category::SolarReturn,
    ];

    pub fn domain(self) -> Domain {
        if Category::SAJU.contains(&self) {
            Domain::Saju
        } else {
            Domain::Astro
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Category::Daeun => "daeun",
            Category::Seun => "seun",
            Category::Wolun => "wolun",
            Category::Iljin => "iljin",
            Category::Yongsin => "yongsin",
            Category::TransitSun => "transit_sun",
            Category::TransitMoon => "transit_moon",
            Category::MajorPlanets => "major_planets",
            Category::LunarPhase => "lunar_phase",
            Category::SolarReturn => "solar_return",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    Positive,
    Negative,
    Neutral,
}

/// A single named contribution, e.g. `iljin.day_star.nobleman_day = +5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFactor {
    pub key: String,
    pub domain: Domain,
    pub category: Category,
    pub sign: Sign,
    pub magnitude: f64,
}

impl RawFactor {
    pub fn new(category: Category, key: impl Into<String>, value: f64) -> Self {
        let sign = if value > 0.0 {
            Sign::Positive
        } else if value < 0.0 {
            Sign::Negative
        } else {
            Sign::Neutral
        };
        RawFactor {
            key: key.into(),
            domain: category.domain(),
            category,
            sign,
            magnitude: value.abs(),
        }
    }

    /// Signed value.
    pub fn value(&self) -> f64 {
        match self.sign {
            Sign::Positive => self.magnitude,
            Sign::Negative => -self.magnitude,
            Sign::Neutral => 0.0,
        }
    }
}

/// Normalized score of one category together with the factors behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub raw: f64,
    pub normalized: f64,
    pub factor_keys: Vec<String>,
}

/// Signed values of the factors filed under `category`, in extraction order.
pub fn category_values(factors: &[RawFactor], category: Category) -> Vec<f64> {
    factors
        .iter()
        .filter(|f| f.category == category)
        .map(RawFactor::value)
        .collect()
}
