use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Category, RawFactor};
use crate::astro::{
    birthday_offset, detect_aspects, AspectInfo, CelestialBody, LunarPhase, NatalChart,
    PlanetPosition, ZodiacSign,
};
use crate::config::{
    LunarPhaseConfig, MajorPlanetsConfig, ScoringConfig, SolarReturnConfig, TransitConfig,
};
use crate::element::Element;

/// Astrology half of a day's facts. Any missing part contributes zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AstroDayFacts {
    /// Element of the natal day master the transiting Sun and Moon are read against.
    pub day_master: Option<Element>,
    pub sun_sign: Option<ZodiacSign>,
    pub moon_sign: Option<ZodiacSign>,
    #[serde(default)]
    pub aspects: Vec<AspectInfo>,
    #[serde(default)]
    pub retrograde: Vec<CelestialBody>,
    pub lunar_phase: Option<LunarPhase>,
    /// Signed days to the nearest birthday.
    pub birthday_offset: Option<i64>,
}

impl AstroDayFacts {
    /// Builds the facts from transit positions on `date`.
    pub fn derive(
        day_master: Element,
        natal: &NatalChart,
        transits: &[PlanetPosition],
        birth: NaiveDate,
        date: NaiveDate,
        max_orb: f64,
    ) -> Self {
        let find = |body: CelestialBody| transits.iter().find(|p| p.planet == body);
        let sun = find(CelestialBody::Sun);
        let moon = find(CelestialBody::Moon);

        let lunar_phase = match (sun, moon) {
            (Some(sun), Some(moon)) => {
                Some(LunarPhase::from_longitudes(sun.longitude, moon.longitude))
            }
            _ => None,
        };

        AstroDayFacts {
            day_master: Some(day_master),
            sun_sign: sun.map(|p| p.sign),
            moon_sign: moon.map(|p| p.sign),
            aspects: detect_aspects(transits, &natal.planets, max_orb),
            retrograde: transits
                .iter()
                .filter(|p| p.retrograde)
                .map(|p| p.planet)
                .collect(),
            lunar_phase,
            birthday_offset: Some(birthday_offset(birth, date)),
        }
    }
}

/// Element relation between a transiting luminary's sign and the day master.
pub fn transit_factor(
    category: Category,
    table: &TransitConfig,
    day_master: Element,
    sign: ZodiacSign,
) -> RawFactor {
    let relation = day_master.relation_to(sign.element());
    RawFactor::new(
        category,
        format!("{category}.{sign}.{relation}"),
        table.relations.value(relation),
    )
}

/// Weighted aspect scores plus retrograde penalties.
pub fn major_planet_factors(
    config: &MajorPlanetsConfig,
    aspects: &[AspectInfo],
    retrograde: &[CelestialBody],
) -> Vec<RawFactor> {
    let mut factors = Vec::new();

    for info in aspects {
        // aspects are unordered pairs; the heavier body sets the weight
        let weight = config
            .weights
            .value(info.planet1)
            .max(config.weights.value(info.planet2));
        if info.orb > config.max_orb || weight == 0.0 {
            continue;
        }
        let (first, second) = if info.planet1 <= info.planet2 {
            (info.planet1, info.planet2)
        } else {
            (info.planet2, info.planet1)
        };
        factors.push(RawFactor::new(
            Category::MajorPlanets,
            format!("major_planets.{first}.{}.{second}", info.aspect),
            config.aspects.value(info.aspect) * weight,
        ));
    }

    for body in retrograde {
        let penalty = config.retrograde.value(*body);
        if penalty != 0.0 {
            factors.push(RawFactor::new(
                Category::MajorPlanets,
                format!("major_planets.retrograde.{body}"),
                penalty,
            ));
        }
    }

    factors
}

pub fn lunar_phase_factor(config: &LunarPhaseConfig, phase: LunarPhase) -> RawFactor {
    RawFactor::new(
        Category::LunarPhase,
        format!("lunar_phase.{phase}"),
        config.value(phase),
    )
}

/// Linear decay from `peak` on the birthday to zero at `window_days`.
pub fn solar_return_factor(config: &SolarReturnConfig, offset_days: i64) -> Option<RawFactor> {
    let distance = offset_days.unsigned_abs() as f64;
    if distance >= config.window_days {
        return None;
    }
    Some(RawFactor::new(
        Category::SolarReturn,
        format!("solar_return.offset_{distance}"),
        config.peak * (1.0 - distance / config.window_days),
    ))
}

/// Every astrology-side factor of one day.
pub fn astro_factors(config: &ScoringConfig, facts: &AstroDayFacts) -> Vec<RawFactor> {
    let mut factors = Vec::new();

    if let Some(day_master) = facts.day_master {
        if let Some(sign) = facts.sun_sign {
            factors.push(transit_factor(
                Category::TransitSun,
                &config.transit_sun,
                day_master,
                sign,
            ));
        }
        if let Some(sign) = facts.moon_sign {
            factors.push(transit_factor(
                Category::TransitMoon,
                &config.transit_moon,
                day_master,
                sign,
            ));
        }
    }
    factors.extend(major_planet_factors(
        &config.major_planets,
        &facts.aspects,
        &facts.retrograde,
    ));
    if let Some(phase) = facts.lunar_phase {
        factors.push(lunar_phase_factor(&config.lunar_phase, phase));
    }
    if let Some(offset) = facts.birthday_offset {
        factors.extend(solar_return_factor(&config.solar_return, offset));
    }

    for factor in &factors {
        trace!(key = %factor.key, value = factor.value(), "astro factor");
    }
    factors
}
