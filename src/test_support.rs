//! Shared fixtures for unit tests.

use crate::astro::{
    Aspect, AspectInfo, CelestialBody, House, NatalChart, PlanetPosition, ZodiacSign,
};
use crate::element::Element;
use crate::fusion::FusionChart;
use crate::saju::{Branch, Geokguk, Pillar, SajuChart, Stem, StrengthState};

/// Byeong-fire day master born in a sin-mi year, hour known.
pub(crate) fn sample_chart() -> SajuChart {
    SajuChart {
        year: Pillar::new(Stem::Sin, Branch::Mi),
        month: Pillar::new(Stem::Gap, Branch::O),
        day: Pillar::new(Stem::Byeong, Branch::In),
        hour: Some(Pillar::new(Stem::Gye, Branch::Sa)),
        yongsin: Some(Element::Water),
        kibsin: Some(Element::Fire),
        pattern: Some(Geokguk::Jeongjae),
        strength: StrengthState::Strong,
    }
}

pub(crate) fn sample_natal() -> NatalChart {
    let at = |planet, longitude, house| PlanetPosition::new(planet, longitude, house);
    NatalChart {
        ascendant: ZodiacSign::Aries,
        planets: vec![
            at(CelestialBody::Sun, 200.0, House::Seventh),
            at(CelestialBody::Moon, 95.0, House::Fourth),
            at(CelestialBody::Mercury, 190.0, House::Seventh),
            at(CelestialBody::Venus, 220.0, House::Eighth),
            at(CelestialBody::Mars, 15.0, House::First),
            at(CelestialBody::Jupiter, 40.0, House::Second),
            at(CelestialBody::Saturn, 280.0, House::Tenth),
            at(CelestialBody::Uranus, 250.0, House::Ninth),
            at(CelestialBody::Neptune, 260.0, House::Ninth),
            at(CelestialBody::Pluto, 210.0, House::Seventh),
        ],
        aspects: vec![
            AspectInfo {
                aspect: Aspect::Trine,
                planet1: CelestialBody::Moon,
                planet2: CelestialBody::Venus,
                orb: 5.0,
            },
            AspectInfo {
                aspect: Aspect::Opposition,
                planet1: CelestialBody::Jupiter,
                planet2: CelestialBody::Venus,
                orb: 0.0,
            },
            AspectInfo {
                aspect: Aspect::Opposition,
                planet1: CelestialBody::Moon,
                planet2: CelestialBody::Saturn,
                orb: 5.0,
            },
        ],
    }
}

pub(crate) fn fusion_chart() -> FusionChart {
    FusionChart {
        saju: sample_chart(),
        natal: sample_natal(),
        daeun: Some(Pillar::new(Stem::Im, Branch::Jin)),
        seun: Some(Pillar::new(Stem::Byeong, Branch::O)),
    }
}
