//! Fusion matrix.
//!
//! Four layers crossing one Saju axis with one astrology axis. Every cell is a
//! small signed affinity; analyzers cite cells as [`InsightSource`]s, so the
//! `(layer, row, col)` triple always points back to a concrete pair of facts.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::InsightSource;
use crate::astro::{Aspect, CelestialBody, House, ZodiacSign};
use crate::element::{Element, ElementRelation};
use crate::saju::{TenGod, TenGodGroup};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixLayer {
    /// rows: five elements, cols: twelve signs
    ElementSign = 1,
    /// rows: ten gods, cols: ten bodies
    TenGodPlanet = 2,
    /// rows: five ten-god groups, cols: twelve houses
    GroupHouse = 3,
    /// rows: ten-god group of a luck cycle, cols: five aspects
    CycleAspect = 4,
}

impl MatrixLayer {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn dimensions(self) -> (usize, usize) {
        match self {
            MatrixLayer::ElementSign => (5, 12),
            MatrixLayer::TenGodPlanet => (10, 10),
            MatrixLayer::GroupHouse => (5, 12),
            MatrixLayer::CycleAspect => (5, 5),
        }
    }
}

impl fmt::Display for MatrixLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            MatrixLayer::ElementSign => "element_sign",
            MatrixLayer::TenGodPlanet => "ten_god_planet",
            MatrixLayer::GroupHouse => "group_house",
            MatrixLayer::CycleAspect => "cycle_aspect",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------
// ## Cells
// ---------------------------

/// Layer 1: how a sign's element treats a Saju element.
pub fn element_sign(element: Element, sign: ZodiacSign) -> f64 {
    match element.relation_to(sign.element()) {
        ElementRelation::Same => 2.0,
        ElementRelation::GeneratesMe => 1.5,
        ElementRelation::IGenerate => 0.5,
        ElementRelation::ControlsMe => -1.5,
        ElementRelation::IControl => -1.0,
    }
}

/// Bodies that carry the same meaning as a ten-god group.
fn resonant_bodies(group: TenGodGroup) -> &'static [CelestialBody] {
    match group {
        TenGodGroup::Peer => &[CelestialBody::Sun, CelestialBody::Mars],
        TenGodGroup::Expression => &[
            CelestialBody::Mercury,
            CelestialBody::Venus,
            CelestialBody::Uranus,
        ],
        TenGodGroup::Wealth => &[CelestialBody::Venus, CelestialBody::Jupiter],
        TenGodGroup::Status => &[CelestialBody::Saturn, CelestialBody::Sun, CelestialBody::Pluto],
        TenGodGroup::Knowledge => &[
            CelestialBody::Moon,
            CelestialBody::Jupiter,
            CelestialBody::Neptune,
        ],
    }
}

/// Layer 2: resonance between a ten god and a planet. The volatile gods
/// (seven killings, hurting officer, rob wealth) turn a resonant malefic
/// into friction.
pub fn ten_god_planet(god: TenGod, planet: CelestialBody) -> f64 {
    if !resonant_bodies(god.group()).contains(&planet) {
        return 0.0;
    }
    let volatile = matches!(god, TenGod::Pyeongwan | TenGod::Sanggwan | TenGod::Geobjae);
    match (volatile, planet.is_malefic()) {
        (true, true) => -1.5,
        (true, false) => 0.5,
        (false, true) => 0.5,
        (false, false) => 1.0,
    }
}

fn group_houses(group: TenGodGroup) -> &'static [House] {
    match group {
        TenGodGroup::Peer => &[House::First, House::Third, House::Eleventh],
        TenGodGroup::Expression => &[House::Fifth, House::Third, House::Sixth],
        TenGodGroup::Wealth => &[House::Second, House::Eighth, House::Seventh],
        TenGodGroup::Status => &[House::Tenth, House::Sixth, House::Seventh],
        TenGodGroup::Knowledge => &[House::Ninth, House::Fourth, House::Twelfth],
    }
}

/// Layer 3: a group is supported by planets in the houses it rules.
/// Malefics there still count, at reduced and negative weight.
pub fn group_house(group: TenGodGroup, house: House, planet: CelestialBody) -> f64 {
    if !group_houses(group).contains(&house) {
        0.0
    } else if planet.is_malefic() {
        -0.5
    } else {
        1.0
    }
}

/// Layer 4: an aspect felt under a luck cycle of the given group.
pub fn cycle_aspect(group: TenGodGroup, aspect: Aspect) -> f64 {
    let pressured = matches!(group, TenGodGroup::Status | TenGodGroup::Expression);
    match aspect {
        Aspect::Trine | Aspect::Sextile => 1.0,
        Aspect::Conjunction => 0.5,
        Aspect::Square | Aspect::Opposition if pressured => -1.0,
        Aspect::Square | Aspect::Opposition => -0.5,
    }
}

// ---------------------------
// ## Citations
// ---------------------------

/// A matrix cell reading; `value` is the cell, scaled by `weight`.
struct Cell {
    layer: MatrixLayer,
    row: usize,
    col: usize,
    value: f64,
    weight: f64,
}

fn cite(cell: Cell, saju: String, astro: String) -> InsightSource {
    InsightSource {
        layer: cell.layer.number(),
        row: cell.row,
        col: cell.col,
        contribution: cell.value * cell.weight,
        saju_factor: saju,
        astro_factor: astro,
    }
}

pub fn cite_element_sign(
    element: Element,
    saju: impl Into<String>,
    sign: ZodiacSign,
    astro: impl Into<String>,
    weight: f64,
) -> InsightSource {
    cite(
        Cell {
            layer: MatrixLayer::ElementSign,
            row: element.index(),
            col: sign.index(),
            value: element_sign(element, sign),
            weight: weight,
        },
        format!("{}:{element}", saju.into()),
        format!("{}:{sign}", astro.into()),
    )
}

pub fn cite_ten_god_planet(god: TenGod, planet: CelestialBody, weight: f64) -> InsightSource {
    cite(
        Cell {
            layer: MatrixLayer::TenGodPlanet,
            row: god.index(),
            col: planet.index(),
            value: ten_god_planet(god, planet),
            weight: weight,
        },
        format!("ten_god:{god}"),
        format!("planet:{planet}"),
    )
}

pub fn cite_group_house(
    group: TenGodGroup,
    house: House,
    planet: CelestialBody,
    weight: f64,
) -> InsightSource {
    cite(
        Cell {
            layer: MatrixLayer::GroupHouse,
            row: group.index(),
            col: house.number() - 1,
            value: group_house(group, house, planet),
            weight: weight,
        },
        format!("ten_god_group:{group}"),
        format!("house_{}:{planet}", house.number()),
    )
}

pub fn cite_cycle_aspect(
    cycle: &str,
    group: TenGodGroup,
    aspect: Aspect,
    planets: (CelestialBody, CelestialBody),
) -> InsightSource {
    cite(
        Cell {
            layer: MatrixLayer::CycleAspect,
            row: group.index(),
            col: aspect.index(),
            value: cycle_aspect(group, aspect),
            weight: 1.0,
        },
        format!("{cycle}:{group}"),
        format!("{}_{aspect}_{}", planets.0, planets.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn element_sign_follows_the_relation_ranking() {
        assert_relative_eq!(element_sign(Element::Water, ZodiacSign::Cancer), 2.0);
        // air signs read as wood, which water feeds
        assert_relative_eq!(element_sign(Element::Water, ZodiacSign::Libra), 0.5);
        // earth controls water
        assert_relative_eq!(element_sign(Element::Water, ZodiacSign::Taurus), -1.5);
    }

    #[test]
    fn volatile_gods_clash_with_malefics() {
        assert_relative_eq!(ten_god_planet(TenGod::Pyeongwan, CelestialBody::Saturn), -1.5);
        assert_relative_eq!(ten_god_planet(TenGod::Jeonggwan, CelestialBody::Saturn), 0.5);
        assert_relative_eq!(ten_god_planet(TenGod::Jeongjae, CelestialBody::Jupiter), 1.0);
        assert_relative_eq!(ten_god_planet(TenGod::Jeongjae, CelestialBody::Saturn), 0.0);
    }

    #[test]
    fn citations_stay_inside_layer_dimensions() {
        let sources = [
            cite_element_sign(Element::Water, "day_master", ZodiacSign::Pisces, "sun", 1.0),
            cite_ten_god_planet(TenGod::Jeongin, CelestialBody::Pluto, 1.0),
            cite_group_house(TenGodGroup::Knowledge, House::Twelfth, CelestialBody::Moon, 1.0),
            cite_cycle_aspect(
                "seun",
                TenGodGroup::Knowledge,
                Aspect::Opposition,
                (CelestialBody::Sun, CelestialBody::Moon),
            ),
        ];
        let layers = [
            MatrixLayer::ElementSign,
            MatrixLayer::TenGodPlanet,
            MatrixLayer::GroupHouse,
            MatrixLayer::CycleAspect,
        ];
        for (source, layer) in sources.iter().zip(layers) {
            let (rows, cols) = layer.dimensions();
            assert_eq!(source.layer, layer.number());
            assert!(source.row < rows && source.col < cols, "{source:?}");
        }
    }

    #[test]
    fn citation_scales_by_weight() {
        let source =
            cite_group_house(TenGodGroup::Status, House::Tenth, CelestialBody::Jupiter, 3.0);
        assert_relative_eq!(source.contribution, 3.0);
        assert_eq!(source.saju_factor, "ten_god_group:status");
        assert_eq!(source.astro_factor, "house_10:jupiter");
    }
}
