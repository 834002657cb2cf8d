//! Domain analyzers. Each reads a [`FusionChart`], cites fusion-matrix cells
//! and turns them into scored candidates.

use super::matrix::{
    cite_cycle_aspect, cite_element_sign, cite_group_house, cite_ten_god_planet, group_house,
    ten_god_planet,
};
use super::{FusionChart, InsightAnalyzer, InsightCandidate, InsightDomain, InsightSource};
use crate::astro::{CelestialBody, House, NatalChart, ZodiacSign};
use crate::config::FusionConfig;
use crate::error::Result;
use crate::saju::{TenGod, TenGodDistribution, TenGodGroup};

pub fn default_analyzers() -> Vec<Box<dyn InsightAnalyzer>> {
    vec![
        Box::new(PersonalityAnalyzer),
        Box::new(CareerAnalyzer),
        Box::new(RelationshipAnalyzer),
        Box::new(WealthAnalyzer),
        Box::new(HealthAnalyzer),
        Box::new(TimingAnalyzer),
    ]
}

fn sign_of(natal: &NatalChart, body: CelestialBody) -> Option<ZodiacSign> {
    natal.planet(body).map(|p| p.sign)
}

/// Layer-2 citations for every listed ten god present in the chart, weighted by count.
fn ten_god_sources(
    distribution: &TenGodDistribution,
    gods: &[TenGod],
    natal: &NatalChart,
) -> Vec<InsightSource> {
    let mut sources = Vec::new();
    for &god in gods {
        let count = distribution.count(god);
        if count == 0 {
            continue;
        }
        for position in &natal.planets {
            if ten_god_planet(god, position.planet) != 0.0 {
                sources.push(cite_ten_god_planet(god, position.planet, count as f64));
            }
        }
    }
    sources
}

/// Layer-3 citations for every natal planet sitting in a house the group rules.
fn house_sources(
    group: TenGodGroup,
    natal: &NatalChart,
    houses: Option<&[House]>,
) -> Vec<InsightSource> {
    natal
        .planets
        .iter()
        .filter(|p| houses.map_or(true, |h| h.contains(&p.house)))
        .filter(|p| group_house(group, p.house, p.planet) != 0.0)
        .map(|p| cite_group_house(group, p.house, p.planet, 1.0))
        .collect()
}

// ---------------------------
// ## Personality
// ---------------------------

pub struct PersonalityAnalyzer;

impl InsightAnalyzer for PersonalityAnalyzer {
    fn domain(&self) -> InsightDomain {
        InsightDomain::Personality
    }

    fn analyze(&self, chart: &FusionChart, config: &FusionConfig) -> Result<Vec<InsightCandidate>> {
        let natal = &chart.natal;
        let day_master = chart.saju.day_master().element();
        let mut candidates = Vec::new();

        let luminaries = [
            ("sun", sign_of(natal, CelestialBody::Sun), 1.0),
            ("moon", sign_of(natal, CelestialBody::Moon), 0.75),
            ("ascendant", Some(natal.ascendant), 0.5),
        ];
        let sources = luminaries
            .iter()
            .filter_map(|(label, sign, weight)| {
                sign.map(|s| cite_element_sign(day_master, "day_master", s, *label, *weight))
            })
            .collect();
        candidates.extend(InsightCandidate::from_sources(
            "personality.temperament",
            "Day master against sun, moon and ascendant",
            sources,
            config,
        ));

        let distribution = chart.saju.ten_god_distribution();
        let grouped = distribution.grouped();
        if let Some(group) = grouped.dominant() {
            let gods: Vec<TenGod> = grouped.members(group).map(|(god, _)| god).collect();
            let sources = ten_god_sources(&distribution, &gods, natal);
            candidates.extend(InsightCandidate::from_sources(
                "personality.dominant_group",
                format!("Dominant {group} group and its planets"),
                sources,
                config,
            ));
        }

        Ok(candidates)
    }
}

// ---------------------------
// ## Career
// ---------------------------

pub struct CareerAnalyzer;

impl InsightAnalyzer for CareerAnalyzer {
    fn domain(&self) -> InsightDomain {
        InsightDomain::Career
    }

    fn analyze(&self, chart: &FusionChart, config: &FusionConfig) -> Result<Vec<InsightCandidate>> {
        let natal = &chart.natal;
        let mut sources = house_sources(TenGodGroup::Status, natal, None);
        sources.extend(ten_god_sources(
            &chart.saju.ten_god_distribution(),
            &[TenGod::Jeonggwan, TenGod::Pyeongwan],
            natal,
        ));

        Ok(InsightCandidate::from_sources(
            "career.vocation",
            "Status stars and the houses of work",
            sources,
            config,
        )
        .into_iter()
        .collect())
    }
}

// ---------------------------
// ## Relationship
// ---------------------------

pub struct RelationshipAnalyzer;

impl InsightAnalyzer for RelationshipAnalyzer {
    fn domain(&self) -> InsightDomain {
        InsightDomain::Relationship
    }

    fn analyze(&self, chart: &FusionChart, config: &FusionConfig) -> Result<Vec<InsightCandidate>> {
        let natal = &chart.natal;
        let day_master = chart.saju.day_master().element();
        let mut sources = Vec::new();

        if let Some(sign) = sign_of(natal, CelestialBody::Venus) {
            sources.push(cite_element_sign(day_master, "day_master", sign, "venus", 1.0));
        }
        if let Some(sign) = sign_of(natal, CelestialBody::Moon) {
            sources.push(cite_element_sign(day_master, "day_master", sign, "moon", 0.5));
        }

        // the partner house is read through whichever of wealth or status the chart holds more of
        let grouped = chart.saju.ten_god_distribution().grouped();
        let partner_group =
            if grouped.count(TenGodGroup::Status) > grouped.count(TenGodGroup::Wealth) {
                TenGodGroup::Status
            } else {
                TenGodGroup::Wealth
            };
        sources.extend(house_sources(partner_group, natal, Some(&[House::Seventh][..])));

        Ok(InsightCandidate::from_sources(
            "relationship.partnership",
            format!("Venus, moon and the seventh house through the {partner_group} group"),
            sources,
            config,
        )
        .into_iter()
        .collect())
    }
}

// ---------------------------
// ## Wealth
// ---------------------------

pub struct WealthAnalyzer;

impl InsightAnalyzer for WealthAnalyzer {
    fn domain(&self) -> InsightDomain {
        InsightDomain::Wealth
    }

    fn analyze(&self, chart: &FusionChart, config: &FusionConfig) -> Result<Vec<InsightCandidate>> {
        let natal = &chart.natal;
        let mut sources = house_sources(TenGodGroup::Wealth, natal, None);
        sources.extend(ten_god_sources(
            &chart.saju.ten_god_distribution(),
            &[TenGod::Jeongjae, TenGod::Pyeonjae],
            natal,
        ));

        Ok(InsightCandidate::from_sources(
            "wealth.resources",
            "Wealth stars and the houses of money",
            sources,
            config,
        )
        .into_iter()
        .collect())
    }
}

// ---------------------------
// ## Health
// ---------------------------

pub struct HealthAnalyzer;

impl InsightAnalyzer for HealthAnalyzer {
    fn domain(&self) -> InsightDomain {
        InsightDomain::Health
    }

    fn analyze(&self, chart: &FusionChart, config: &FusionConfig) -> Result<Vec<InsightCandidate>> {
        let natal = &chart.natal;
        let mut candidates = Vec::new();

        let balance = chart.saju.element_balance();
        if let Some((weakest, _)) = balance.iter().min_by_key(|(_, count)| **count) {
            let sources = [
                ("sun", sign_of(natal, CelestialBody::Sun), 1.0),
                ("mars", sign_of(natal, CelestialBody::Mars), 0.5),
            ]
            .iter()
            .filter_map(|(label, sign, weight)| {
                sign.map(|s| cite_element_sign(*weakest, "weakest_element", s, *label, *weight))
            })
            .collect();
            candidates.extend(InsightCandidate::from_sources(
                "health.element_balance",
                format!("Weakest element {weakest} against sun and mars"),
                sources,
                config,
            ));
        }

        let mut sources = house_sources(TenGodGroup::Peer, natal, Some(&[House::First][..]));
        sources.extend(house_sources(TenGodGroup::Expression, natal, Some(&[House::Sixth][..])));
        candidates.extend(InsightCandidate::from_sources(
            "health.vitality",
            "Planets in the houses of body and routine",
            sources,
            config,
        ));

        Ok(candidates)
    }
}

// ---------------------------
// ## Timing
// ---------------------------

/// Natal aspects as felt under the current 10-year and annual cycles.
pub struct TimingAnalyzer;

impl InsightAnalyzer for TimingAnalyzer {
    fn domain(&self) -> InsightDomain {
        InsightDomain::Timing
    }

    fn analyze(&self, chart: &FusionChart, config: &FusionConfig) -> Result<Vec<InsightCandidate>> {
        chart.natal.check_consistency()?;
        let day_master = chart.saju.day_master();
        let mut candidates = Vec::new();

        for (cycle, pillar) in [("daeun", chart.daeun), ("seun", chart.seun)] {
            let Some(pillar) = pillar else { continue };
            let group = TenGod::between(day_master, pillar.stem).group();
            let sources = chart
                .natal
                .aspects
                .iter()
                .map(|a| cite_cycle_aspect(cycle, group, a.aspect, (a.planet1, a.planet2)))
                .collect();
            candidates.extend(InsightCandidate::from_sources(
                format!("timing.{cycle}"),
                format!("Natal aspects under the {pillar} {cycle} ({group})"),
                sources,
                config,
            ));
        }

        Ok(candidates)
    }
}
