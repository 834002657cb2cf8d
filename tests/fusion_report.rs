use destiny_core::astro::{Aspect, House};
use destiny_core::config::FusionConfig;
use destiny_core::fusion::{InsightDomain, MatrixLayer};
use destiny_core::saju::{Geokguk, StrengthState};
use destiny_core::*;

fn chart() -> FusionChart {
    let at = |planet, longitude, house| PlanetPosition::new(planet, longitude, house);
    FusionChart {
        saju: SajuChart {
            year: Pillar::parse("sin-mi").unwrap(),
            month: Pillar::parse("gap-o").unwrap(),
            day: Pillar::parse("byeong-in").unwrap(),
            hour: Some(Pillar::parse("gye-sa").unwrap()),
            yongsin: Some(Element::Water),
            kibsin: Some(Element::Fire),
            pattern: Some(Geokguk::Jeongjae),
            strength: StrengthState::Strong,
        },
        natal: NatalChart {
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
                    planet1: CelestialBody::Moon,
                    planet2: CelestialBody::Saturn,
                    orb: 5.0,
                },
            ],
        },
        daeun: Some(Pillar::parse("im-jin").unwrap()),
        seun: Some(Pillar::parse("byeong-o").unwrap()),
    }
}

fn layer(number: u8) -> MatrixLayer {
    match number {
        1 => MatrixLayer::ElementSign,
        2 => MatrixLayer::TenGodPlanet,
        3 => MatrixLayer::GroupHouse,
        4 => MatrixLayer::CycleAspect,
        other => panic!("no matrix layer {other}"),
    }
}

#[test]
fn report_is_ranked_and_bounded() {
    let report = FusionAssembler::default().assemble(&chart());
    assert!(report.skipped.is_empty());
    assert!(!report.insights.is_empty());
    assert!(report.insights.len() <= FusionConfig::default().top_n);
    assert!(report.candidate_count >= report.insights.len());
    assert!(report
        .insights
        .windows(2)
        .all(|w| w[0].weighted_score >= w[1].weighted_score));
    for insight in &report.insights {
        assert!((0.0..=100.0).contains(&insight.score));
        assert!((0.0..=1.0).contains(&insight.confidence));
        assert!(insight.weighted_score <= insight.score);
    }
}

#[test]
fn every_insight_cites_real_matrix_cells() {
    let report = FusionAssembler::default().assemble(&chart());
    for insight in &report.insights {
        assert!(!insight.sources.is_empty(), "{} has no sources", insight.id);
        for source in &insight.sources {
            let (rows, cols) = layer(source.layer).dimensions();
            assert!(source.row < rows && source.col < cols, "{}: {:?}", insight.id, source);
            assert!(!source.saju_factor.is_empty());
            assert!(!source.astro_factor.is_empty());
        }
    }
}

#[test]
fn top_n_limits_the_report() {
    let config = FusionConfig {
        top_n: 2,
        ..FusionConfig::default()
    };
    let full = FusionAssembler::default().assemble(&chart());
    let short = FusionAssembler::new(config).assemble(&chart());
    assert_eq!(short.insights.len(), 2);
    assert_eq!(short.candidate_count, full.candidate_count);
    assert_eq!(short.insights[..], full.insights[..2]);
}

#[test]
fn assembly_is_deterministic() {
    let assembler = FusionAssembler::default();
    let first = serde_json::to_value(assembler.assemble(&chart())).unwrap();
    let second = serde_json::to_value(assembler.assemble(&chart())).unwrap();
    assert_eq!(first, second);
    assert!(first["insights"][0]["sources"].is_array());
    assert!(first["insights"][0]["category"].is_string());
}

#[test]
fn inconsistent_chart_still_yields_a_partial_report() {
    let mut chart = chart();
    chart.natal.planets.retain(|p| p.planet != CelestialBody::Saturn);

    let report = FusionAssembler::default().assemble(&chart);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].domain, InsightDomain::Timing);
    assert!(!report.insights.is_empty());
    assert!(report.insights.iter().all(|i| i.domain != InsightDomain::Timing));
}
