use chrono::{Days, NaiveDate};
use destiny_core::activity::day_shinsal;
use destiny_core::astro::House;
use destiny_core::saju::{Geokguk, StrengthState};
use destiny_core::{
    ActivityContext, ActivityScorer, AstroDayFacts, Branch, CelestialBody, DayFacts, DayGrader,
    Element, FusionAssembler, FusionChart, NatalChart, Pillar, PlanetPosition, SajuChart,
    SajuDayFacts, ScoringConfig, Stem, VoidInfo, ZodiacSign,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ScoringConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        },
        None => ScoringConfig::default(),
    };

    // byeong-in day master, born 1991-10-20
    let saju = SajuChart {
        year: Pillar::new(Stem::Sin, Branch::Mi),
        month: Pillar::new(Stem::Gap, Branch::O),
        day: Pillar::new(Stem::Byeong, Branch::In),
        hour: Some(Pillar::new(Stem::Gye, Branch::Sa)),
        yongsin: Some(Element::Water),
        kibsin: Some(Element::Fire),
        pattern: Some(Geokguk::Jeongjae),
        strength: StrengthState::Strong,
    };
    let natal = NatalChart {
        ascendant: ZodiacSign::Aries,
        planets: vec![
            PlanetPosition::new(CelestialBody::Sun, 206.5, House::Seventh),
            PlanetPosition::new(CelestialBody::Moon, 95.0, House::Fourth),
            PlanetPosition::new(CelestialBody::Venus, 220.0, House::Eighth),
            PlanetPosition::new(CelestialBody::Mars, 15.0, House::First),
            PlanetPosition::new(CelestialBody::Jupiter, 40.0, House::Second),
            PlanetPosition::new(CelestialBody::Saturn, 280.0, House::Tenth),
        ],
        aspects: vec![],
    };
    let (Some(birth), Some(start)) = (
        NaiveDate::from_ymd_opt(1991, 10, 20),
        NaiveDate::from_ymd_opt(2026, 10, 16),
    ) else {
        return;
    };

    let daeun = Some(Pillar::new(Stem::Im, Branch::Jin));
    let seun = Pillar::new(Stem::Byeong, Branch::O);
    let wolun = Pillar::new(Stem::Mu, Branch::Sul);

    // day pillars and a slowly moving sky for one week
    let days: Vec<DayFacts> = (0..7u64)
        .filter_map(|offset| {
            let date = start.checked_add_days(Days::new(offset))?;
            let day = Pillar::new(
                Stem::ALL[(2 + offset as usize) % 10],
                Branch::from_index(8 + offset as usize),
            );
            let transits = vec![
                PlanetPosition::new(CelestialBody::Sun, 203.0 + offset as f64, House::Seventh),
                PlanetPosition::new(
                    CelestialBody::Moon,
                    110.0 + 13.2 * offset as f64,
                    House::Fourth,
                ),
                PlanetPosition::new(CelestialBody::Jupiter, 160.0, House::Sixth),
                PlanetPosition::new(CelestialBody::Saturn, 5.0, House::First),
            ];
            let astro = AstroDayFacts::derive(
                saju.day_master().element(),
                &natal,
                &transits,
                birth,
                date,
                config.major_planets.max_orb,
            );
            let saju_facts = SajuDayFacts::derive(&saju, daeun, seun, wolun, day);
            Some(DayFacts::new(date, saju_facts, astro))
        })
        .collect();

    let grader = DayGrader::new(config.clone());
    for score in grader.grade_range(&days) {
        println!(
            "{}  saju {:5.2}  astro {:5.2}  cross {:+.0}  total {:5.2}  {}",
            score.date,
            score.saju_total,
            score.astro_total,
            score.cross.bonus,
            score.total,
            score.grade
        );
    }

    let today = Pillar::new(Stem::Jeong, Branch::Yu);
    let scorer = ActivityScorer::new(config.activity.clone());
    let activities = scorer.score_all(
        Some(&VoidInfo::derive(&saju, today)),
        &ActivityContext::derive(&saju, today),
        &day_shinsal(&saju, today),
    );
    println!("{:#?}", activities);

    let chart = FusionChart {
        saju,
        natal,
        daeun,
        seun: Some(seun),
    };
    let report = FusionAssembler::new(config.fusion).assemble(&chart);
    println!("{:#?}", report);
}
