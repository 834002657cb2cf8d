use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use super::{Category, RawFactor};
use crate::config::{
    CycleConfig, DayStarConfig, GeokgukConfig, SamjaeConfig, ScoringConfig, YongsinConfig,
};
use crate::element::Element;
use crate::saju::relations::relations_against;
use crate::saju::shinsal::{is_samjae_year, nobleman_branches};
use crate::saju::{BranchRelation, DayStar, Geokguk, Pillar, SajuChart, StrengthState, TenGod};

// ---------------------------
// ## Facts
// ---------------------------

/// What one luck-cycle pillar (10-year, annual, monthly or daily) brings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleFacts {
    pub ten_god: Option<TenGod>,
    #[serde(default)]
    pub relations: Vec<BranchRelation>,
}

impl CycleFacts {
    pub fn derive(natal: &SajuChart, pillar: Pillar) -> Self {
        CycleFacts {
            ten_god: Some(TenGod::between(natal.day_master(), pillar.stem)),
            relations: relations_against(pillar.branch, natal.branches()),
        }
    }

    pub fn has(&self, relation: BranchRelation) -> bool {
        self.relations.contains(&relation)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeunFacts {
    #[serde(flatten)]
    pub cycle: CycleFacts,
    #[serde(default)]
    pub samjae: bool,
    /// The year branch is one of the day master's nobleman branches.
    #[serde(default)]
    pub nobleman: bool,
}

impl SeunFacts {
    pub fn derive(natal: &SajuChart, year: Pillar) -> Self {
        SeunFacts {
            cycle: CycleFacts::derive(natal, year),
            samjae: is_samjae_year(natal.year.branch, year.branch),
            nobleman: nobleman_branches(natal.day_master()).contains(&year.branch),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IljinFacts {
    #[serde(flatten)]
    pub cycle: CycleFacts,
    #[serde(default)]
    pub stars: Vec<DayStar>,
}

impl IljinFacts {
    pub fn derive(natal: &SajuChart, day: Pillar) -> Self {
        IljinFacts {
            cycle: CycleFacts::derive(natal, day),
            stars: DayStar::derive(natal, day),
        }
    }
}

/// Favorable-element and pattern facts for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YongsinFacts {
    pub yongsin: Option<Element>,
    pub kibsin: Option<Element>,
    pub day_stem_element: Element,
    pub day_branch_element: Element,
    pub pattern: Option<Geokguk>,
    pub strength: StrengthState,
}

impl YongsinFacts {
    pub fn derive(natal: &SajuChart, day: Pillar) -> Self {
        YongsinFacts {
            yongsin: natal.yongsin,
            kibsin: natal.kibsin,
            day_stem_element: day.stem.element(),
            day_branch_element: day.branch.element(),
            pattern: natal.pattern,
            strength: natal.strength,
        }
    }
}

/// Saju half of a day's facts. Any missing part contributes zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SajuDayFacts {
    pub daeun: Option<CycleFacts>,
    pub seun: Option<SeunFacts>,
    pub wolun: Option<CycleFacts>,
    pub iljin: Option<IljinFacts>,
    pub yongsin: Option<YongsinFacts>,
}

impl SajuDayFacts {
    /// Builds the facts from the natal chart and the pillars in force on a date.
    /// No 10-year pillar is available before the first cycle starts.
    pub fn derive(
        natal: &SajuChart,
        daeun: Option<Pillar>,
        seun: Pillar,
        wolun: Pillar,
        iljin: Pillar,
    ) -> Self {
        SajuDayFacts {
            daeun: daeun.map(|p| CycleFacts::derive(natal, p)),
            seun: Some(SeunFacts::derive(natal, seun)),
            wolun: Some(CycleFacts::derive(natal, wolun)),
            iljin: Some(IljinFacts::derive(natal, iljin)),
            yongsin: Some(YongsinFacts::derive(natal, iljin)),
        }
    }

    /// Branch relations the day pillar forms with the natal chart.
    pub fn day_relations(&self) -> &[BranchRelation] {
        self.iljin
            .as_ref()
            .map(|i| i.cycle.relations.as_slice())
            .unwrap_or(&[])
    }
}

// ---------------------------
// ## Cycle Tables
// ---------------------------

/// Sibsin and branch-relation contributions of one cycle pillar.
pub fn cycle_factors(
    category: Category,
    table: &CycleConfig,
    facts: &CycleFacts,
) -> Vec<RawFactor> {
    let mut factors = Vec::new();

    if let Some(god) = facts.ten_god {
        factors.push(RawFactor::new(
            category,
            format!("{category}.sibsin.{god}"),
            table.sibsin.value(god),
        ));
    }
    for relation in &facts.relations {
        factors.push(RawFactor::new(
            category,
            format!("{category}.relation.{relation}"),
            table.relations.value(*relation),
        ));
    }

    factors
}

/// Samjae outcomes, highest precedence first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamjaeRule {
    WithNobleman,
    WithClash,
    Alone,
}

/// Evaluated top-down; the first rule that applies wins. A nobleman year
/// outranks a clash, and a samjae rule absorbs the year's clash relation,
/// so samjae + nobleman + clash still nets positive.
pub const SAMJAE_RULES: [SamjaeRule; 3] = [
    SamjaeRule::WithNobleman,
    SamjaeRule::WithClash,
    SamjaeRule::Alone,
];

impl SamjaeRule {
    pub fn applies(self, facts: &SeunFacts) -> bool {
        facts.samjae
            && match self {
                SamjaeRule::WithNobleman => facts.nobleman,
                SamjaeRule::WithClash => facts.cycle.has(BranchRelation::Clash),
                SamjaeRule::Alone => true,
            }
    }

    pub fn value(self, config: &SamjaeConfig) -> f64 {
        match self {
            SamjaeRule::WithNobleman => config.with_nobleman(),
            SamjaeRule::WithClash => config.clash_penalty,
            SamjaeRule::Alone => config.base_penalty,
        }
    }
}

impl fmt::Display for SamjaeRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SamjaeRule::WithNobleman => "with_nobleman",
            SamjaeRule::WithClash => "with_clash",
            SamjaeRule::Alone => "alone",
        };
        write!(f, "{}", name)
    }
}

/// First matching samjae rule, or `None` outside a samjae year.
pub fn samjae_rule(facts: &SeunFacts) -> Option<SamjaeRule> {
    SAMJAE_RULES.into_iter().find(|rule| rule.applies(facts))
}

pub fn samjae_factor(config: &SamjaeConfig, facts: &SeunFacts) -> Option<RawFactor> {
    samjae_rule(facts).map(|rule| {
        RawFactor::new(Category::Seun, format!("seun.samjae.{rule}"), rule.value(config))
    })
}

/// Annual-pillar contributions: the cycle tables plus the samjae rule. Inside
/// a samjae year the clash is carried by the rule instead of the relation table.
pub fn seun_factors(config: &ScoringConfig, facts: &SeunFacts) -> Vec<RawFactor> {
    let samjae = samjae_factor(&config.samjae, facts);
    let mut factors = if samjae.is_some() {
        let cycle = CycleFacts {
            ten_god: facts.cycle.ten_god,
            relations: facts
                .cycle
                .relations
                .iter()
                .copied()
                .filter(|r| *r != BranchRelation::Clash)
                .collect(),
        };
        cycle_factors(Category::Seun, &config.seun, &cycle)
    } else {
        cycle_factors(Category::Seun, &config.seun, &facts.cycle)
    };
    factors.extend(samjae);
    factors
}

pub fn day_star_factors(config: &DayStarConfig, stars: &[DayStar]) -> Vec<RawFactor> {
    stars
        .iter()
        .map(|star| {
            RawFactor::new(
                Category::Iljin,
                format!("iljin.day_star.{star}"),
                config.value(*star),
            )
        })
        .collect()
}

// ---------------------------
// ## Yongsin & Geokguk
// ---------------------------

fn element_match(
    config: &YongsinConfig,
    facts: &YongsinFacts,
    element: Element,
) -> Option<(&'static str, f64)> {
    if facts.yongsin == Some(element) {
        Some(("favorable_exact", config.favorable_exact))
    } else if facts.kibsin == Some(element) {
        Some(("unfavorable_exact", config.unfavorable_exact))
    } else if facts.yongsin == Some(element.generates()) {
        Some(("generates_favorable", config.generates_favorable))
    } else if facts.kibsin == Some(element.generates()) {
        Some(("generates_unfavorable", config.generates_unfavorable))
    } else {
        None
    }
}

/// The day stem decides; a neutral stem defers to the day branch at reduced weight.
pub fn yongsin_factor(config: &YongsinConfig, facts: &YongsinFacts) -> Option<RawFactor> {
    if let Some((label, value)) = element_match(config, facts, facts.day_stem_element) {
        return Some(RawFactor::new(Category::Yongsin, format!("yongsin.{label}"), value));
    }
    element_match(config, facts, facts.day_branch_element).map(|(label, value)| {
        RawFactor::new(
            Category::Yongsin,
            format!("yongsin.branch.{label}"),
            value * config.branch_weight,
        )
    })
}

pub fn geokguk_factor(config: &GeokgukConfig, facts: &YongsinFacts) -> Option<RawFactor> {
    let pattern = facts.pattern?;
    Some(RawFactor::new(
        Category::Yongsin,
        format!("geokguk.{pattern}.{}", facts.strength),
        config.value(pattern, facts.strength),
    ))
}

/// Every Saju-side factor of one day.
pub fn saju_factors(config: &ScoringConfig, facts: &SajuDayFacts) -> Vec<RawFactor> {
    let mut factors = Vec::new();

    if let Some(daeun) = &facts.daeun {
        factors.extend(cycle_factors(Category::Daeun, &config.daeun, daeun));
    }
    if let Some(seun) = &facts.seun {
        factors.extend(seun_factors(config, seun));
    }
    if let Some(wolun) = &facts.wolun {
        factors.extend(cycle_factors(Category::Wolun, &config.wolun, wolun));
    }
    if let Some(iljin) = &facts.iljin {
        factors.extend(cycle_factors(Category::Iljin, &config.iljin, &iljin.cycle));
        factors.extend(day_star_factors(&config.day_stars, &iljin.stars));
    }
    if let Some(yongsin) = &facts.yongsin {
        factors.extend(yongsin_factor(&config.yongsin, yongsin));
        factors.extend(geokguk_factor(&config.geokguk, yongsin));
    }

    for factor in &factors {
        trace!(key = %factor.key, value = factor.value(), "saju factor");
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saju::{Branch, Stem};
    use crate::test_support::sample_chart;
    use approx::assert_relative_eq;

    fn yongsin_facts(stem: Element, branch: Element) -> YongsinFacts {
        YongsinFacts {
            yongsin: Some(Element::Water),
            kibsin: Some(Element::Fire),
            day_stem_element: stem,
            day_branch_element: branch,
            pattern: None,
            strength: StrengthState::Balanced,
        }
    }

    fn match_for(stem: Element, branch: Element) -> RawFactor {
        yongsin_factor(&YongsinConfig::default(), &yongsin_facts(stem, branch)).unwrap()
    }

    fn seun(samjae: bool, nobleman: bool, clash: bool) -> SeunFacts {
        SeunFacts {
            cycle: CycleFacts {
                ten_god: None,
                relations: if clash { vec![BranchRelation::Clash] } else { vec![] },
            },
            samjae,
            nobleman,
        }
    }

    #[test]
    fn exact_yongsin_match_is_plus_thirty() {
        let factor = match_for(Element::Water, Element::Earth);
        assert_eq!(factor.key, "yongsin.favorable_exact");
        assert_relative_eq!(factor.value(), 30.0);
    }

    #[test]
    fn exact_kibsin_match_is_minus_twenty_eight() {
        let factor = match_for(Element::Fire, Element::Water);
        assert_relative_eq!(factor.value(), -28.0);
        assert!(factor.magnitude != 30.0);
    }

    #[test]
    fn generating_and_branch_matches_are_partial() {
        // metal generates water
        let generating = match_for(Element::Metal, Element::Earth);
        assert_relative_eq!(generating.value(), 14.0);
        // wood generates fire
        let feeding_kibsin = match_for(Element::Wood, Element::Earth);
        assert_relative_eq!(feeding_kibsin.value(), -12.0);
        // earth stem is neutral, water branch counts at half weight
        let branch = match_for(Element::Earth, Element::Water);
        assert_eq!(branch.key, "yongsin.branch.favorable_exact");
        assert_relative_eq!(branch.value(), 15.0);
    }

    #[test]
    fn absent_yongsin_contributes_nothing() {
        let facts = YongsinFacts {
            yongsin: None,
            kibsin: None,
            ..yongsin_facts(Element::Water, Element::Water)
        };
        assert!(yongsin_factor(&YongsinConfig::default(), &facts).is_none());
    }

    #[test]
    fn samjae_precedence() {
        assert_eq!(samjae_rule(&seun(true, true, true)), Some(SamjaeRule::WithNobleman));
        assert_eq!(samjae_rule(&seun(true, false, true)), Some(SamjaeRule::WithClash));
        assert_eq!(samjae_rule(&seun(true, false, false)), Some(SamjaeRule::Alone));
        assert_eq!(samjae_rule(&seun(false, true, true)), None);
    }

    #[test]
    fn nobleman_flips_samjae_positive() {
        let config = SamjaeConfig::default();
        let protected = samjae_factor(&config, &seun(true, true, true)).unwrap();
        let clashed = samjae_factor(&config, &seun(true, false, true)).unwrap();
        let plain = samjae_factor(&config, &seun(true, false, false)).unwrap();
        assert_relative_eq!(protected.value(), 4.0);
        assert_relative_eq!(clashed.value(), -10.0);
        assert_relative_eq!(plain.value(), -6.0);
    }

    #[test]
    fn samjae_absorbs_the_year_clash() {
        let config = ScoringConfig::default();
        let seun_total = |facts: SeunFacts| -> f64 {
            let day = SajuDayFacts {
                seun: Some(facts),
                ..SajuDayFacts::default()
            };
            saju_factors(&config, &day)
                .iter()
                .filter(|f| f.category == Category::Seun)
                .map(RawFactor::value)
                .sum()
        };
        assert_relative_eq!(seun_total(seun(true, true, true)), 4.0);
        assert_relative_eq!(seun_total(seun(true, false, true)), -10.0);
        assert_relative_eq!(seun_total(seun(true, false, false)), -6.0);
        // outside a samjae year the clash is scored by the relation table
        assert_relative_eq!(seun_total(seun(false, true, true)), -6.0);
        assert!(seun_total(seun(true, true, true)) > 0.0);
    }

    #[test]
    fn geokguk_lookup() {
        let config = GeokgukConfig::default();
        let facts = YongsinFacts {
            pattern: Some(Geokguk::Jeongin),
            strength: StrengthState::Weak,
            ..yongsin_facts(Element::Earth, Element::Earth)
        };
        let factor = geokguk_factor(&config, &facts).unwrap();
        assert_eq!(factor.key, "geokguk.jeongin.weak");
        assert_relative_eq!(factor.value(), 4.0);
        assert_eq!(factor.category, Category::Yongsin);
    }

    #[test]
    fn day_stars_accumulate() {
        let factors = day_star_factors(
            &DayStarConfig::default(),
            &[DayStar::NoblemanDay, DayStar::VoidDay, DayStar::ResentmentStar],
        );
        let sum: f64 = factors.iter().map(RawFactor::value).sum();
        assert_relative_eq!(sum, 5.0 - 5.0 - 3.0);
    }

    #[test]
    fn derived_day_facts_feed_every_saju_table() {
        let natal = sample_chart();
        let facts = SajuDayFacts::derive(
            &natal,
            Some(Pillar::new(Stem::Gyeong, Branch::Ja)),
            Pillar::new(Stem::Eul, Branch::Sa),
            Pillar::new(Stem::Byeong, Branch::Sul),
            Pillar::new(Stem::Im, Branch::Sin),
        );
        let factors = saju_factors(&ScoringConfig::default(), &facts);
        for category in Category::SAJU {
            assert!(factors.iter().any(|f| f.category == category), "{category} empty");
        }
        // im-sin clashes the natal in branch and punishes it
        assert!(facts.day_relations().contains(&BranchRelation::Clash));
        assert!(facts.day_relations().contains(&BranchRelation::Punishment));
    }

    #[test]
    fn missing_facts_yield_no_factors() {
        assert!(saju_factors(&ScoringConfig::default(), &SajuDayFacts::default()).is_empty());
    }
}
