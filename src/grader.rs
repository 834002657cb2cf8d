//! Day Grader.
//!
//! Sums the ten category scores of a date into a 0-100 total, applies the
//! bounded cross-verification adjustment, maps the total onto grades 0-4 and
//! finally runs the override rules.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::{NormalizationMode, ScoringConfig, CROSS_BUDGET, SIDE_MAX};
use crate::factors::{
    astro_factors, category_values, saju_factors, AstroDayFacts, Category, CategoryScore, Domain,
    RawFactor, SajuDayFacts,
};
use crate::normalize::{calculate_adjusted_score, normalize_to_category};
use crate::saju::BranchRelation;

// ---------------------------
// ## Grades
// ---------------------------

/// Grade 0 is the best day, grade 4 the worst.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Grade0 = 0,
    Grade1,
    Grade2,
    Grade3,
    Grade4,
}

impl Grade {
    pub const ALL: [Grade; 5] = [
        Grade::Grade0,
        Grade::Grade1,
        Grade::Grade2,
        Grade::Grade3,
        Grade::Grade4,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: usize) -> Grade {
        Grade::ALL[index.min(4)]
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "grade{}", self.value())
    }
}

/// Rules applied after threshold evaluation, in order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideRule {
    /// Grade 0 with both a clash and a punishment on the day pillar drops to grade 1.
    ClashAndPunishment,
}

pub const OVERRIDE_RULES: [OverrideRule; 1] = [OverrideRule::ClashAndPunishment];

impl OverrideRule {
    /// Replacement grade when the rule fires.
    pub fn apply(self, grade: Grade, day_relations: &[BranchRelation]) -> Option<Grade> {
        match self {
            OverrideRule::ClashAndPunishment => {
                let fires = grade == Grade::Grade0
                    && day_relations.contains(&BranchRelation::Clash)
                    && day_relations.contains(&BranchRelation::Punishment);
                fires.then_some(Grade::Grade1)
            }
        }
    }
}

// ---------------------------
// ## Inputs & Outputs
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayFacts {
    pub date: NaiveDate,
    #[serde(default)]
    pub saju: SajuDayFacts,
    #[serde(default)]
    pub astro: AstroDayFacts,
}

impl DayFacts {
    pub fn new(date: NaiveDate, saju: SajuDayFacts, astro: AstroDayFacts) -> Self {
        DayFacts { date, saju, astro }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossVerification {
    pub saju_deviation: f64,
    pub astro_deviation: f64,
    pub bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayScore {
    pub date: NaiveDate,
    pub saju_total: f64,
    pub astro_total: f64,
    pub cross: CrossVerification,
    pub total: f64,
    pub grade: Grade,
    /// Grade from the thresholds alone, before override rules.
    pub threshold_grade: Grade,
    pub applied_override: Option<OverrideRule>,
    pub categories: Vec<CategoryScore>,
    pub factors: Vec<RawFactor>,
}

impl DayScore {
    pub fn cross_bonus(&self) -> f64 {
        self.cross.bonus
    }
}

// ---------------------------
// ## Grader
// ---------------------------

#[derive(Debug, Clone, Default)]
pub struct DayGrader {
    config: ScoringConfig,
}

impl DayGrader {
    pub fn new(config: ScoringConfig) -> Self {
        DayGrader { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn normalize(&self, category: Category, values: &[f64]) -> (f64, f64) {
        let table = self.config.table(category);
        let raw: f64 = values.iter().sum();
        let normalized = match self.config.grader.normalization {
            NormalizationMode::Linear => {
                normalize_to_category(raw, table.max_raw, table.category_max)
            }
            NormalizationMode::Adjusted => {
                calculate_adjusted_score(table.category_max, values, table.max_raw)
            }
        };
        (raw, normalized)
    }

    pub fn category_scores(&self, factors: &[RawFactor]) -> Vec<CategoryScore> {
        Category::ALL
            .iter()
            .map(|&category| {
                let (raw, normalized) =
                    self.normalize(category, &category_values(factors, category));
                CategoryScore {
                    category,
                    raw,
                    normalized,
                    factor_keys: factors
                        .iter()
                        .filter(|f| f.category == category)
                        .map(|f| f.key.clone())
                        .collect(),
                }
            })
            .collect()
    }

    /// Agreement bonus when both sides deviate from their midpoint in the same direction.
    pub fn cross_verify(&self, saju_total: f64, astro_total: f64) -> CrossVerification {
        let cross = &self.config.grader.cross;
        let midpoint = SIDE_MAX / 2.0;
        let saju_deviation = saju_total - midpoint;
        let astro_deviation = astro_total - midpoint;

        let bonus = if saju_deviation >= cross.positive_threshold
            && astro_deviation >= cross.positive_threshold
        {
            cross.bonus
        } else if saju_deviation <= cross.negative_threshold
            && astro_deviation <= cross.negative_threshold
        {
            -cross.penalty
        } else {
            0.0
        };

        CrossVerification {
            saju_deviation,
            astro_deviation,
            bonus: bonus.clamp(-CROSS_BUDGET, CROSS_BUDGET),
        }
    }

    /// First threshold the total reaches, scanning from grade 0 down.
    pub fn grade_for(&self, total: f64) -> Grade {
        self.config
            .grader
            .thresholds
            .ordered()
            .iter()
            .position(|threshold| total >= *threshold)
            .map(Grade::from_index)
            .unwrap_or(Grade::Grade4)
    }

    pub fn grade(&self, facts: &DayFacts) -> DayScore {
        let mut factors = saju_factors(&self.config, &facts.saju);
        factors.extend(astro_factors(&self.config, &facts.astro));

        let categories = self.category_scores(&factors);
        let side_total = |domain: Domain| -> f64 {
            categories
                .iter()
                .filter(|c| c.category.domain() == domain)
                .map(|c| c.normalized)
                .sum()
        };
        let saju_total = side_total(Domain::Saju);
        let astro_total = side_total(Domain::Astro);

        let cross = self.cross_verify(saju_total, astro_total);
        let total = (saju_total + astro_total + cross.bonus).clamp(0.0, 100.0);
        let threshold_grade = self.grade_for(total);

        let mut grade = threshold_grade;
        let mut applied_override = None;
        for rule in OVERRIDE_RULES {
            if let Some(replacement) = rule.apply(grade, facts.saju.day_relations()) {
                debug!(
                    date = %facts.date,
                    ?rule,
                    from = %grade,
                    to = %replacement,
                    "grade overridden"
                );
                grade = replacement;
                applied_override = Some(rule);
            }
        }

        debug!(
            date = %facts.date,
            saju_total,
            astro_total,
            cross_bonus = cross.bonus,
            total,
            %grade,
            "day graded"
        );

        DayScore {
            date: facts.date,
            saju_total,
            astro_total,
            cross,
            total,
            grade,
            threshold_grade,
            applied_override,
            categories,
            factors,
        }
    }

    /// Grades many dates in parallel. Output order matches input order.
    pub fn grade_range(&self, days: &[DayFacts]) -> Vec<DayScore> {
        days.par_iter().map(|facts| self.grade(facts)).collect()
    }
}
