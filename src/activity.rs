//! Activity Scorer.
//!
//! A narrower scorer than the day grader: one 0-100 suitability score per
//! activity, built additively from a neutral baseline and clamped once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::config::ActivityConfig;
use crate::element::Element;
use crate::error::{EngineError, Result};
use crate::saju::shinsal::{stars_for_branch, void_branches};
use crate::saju::{Branch, Pillar, SajuChart, ShinsalEntry, TenGod, TenGodGroup};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Wealth,
    Career,
    Love,
    Health,
    Travel,
    Study,
    General,
}

impl ActivityType {
    pub const ALL: [ActivityType; 7] = [
        ActivityType::Wealth,
        ActivityType::Career,
        ActivityType::Love,
        ActivityType::Health,
        ActivityType::Travel,
        ActivityType::Study,
        ActivityType::General,
    ];

    /// Ten-god group whose day supports this activity.
    pub fn favored_group(self) -> Option<TenGodGroup> {
        match self {
            ActivityType::Wealth => Some(TenGodGroup::Wealth),
            ActivityType::Career => Some(TenGodGroup::Status),
            ActivityType::Love => Some(TenGodGroup::Expression),
            ActivityType::Health => Some(TenGodGroup::Peer),
            ActivityType::Travel => Some(TenGodGroup::Expression),
            ActivityType::Study => Some(TenGodGroup::Knowledge),
            ActivityType::General => None,
        }
    }
}

impl FromStr for ActivityType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let activity = match s.trim().to_lowercase().as_str() {
            "wealth" | "money" | "재물" => ActivityType::Wealth,
            "career" | "work" | "직업" => ActivityType::Career,
            "love" | "romance" | "연애" => ActivityType::Love,
            "health" | "건강" => ActivityType::Health,
            "travel" | "여행" => ActivityType::Travel,
            "study" | "학업" => ActivityType::Study,
            "general" | "종합" => ActivityType::General,
            _ => return Err(EngineError::unknown("activity", s)),
        };
        Ok(activity)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ActivityType::Wealth => "wealth",
            ActivityType::Career => "career",
            ActivityType::Love => "love",
            ActivityType::Health => "health",
            ActivityType::Travel => "travel",
            ActivityType::Study => "study",
            ActivityType::General => "general",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------
// ## Inputs
// ---------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoidInfo {
    pub is_void: bool,
    #[serde(default)]
    pub void_branches: Vec<Branch>,
}

impl VoidInfo {
    pub fn derive(natal: &SajuChart, day: Pillar) -> Self {
        let branches = void_branches(natal.day);
        VoidInfo {
            is_void: branches.contains(&day.branch),
            void_branches: branches.to_vec(),
        }
    }
}

/// Day-level context beyond stars and void.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityContext {
    pub day_ten_god: Option<TenGod>,
    pub day_element: Option<Element>,
    pub yongsin: Option<Element>,
    pub kibsin: Option<Element>,
}

impl ActivityContext {
    pub fn derive(natal: &SajuChart, day: Pillar) -> Self {
        ActivityContext {
            day_ten_god: Some(TenGod::between(natal.day_master(), day.stem)),
            day_element: Some(day.stem.element()),
            yongsin: natal.yongsin,
            kibsin: natal.kibsin,
        }
    }
}

/// Stars the day branch switches on against the natal chart, at full strength.
pub fn day_shinsal(natal: &SajuChart, day: Pillar) -> Vec<ShinsalEntry> {
    stars_for_branch(natal, day.branch)
        .into_iter()
        .map(ShinsalEntry::new)
        .collect()
}

// ---------------------------
// ## Scoring
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFactor {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityScore {
    pub activity: ActivityType,
    pub score: f64,
    pub factors: Vec<ActivityFactor>,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityScorer {
    config: ActivityConfig,
}

impl ActivityScorer {
    pub fn new(config: ActivityConfig) -> Self {
        ActivityScorer { config }
    }

    pub fn score(
        &self,
        activity: ActivityType,
        void: Option<&VoidInfo>,
        context: &ActivityContext,
        shinsal: &[ShinsalEntry],
    ) -> ActivityScore {
        let config = &self.config;
        let mut factors = Vec::new();

        if void.map_or(false, |v| v.is_void) {
            factors.push(factor("void", config.void_penalty));
        }

        for entry in shinsal {
            // negative or NaN strengths count as zero
            let strength = entry.strength.max(0.0);
            if entry.beneficial_for().contains(&activity) {
                let key = format!("shinsal.{}", entry.star);
                factors.push(factor(key, config.star_bonus * strength));
            } else if entry.harmful_for().contains(&activity) {
                let key = format!("shinsal.{}", entry.star);
                factors.push(factor(key, config.star_penalty * strength));
            }
        }

        if let (Some(favored), Some(god)) = (activity.favored_group(), context.day_ten_god) {
            let group = god.group();
            if group == favored {
                factors.push(factor(format!("ten_god.{god}"), config.affinity_bonus));
            } else if group == favored.controlled_by() {
                factors.push(factor(format!("ten_god.{god}"), config.affinity_penalty));
            }
        }

        if let Some(element) = context.day_element {
            if context.yongsin == Some(element) {
                factors.push(factor("yongsin", config.yongsin_bonus));
            } else if context.kibsin == Some(element) {
                factors.push(factor("kibsin", config.kibsin_penalty));
            }
        }

        let raw = config.baseline + factors.iter().map(|f| f.value).sum::<f64>();
        let score = if raw.is_nan() {
            config.baseline
        } else {
            raw.clamp(0.0, 100.0)
        };
        trace!(%activity, score, factors = factors.len(), "activity scored");

        ActivityScore {
            activity,
            score,
            factors,
        }
    }

    /// Scores every activity type for the same day.
    pub fn score_all(
        &self,
        void: Option<&VoidInfo>,
        context: &ActivityContext,
        shinsal: &[ShinsalEntry],
    ) -> Vec<ActivityScore> {
        ActivityType::ALL
            .iter()
            .map(|activity| self.score(*activity, void, context, shinsal))
            .collect()
    }
}

fn factor(key: impl Into<String>, value: f64) -> ActivityFactor {
    ActivityFactor {
        key: key.into(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saju::{Shinsal, Stem};
    use crate::test_support::sample_chart;
    use approx::assert_relative_eq;

    fn void_day() -> VoidInfo {
        VoidInfo {
            is_void: true,
            void_branches: vec![Branch::Sul, Branch::Hae],
        }
    }

    fn plain(activity: ActivityType, shinsal: &[ShinsalEntry]) -> ActivityScore {
        ActivityScorer::default().score(activity, None, &ActivityContext::default(), shinsal)
    }

    #[test]
    fn empty_inputs_score_the_baseline() {
        let score = plain(ActivityType::General, &[]);
        assert_relative_eq!(score.score, 50.0);
        assert!(score.factors.is_empty());
    }

    #[test]
    fn void_day_is_penalized() {
        let score = ActivityScorer::default().score(
            ActivityType::Travel,
            Some(&void_day()),
            &ActivityContext::default(),
            &[],
        );
        assert_relative_eq!(score.score, 35.0);
    }

    #[test]
    fn one_star_helps_one_activity_and_hurts_another() {
        let scorer = ActivityScorer::default();
        let dohwa = [ShinsalEntry::new(Shinsal::Dohwa)];
        let context = ActivityContext::default();
        assert_relative_eq!(scorer.score(ActivityType::Love, None, &context, &dohwa).score, 58.0);
        assert_relative_eq!(scorer.score(ActivityType::Study, None, &context, &dohwa).score, 42.0);
        assert_relative_eq!(scorer.score(ActivityType::Wealth, None, &context, &dohwa).score, 50.0);
    }

    #[test]
    fn unknown_stars_are_neutral() {
        let stars = [ShinsalEntry::new(Shinsal::from_key("mystery_star"))];
        let score = plain(ActivityType::Career, &stars);
        assert_relative_eq!(score.score, 50.0);
    }

    #[test]
    fn stacked_stars_stay_clamped() {
        let scorer = ActivityScorer::default();
        let context = ActivityContext::default();
        let lucky = vec![ShinsalEntry::new(Shinsal::CheonEul); 25];
        let unlucky = vec![ShinsalEntry::new(Shinsal::Baekho); 25];

        let high = scorer.score(ActivityType::Career, None, &context, &lucky);
        let low = scorer.score(ActivityType::Health, Some(&void_day()), &context, &unlucky);
        assert_relative_eq!(high.score, 100.0);
        assert_relative_eq!(low.score, 0.0);
        assert_eq!(high.factors.len(), 25);
    }

    #[test]
    fn strength_scales_star_contributions() {
        let entry = ShinsalEntry {
            star: Shinsal::Munchang,
            strength: 0.5,
        };
        let score = plain(ActivityType::Study, &[entry]);
        assert_relative_eq!(score.score, 54.0);
    }

    #[test]
    fn ten_god_affinity() {
        let scorer = ActivityScorer::default();
        let wealth_day = ActivityContext {
            day_ten_god: Some(TenGod::Jeongjae),
            ..ActivityContext::default()
        };
        assert_relative_eq!(scorer.score(ActivityType::Wealth, None, &wealth_day, &[]).score, 56.0);
        // wealth controls knowledge
        assert_relative_eq!(scorer.score(ActivityType::Study, None, &wealth_day, &[]).score, 44.0);
    }

    #[test]
    fn derived_context_reads_the_natal_chart() {
        let natal = sample_chart();
        // gye day for a byeong day master: jeonggwan, water matches yongsin
        let day = Pillar::new(Stem::Gye, Branch::Hae);
        let context = ActivityContext::derive(&natal, day);
        assert_eq!(context.day_ten_god, Some(TenGod::Jeonggwan));

        let career = ActivityScorer::default().score(ActivityType::Career, None, &context, &[]);
        assert_relative_eq!(career.score, 50.0 + 6.0 + 5.0);

        let void = VoidInfo::derive(&natal, day);
        assert!(void.is_void);
    }

    #[test]
    fn scoring_is_deterministic() {
        let natal = sample_chart();
        let day = Pillar::new(Stem::Jeong, Branch::Yu);
        let scorer = ActivityScorer::default();
        let context = ActivityContext::derive(&natal, day);
        let stars = day_shinsal(&natal, day);
        let void = VoidInfo::derive(&natal, day);
        assert_eq!(
            scorer.score_all(Some(&void), &context, &stars),
            scorer.score_all(Some(&void), &context, &stars)
        );
    }

    #[test]
    fn activity_labels_parse() {
        assert_eq!("Love".parse::<ActivityType>().unwrap(), ActivityType::Love);
        assert!("karaoke".parse::<ActivityType>().is_err());
    }
}
