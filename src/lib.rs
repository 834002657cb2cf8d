//! Destiny scoring and fusion engine.
//!
//! Converts Four Pillars (saju) facts and Western natal/transit facts into
//! per-day scores and grades, per-activity suitability scores and a ranked,
//! source-cited fusion report. Every scorer is a pure function of its inputs.

pub mod activity;
pub mod astro;
pub mod config;
pub mod element;
pub mod error;
pub mod factors;
pub mod fusion;
pub mod grader;
pub mod normalize;
pub mod saju;

#[cfg(test)]
pub(crate) mod test_support;

pub use activity::{ActivityContext, ActivityScore, ActivityScorer, ActivityType, VoidInfo};
pub use astro::{AspectInfo, CelestialBody, NatalChart, PlanetPosition, ZodiacSign};
pub use config::ScoringConfig;
pub use element::{Element, ElementRelation};
pub use error::{EngineError, Result};
pub use factors::{AstroDayFacts, Category, CategoryScore, RawFactor, SajuDayFacts};
pub use fusion::{
    FusionAssembler, FusionChart, FusionInsight, FusionReport, InsightCategory, InsightSource,
};
pub use grader::{DayFacts, DayGrader, DayScore, Grade};
pub use normalize::{calculate_adjusted_score, normalize_to_category, sum_and_normalize};
pub use saju::{Branch, Pillar, SajuChart, ShinsalEntry, Stem, TenGod, TenGodDistribution};
