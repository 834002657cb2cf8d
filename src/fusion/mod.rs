//! Fusion Report Assembler.
//!
//! Runs every domain analyzer over a full chart, weights each scored candidate
//! by its confidence, ranks and classifies the candidates and keeps the top N.
//! Every retained insight carries its complete list of [`InsightSource`]s.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::astro::NatalChart;
use crate::config::{BandThresholds, FusionConfig};
use crate::error::Result;
use crate::saju::{Pillar, SajuChart};

pub mod analyzers;
pub mod matrix;

pub use self::analyzers::default_analyzers;
pub use self::matrix::MatrixLayer;

// ---------------------------
// ## Insight Types
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightDomain {
    Personality,
    Career,
    Relationship,
    Wealth,
    Health,
    Timing,
}

impl fmt::Display for InsightDomain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            InsightDomain::Personality => "personality",
            InsightDomain::Career => "career",
            InsightDomain::Relationship => "relationship",
            InsightDomain::Wealth => "wealth",
            InsightDomain::Health => "health",
            InsightDomain::Timing => "timing",
        };
        write!(f, "{}", name)
    }
}

/// Score band of an insight, best first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Strength,
    Opportunity,
    Balance,
    Caution,
    Challenge,
}

impl InsightCategory {
    pub fn from_score(score: f64, bands: &BandThresholds) -> InsightCategory {
        if score >= bands.strength {
            InsightCategory::Strength
        } else if score >= bands.opportunity {
            InsightCategory::Opportunity
        } else if score >= bands.balance {
            InsightCategory::Balance
        } else if score >= bands.caution {
            InsightCategory::Caution
        } else {
            InsightCategory::Challenge
        }
    }
}

impl fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            InsightCategory::Strength => "strength",
            InsightCategory::Opportunity => "opportunity",
            InsightCategory::Balance => "balance",
            InsightCategory::Caution => "caution",
            InsightCategory::Challenge => "challenge",
        };
        write!(f, "{}", name)
    }
}

/// One cited matrix cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSource {
    pub layer: u8,
    pub row: usize,
    pub col: usize,
    pub contribution: f64,
    pub saju_factor: String,
    pub astro_factor: String,
}

/// What an analyzer hands back before ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub score: f64,
    pub confidence: f64,
    pub sources: Vec<InsightSource>,
}

impl InsightCandidate {
    /// Scores a candidate from its sources. A candidate without sources has
    /// nothing to ground it and is not produced.
    pub fn from_sources(
        id: impl Into<String>,
        title: impl Into<String>,
        sources: Vec<InsightSource>,
        config: &FusionConfig,
    ) -> Option<Self> {
        if sources.is_empty() {
            return None;
        }
        let net = net_contribution(&sources);
        let description = format!(
            "{} sources, net {:+.2}: {}",
            sources.len(),
            net,
            sources
                .iter()
                .map(|s| format!("{} x {}", s.saju_factor, s.astro_factor))
                .collect::<Vec<_>>()
                .join("; ")
        );
        Some(InsightCandidate {
            id: id.into(),
            title: title.into(),
            description,
            score: source_score(&sources, config),
            confidence: source_confidence(&sources, config),
            sources,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionInsight {
    pub id: String,
    pub domain: InsightDomain,
    pub category: InsightCategory,
    pub title: String,
    pub description: String,
    pub score: f64,
    pub weighted_score: f64,
    pub confidence: f64,
    pub sources: Vec<InsightSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAnalyzer {
    pub domain: InsightDomain,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionReport {
    pub insights: Vec<FusionInsight>,
    /// Candidates produced before truncation to the top N.
    pub candidate_count: usize,
    pub skipped: Vec<SkippedAnalyzer>,
}

/// Everything the analyzers read: both natal charts plus the luck cycles in force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionChart {
    pub saju: SajuChart,
    pub natal: NatalChart,
    #[serde(default)]
    pub daeun: Option<Pillar>,
    #[serde(default)]
    pub seun: Option<Pillar>,
}

// ---------------------------
// ## Scoring Helpers
// ---------------------------

fn net_contribution(sources: &[InsightSource]) -> f64 {
    sources.iter().map(|s| s.contribution).sum()
}

pub fn source_score(sources: &[InsightSource], config: &FusionConfig) -> f64 {
    let score = 50.0 + config.score_scale * net_contribution(sources);
    if score.is_nan() {
        50.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Share of non-zero sources pointing the same way as the net contribution.
pub fn agreement(sources: &[InsightSource]) -> f64 {
    let net = net_contribution(sources);
    let signed: Vec<f64> = sources
        .iter()
        .map(|s| s.contribution)
        .filter(|c| *c != 0.0)
        .collect();
    if signed.is_empty() || net == 0.0 {
        return 0.0;
    }
    let agreeing = signed.iter().filter(|c| c.signum() == net.signum()).count();
    agreeing as f64 / signed.len() as f64
}

pub fn source_confidence(sources: &[InsightSource], config: &FusionConfig) -> f64 {
    let counted = sources.len().min(config.confidence_max_sources) as f64;
    let confidence = config.confidence_base
        + config.confidence_per_source * counted
        + config.agreement_weight * agreement(sources);
    confidence.clamp(0.0, 1.0)
}

/// Clamps into `[0, max]`; NaN counts as no evidence.
fn bounded(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

// ---------------------------
// ## Assembler
// ---------------------------

pub trait InsightAnalyzer: Send + Sync {
    fn domain(&self) -> InsightDomain;

    fn analyze(&self, chart: &FusionChart, config: &FusionConfig) -> Result<Vec<InsightCandidate>>;
}

pub struct FusionAssembler {
    config: FusionConfig,
    analyzers: Vec<Box<dyn InsightAnalyzer>>,
}

impl Default for FusionAssembler {
    fn default() -> Self {
        FusionAssembler::new(FusionConfig::default())
    }
}

impl FusionAssembler {
    pub fn new(config: FusionConfig) -> Self {
        FusionAssembler {
            config,
            analyzers: default_analyzers(),
        }
    }

    pub fn with_analyzers(config: FusionConfig, analyzers: Vec<Box<dyn InsightAnalyzer>>) -> Self {
        FusionAssembler { config, analyzers }
    }

    pub fn weighted_score(&self, score: f64, confidence: f64) -> f64 {
        let floor = self.config.confidence_floor;
        score * (floor + (1.0 - floor) * confidence.clamp(0.0, 1.0))
    }

    pub fn classify(&self, score: f64) -> InsightCategory {
        InsightCategory::from_score(score, &self.config.bands)
    }

    pub fn assemble(&self, chart: &FusionChart) -> FusionReport {
        let mut insights = Vec::new();
        let mut skipped = Vec::new();

        for analyzer in &self.analyzers {
            let domain = analyzer.domain();
            match analyzer.analyze(chart, &self.config) {
                Ok(candidates) => {
                    debug!(%domain, candidates = candidates.len(), "analyzer finished");
                    insights.extend(candidates.into_iter().map(|c| {
                        let score = bounded(c.score, 100.0);
                        let confidence = bounded(c.confidence, 1.0);
                        FusionInsight {
                            category: self.classify(score),
                            weighted_score: self.weighted_score(score, confidence),
                            id: c.id,
                            domain,
                            title: c.title,
                            description: c.description,
                            score,
                            confidence,
                            sources: c.sources,
                        }
                    }));
                }
                Err(err) => {
                    warn!(%domain, error = %err, "analyzer skipped");
                    skipped.push(SkippedAnalyzer {
                        domain,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let candidate_count = insights.len();
        insights.sort_by(|a, b| {
            b.weighted_score
                .total_cmp(&a.weighted_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        insights.truncate(self.config.top_n);

        FusionReport {
            insights,
            candidate_count,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::test_support::fusion_chart;
    use approx::assert_relative_eq;

    fn source(contribution: f64) -> InsightSource {
        InsightSource {
            layer: 1,
            row: 0,
            col: 0,
            contribution,
            saju_factor: "day_master:wood".to_string(),
            astro_factor: "sun:Aries".to_string(),
        }
    }

    struct Fixed(InsightDomain, Vec<f64>);

    impl InsightAnalyzer for Fixed {
        fn domain(&self) -> InsightDomain {
            self.0
        }

        fn analyze(
            &self,
            _chart: &FusionChart,
            config: &FusionConfig,
        ) -> Result<Vec<InsightCandidate>> {
            Ok(self
                .1
                .iter()
                .enumerate()
                .filter_map(|(i, c)| {
                    InsightCandidate::from_sources(
                        format!("{}.{i}", self.0),
                        "fixed",
                        vec![source(*c)],
                        config,
                    )
                })
                .collect())
        }
    }

    struct Broken;

    impl InsightAnalyzer for Broken {
        fn domain(&self) -> InsightDomain {
            InsightDomain::Health
        }

        fn analyze(
            &self,
            _chart: &FusionChart,
            _config: &FusionConfig,
        ) -> Result<Vec<InsightCandidate>> {
            Err(EngineError::AnalyzerFailed {
                domain: "health".to_string(),
                reason: "no vitality data".to_string(),
            })
        }
    }

    /// Emits raw candidates without going through `from_sources`.
    struct Unbounded(Vec<(f64, f64)>);

    impl InsightAnalyzer for Unbounded {
        fn domain(&self) -> InsightDomain {
            InsightDomain::Career
        }

        fn analyze(
            &self,
            _chart: &FusionChart,
            _config: &FusionConfig,
        ) -> Result<Vec<InsightCandidate>> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, (score, confidence))| InsightCandidate {
                    id: format!("career.raw.{i}"),
                    title: "raw".to_string(),
                    description: String::new(),
                    score: *score,
                    confidence: *confidence,
                    sources: vec![source(1.0)],
                })
                .collect())
        }
    }

    #[test]
    fn bands_mirror_grade_thresholds() {
        let bands = BandThresholds::default();
        assert_eq!(InsightCategory::from_score(72.0, &bands), InsightCategory::Strength);
        assert_eq!(InsightCategory::from_score(71.9, &bands), InsightCategory::Opportunity);
        assert_eq!(InsightCategory::from_score(45.0, &bands), InsightCategory::Balance);
        assert_eq!(InsightCategory::from_score(32.0, &bands), InsightCategory::Caution);
        assert_eq!(InsightCategory::from_score(10.0, &bands), InsightCategory::Challenge);
    }

    #[test]
    fn score_and_confidence_from_sources() {
        let config = FusionConfig::default();
        let sources = vec![source(2.0), source(1.0), source(-0.5)];
        assert_relative_eq!(source_score(&sources, &config), 60.0);
        // 2 of 3 signed sources agree with the positive net
        assert_relative_eq!(agreement(&sources), 2.0 / 3.0);
        assert_relative_eq!(
            source_confidence(&sources, &config),
            0.35 + 0.3 + 0.25 * 2.0 / 3.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(source_score(&[source(100.0)], &config), 100.0);
        assert!(InsightCandidate::from_sources("x", "x", vec![], &config).is_none());
    }

    #[test]
    fn weighted_score_discounts_low_confidence() {
        let assembler = FusionAssembler::default();
        assert_relative_eq!(assembler.weighted_score(80.0, 1.0), 80.0);
        assert_relative_eq!(assembler.weighted_score(80.0, 0.0), 48.0);
        assert_relative_eq!(assembler.weighted_score(80.0, 0.5), 64.0);
    }

    #[test]
    fn ranks_truncates_and_keeps_sources() {
        let config = FusionConfig {
            top_n: 3,
            ..FusionConfig::default()
        };
        let assembler = FusionAssembler::with_analyzers(
            config,
            vec![
                Box::new(Fixed(InsightDomain::Career, vec![1.0, 5.0, -3.0])),
                Box::new(Fixed(InsightDomain::Wealth, vec![2.0, 0.5])),
            ],
        );
        let report = assembler.assemble(&fusion_chart());
        assert_eq!(report.candidate_count, 5);
        assert_eq!(report.insights.len(), 3);
        let ids: Vec<&str> = report.insights.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["career.1", "wealth.0", "career.0"]);
        assert!(report.insights.windows(2).all(|w| w[0].weighted_score >= w[1].weighted_score));
        assert!(report.insights.iter().all(|i| !i.sources.is_empty()));
        assert_eq!(report.insights[0].category, InsightCategory::Opportunity);
    }

    #[test]
    fn failing_analyzer_is_skipped() {
        let assembler = FusionAssembler::with_analyzers(
            FusionConfig::default(),
            vec![
                Box::new(Broken),
                Box::new(Fixed(InsightDomain::Career, vec![1.0])),
            ],
        );
        let report = assembler.assemble(&fusion_chart());
        assert_eq!(report.insights.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].domain, InsightDomain::Health);
        assert!(report.skipped[0].reason.contains("no vitality data"));
    }

    #[test]
    fn plugged_in_scores_are_clamped() {
        let assembler = FusionAssembler::with_analyzers(
            FusionConfig::default(),
            vec![Box::new(Unbounded(vec![
                (140.0, 1.7),
                (-20.0, -0.5),
                (f64::NAN, f64::NAN),
                (60.0, 0.5),
            ]))],
        );
        let report = assembler.assemble(&fusion_chart());
        assert_eq!(report.insights.len(), 4);
        for insight in &report.insights {
            assert!((0.0..=100.0).contains(&insight.score), "{}", insight.id);
            assert!((0.0..=1.0).contains(&insight.confidence), "{}", insight.id);
            assert!(insight.weighted_score <= insight.score);
        }
        let top = &report.insights[0];
        assert_eq!(top.id, "career.raw.0");
        assert_relative_eq!(top.score, 100.0);
        assert_relative_eq!(top.confidence, 1.0);
        assert_relative_eq!(top.weighted_score, 100.0);
        assert_eq!(top.category, InsightCategory::Strength);
        let nan = report.insights.iter().find(|i| i.id == "career.raw.2").unwrap();
        assert_relative_eq!(nan.weighted_score, 0.0);
    }
}
