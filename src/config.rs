//! Scoring tables.
//!
//! Every tuned weight and threshold lives here as an immutable record, one per
//! scoring table. `ScoringConfig::default()` carries the production values; a
//! partial TOML document can override any subset of them.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::astro::{Aspect, CelestialBody, LunarPhase};
use crate::element::ElementRelation;
use crate::error::{EngineError, Result};
use crate::factors::Category;
use crate::saju::{BranchRelation, DayStar, Geokguk, StrengthState, TenGod};

/// Raw contribution of an exact favorable-element (yongsin) match.
pub const YONGSIN_EXACT_MATCH: f64 = 30.0;
/// Raw contribution of an exact unfavorable-element (kibsin) match.
pub const KIBSIN_EXACT_MATCH: f64 = -28.0;
/// Lowest total that still earns grade 0.
pub const GRADE0_THRESHOLD: f64 = 72.0;
/// Budget of the cross-verification adjustment in either direction.
pub const CROSS_BUDGET: f64 = 3.0;
/// Each side (saju, astrology) contributes at most this many points.
pub const SIDE_MAX: f64 = 50.0;

// ---------------------------
// ## Shared Records
// ---------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub category_max: f64,
    pub max_raw: f64,
}

impl CategoryTable {
    pub const fn new(category_max: f64, max_raw: f64) -> Self {
        CategoryTable {
            category_max,
            max_raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SibsinTable {
    pub bigyeon: f64,
    pub geobjae: f64,
    pub siksin: f64,
    pub sanggwan: f64,
    pub pyeonjae: f64,
    pub jeongjae: f64,
    pub pyeongwan: f64,
    pub jeonggwan: f64,
    pub pyeonin: f64,
    pub jeongin: f64,
}

impl SibsinTable {
    pub fn value(&self, god: TenGod) -> f64 {
        match god {
            TenGod::Bigyeon => self.bigyeon,
            TenGod::Geobjae => self.geobjae,
            TenGod::Siksin => self.siksin,
            TenGod::Sanggwan => self.sanggwan,
            TenGod::Pyeonjae => self.pyeonjae,
            TenGod::Jeongjae => self.jeongjae,
            TenGod::Pyeongwan => self.pyeongwan,
            TenGod::Jeonggwan => self.jeonggwan,
            TenGod::Pyeonin => self.pyeonin,
            TenGod::Jeongin => self.jeongin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationTable {
    pub six_combination: f64,
    pub triad: f64,
    pub clash: f64,
    pub punishment: f64,
    pub harm: f64,
}

impl RelationTable {
    pub fn value(&self, relation: BranchRelation) -> f64 {
        match relation {
            BranchRelation::SixCombination => self.six_combination,
            BranchRelation::Triad => self.triad,
            BranchRelation::Clash => self.clash,
            BranchRelation::Punishment => self.punishment,
            BranchRelation::Harm => self.harm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleConfig {
    pub scale: CategoryTable,
    pub sibsin: SibsinTable,
    pub relations: RelationTable,
}

impl CycleConfig {
    fn new(scale: CategoryTable, sibsin: [f64; 10], relations: [f64; 5]) -> Self {
        let [
            bigyeon, geobjae, siksin, sanggwan, pyeonjae, jeongjae, pyeongwan, jeonggwan, pyeonin,
            jeongin,
        ] = sibsin;
        let [six_combination, triad, clash, punishment, harm] = relations;
        CycleConfig {
            scale,
            sibsin: SibsinTable {
                bigyeon,
                geobjae,
                siksin,
                sanggwan,
                pyeonjae,
                jeongjae,
                pyeongwan,
                jeonggwan,
                pyeonin,
                jeongin,
            },
            relations: RelationTable {
                six_combination,
                triad,
                clash,
                punishment,
                harm,
            },
        }
    }

    pub fn daeun() -> Self {
        CycleConfig::new(
            CategoryTable::new(8.0, 12.0),
            [4.0, 2.0, -1.0, -4.0, 1.0, 2.0, -4.0, -2.0, 3.0, 5.0],
            [3.0, 3.0, -5.0, -4.0, -2.0],
        )
    }

    pub fn seun() -> Self {
        CycleConfig::new(
            CategoryTable::new(10.0, 16.0),
            [5.0, 2.0, -1.0, -5.0, 2.0, 3.0, -5.0, -2.0, 3.0, 6.0],
            [4.0, 4.0, -6.0, -5.0, -2.0],
        )
    }

    pub fn wolun() -> Self {
        CycleConfig::new(
            CategoryTable::new(10.0, 14.0),
            [4.0, 2.0, -1.0, -4.0, 2.0, 2.0, -4.0, -2.0, 2.0, 5.0],
            [3.0, 3.0, -5.0, -4.0, -2.0],
        )
    }

    pub fn iljin() -> Self {
        CycleConfig::new(
            CategoryTable::new(12.0, 20.0),
            [5.0, 2.0, -1.0, -5.0, 2.0, 3.0, -5.0, -2.0, 3.0, 6.0],
            [4.0, 3.0, -6.0, -5.0, -3.0],
        )
    }
}

// ---------------------------
// ## Saju Tables
// ---------------------------

/// Samjae outcomes. `with_nobleman` is the net of the base penalty and the
/// nobleman bonus, and is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamjaeConfig {
    pub base_penalty: f64,
    pub clash_penalty: f64,
    pub nobleman_bonus: f64,
}

impl Default for SamjaeConfig {
    fn default() -> Self {
        SamjaeConfig {
            base_penalty: -6.0,
            clash_penalty: -10.0,
            nobleman_bonus: 10.0,
        }
    }
}

impl SamjaeConfig {
    pub fn with_nobleman(&self) -> f64 {
        self.base_penalty + self.nobleman_bonus
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DayStarConfig {
    pub nobleman_day: f64,
    pub command_seat_day: f64,
    pub romance_star: f64,
    pub void_day: f64,
    pub resentment_star: f64,
}

impl Default for DayStarConfig {
    fn default() -> Self {
        DayStarConfig {
            nobleman_day: 5.0,
            command_seat_day: 4.0,
            romance_star: 2.0,
            void_day: -5.0,
            resentment_star: -3.0,
        }
    }
}

impl DayStarConfig {
    pub fn value(&self, star: DayStar) -> f64 {
        match star {
            DayStar::NoblemanDay => self.nobleman_day,
            DayStar::CommandSeatDay => self.command_seat_day,
            DayStar::RomanceStar => self.romance_star,
            DayStar::VoidDay => self.void_day,
            DayStar::ResentmentStar => self.resentment_star,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct YongsinConfig {
    pub scale: CategoryTable,
    pub favorable_exact: f64,
    pub unfavorable_exact: f64,
    pub generates_favorable: f64,
    pub generates_unfavorable: f64,
    /// Weight applied when only the day branch matches.
    pub branch_weight: f64,
}

impl Default for YongsinConfig {
    fn default() -> Self {
        YongsinConfig {
            scale: CategoryTable::new(10.0, 36.0),
            favorable_exact: YONGSIN_EXACT_MATCH,
            unfavorable_exact: KIBSIN_EXACT_MATCH,
            generates_favorable: 14.0,
            generates_unfavorable: -12.0,
            branch_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthRow {
    pub strong: f64,
    pub balanced: f64,
    pub weak: f64,
}

impl StrengthRow {
    const fn new(strong: f64, balanced: f64, weak: f64) -> Self {
        StrengthRow {
            strong,
            balanced,
            weak,
        }
    }

    pub fn value(&self, strength: StrengthState) -> f64 {
        match strength {
            StrengthState::Strong => self.strong,
            StrengthState::Balanced => self.balanced,
            StrengthState::Weak => self.weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeokgukConfig {
    /// Officer, wealth and output patterns.
    pub outward: StrengthRow,
    /// Seven-killings and hurting-officer patterns.
    pub volatile: StrengthRow,
    pub resource: StrengthRow,
    /// Command-seat and blade patterns.
    pub self_reliant: StrengthRow,
    pub follow: StrengthRow,
}

impl Default for GeokgukConfig {
    fn default() -> Self {
        GeokgukConfig {
            outward: StrengthRow::new(4.0, 2.0, -4.0),
            volatile: StrengthRow::new(4.0, 1.0, -5.0),
            resource: StrengthRow::new(-3.0, 2.0, 4.0),
            self_reliant: StrengthRow::new(-2.0, 1.0, 3.0),
            follow: StrengthRow::new(5.0, -4.0, 5.0),
        }
    }
}

impl GeokgukConfig {
    pub fn value(&self, pattern: Geokguk, strength: StrengthState) -> f64 {
        let row = match pattern {
            Geokguk::Jeonggwan | Geokguk::Jeongjae | Geokguk::Pyeonjae | Geokguk::Siksin => {
                &self.outward
            }
            Geokguk::Pyeongwan | Geokguk::Sanggwan => &self.volatile,
            Geokguk::Jeongin | Geokguk::Pyeonin => &self.resource,
            Geokguk::Geonrok | Geokguk::Yangin => &self.self_reliant,
            Geokguk::Jonggyeok => &self.follow,
        };
        row.value(strength)
    }
}

// ---------------------------
// ## Astrology Tables
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementRelationTable {
    pub same: f64,
    pub generates_me: f64,
    pub i_generate: f64,
    pub controls_me: f64,
    pub i_control: f64,
}

impl ElementRelationTable {
    pub fn value(&self, relation: ElementRelation) -> f64 {
        match relation {
            ElementRelation::Same => self.same,
            ElementRelation::GeneratesMe => self.generates_me,
            ElementRelation::IGenerate => self.i_generate,
            ElementRelation::ControlsMe => self.controls_me,
            ElementRelation::IControl => self.i_control,
        }
    }

    fn ordered(&self) -> [f64; 5] {
        [
            self.same,
            self.generates_me,
            self.i_generate,
            self.controls_me,
            self.i_control,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitConfig {
    pub scale: CategoryTable,
    pub relations: ElementRelationTable,
}

impl TransitConfig {
    pub fn sun() -> Self {
        TransitConfig {
            scale: CategoryTable::new(10.0, 6.0),
            relations: ElementRelationTable {
                same: 6.0,
                generates_me: 4.0,
                i_generate: 1.0,
                controls_me: -3.0,
                i_control: -5.0,
            },
        }
    }

    pub fn moon() -> Self {
        TransitConfig {
            scale: CategoryTable::new(8.0, 5.0),
            relations: ElementRelationTable {
                same: 5.0,
                generates_me: 3.0,
                i_generate: 1.0,
                controls_me: -2.0,
                i_control: -4.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AspectTable {
    pub conjunction: f64,
    pub sextile: f64,
    pub square: f64,
    pub trine: f64,
    pub opposition: f64,
}

impl AspectTable {
    pub fn value(&self, aspect: Aspect) -> f64 {
        match aspect {
            Aspect::Conjunction => self.conjunction,
            Aspect::Sextile => self.sextile,
            Aspect::Square => self.square,
            Aspect::Trine => self.trine,
            Aspect::Opposition => self.opposition,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanetTable {
    pub sun: f64,
    pub moon: f64,
    pub mercury: f64,
    pub venus: f64,
    pub mars: f64,
    pub jupiter: f64,
    pub saturn: f64,
    pub uranus: f64,
    pub neptune: f64,
    pub pluto: f64,
}

impl PlanetTable {
    pub fn value(&self, body: CelestialBody) -> f64 {
        match body {
            CelestialBody::Sun => self.sun,
            CelestialBody::Moon => self.moon,
            CelestialBody::Mercury => self.mercury,
            CelestialBody::Venus => self.venus,
            CelestialBody::Mars => self.mars,
            CelestialBody::Jupiter => self.jupiter,
            CelestialBody::Saturn => self.saturn,
            CelestialBody::Uranus => self.uranus,
            CelestialBody::Neptune => self.neptune,
            CelestialBody::Pluto => self.pluto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MajorPlanetsConfig {
    pub scale: CategoryTable,
    pub aspects: AspectTable,
    pub weights: PlanetTable,
    pub retrograde: PlanetTable,
    pub max_orb: f64,
}

impl Default for MajorPlanetsConfig {
    fn default() -> Self {
        MajorPlanetsConfig {
            scale: CategoryTable::new(15.0, 16.0),
            aspects: AspectTable {
                conjunction: 1.0,
                sextile: 2.0,
                square: -3.0,
                trine: 3.0,
                opposition: -3.0,
            },
            weights: PlanetTable {
                sun: 0.0,
                moon: 0.0,
                mercury: 0.6,
                venus: 0.8,
                mars: 1.0,
                jupiter: 1.3,
                saturn: 1.5,
                uranus: 1.7,
                neptune: 1.8,
                pluto: 2.0,
            },
            retrograde: PlanetTable {
                sun: 0.0,
                moon: 0.0,
                mercury: -3.0,
                venus: -2.0,
                mars: -2.0,
                jupiter: -1.0,
                saturn: -1.0,
                uranus: -0.5,
                neptune: -0.5,
                pluto: -0.5,
            },
            max_orb: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LunarPhaseConfig {
    pub scale: CategoryTable,
    pub new_moon: f64,
    pub waxing_crescent: f64,
    pub first_quarter: f64,
    pub waxing_gibbous: f64,
    pub full_moon: f64,
    pub waning_gibbous: f64,
    pub last_quarter: f64,
    pub waning_crescent: f64,
}

impl Default for LunarPhaseConfig {
    fn default() -> Self {
        LunarPhaseConfig {
            scale: CategoryTable::new(8.0, 5.0),
            new_moon: 0.5,
            waxing_crescent: 1.0,
            first_quarter: -2.0,
            waxing_gibbous: 2.0,
            full_moon: 5.0,
            waning_gibbous: 1.0,
            last_quarter: -2.0,
            waning_crescent: -0.5,
        }
    }
}

impl LunarPhaseConfig {
    pub fn value(&self, phase: LunarPhase) -> f64 {
        match phase {
            LunarPhase::NewMoon => self.new_moon,
            LunarPhase::WaxingCrescent => self.waxing_crescent,
            LunarPhase::FirstQuarter => self.first_quarter,
            LunarPhase::WaxingGibbous => self.waxing_gibbous,
            LunarPhase::FullMoon => self.full_moon,
            LunarPhase::WaningGibbous => self.waning_gibbous,
            LunarPhase::LastQuarter => self.last_quarter,
            LunarPhase::WaningCrescent => self.waning_crescent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarReturnConfig {
    pub scale: CategoryTable,
    pub peak: f64,
    pub window_days: f64,
}

impl Default for SolarReturnConfig {
    fn default() -> Self {
        SolarReturnConfig {
            scale: CategoryTable::new(9.0, 8.0),
            peak: 8.0,
            window_days: 7.0,
        }
    }
}

// ---------------------------
// ## Grader, Activity, Fusion
// ---------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// `normalize_to_category`: zero evidence lands on the category midpoint.
    Linear,
    /// `calculate_adjusted_score`: pessimistic 45% prior with amplified adjustments.
    Adjusted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradeThresholds {
    pub grade0: f64,
    pub grade1: f64,
    pub grade2: f64,
    pub grade3: f64,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        GradeThresholds {
            grade0: GRADE0_THRESHOLD,
            grade1: 60.0,
            grade2: 45.0,
            grade3: 32.0,
        }
    }
}

impl GradeThresholds {
    pub fn ordered(&self) -> [f64; 4] {
        [self.grade0, self.grade1, self.grade2, self.grade3]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrossConfig {
    pub positive_threshold: f64,
    pub negative_threshold: f64,
    pub bonus: f64,
    pub penalty: f64,
}

impl Default for CrossConfig {
    fn default() -> Self {
        CrossConfig {
            positive_threshold: 5.0,
            negative_threshold: -5.0,
            bonus: 3.0,
            penalty: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraderConfig {
    pub thresholds: GradeThresholds,
    pub cross: CrossConfig,
    pub normalization: NormalizationMode,
}

impl Default for GraderConfig {
    fn default() -> Self {
        GraderConfig {
            thresholds: GradeThresholds::default(),
            cross: CrossConfig::default(),
            normalization: NormalizationMode::Linear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivityConfig {
    pub baseline: f64,
    pub void_penalty: f64,
    pub star_bonus: f64,
    pub star_penalty: f64,
    pub affinity_bonus: f64,
    pub affinity_penalty: f64,
    pub yongsin_bonus: f64,
    pub kibsin_penalty: f64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        ActivityConfig {
            baseline: 50.0,
            void_penalty: -15.0,
            star_bonus: 8.0,
            star_penalty: -8.0,
            affinity_bonus: 6.0,
            affinity_penalty: -6.0,
            yongsin_bonus: 5.0,
            kibsin_penalty: -5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BandThresholds {
    pub strength: f64,
    pub opportunity: f64,
    pub balance: f64,
    pub caution: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        BandThresholds {
            strength: GRADE0_THRESHOLD,
            opportunity: 60.0,
            balance: 45.0,
            caution: 32.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FusionConfig {
    pub top_n: usize,
    pub bands: BandThresholds,
    /// Points per unit of summed cell contribution around the neutral 50.
    pub score_scale: f64,
    /// Share of the score kept at zero confidence.
    pub confidence_floor: f64,
    pub confidence_base: f64,
    pub confidence_per_source: f64,
    pub confidence_max_sources: usize,
    pub agreement_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            top_n: 10,
            bands: BandThresholds::default(),
            score_scale: 4.0,
            confidence_floor: 0.6,
            confidence_base: 0.35,
            confidence_per_source: 0.1,
            confidence_max_sources: 4,
            agreement_weight: 0.25,
        }
    }
}

// ---------------------------
// ## Root Configuration
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub daeun: CycleConfig,
    pub seun: CycleConfig,
    pub wolun: CycleConfig,
    pub iljin: CycleConfig,
    pub samjae: SamjaeConfig,
    pub day_stars: DayStarConfig,
    pub yongsin: YongsinConfig,
    pub geokguk: GeokgukConfig,
    pub transit_sun: TransitConfig,
    pub transit_moon: TransitConfig,
    pub major_planets: MajorPlanetsConfig,
    pub lunar_phase: LunarPhaseConfig,
    pub solar_return: SolarReturnConfig,
    pub grader: GraderConfig,
    pub activity: ActivityConfig,
    pub fusion: FusionConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            daeun: CycleConfig::daeun(),
            seun: CycleConfig::seun(),
            wolun: CycleConfig::wolun(),
            iljin: CycleConfig::iljin(),
            samjae: SamjaeConfig::default(),
            day_stars: DayStarConfig::default(),
            yongsin: YongsinConfig::default(),
            geokguk: GeokgukConfig::default(),
            transit_sun: TransitConfig::sun(),
            transit_moon: TransitConfig::moon(),
            major_planets: MajorPlanetsConfig::default(),
            lunar_phase: LunarPhaseConfig::default(),
            solar_return: SolarReturnConfig::default(),
            grader: GraderConfig::default(),
            activity: ActivityConfig::default(),
            fusion: FusionConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Parses a (possibly partial) TOML document. Every key left out, at any
    /// depth, keeps its default; the four cycle tables keep their own defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let overrides: toml::Table = toml::from_str(source)?;
        let mut merged = match toml::Value::try_from(ScoringConfig::default())? {
            toml::Value::Table(table) => table,
            _ => toml::Table::new(),
        };
        merge_tables(&mut merged, overrides);
        let config: ScoringConfig = toml::Value::Table(merged).try_into()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn table(&self, category: Category) -> CategoryTable {
        match category {
            Category::Daeun => self.daeun.scale,
            Category::Seun => self.seun.scale,
            Category::Wolun => self.wolun.scale,
            Category::Iljin => self.iljin.scale,
            Category::Yongsin => self.yongsin.scale,
            Category::TransitSun => self.transit_sun.scale,
            Category::TransitMoon => self.transit_moon.scale,
            Category::MajorPlanets => self.major_planets.scale,
            Category::LunarPhase => self.lunar_phase.scale,
            Category::SolarReturn => self.solar_return.scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for category in Category::ALL {
            let table = self.table(category);
            if !(table.max_raw > 0.0) || !(table.category_max > 0.0) {
                return Err(invalid(format!(
                    "{category}: category_max and max_raw must be positive"
                )));
            }
        }

        for (side, categories) in [("saju", Category::SAJU), ("astro", Category::ASTRO)] {
            let sum: f64 = categories.iter().map(|c| self.table(*c).category_max).sum();
            if (sum - SIDE_MAX).abs() > 1e-9 {
                return Err(invalid(format!(
                    "{side} category maxima sum to {sum}, expected {SIDE_MAX}"
                )));
            }
        }

        let thresholds = self.grader.thresholds.ordered();
        if thresholds.windows(2).any(|w| w[0] <= w[1])
            || thresholds.iter().any(|t| !(0.0..=100.0).contains(t))
        {
            return Err(invalid(format!(
                "grade thresholds must descend within [0, 100], got {thresholds:?}"
            )));
        }

        let cross = &self.grader.cross;
        if cross.positive_threshold <= cross.negative_threshold {
            return Err(invalid(
                "cross positive_threshold must exceed negative_threshold".to_string(),
            ));
        }
        let budget = 0.0..=CROSS_BUDGET;
        if !budget.contains(&cross.bonus) || !budget.contains(&cross.penalty) {
            return Err(invalid(format!(
                "cross bonus and penalty must lie within [0, {CROSS_BUDGET}]"
            )));
        }

        for (name, table) in [
            ("transit_sun", &self.transit_sun.relations),
            ("transit_moon", &self.transit_moon.relations),
        ] {
            if table.ordered().windows(2).any(|w| w[0] < w[1]) {
                return Err(invalid(format!(
                    "{name} relation scores must not increase from same to i_control"
                )));
            }
        }

        if !(0.0..=100.0).contains(&self.activity.baseline) {
            return Err(invalid("activity baseline must lie within [0, 100]".to_string()));
        }

        let fusion = &self.fusion;
        let bands = [
            fusion.bands.strength,
            fusion.bands.opportunity,
            fusion.bands.balance,
            fusion.bands.caution,
        ];
        if fusion.top_n == 0 || bands.windows(2).any(|w| w[0] <= w[1]) {
            return Err(invalid(
                "fusion top_n must be positive and bands must descend".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&fusion.confidence_floor) {
            return Err(invalid("fusion confidence_floor must lie within [0, 1]".to_string()));
        }

        Ok(())
    }
}

/// Overlays `overrides` onto `base`, descending into tables present in both.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        if let toml::Value::Table(table) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, table);
                continue;
            }
            base.insert(key, toml::Value::Table(table));
        } else {
            base.insert(key, value);
        }
    }
}

fn invalid(message: String) -> EngineError {
    EngineError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        ScoringConfig::default().validate().unwrap();
    }

    #[test]
    fn yongsin_asymmetry_is_preserved() {
        let config = ScoringConfig::default();
        assert_relative_eq!(config.yongsin.favorable_exact, 30.0);
        assert_relative_eq!(config.yongsin.unfavorable_exact, -28.0);
        assert!(config.yongsin.favorable_exact.abs() != config.yongsin.unfavorable_exact.abs());
    }

    #[test]
    fn grade0_threshold_is_72() {
        assert_relative_eq!(ScoringConfig::default().grader.thresholds.grade0, 72.0);
    }

    #[test]
    fn samjae_nobleman_flips_sign() {
        let samjae = SamjaeConfig::default();
        assert!(samjae.base_penalty < 0.0);
        assert!(samjae.clash_penalty < samjae.base_penalty);
        assert!(samjae.with_nobleman() > 0.0);
    }

    #[test]
    fn fastest_planet_carries_heaviest_retrograde_penalty() {
        let retrograde = MajorPlanetsConfig::default().retrograde;
        let mercury = retrograde.value(CelestialBody::Mercury);
        for body in CelestialBody::ALL {
            assert!(mercury <= retrograde.value(body));
        }
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ScoringConfig::from_toml_str(
            r#"
            [grader]
            normalization = "adjusted"

            [activity]
            baseline = 55.0
            "#,
        )
        .unwrap();
        assert_eq!(config.grader.normalization, NormalizationMode::Adjusted);
        assert_relative_eq!(config.activity.baseline, 55.0);
        assert_relative_eq!(config.activity.void_penalty, -15.0);
        assert_eq!(config.daeun, CycleConfig::daeun());
    }

    #[test]
    fn partial_nested_tables_keep_their_own_defaults() {
        let config = ScoringConfig::from_toml_str(
            r#"
            [daeun.relations]
            clash = -7.0

            [transit_moon.relations]
            same = 4.5

            [geokguk.follow]
            balanced = -3.0
            "#,
        )
        .unwrap();
        let defaults = ScoringConfig::default();
        assert_relative_eq!(config.daeun.relations.clash, -7.0);
        assert_relative_eq!(config.daeun.relations.harm, defaults.daeun.relations.harm);
        assert_eq!(config.daeun.sibsin, defaults.daeun.sibsin);
        assert_eq!(config.seun, defaults.seun);
        assert_relative_eq!(config.transit_moon.relations.same, 4.5);
        assert_relative_eq!(config.transit_moon.relations.i_control, -4.0);
        assert_eq!(config.transit_sun, TransitConfig::sun());
        assert_relative_eq!(config.geokguk.follow.balanced, -3.0);
        assert_relative_eq!(config.geokguk.follow.strong, 5.0);
    }

    #[test]
    fn inverted_cross_thresholds_are_rejected() {
        let result = ScoringConfig::from_toml_str(
            r#"
            [grader.cross]
            positive_threshold = -1.0
            negative_threshold = 1.0
            "#,
        );
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn unbalanced_side_maxima_are_rejected() {
        let result = ScoringConfig::from_toml_str(
            r#"
            [lunar_phase.scale]
            category_max = 20.0
            max_raw = 5.0
            "#,
        );
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn unknown_keys_are_a_parse_error() {
        let result = ScoringConfig::from_toml_str("[grader]\nthreshold = 3\n");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fusion]\ntop_n = 3").unwrap();
        let config = ScoringConfig::load(file.path()).unwrap();
        assert_eq!(config.fusion.top_n, 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = ScoringConfig::load("/nonexistent/destiny/scoring.toml");
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}
