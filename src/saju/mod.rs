//! Four Pillars chart facts.
//!
//! The raw pillar computation lives with the chart provider. This module only
//! models what the provider hands over and derives the distributions the
//! scorers read (ten gods, element balance, relations, special stars).

pub mod relations;
pub mod shinsal;
pub mod ten_gods;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::element::{Element, YinYang};
use crate::error::{EngineError, Result};

pub use relations::BranchRelation;
pub use shinsal::{DayStar, Shinsal, ShinsalEntry};
pub use ten_gods::{GroupedTenGods, TenGod, TenGodDistribution, TenGodGroup};

// ---------------------------
// ## Stems and Branches
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stem {
    Gap = 0,
    Eul,
    Byeong,
    Jeong,
    Mu,
    Gi,
    Gyeong,
    Sin,
    Im,
    Gye,
}

impl Stem {
    pub const ALL: [Stem; 10] = [
        Stem::Gap,
        Stem::Eul,
        Stem::Byeong,
        Stem::Jeong,
        Stem::Mu,
        Stem::Gi,
        Stem::Gyeong,
        Stem::Sin,
        Stem::Im,
        Stem::Gye,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn element(self) -> Element {
        Element::ALL[self.index() / 2]
    }

    pub fn yin_yang(self) -> YinYang {
        if self.index() % 2 == 0 {
            YinYang::Yang
        } else {
            YinYang::Yin
        }
    }
}

impl FromStr for Stem {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let stem = match s.trim().to_lowercase().as_str() {
            "gap" | "갑" | "甲" => Stem::Gap,
            "eul" | "을" | "乙" => Stem::Eul,
            "byeong" | "병" | "丙" => Stem::Byeong,
            "jeong" | "정" | "丁" => Stem::Jeong,
            "mu" | "무" | "戊" => Stem::Mu,
            "gi" | "기" | "己" => Stem::Gi,
            "gyeong" | "경" | "庚" => Stem::Gyeong,
            "sin" | "신" | "辛" => Stem::Sin,
            "im" | "임" | "壬" => Stem::Im,
            "gye" | "계" | "癸" => Stem::Gye,
            _ => return Err(EngineError::unknown("stem", s)),
        };
        Ok(stem)
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stem::Gap => "gap",
            Stem::Eul => "eul",
            Stem::Byeong => "byeong",
            Stem::Jeong => "jeong",
            Stem::Mu => "mu",
            Stem::Gi => "gi",
            Stem::Gyeong => "gyeong",
            Stem::Sin => "sin",
            Stem::Im => "im",
            Stem::Gye => "gye",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Ja = 0,
    Chuk,
    In,
    Myo,
    Jin,
    Sa,
    O,
    Mi,
    Sin,
    Yu,
    Sul,
    Hae,
}

impl Branch {
    pub const ALL: [Branch; 12] = [
        Branch::Ja,
        Branch::Chuk,
        Branch::In,
        Branch::Myo,
        Branch::Jin,
        Branch::Sa,
        Branch::O,
        Branch::Mi,
        Branch::Sin,
        Branch::Yu,
        Branch::Sul,
        Branch::Hae,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Branch {
        Branch::ALL[index % 12]
    }

    /// Principal hidden stem; a branch behaves like this stem for ten-god purposes.
    pub fn main_stem(self) -> Stem {
        match self {
            Branch::Ja => Stem::Gye,
            Branch::Chuk => Stem::Gi,
            Branch::In => Stem::Gap,
            Branch::Myo => Stem::Eul,
            Branch::Jin => Stem::Mu,
            Branch::Sa => Stem::Byeong,
            Branch::O => Stem::Jeong,
            Branch::Mi => Stem::Gi,
            Branch::Sin => Stem::Gyeong,
            Branch::Yu => Stem::Sin,
            Branch::Sul => Stem::Mu,
            Branch::Hae => Stem::Im,
        }
    }

    pub fn element(self) -> Element {
        self.main_stem().element()
    }
}

impl FromStr for Branch {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let branch = match s.trim().to_lowercase().as_str() {
            "ja" | "자" | "子" => Branch::Ja,
            "chuk" | "축" | "丑" => Branch::Chuk,
            "in" | "인" | "寅" => Branch::In,
            "myo" | "묘" | "卯" => Branch::Myo,
            "jin" | "진" | "辰" => Branch::Jin,
            "sa" | "사" | "巳" => Branch::Sa,
            "o" | "오" | "午" => Branch::O,
            "mi" | "미" | "未" => Branch::Mi,
            "sin" | "shin" | "신" | "申" => Branch::Sin,
            "yu" | "유" | "酉" => Branch::Yu,
            "sul" | "술" | "戌" => Branch::Sul,
            "hae" | "해" | "亥" => Branch::Hae,
            _ => return Err(EngineError::unknown("branch", s)),
        };
        Ok(branch)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Branch::Ja => "ja",
            Branch::Chuk => "chuk",
            Branch::In => "in",
            Branch::Myo => "myo",
            Branch::Jin => "jin",
            Branch::Sa => "sa",
            Branch::O => "o",
            Branch::Mi => "mi",
            Branch::Sin => "sin",
            Branch::Yu => "yu",
            Branch::Sul => "sul",
            Branch::Hae => "hae",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pillar {
    pub stem: Stem,
    pub branch: Branch,
}

impl Pillar {
    pub fn new(stem: Stem, branch: Branch) -> Self {
        Pillar { stem, branch }
    }

    /// Parses a two-part label such as `"gap-ja"` or `"갑자"`.
    pub fn parse(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        if let Some((stem, branch)) = trimmed.split_once(&['-', ' ', '_'][..]) {
            return Ok(Pillar::new(stem.parse()?, branch.parse()?));
        }
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(s), Some(b), None) => Ok(Pillar::new(
                s.to_string().parse()?,
                b.to_string().parse()?,
            )),
            _ => Err(EngineError::unknown("pillar", label)),
        }
    }

    /// Position of this pillar in the sixty-pillar cycle, or `None` for a
    /// stem/branch pair of mismatched polarity.
    pub fn cycle_index(self) -> Option<usize> {
        (0..60).find(|n| n % 10 == self.stem.index() && n % 12 == self.branch.index())
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.stem, self.branch)
    }
}

// ---------------------------
// ## Chart Classification
// ---------------------------

/// Day-master strength as classified by the chart provider.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthState {
    Strong,
    Balanced,
    Weak,
}

/// Structural pattern (geokguk).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geokguk {
    Jeonggwan,
    Pyeongwan,
    Jeongjae,
    Pyeonjae,
    Siksin,
    Sanggwan,
    Jeongin,
    Pyeonin,
    Geonrok,
    Yangin,
    Jonggyeok,
}

impl FromStr for Geokguk {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let pattern = match s.trim().to_lowercase().trim_end_matches("gyeok") {
            "jeonggwan" | "정관" => Geokguk::Jeonggwan,
            "pyeongwan" | "chilsal" | "편관" => Geokguk::Pyeongwan,
            "jeongjae" | "정재" => Geokguk::Jeongjae,
            "pyeonjae" | "편재" => Geokguk::Pyeonjae,
            "siksin" | "식신" => Geokguk::Siksin,
            "sanggwan" | "상관" => Geokguk::Sanggwan,
            "jeongin" | "정인" => Geokguk::Jeongin,
            "pyeonin" | "편인" => Geokguk::Pyeonin,
            "geonrok" | "건록" => Geokguk::Geonrok,
            "yangin" | "양인" => Geokguk::Yangin,
            "jong" | "종격" => Geokguk::Jonggyeok,
            _ => return Err(EngineError::unknown("pattern", s)),
        };
        Ok(pattern)
    }
}

impl fmt::Display for Geokguk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Geokguk::Jeonggwan => "jeonggwan",
            Geokguk::Pyeongwan => "pyeongwan",
            Geokguk::Jeongjae => "jeongjae",
            Geokguk::Pyeonjae => "pyeonjae",
            Geokguk::Siksin => "siksin",
            Geokguk::Sanggwan => "sanggwan",
            Geokguk::Jeongin => "jeongin",
            Geokguk::Pyeonin => "pyeonin",
            Geokguk::Geonrok => "geonrok",
            Geokguk::Yangin => "yangin",
            Geokguk::Jonggyeok => "jonggyeok",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for StrengthState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            StrengthState::Strong => "strong",
            StrengthState::Balanced => "balanced",
            StrengthState::Weak => "weak",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SajuChart {
    pub year: Pillar,
    pub month: Pillar,
    pub day: Pillar,
    /// Unknown birth hour leaves this empty; it then contributes nothing.
    pub hour: Option<Pillar>,
    pub yongsin: Option<Element>,
    pub kibsin: Option<Element>,
    pub pattern: Option<Geokguk>,
    pub strength: StrengthState,
}

impl SajuChart {
    pub fn day_master(&self) -> Stem {
        self.day.stem
    }

    pub fn pillars(&self) -> impl Iterator<Item = Pillar> + '_ {
        [Some(self.year), Some(self.month), Some(self.day), self.hour]
            .into_iter()
            .flatten()
    }

    pub fn branches(&self) -> impl Iterator<Item = Branch> + '_ {
        self.pillars().map(|p| p.branch)
    }

    /// Ten gods of every stem and branch except the day master itself.
    pub fn ten_god_distribution(&self) -> TenGodDistribution {
        let dm = self.day_master();
        let mut distribution = TenGodDistribution::default();
        for (position, pillar) in self.pillars().enumerate() {
            // position 2 is the day pillar; its stem is the day master
            if position != 2 {
                distribution.add(TenGod::between(dm, pillar.stem), 1);
            }
            distribution.add(TenGod::between(dm, pillar.branch.main_stem()), 1);
        }
        distribution
    }

    /// Element counts over all stems and branches, day master included.
    pub fn element_balance(&self) -> BTreeMap<Element, u32> {
        let mut balance: BTreeMap<Element, u32> = Element::ALL.iter().map(|e| (*e, 0)).collect();
        for pillar in self.pillars() {
            *balance.entry(pillar.stem.element()).or_insert(0) += 1;
            *balance.entry(pillar.branch.element()).or_insert(0) += 1;
        }
        balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_chart;

    #[test]
    fn stem_elements_and_polarity() {
        assert_eq!(Stem::Gap.element(), Element::Wood);
        assert_eq!(Stem::Gye.element(), Element::Water);
        assert_eq!(Stem::Gyeong.yin_yang(), YinYang::Yang);
        assert_eq!(Stem::Sin.yin_yang(), YinYang::Yin);
    }

    #[test]
    fn labels_parse_in_romanized_and_hangul_form() {
        assert_eq!("Byeong".parse::<Stem>().unwrap(), Stem::Byeong);
        assert_eq!("병".parse::<Stem>().unwrap(), Stem::Byeong);
        assert_eq!("shin".parse::<Branch>().unwrap(), Branch::Sin);
        assert!(matches!(
            "zeta".parse::<Stem>(),
            Err(EngineError::UnknownLabel { kind: "stem", .. })
        ));
    }

    #[test]
    fn pillar_parsing() {
        assert_eq!(Pillar::parse("gap-ja").unwrap(), Pillar::new(Stem::Gap, Branch::Ja));
        assert_eq!(Pillar::parse("갑자").unwrap(), Pillar::new(Stem::Gap, Branch::Ja));
        assert!(Pillar::parse("gap").is_err());
    }

    #[test]
    fn sexagenary_index() {
        assert_eq!(Pillar::new(Stem::Gap, Branch::Ja).cycle_index(), Some(0));
        assert_eq!(Pillar::new(Stem::Gye, Branch::Hae).cycle_index(), Some(59));
        assert_eq!(Pillar::new(Stem::Gap, Branch::Chuk).cycle_index(), None);
    }

    #[test]
    fn distribution_covers_seven_positions_with_hour() {
        let chart = sample_chart();
        assert_eq!(chart.ten_god_distribution().total(), 7);

        let no_hour = SajuChart { hour: None, ..chart };
        assert_eq!(no_hour.ten_god_distribution().total(), 5);
    }

    #[test]
    fn element_balance_counts_all_characters() {
        let balance = sample_chart().element_balance();
        assert_eq!(balance.values().sum::<u32>(), 8);
        assert_eq!(balance[&Element::Fire], 3);
    }
}
