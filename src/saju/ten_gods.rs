use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::Stem;
use crate::element::ElementRelation;
use crate::error::{EngineError, Result};

// ---------------------------
// ## Ten Gods (sibsin)
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenGod {
    Bigyeon,
    Geobjae,
    Siksin,
    Sanggwan,
    Pyeonjae,
    Jeongjae,
    Pyeongwan,
    Jeonggwan,
    Pyeonin,
    Jeongin,
}

impl TenGod {
    pub const ALL: [TenGod; 10] = [
        TenGod::Bigyeon,
        TenGod::Geobjae,
        TenGod::Siksin,
        TenGod::Sanggwan,
        TenGod::Pyeonjae,
        TenGod::Jeongjae,
        TenGod::Pyeongwan,
        TenGod::Jeonggwan,
        TenGod::Pyeonin,
        TenGod::Jeongin,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Ten god of `other` seen from the day master `day_master`.
    pub fn between(day_master: Stem, other: Stem) -> TenGod {
        let same_polarity = day_master.yin_yang() == other.yin_yang();
        let pick = |same: TenGod, different: TenGod| if same_polarity { same } else { different };
        match day_master.element().relation_to(other.element()) {
            ElementRelation::Same => pick(TenGod::Bigyeon, TenGod::Geobjae),
            ElementRelation::IGenerate => pick(TenGod::Siksin, TenGod::Sanggwan),
            ElementRelation::IControl => pick(TenGod::Pyeonjae, TenGod::Jeongjae),
            ElementRelation::ControlsMe => pick(TenGod::Pyeongwan, TenGod::Jeonggwan),
            ElementRelation::GeneratesMe => pick(TenGod::Pyeonin, TenGod::Jeongin),
        }
    }

    pub fn group(self) -> TenGodGroup {
        match self {
            TenGod::Bigyeon | TenGod::Geobjae => TenGodGroup::Peer,
            TenGod::Siksin | TenGod::Sanggwan => TenGodGroup::Expression,
            TenGod::Pyeonjae | TenGod::Jeongjae => TenGodGroup::Wealth,
            TenGod::Pyeongwan | TenGod::Jeonggwan => TenGodGroup::Status,
            TenGod::Pyeonin | TenGod::Jeongin => TenGodGroup::Knowledge,
        }
    }

    /// The same-polarity member of each pair (bigyeon, siksin, pyeonjae, pyeongwan, pyeonin).
    pub fn is_partial(self) -> bool {
        self.index() % 2 == 0
    }
}

impl FromStr for TenGod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let god = match s.trim().to_lowercase().as_str() {
            "bigyeon" | "비견" | "比肩" | "peer_a" => TenGod::Bigyeon,
            "geobjae" | "겁재" | "劫財" | "peer_b" => TenGod::Geobjae,
            "siksin" | "식신" | "食神" | "expression_a" => TenGod::Siksin,
            "sanggwan" | "상관" | "傷官" | "expression_b" => TenGod::Sanggwan,
            "pyeonjae" | "편재" | "偏財" | "wealth_a" => TenGod::Pyeonjae,
            "jeongjae" | "정재" | "正財" | "wealth_b" => TenGod::Jeongjae,
            "pyeongwan" | "편관" | "偏官" | "status_a" => TenGod::Pyeongwan,
            "jeonggwan" | "정관" | "正官" | "status_b" => TenGod::Jeonggwan,
            "pyeonin" | "편인" | "偏印" | "knowledge_a" => TenGod::Pyeonin,
            "jeongin" | "정인" | "正印" | "knowledge_b" => TenGod::Jeongin,
            _ => return Err(EngineError::unknown("ten god", s)),
        };
        Ok(god)
    }
}

impl fmt::Display for TenGod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TenGod::Bigyeon => "bigyeon",
            TenGod::Geobjae => "geobjae",
            TenGod::Siksin => "siksin",
            TenGod::Sanggwan => "sanggwan",
            TenGod::Pyeonjae => "pyeonjae",
            TenGod::Jeongjae => "jeongjae",
            TenGod::Pyeongwan => "pyeongwan",
            TenGod::Jeonggwan => "jeonggwan",
            TenGod::Pyeonin => "pyeonin",
            TenGod::Jeongin => "jeongin",
        };
        write!(f, "{}", name)
    }
}

/// The five super-categories the ten gods pair into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenGodGroup {
    Peer,
    Expression,
    Wealth,
    Status,
    Knowledge,
}

impl TenGodGroup {
    pub const ALL: [TenGodGroup; 5] = [
        TenGodGroup::Peer,
        TenGodGroup::Expression,
        TenGodGroup::Wealth,
        TenGodGroup::Status,
        TenGodGroup::Knowledge,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The group whose element suppresses this one (peers rob wealth, wealth
    /// spoils knowledge, knowledge blocks expression, expression wounds status,
    /// status restrains peers).
    pub fn controlled_by(self) -> TenGodGroup {
        TenGodGroup::ALL[(self.index() + 3) % 5]
    }
}

impl fmt::Display for TenGodGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TenGodGroup::Peer => "peer",
            TenGodGroup::Expression => "expression",
            TenGodGroup::Wealth => "wealth",
            TenGodGroup::Status => "status",
            TenGodGroup::Knowledge => "knowledge",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------
// ## Distributions
// ---------------------------

/// Raw ten-god counts over the four pillars.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenGodDistribution {
    counts: BTreeMap<TenGod, u32>,
}

impl TenGodDistribution {
    /// Builds a distribution from provider labels. Unknown labels are rejected here,
    /// at ingestion, so the scorers only ever see typed ten gods.
    pub fn from_labels<'a, I>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut distribution = TenGodDistribution::default();
        for (label, count) in labels {
            distribution.add(label.parse()?, count);
        }
        Ok(distribution)
    }

    pub fn add(&mut self, god: TenGod, count: u32) {
        if count > 0 {
            let entry = self.counts.entry(god).or_insert(0);
            *entry = entry.saturating_add(count);
        }
    }

    pub fn count(&self, god: TenGod) -> u32 {
        self.counts.get(&god).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().fold(0, |acc, c| acc.saturating_add(*c))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TenGod, u32)> + '_ {
        self.counts.iter().map(|(g, c)| (*g, *c))
    }

    pub fn grouped(&self) -> GroupedTenGods {
        let mut groups: BTreeMap<TenGodGroup, BTreeMap<TenGod, u32>> = BTreeMap::new();
        for (god, count) in self.iter() {
            groups.entry(god.group()).or_default().insert(god, count);
        }
        GroupedTenGods { groups }
    }
}

/// Ten-god counts folded into their five super-categories. Only groups with at
/// least one member are present, so an empty distribution groups to nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedTenGods {
    groups: BTreeMap<TenGodGroup, BTreeMap<TenGod, u32>>,
}

impl GroupedTenGods {
    pub fn count(&self, group: TenGodGroup) -> u32 {
        self.groups
            .get(&group)
            .map(|members| members.values().fold(0, |acc: u32, c| acc.saturating_add(*c)))
            .unwrap_or(0)
    }

    pub fn members(&self, group: TenGodGroup) -> impl Iterator<Item = (TenGod, u32)> + '_ {
        self.groups
            .get(&group)
            .into_iter()
            .flat_map(|members| members.iter().map(|(g, c)| (*g, *c)))
    }

    pub fn total(&self) -> u32 {
        self.groups
            .keys()
            .fold(0, |acc, g| acc.saturating_add(self.count(*g)))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TenGodGroup, u32)> + '_ {
        self.groups.keys().map(|g| (*g, self.count(*g)))
    }

    /// Largest group, ties resolved toward the earlier group.
    pub fn dominant(&self) -> Option<TenGodGroup> {
        let mut best: Option<(TenGodGroup, u32)> = None;
        for (group, count) in self.iter() {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((group, count));
            }
        }
        best.map(|(g, _)| g)
    }
}
