use serde::{Deserialize, Serialize};
use std::fmt;

use super::Branch;

/// Harmonious and adversarial relations between two earthly branches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchRelation {
    SixCombination,
    Triad,
    Clash,
    Punishment,
    Harm,
}

impl BranchRelation {
    pub fn is_harmonious(self) -> bool {
        matches!(self, BranchRelation::SixCombination | BranchRelation::Triad)
    }
}

impl fmt::Display for BranchRelation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            BranchRelation::SixCombination => "six_combination",
            BranchRelation::Triad => "triad",
            BranchRelation::Clash => "clash",
            BranchRelation::Punishment => "punishment",
            BranchRelation::Harm => "harm",
        };
        write!(f, "{}", name)
    }
}

const SIX_COMBINATIONS: [(Branch, Branch); 6] = [
    (Branch::Ja, Branch::Chuk),
    (Branch::In, Branch::Hae),
    (Branch::Myo, Branch::Sul),
    (Branch::Jin, Branch::Yu),
    (Branch::Sa, Branch::Sin),
    (Branch::O, Branch::Mi),
];

pub(crate) const TRIADS: [[Branch; 3]; 4] = [
    [Branch::Sin, Branch::Ja, Branch::Jin],
    [Branch::Hae, Branch::Myo, Branch::Mi],
    [Branch::In, Branch::O, Branch::Sul],
    [Branch::Sa, Branch::Yu, Branch::Chuk],
];

const PUNISHMENT_GROUPS: [&[Branch]; 3] = [
    &[Branch::In, Branch::Sa, Branch::Sin],
    &[Branch::Chuk, Branch::Sul, Branch::Mi],
    &[Branch::Ja, Branch::Myo],
];

const SELF_PUNISHMENT: [Branch; 4] = [Branch::Jin, Branch::O, Branch::Yu, Branch::Hae];

const HARMS: [(Branch, Branch); 6] = [
    (Branch::Ja, Branch::Mi),
    (Branch::Chuk, Branch::O),
    (Branch::In, Branch::Sa),
    (Branch::Myo, Branch::Jin),
    (Branch::Sin, Branch::Hae),
    (Branch::Yu, Branch::Sul),
];

fn pair_in(pairs: &[(Branch, Branch)], a: Branch, b: Branch) -> bool {
    pairs
        .iter()
        .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

/// Triad the branch belongs to.
pub(crate) fn triad_of(branch: Branch) -> &'static [Branch; 3] {
    TRIADS
        .iter()
        .find(|t| t.contains(&branch))
        .unwrap_or(&TRIADS[0])
}

impl Branch {
    /// Every relation `self` forms with `other`, in a fixed order.
    pub fn relations_with(self, other: Branch) -> Vec<BranchRelation> {
        let mut relations = Vec::new();

        if pair_in(&SIX_COMBINATIONS, self, other) {
            relations.push(BranchRelation::SixCombination);
        }
        if self != other && triad_of(self).contains(&other) {
            relations.push(BranchRelation::Triad);
        }
        if (self.index() + 6) % 12 == other.index() {
            relations.push(BranchRelation::Clash);
        }
        let group_punishment = self != other
            && PUNISHMENT_GROUPS
                .iter()
                .any(|group| group.contains(&self) && group.contains(&other));
        if group_punishment || (self == other && SELF_PUNISHMENT.contains(&self)) {
            relations.push(BranchRelation::Punishment);
        }
        if pair_in(&HARMS, self, other) {
            relations.push(BranchRelation::Harm);
        }

        relations
    }
}

/// Relations a transiting branch forms with any branch of a natal set, deduplicated.
pub fn relations_against<I>(branch: Branch, natal: I) -> Vec<BranchRelation>
where
    I: IntoIterator<Item = Branch>,
{
    let mut relations: Vec<BranchRelation> = natal
        .into_iter()
        .flat_map(|n| branch.relations_with(n))
        .collect();
    relations.sort();
    relations.dedup();
    relations
}
