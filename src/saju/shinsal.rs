//! Special stars (shinsal), void branches and the three-year samjae cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::relations::triad_of;
use super::{Branch, Pillar, SajuChart, Stem};
use crate::activity::ActivityType::{self, Career, General, Health, Love, Study, Travel, Wealth};

// ---------------------------
// ## Special Stars
// ---------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shinsal {
    CheonEul,
    Munchang,
    Dohwa,
    Yeokma,
    Hwagae,
    Geumyeo,
    Cheondeok,
    Baekho,
    Yangin,
    Gwimun,
    /// A provider key this engine does not know. Scores as neutral.
    Other(String),
}

impl Shinsal {
    /// Maps a provider key to a star. Unrecognized keys become `Other`, never an error.
    pub fn from_key(key: &str) -> Shinsal {
        match key.trim().to_lowercase().replace(&['-', ' '][..], "_").as_str() {
            "cheon_eul" | "cheoneul" | "천을귀인" | "nobleman" => Shinsal::CheonEul,
            "munchang" | "문창귀인" | "literary" => Shinsal::Munchang,
            "dohwa" | "도화살" | "peach_blossom" | "romance" => Shinsal::Dohwa,
            "yeokma" | "역마살" | "travel_horse" => Shinsal::Yeokma,
            "hwagae" | "화개살" | "canopy" => Shinsal::Hwagae,
            "geumyeo" | "금여록" | "golden_carriage" => Shinsal::Geumyeo,
            "cheondeok" | "천덕귀인" | "heavenly_virtue" => Shinsal::Cheondeok,
            "baekho" | "백호살" | "white_tiger" => Shinsal::Baekho,
            "yangin" | "양인살" | "blade" => Shinsal::Yangin,
            "gwimun" | "귀문관살" | "ghost_gate" => Shinsal::Gwimun,
            _ => Shinsal::Other(key.to_string()),
        }
    }

    pub fn beneficial_for(&self) -> &'static [ActivityType] {
        match self {
            Shinsal::CheonEul => &[Career, Wealth, General],
            Shinsal::Munchang => &[Study, Career],
            Shinsal::Dohwa => &[Love],
            Shinsal::Yeokma => &[Travel, Career],
            Shinsal::Hwagae => &[Study],
            Shinsal::Geumyeo => &[Love, Wealth],
            Shinsal::Cheondeok => &[Health, General],
            Shinsal::Yangin => &[Career],
            Shinsal::Baekho | Shinsal::Gwimun | Shinsal::Other(_) => &[],
        }
    }

    pub fn harmful_for(&self) -> &'static [ActivityType] {
        match self {
            Shinsal::Dohwa => &[Study],
            Shinsal::Yeokma => &[Health],
            Shinsal::Hwagae => &[Love],
            Shinsal::Baekho => &[Health, Travel],
            Shinsal::Yangin => &[Health, Love],
            Shinsal::Gwimun => &[Study, Health],
            Shinsal::CheonEul
            | Shinsal::Munchang
            | Shinsal::Geumyeo
            | Shinsal::Cheondeok
            | Shinsal::Other(_) => &[],
        }
    }
}

impl fmt::Display for Shinsal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Shinsal::CheonEul => "cheon_eul",
            Shinsal::Munchang => "munchang",
            Shinsal::Dohwa => "dohwa",
            Shinsal::Yeokma => "yeokma",
            Shinsal::Hwagae => "hwagae",
            Shinsal::Geumyeo => "geumyeo",
            Shinsal::Cheondeok => "cheondeok",
            Shinsal::Baekho => "baekho",
            Shinsal::Yangin => "yangin",
            Shinsal::Gwimun => "gwimun",
            Shinsal::Other(key) => key.as_str(),
        };
        write!(f, "{}", name)
    }
}

/// A star as attached to a date or chart, with an optional intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShinsalEntry {
    pub star: Shinsal,
    #[serde(default = "default_strength")]
    pub strength: f64,
}

fn default_strength() -> f64 {
    1.0
}

impl ShinsalEntry {
    pub fn new(star: Shinsal) -> Self {
        ShinsalEntry { star, strength: 1.0 }
    }

    pub fn beneficial_for(&self) -> &'static [ActivityType] {
        self.star.beneficial_for()
    }

    pub fn harmful_for(&self) -> &'static [ActivityType] {
        self.star.harmful_for()
    }
}

// ---------------------------
// ## Branch Tables
// ---------------------------

pub fn nobleman_branches(day_master: Stem) -> [Branch; 2] {
    match day_master {
        Stem::Gap | Stem::Mu | Stem::Gyeong => [Branch::Chuk, Branch::Mi],
        Stem::Eul | Stem::Gi => [Branch::Ja, Branch::Sin],
        Stem::Byeong | Stem::Jeong => [Branch::Hae, Branch::Yu],
        Stem::Sin => [Branch::In, Branch::O],
        Stem::Im | Stem::Gye => [Branch::Sa, Branch::Myo],
    }
}

/// Command-seat (rok) branch of a stem.
pub fn command_seat_branch(day_master: Stem) -> Branch {
    match day_master {
        Stem::Gap => Branch::In,
        Stem::Eul => Branch::Myo,
        Stem::Byeong | Stem::Mu => Branch::Sa,
        Stem::Jeong | Stem::Gi => Branch::O,
        Stem::Gyeong => Branch::Sin,
        Stem::Sin => Branch::Yu,
        Stem::Im => Branch::Hae,
        Stem::Gye => Branch::Ja,
    }
}

pub fn literary_branch(day_master: Stem) -> Branch {
    match day_master {
        Stem::Gap => Branch::Sa,
        Stem::Eul => Branch::O,
        Stem::Byeong | Stem::Mu => Branch::Sin,
        Stem::Jeong | Stem::Gi => Branch::Yu,
        Stem::Gyeong => Branch::Hae,
        Stem::Sin => Branch::Ja,
        Stem::Im => Branch::In,
        Stem::Gye => Branch::Myo,
    }
}

/// Blade branch; only yang stems carry one.
pub fn blade_branch(day_master: Stem) -> Option<Branch> {
    match day_master {
        Stem::Gap => Some(Branch::Myo),
        Stem::Byeong | Stem::Mu => Some(Branch::O),
        Stem::Gyeong => Some(Branch::Yu),
        Stem::Im => Some(Branch::Ja),
        _ => None,
    }
}

/// Index of the triad whose members share the triad-based stars.
fn triad_index(branch: Branch) -> usize {
    match triad_of(branch)[1] {
        Branch::Ja => 0,
        Branch::Myo => 1,
        Branch::O => 2,
        _ => 3,
    }
}

pub fn romance_branch(base: Branch) -> Branch {
    [Branch::Yu, Branch::Ja, Branch::Myo, Branch::O][triad_index(base)]
}

pub fn travel_branch(base: Branch) -> Branch {
    [Branch::In, Branch::Sa, Branch::Sin, Branch::Hae][triad_index(base)]
}

pub fn canopy_branch(base: Branch) -> Branch {
    [Branch::Jin, Branch::Mi, Branch::Sul, Branch::Chuk][triad_index(base)]
}

/// The two branches left over by the ten-day decade containing `pillar`.
pub fn void_branches(pillar: Pillar) -> [Branch; 2] {
    let start = (pillar.branch.index() + 12 - pillar.stem.index()) % 12;
    [Branch::from_index(start + 10), Branch::from_index(start + 11)]
}

/// Years (by branch) of the three-year samjae cycle for a birth-year branch.
/// The cycle opens on the travel branch of the birth triad.
pub fn samjae_years(birth_year: Branch) -> [Branch; 3] {
    let first = travel_branch(birth_year).index();
    [
        Branch::from_index(first),
        Branch::from_index(first + 1),
        Branch::from_index(first + 2),
    ]
}

pub fn is_samjae_year(birth_year: Branch, year: Branch) -> bool {
    samjae_years(birth_year).contains(&year)
}

const RESENTMENT_PAIRS: [(Branch, Branch); 6] = [
    (Branch::Ja, Branch::Mi),
    (Branch::Chuk, Branch::O),
    (Branch::In, Branch::Yu),
    (Branch::Myo, Branch::Sin),
    (Branch::Jin, Branch::Hae),
    (Branch::Sa, Branch::Sul),
];

pub fn is_resentment_pair(a: Branch, b: Branch) -> bool {
    RESENTMENT_PAIRS
        .iter()
        .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

const WHITE_TIGER_PILLARS: [(Stem, Branch); 7] = [
    (Stem::Gap, Branch::Jin),
    (Stem::Eul, Branch::Mi),
    (Stem::Byeong, Branch::Sul),
    (Stem::Jeong, Branch::Chuk),
    (Stem::Mu, Branch::Jin),
    (Stem::Im, Branch::Sul),
    (Stem::Gye, Branch::Chuk),
];

/// Stars a branch switches on relative to a natal chart.
pub fn stars_for_branch(natal: &SajuChart, branch: Branch) -> Vec<Shinsal> {
    let dm = natal.day_master();
    let base = natal.day.branch;
    let mut stars = Vec::new();

    if nobleman_branches(dm).contains(&branch) {
        stars.push(Shinsal::CheonEul);
    }
    if literary_branch(dm) == branch {
        stars.push(Shinsal::Munchang);
    }
    if romance_branch(base) == branch || romance_branch(natal.year.branch) == branch {
        stars.push(Shinsal::Dohwa);
    }
    if travel_branch(base) == branch || travel_branch(natal.year.branch) == branch {
        stars.push(Shinsal::Yeokma);
    }
    if canopy_branch(base) == branch {
        stars.push(Shinsal::Hwagae);
    }
    if blade_branch(dm) == Some(branch) {
        stars.push(Shinsal::Yangin);
    }

    stars
}

/// Stars present in the natal chart itself, deduplicated and sorted.
pub fn natal_stars(natal: &SajuChart) -> Vec<Shinsal> {
    let mut stars: Vec<Shinsal> = natal
        .pillars()
        .enumerate()
        .filter(|(position, _)| *position != 2)
        .flat_map(|(_, pillar)| stars_for_branch(natal, pillar.branch))
        .collect();

    if WHITE_TIGER_PILLARS.contains(&(natal.day.stem, natal.day.branch)) {
        stars.push(Shinsal::Baekho);
    }
    if is_resentment_pair(natal.day.branch, natal.month.branch) {
        stars.push(Shinsal::Gwimun);
    }

    stars.sort();
    stars.dedup();
    stars
}

// ---------------------------
// ## Day Stars
// ---------------------------

/// Per-date lucky and unlucky flags scored by the daily (iljin) table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStar {
    NoblemanDay,
    CommandSeatDay,
    RomanceStar,
    VoidDay,
    ResentmentStar,
}

impl DayStar {
    pub fn is_lucky(self) -> bool {
        matches!(
            self,
            DayStar::NoblemanDay | DayStar::CommandSeatDay | DayStar::RomanceStar
        )
    }

    /// Flags the given day pillar raises against a natal chart.
    pub fn derive(natal: &SajuChart, day: Pillar) -> Vec<DayStar> {
        let dm = natal.day_master();
        let mut stars = Vec::new();

        if nobleman_branches(dm).contains(&day.branch) {
            stars.push(DayStar::NoblemanDay);
        }
        if command_seat_branch(dm) == day.branch {
            stars.push(DayStar::CommandSeatDay);
        }
        if romance_branch(natal.day.branch) == day.branch {
            stars.push(DayStar::RomanceStar);
        }
        if void_branches(natal.day).contains(&day.branch) {
            stars.push(DayStar::VoidDay);
        }
        if is_resentment_pair(natal.day.branch, day.branch) {
            stars.push(DayStar::ResentmentStar);
        }

        stars
    }
}

impl fmt::Display for DayStar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DayStar::NoblemanDay => "nobleman_day",
            DayStar::CommandSeatDay => "command_seat_day",
            DayStar::RomanceStar => "romance_star",
            DayStar::VoidDay => "void_day",
            DayStar::ResentmentStar => "resentment_star",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::saju::StrengthState;

    fn chart(day: Pillar, year: Pillar) -> SajuChart {
        SajuChart {
            year,
            month: Pillar::new(Stem::Gap, Branch::O),
            day,
            hour: None,
            yongsin: Some(Element::Water),
            kibsin: None,
            pattern: None,
            strength: StrengthState::Balanced,
        }
    }

    #[test]
    fn void_branches_of_first_decade() {
        assert_eq!(
            void_branches(Pillar::new(Stem::Gap, Branch::Ja)),
            [Branch::Sul, Branch::Hae]
        );
        // gap-sul opens the second decade
        assert_eq!(
            void_branches(Pillar::new(Stem::Byeong, Branch::Ja)),
            [Branch::Sin, Branch::Yu]
        );
    }

    #[test]
    fn samjae_follows_birth_triad() {
        assert_eq!(samjae_years(Branch::Ja), [Branch::In, Branch::Myo, Branch::Jin]);
        assert_eq!(samjae_years(Branch::O), [Branch::Sin, Branch::Yu, Branch::Sul]);
        assert!(is_samjae_year(Branch::Yu, Branch::Chuk));
        assert!(!is_samjae_year(Branch::Yu, Branch::In));
    }

    #[test]
    fn triad_stars() {
        assert_eq!(romance_branch(Branch::Jin), Branch::Yu);
        assert_eq!(travel_branch(Branch::Mi), Branch::Sa);
        assert_eq!(canopy_branch(Branch::O), Branch::Sul);
    }

    #[test]
    fn unknown_star_key_is_neutral() {
        let star = Shinsal::from_key("lunar-dragon");
        assert_eq!(star, Shinsal::Other("lunar-dragon".to_string()));
        assert!(star.beneficial_for().is_empty());
        assert!(star.harmful_for().is_empty());
        assert_eq!(Shinsal::from_key("Peach Blossom"), Shinsal::Dohwa);
    }

    #[test]
    fn same_star_helps_one_activity_and_hurts_another() {
        let dohwa = Shinsal::Dohwa;
        assert!(dohwa.beneficial_for().contains(&ActivityType::Love));
        assert!(dohwa.harmful_for().contains(&ActivityType::Study));
    }

    #[test]
    fn day_stars_for_byeong_day_master() {
        let natal = chart(
            Pillar::new(Stem::Byeong, Branch::In),
            Pillar::new(Stem::Sin, Branch::Mi),
        );
        // byeong-in sits in the gap-ja decade, so sul and hae are void
        assert_eq!(void_branches(natal.day), [Branch::Sul, Branch::Hae]);

        // hae is both a nobleman branch for byeong and void; both flags stand
        let stars = DayStar::derive(&natal, Pillar::new(Stem::Jeong, Branch::Hae));
        assert_eq!(stars, vec![DayStar::NoblemanDay, DayStar::VoidDay]);

        // sa is byeong's command seat
        let stars = DayStar::derive(&natal, Pillar::new(Stem::Gi, Branch::Sa));
        assert_eq!(stars, vec![DayStar::CommandSeatDay]);
    }

    #[test]
    fn natal_stars_are_sorted_and_unique() {
        let natal = chart(
            Pillar::new(Stem::Gap, Branch::Jin),
            Pillar::new(Stem::Gyeong, Branch::Chuk),
        );
        let stars = natal_stars(&natal);
        assert!(stars.contains(&Shinsal::CheonEul));
        assert!(stars.contains(&Shinsal::Baekho));
        let mut sorted = stars.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(stars, sorted);
    }
}
