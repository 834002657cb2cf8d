use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------
// ## Five Elements
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Wood = 0,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The element this one feeds along the generating cycle.
    pub fn generates(self) -> Element {
        Element::ALL[(self.index() + 1) % 5]
    }

    /// The element this one suppresses along the controlling cycle.
    pub fn controls(self) -> Element {
        Element::ALL[(self.index() + 2) % 5]
    }

    /// How `other` stands toward `self`, read from `self`'s point of view.
    pub fn relation_to(self, other: Element) -> ElementRelation {
        if self == other {
            ElementRelation::Same
        } else if other.generates() == self {
            ElementRelation::GeneratesMe
        } else if self.generates() == other {
            ElementRelation::IGenerate
        } else if other.controls() == self {
            ElementRelation::ControlsMe
        } else {
            ElementRelation::IControl
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Element::Wood => "wood",
            Element::Fire => "fire",
            Element::Earth => "earth",
            Element::Metal => "metal",
            Element::Water => "water",
        };
        write!(f, "{}", name)
    }
}

/// Relation of another element toward a reference element, ordered from most
/// to least favorable for the reference.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementRelation {
    Same,
    GeneratesMe,
    IGenerate,
    ControlsMe,
    IControl,
}

impl fmt::Display for ElementRelation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ElementRelation::Same => "same",
            ElementRelation::GeneratesMe => "generates_me",
            ElementRelation::IGenerate => "i_generate",
            ElementRelation::ControlsMe => "controls_me",
            ElementRelation::IControl => "i_control",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YinYang {
    Yang,
    Yin,
}
