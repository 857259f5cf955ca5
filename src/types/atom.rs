//! Description atoms for the legal-description grammar.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cardinal direction used by halves and trimmed edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinal {
    /// North.
    North,
    /// East.
    East,
    /// South.
    South,
    /// West.
    West,
}

impl Cardinal {
    /// Parse a spelled-out direction word ("north", "east", ...).
    pub fn from_word(s: &str) -> Option<Self> {
        match s {
            "north" => Some(Self::North),
            "east" => Some(Self::East),
            "south" => Some(Self::South),
            "west" => Some(Self::West),
            _ => None,
        }
    }

    /// The opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

impl fmt::Display for Cardinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::North => write!(f, "north"),
            Self::East => write!(f, "east"),
            Self::South => write!(f, "south"),
            Self::West => write!(f, "west"),
        }
    }
}

/// Quarter corner of a quadrilateral or section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    /// Northwest.
    Nw,
    /// Northeast.
    Ne,
    /// Southeast.
    Se,
    /// Southwest.
    Sw,
}

impl Corner {
    /// Parse a compact corner code ("nw", "ne", "se", "sw").
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "nw" => Some(Self::Nw),
            "ne" => Some(Self::Ne),
            "se" => Some(Self::Se),
            "sw" => Some(Self::Sw),
            _ => None,
        }
    }

    /// Compact lowercase code for this corner.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Nw => "nw",
            Self::Ne => "ne",
            Self::Se => "se",
            Self::Sw => "sw",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_code().to_uppercase())
    }
}

/// Unit attached to a trimmed-edge distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceUnit {
    /// US survey feet, the working unit.
    Feet,
    /// Statute miles.
    Miles,
}

impl DistanceUnit {
    /// Parse a spelled-out unit word.
    pub fn from_word(s: &str) -> Option<Self> {
        match s {
            "feet" => Some(Self::Feet),
            "miles" => Some(Self::Miles),
            _ => None,
        }
    }

    /// Convert an amount in this unit to feet.
    pub fn to_feet(self, amount: f64) -> f64 {
        match self {
            Self::Feet => amount,
            Self::Miles => amount * 5280.0,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feet => write!(f, "feet"),
            Self::Miles => write!(f, "miles"),
        }
    }
}

/// North/south direction of a township line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TownshipDir {
    /// North of the base line.
    North,
    /// South of the base line.
    South,
}

impl fmt::Display for TownshipDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::North => write!(f, "N"),
            Self::South => write!(f, "S"),
        }
    }
}

/// East/west direction of a range line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeDir {
    /// East of the principal meridian.
    East,
    /// West of the principal meridian.
    West,
}

impl fmt::Display for RangeDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::East => write!(f, "E"),
            Self::West => write!(f, "W"),
        }
    }
}

/// One typed fragment of a legal land description.
///
/// Atoms are immutable once constructed. The set is closed: folding
/// into an area aggregate is an exhaustive `match`, with no open
/// extension point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Atom {
    /// Stated acreage ("consisting of 40 acres"). Metadata only; the
    /// amount is kept verbatim because deeds spell it out in words as
    /// often as digits.
    Acres(String),
    /// Quarter scoping operator ("Northwest 1/4").
    Quarter(Corner),
    /// Half scoping operator ("South 1/2").
    Half(Cardinal),
    /// Section number.
    Section(u32),
    /// Township number and direction.
    Township {
        /// Township number.
        number: u32,
        /// North or south of the base line.
        direction: TownshipDir,
    },
    /// Range number and direction. By domain convention a `Range`
    /// atom always closes a description group.
    Range {
        /// Range number.
        number: u32,
        /// East or west of the principal meridian.
        direction: RangeDir,
    },
    /// Literal-distance strip kept from the named side
    /// ("the North 330 feet").
    Edge {
        /// Side the strip is measured from.
        direction: Cardinal,
        /// Distance in the stated unit.
        amount: f64,
        /// Unit of the distance.
        unit: DistanceUnit,
    },
    /// Remainder after removing the named strip
    /// ("less the North 330 feet").
    LessEdge {
        /// Side the removed strip is measured from.
        direction: Cardinal,
        /// Distance in the stated unit.
        amount: f64,
        /// Unit of the distance.
        unit: DistanceUnit,
    },
    /// Single lot number. Metadata only.
    Lot(u32),
    /// Multiple lot numbers, in stated order. Metadata only.
    Lots(Vec<u32>),
    /// Platted subdivision name. Metadata only; lot geometry inside a
    /// platted subdivision is unsupported.
    Subdivision(String),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acres(amount) => write!(f, "{} Acres", amount),
            Self::Quarter(corner) => write!(f, "{} Quarter", corner),
            Self::Half(direction) => write!(f, "{} Half", capitalize(&direction.to_string())),
            Self::Section(number) => write!(f, "Section {}", number),
            Self::Township { number, direction } => {
                write!(f, "Township {} {}", number, direction)
            }
            Self::Range { number, direction } => write!(f, "Range {} {}", number, direction),
            Self::Edge {
                direction,
                amount,
                unit,
            } => write!(f, "{} {} {}", capitalize(&direction.to_string()), amount, unit),
            Self::LessEdge {
                direction,
                amount,
                unit,
            } => write!(
                f,
                "Less {} {} {}",
                capitalize(&direction.to_string()),
                amount,
                unit
            ),
            Self::Lot(number) => write!(f, "Lot {}", number),
            Self::Lots(numbers) => {
                let listed: Vec<String> = numbers.iter().map(|n| n.to_string()).collect();
                write!(f, "Lots {}", listed.join(", "))
            }
            Self::Subdivision(name) => write!(f, "{} Subdivision", name),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
