//! Atom grammar for legal land descriptions.
//!
//! Each atom kind owns a regex fragment written with plain named
//! groups. At startup the fragments are combined into a single
//! alternation: every group name is prefixed with its kind
//! (`Quarter_corner`, `Edge_amount`, ...) so the combined pattern has
//! no collisions, and each fragment is wrapped in a top-level group
//! named after the kind. Which top-level group is non-empty identifies
//! the matched kind; a per-kind extractor then pulls out the
//! sub-fields.
//!
//! The grammar is tolerant of OCR artifacts: matching runs over text
//! normalized to lowercase with whitespace runs collapsed, and the
//! keyword fragments accept the line-wrap hyphenation OCR produces
//! ("sec- tion"). Spans of text that match nothing are skipped
//! silently; free text surrounds the legal description and is not an
//! error.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::types::atom::{Atom, Cardinal, Corner, DistanceUnit, RangeDir, TownshipDir};

/// Ordered grammar table. Order matters twice: alternation is
/// leftmost-first, so `LessEdge` must precede `Edge` and `Lot` must
/// precede `Lots`-free prose scanning picks the right branch.
const GRAMMAR: &[(&str, &str)] = &[
    (
        "Acres",
        r"(?:consisting\s+of\s+)(?P<amount>[0-9.]+|[a-z](?:[a-z]|\s)+)\s+ac(?:-\s+)?res(?:\s+more\s+or\s+less)?",
    ),
    (
        "Quarter",
        r"(?:(?P<corner>[ns][ew])|(?P<ns>north|south)(?P<ew>east|west)(?:ern|erly)?)\s+(?:1/4|quar(?:-\s+)?ter)",
    ),
    (
        "Half",
        r"(?P<direction>north|east|south|west)(?:ern|erly)?\s+(?:1/2|half)",
    ),
    ("Section", r"sec(?:-\s+)?tion\s+(?P<number>[0-9]+)"),
    (
        "Township",
        r"town(?:-\s+)?ship\s+(?P<number>[0-9]+)\s*(?P<direction>n|s)",
    ),
    ("Range", r"range\s+(?P<number>[0-9]+)\s*(?P<direction>w|e)"),
    (
        "LessEdge",
        r"less(?:\s+the\s+)?(?P<direction>north|east|south|west)(?:ern|erly)?[^0-9]+(?P<amount>[0-9]+)[^0-9]*\s+(?P<unit>feet|miles)",
    ),
    (
        "Edge",
        r"(?:\s+the\s+)?(?P<direction>north|east|south|west)(?:ern|erly)?[^0-9]+(?P<amount>[0-9]+)[^0-9]*\s+(?P<unit>feet|miles)",
    ),
    ("Lot", r"lot\s+(?P<number>[0-9]+)\s+"),
    (
        "Lots",
        r"lots\s+(?P<numbers>(?:[0-9]+(?:[,.]\s+|\s+and\s+|\s+(?P<through>through|thru)\s+)?)+)",
    ),
    ("Subdivision", r"(?:in\s+|of\s+)?(?P<name>.+?)\s+(?:subdivision|s/d)"),
];

static GROUP_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\?P<(\w+)>").expect("group-name pattern"));

/// Combined alternation over all atom kinds, built once.
static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    let branches: Vec<String> = GRAMMAR
        .iter()
        .map(|(kind, fragment)| {
            let prefixed = GROUP_NAME_RE
                .replace_all(fragment, |caps: &Captures| {
                    format!("(?P<{}_{}>", kind, &caps[1])
                })
                .into_owned();
            format!("(?P<{}>{})", kind, prefixed)
        })
        .collect();
    Regex::new(&branches.join("|")).expect("combined grammar pattern")
});

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("number pattern"));

/// Error raised when a matched atom carries an unparseable field.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// A numeric field matched the pattern but failed to parse.
    #[error("malformed {kind} field {field}: {value:?}")]
    MalformedField {
        /// Atom kind that matched.
        kind: &'static str,
        /// Name of the offending field.
        field: &'static str,
        /// Raw matched text.
        value: String,
    },
    /// A field the pattern should guarantee was absent.
    #[error("{kind} match is missing field {field}")]
    MissingField {
        /// Atom kind that matched.
        kind: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },
}

/// Result of scanning one document's normalized text.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// Recognized atoms in encounter order.
    pub atoms: Vec<Atom>,
    /// Byte span in the normalized text from the start of the first
    /// match to the end of the last, when anything matched. Useful for
    /// extracting the legal-description window out of surrounding
    /// prose.
    pub span: Option<(usize, usize)>,
}

/// Normalize raw OCR text for matching: lowercase, with whitespace and
/// line-wrap runs collapsed to single spaces.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace-normalize a matched sub-field.
fn clean(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Matched sub-field of the given kind, whitespace-normalized.
fn field(caps: &Captures<'_>, kind: &str, name: &str) -> Option<String> {
    caps.name(&format!("{}_{}", kind, name))
        .map(|m| clean(m.as_str()))
}

fn require<'a>(
    value: Option<&'a String>,
    kind: &'static str,
    name: &'static str,
) -> Result<&'a str, GrammarError> {
    value
        .map(|s| s.as_str())
        .ok_or(GrammarError::MissingField { kind, field: name })
}

fn parse_number<T: std::str::FromStr>(
    value: &str,
    kind: &'static str,
    name: &'static str,
) -> Result<T, GrammarError> {
    value.parse().map_err(|_| GrammarError::MalformedField {
        kind,
        field: name,
        value: value.to_string(),
    })
}

fn malformed(kind: &'static str, field: &'static str, value: &str) -> GrammarError {
    GrammarError::MalformedField {
        kind,
        field,
        value: value.to_string(),
    }
}

/// Build the atom for one combined-pattern match.
fn extract(kind: &'static str, caps: &Captures<'_>) -> Result<Atom, GrammarError> {
    let get = |name: &str| field(caps, kind, name);
    match kind {
        "Acres" => {
            let amount = get("amount");
            Ok(Atom::Acres(require(amount.as_ref(), kind, "amount")?.to_string()))
        }
        "Quarter" => {
            let code = match get("corner") {
                Some(code) => code,
                None => {
                    let ns = get("ns");
                    let ew = get("ew");
                    let ns = require(ns.as_ref(), kind, "ns")?;
                    let ew = require(ew.as_ref(), kind, "ew")?;
                    format!("{}{}", &ns[..1], &ew[..1])
                }
            };
            let corner = Corner::from_code(&code).ok_or_else(|| malformed(kind, "corner", &code))?;
            Ok(Atom::Quarter(corner))
        }
        "Half" => {
            let word = get("direction");
            let word = require(word.as_ref(), kind, "direction")?;
            let direction =
                Cardinal::from_word(word).ok_or_else(|| malformed(kind, "direction", word))?;
            Ok(Atom::Half(direction))
        }
        "Section" => {
            let number = get("number");
            let number = require(number.as_ref(), kind, "number")?;
            Ok(Atom::Section(parse_number(number, kind, "number")?))
        }
        "Township" => {
            let number = get("number");
            let number = require(number.as_ref(), kind, "number")?;
            let dir = get("direction");
            let direction = match require(dir.as_ref(), kind, "direction")? {
                "n" => TownshipDir::North,
                _ => TownshipDir::South,
            };
            Ok(Atom::Township {
                number: parse_number(number, kind, "number")?,
                direction,
            })
        }
        "Range" => {
            let number = get("number");
            let number = require(number.as_ref(), kind, "number")?;
            let dir = get("direction");
            let direction = match require(dir.as_ref(), kind, "direction")? {
                "e" => RangeDir::East,
                _ => RangeDir::West,
            };
            Ok(Atom::Range {
                number: parse_number(number, kind, "number")?,
                direction,
            })
        }
        "Edge" | "LessEdge" => {
            let word = get("direction");
            let word = require(word.as_ref(), kind, "direction")?;
            let direction =
                Cardinal::from_word(word).ok_or_else(|| malformed(kind, "direction", word))?;
            let amount = get("amount");
            let amount: f64 = parse_number(require(amount.as_ref(), kind, "amount")?, kind, "amount")?;
            let unit_word = get("unit");
            let unit_word = require(unit_word.as_ref(), kind, "unit")?;
            let unit = DistanceUnit::from_word(unit_word)
                .ok_or_else(|| malformed(kind, "unit", unit_word))?;
            if kind == "Edge" {
                Ok(Atom::Edge {
                    direction,
                    amount,
                    unit,
                })
            } else {
                Ok(Atom::LessEdge {
                    direction,
                    amount,
                    unit,
                })
            }
        }
        "Lot" => {
            let number = get("number");
            let number = require(number.as_ref(), kind, "number")?;
            Ok(Atom::Lot(parse_number(number, kind, "number")?))
        }
        "Lots" => {
            let raw = get("numbers");
            let raw = require(raw.as_ref(), kind, "numbers")?;
            let mut numbers = Vec::new();
            for m in NUMBER_RE.find_iter(raw) {
                numbers.push(parse_number::<u32>(m.as_str(), kind, "numbers")?);
            }
            // "Lots 3 through 6" names an inclusive range, not a pair.
            if get("through").is_some() && numbers.len() == 2 {
                let (first, last) = (numbers[0], numbers[1]);
                numbers = (first..=last).collect();
            }
            Ok(Atom::Lots(numbers))
        }
        "Subdivision" => {
            let name = get("name");
            Ok(Atom::Subdivision(
                require(name.as_ref(), kind, "name")?.to_string(),
            ))
        }
        _ => Err(GrammarError::MissingField {
            kind: "unknown",
            field: "kind",
        }),
    }
}

/// Scan normalized text for description atoms.
///
/// Unmatched spans are skipped silently. The only failure mode is a
/// matched atom whose numeric field does not parse.
pub fn scan(normalized: &str) -> Result<ScanOutcome, GrammarError> {
    let mut atoms = Vec::new();
    let mut span: Option<(usize, usize)> = None;

    for caps in PROPERTY_RE.captures_iter(normalized) {
        let whole = caps.get(0).ok_or(GrammarError::MissingField {
            kind: "unknown",
            field: "match",
        })?;
        span = Some(match span {
            None => (whole.start(), whole.end()),
            Some((start, _)) => (start, whole.end()),
        });

        for (kind, _) in GRAMMAR {
            if caps.name(kind).is_some() {
                atoms.push(extract(kind, &caps)?);
                break;
            }
        }
    }

    Ok(ScanOutcome { atoms, span })
}
