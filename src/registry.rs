//! PLSS corner registry.
//!
//! A static, read-only mapping from surveyed reference points to
//! working-grid coordinates. The registry is explicitly constructed and
//! passed to whatever needs it; after construction nothing mutates it,
//! so it can be shared freely across any number of parallel
//! compilations.
//!
//! Keys cover the nine surveyed points of a section: the four cardinal
//! corners (NW/NE/SE/SW), the four edge midpoints (N/E/S/W), and the
//! center (C). Quadrilaterals are bootstrapped directly from these
//! surveyed points rather than derived from full-section geometry, to
//! avoid compounding floating-point error across recursive cuts.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::projection::ProjectedPoint;
use crate::subdivision::Quadrilateral;
use crate::types::atom::Corner;

/// Surveyed point of a section tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CornerCode {
    /// Northwest corner.
    Nw,
    /// North edge midpoint.
    N,
    /// Northeast corner.
    Ne,
    /// East edge midpoint.
    E,
    /// Southeast corner.
    Se,
    /// South edge midpoint.
    S,
    /// Southwest corner.
    Sw,
    /// West edge midpoint.
    W,
    /// Section center.
    C,
}

impl CornerCode {
    /// Parse the registry spelling of a corner code.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "NW" => Some(Self::Nw),
            "N" => Some(Self::N),
            "NE" => Some(Self::Ne),
            "E" => Some(Self::E),
            "SE" => Some(Self::Se),
            "S" => Some(Self::S),
            "SW" => Some(Self::Sw),
            "W" => Some(Self::W),
            "C" => Some(Self::C),
            _ => None,
        }
    }

    /// Registry spelling of this corner code.
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Nw => "NW",
            Self::N => "N",
            Self::Ne => "NE",
            Self::E => "E",
            Self::Se => "SE",
            Self::S => "S",
            Self::Sw => "SW",
            Self::W => "W",
            Self::C => "C",
        }
    }
}

impl fmt::Display for CornerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Registry corner codes bounding the named quarter of a section, in
/// quadrilateral winding order (NW, NE, SE, SW).
pub fn quarter_codes(corner: Corner) -> [CornerCode; 4] {
    match corner {
        Corner::Nw => [CornerCode::Nw, CornerCode::N, CornerCode::C, CornerCode::W],
        Corner::Ne => [CornerCode::N, CornerCode::Ne, CornerCode::E, CornerCode::C],
        Corner::Se => [CornerCode::C, CornerCode::E, CornerCode::Se, CornerCode::S],
        Corner::Sw => [CornerCode::W, CornerCode::C, CornerCode::S, CornerCode::Sw],
    }
}

/// Identity of a surveyed point: township, range, section, corner code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CornerKey {
    /// Township number.
    pub township: u32,
    /// Range number.
    pub range: u32,
    /// Section number.
    pub section: u32,
    /// Which surveyed point of the section.
    pub code: CornerCode,
}

impl CornerKey {
    /// Create a key from its parts.
    pub fn new(township: u32, range: u32, section: u32, code: CornerCode) -> Self {
        Self {
            township,
            range,
            section,
            code,
        }
    }

    /// Parse the registry-file spelling, e.g. `"24 27 12 SE"`.
    pub fn from_label(label: &str) -> Result<Self, RegistryError> {
        let bad = || RegistryError::BadKey(label.to_string());
        let mut parts = label.split_whitespace();
        let township = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let range = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let section = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let code = parts
            .next()
            .and_then(CornerCode::from_label)
            .ok_or_else(bad)?;
        if parts.next().is_some() {
            return Err(bad());
        }
        Ok(Self::new(township, range, section, code))
    }
}

impl fmt::Display for CornerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.township,
            self.range,
            self.section,
            self.code.as_label()
        )
    }
}

/// Error raised while loading or querying the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A registry-file key did not parse as `"t r s CODE"`.
    #[error("malformed corner key: {0:?}")]
    BadKey(String),
    /// A requested surveyed point is absent from the registry.
    #[error("corner not in registry: {0}")]
    MissingCorner(CornerKey),
}

/// Read-only lookup of surveyed reference points.
#[derive(Debug, Clone, Default)]
pub struct CornerRegistry {
    corners: HashMap<CornerKey, ProjectedPoint>,
}

impl CornerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surveyed point. Intended for construction only; the
    /// registry is not mutated after it is handed to a compiler.
    pub fn insert(&mut self, key: CornerKey, point: ProjectedPoint) {
        self.corners.insert(key, point);
    }

    /// Build a registry from the on-disk map of
    /// `"t r s CODE"` labels to `[x, y]` coordinate pairs.
    pub fn from_map(map: BTreeMap<String, [f64; 2]>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (label, [x, y]) in map {
            let key = CornerKey::from_label(&label)?;
            registry.insert(key, ProjectedPoint::new(x, y));
        }
        Ok(registry)
    }

    /// Build a registry from the JSON serialization of the label map.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let map: BTreeMap<String, [f64; 2]> =
            serde_json::from_str(json).map_err(|e| RegistryError::BadKey(e.to_string()))?;
        Self::from_map(map)
    }

    /// Look up one surveyed point.
    pub fn get(&self, key: &CornerKey) -> Option<ProjectedPoint> {
        self.corners.get(key).copied()
    }

    /// Number of surveyed points loaded.
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    /// Whether the registry holds no points.
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// Bootstrap the named quarter of a section directly from its four
    /// surveyed points.
    pub fn quarter(
        &self,
        township: u32,
        range: u32,
        section: u32,
        corner: Corner,
    ) -> Result<Quadrilateral, RegistryError> {
        let codes = quarter_codes(corner);
        let mut points = [ProjectedPoint::new(0.0, 0.0); 4];
        for (slot, code) in points.iter_mut().zip(codes) {
            let key = CornerKey::new(township, range, section, code);
            *slot = self.get(&key).ok_or(RegistryError::MissingCorner(key))?;
        }
        let [nw, ne, se, sw] = points;
        Ok(Quadrilateral::new(nw, ne, se, sw))
    }
}
