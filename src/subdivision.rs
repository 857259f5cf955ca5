//! Aliquot subdivision engine.
//!
//! Folds the atoms of one clause into a quadrilateral by recursive
//! halving, quartering, and edge trimming. All operators act on a
//! quadrilateral with fixed winding (NW, NE, SE, SW) and every operator
//! preserves that winding.
//!
//! ## Application order
//!
//! Natural-language descriptions name the narrowest part first
//! ("Northwest 1/4 of the Southeast 1/4 of Section 12"), but the outer
//! scoping quarter must be resolved before the inner one can be cut
//! from it. The aggregate therefore keeps two explicit sequences:
//!
//! - `outer_to_inner`: each parsed Half/Quarter is inserted at the
//!   front, so the last-parsed (outermost) scope is applied first;
//! - `trim_edges`: each parsed Edge/LessEdge is appended and applied
//!   in encounter order, after all scoping.

use tracing::warn;

use crate::projection::ProjectedPoint;
use crate::registry::{CornerRegistry, RegistryError};
use crate::types::atom::{Atom, Cardinal, Corner, RangeDir, TownshipDir};

/// Quadrilateral with fixed corner winding.
///
/// The four corners are always ordered NW, NE, SE, SW. Subdivision
/// operators return quadrilaterals in the same winding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrilateral {
    /// Northwest corner.
    pub nw: ProjectedPoint,
    /// Northeast corner.
    pub ne: ProjectedPoint,
    /// Southeast corner.
    pub se: ProjectedPoint,
    /// Southwest corner.
    pub sw: ProjectedPoint,
}

/// Point at `ratio` of the way from `a` to `b`.
fn ratio_point(ratio: f64, a: ProjectedPoint, b: ProjectedPoint) -> ProjectedPoint {
    ProjectedPoint::new(a.x + ratio * (b.x - a.x), a.y + ratio * (b.y - a.y))
}

/// Point a literal `distance` along the segment from `a` toward `b`.
fn edge_point(distance: f64, a: ProjectedPoint, b: ProjectedPoint) -> ProjectedPoint {
    ratio_point(distance / a.distance(b), a, b)
}

impl Quadrilateral {
    /// Create a quadrilateral from its corners in winding order.
    pub fn new(nw: ProjectedPoint, ne: ProjectedPoint, se: ProjectedPoint, sw: ProjectedPoint) -> Self {
        Self { nw, ne, se, sw }
    }

    /// Corners in winding order.
    pub fn corners(&self) -> [ProjectedPoint; 4] {
        [self.nw, self.ne, self.se, self.sw]
    }

    /// Cut a strip from the named side.
    ///
    /// `divider` places the cut point a given `amount` along each of the
    /// two edges running away from the named side. A positive `amount`
    /// keeps the strip nearest that side; a negative `amount` keeps the
    /// remainder on the far side.
    fn subarea<F>(&self, direction: Cardinal, amount: f64, divider: F) -> Self
    where
        F: Fn(f64, ProjectedPoint, ProjectedPoint) -> ProjectedPoint,
    {
        let distance = amount.abs();
        let Self { nw, ne, se, sw } = *self;
        match direction {
            Cardinal::North => {
                let edge_w = divider(distance, nw, sw);
                let edge_e = divider(distance, ne, se);
                if amount > 0.0 {
                    Self::new(nw, ne, edge_e, edge_w)
                } else {
                    Self::new(edge_w, edge_e, se, sw)
                }
            }
            Cardinal::East => {
                let edge_n = divider(distance, ne, nw);
                let edge_s = divider(distance, se, sw);
                if amount > 0.0 {
                    Self::new(edge_n, ne, se, edge_s)
                } else {
                    Self::new(nw, edge_n, edge_s, sw)
                }
            }
            Cardinal::South => {
                let edge_w = divider(distance, sw, nw);
                let edge_e = divider(distance, se, ne);
                if amount > 0.0 {
                    Self::new(edge_w, edge_e, se, sw)
                } else {
                    Self::new(nw, ne, edge_e, edge_w)
                }
            }
            Cardinal::West => {
                let edge_n = divider(distance, nw, ne);
                let edge_s = divider(distance, sw, se);
                if amount > 0.0 {
                    Self::new(nw, edge_n, edge_s, sw)
                } else {
                    Self::new(edge_n, ne, se, edge_s)
                }
            }
        }
    }

    /// Slice at a proportion of the way in from the named side,
    /// keeping the named side.
    pub fn ratio_edge(&self, direction: Cardinal, ratio: f64) -> Self {
        self.subarea(direction, ratio, ratio_point)
    }

    /// The named half, by midpoint interpolation of opposite edges.
    pub fn half(&self, direction: Cardinal) -> Self {
        self.ratio_edge(direction, 0.5)
    }

    /// The named quarter, as two nested half cuts (north/south first,
    /// then east/west).
    pub fn corner(&self, corner: Corner) -> Self {
        match corner {
            Corner::Nw => self.half(Cardinal::West).half(Cardinal::North),
            Corner::Ne => self.half(Cardinal::East).half(Cardinal::North),
            Corner::Se => self.half(Cardinal::East).half(Cardinal::South),
            Corner::Sw => self.half(Cardinal::West).half(Cardinal::South),
        }
    }

    /// Strip a literal distance (in feet) from the named side.
    ///
    /// Positive keeps the strip nearest the side; negative keeps the
    /// far remainder.
    pub fn edge(&self, direction: Cardinal, amount_feet: f64) -> Self {
        self.subarea(direction, amount_feet, edge_point)
    }
}

/// Scoping operator: applied outermost-first once the clause is folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeOp {
    /// Keep the named half.
    Half(Cardinal),
    /// Keep the named quarter.
    Quarter(Corner),
}

/// Edge-trim operator: applied in encounter order after all scoping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimOp {
    /// Side the strip is measured from.
    pub direction: Cardinal,
    /// Signed distance in feet; negative keeps the far remainder.
    pub amount_feet: f64,
}

/// Error raised while computing a clause's quadrilateral.
#[derive(Debug, thiserror::Error)]
pub enum SubdivisionError {
    /// A required scalar of the base-section context never appeared in
    /// the clause.
    #[error("clause is missing a {0} atom")]
    MissingContext(&'static str),
    /// The outermost scoping atom is a half, which cannot be anchored
    /// to surveyed points on its own.
    #[error("outermost scope is a half; a quarter is required to anchor the section")]
    ScopeNotAnchored,
    /// A surveyed point needed to bootstrap the quarter is absent.
    #[error(transparent)]
    UnresolvedRegistry(#[from] RegistryError),
}

/// Accumulated state from folding one clause's atoms.
///
/// Scoping atoms build `outer_to_inner` front-first; trim atoms build
/// `trim_edges` back-first; everything else is scalar context or
/// metadata that never contributes geometry.
#[derive(Debug, Clone, Default)]
pub struct AreaAggregate {
    /// Township number, once parsed.
    pub township: Option<u32>,
    /// Township direction, once parsed.
    pub township_dir: Option<TownshipDir>,
    /// Range number, once parsed.
    pub range: Option<u32>,
    /// Range direction, once parsed.
    pub range_dir: Option<RangeDir>,
    /// Section number, once parsed.
    pub section: Option<u32>,
    /// Scoping operators in application order (outermost first).
    pub outer_to_inner: Vec<ScopeOp>,
    /// Edge trims in encounter order.
    pub trim_edges: Vec<TrimOp>,
    /// Stated acreage, verbatim. Metadata only.
    pub acres: Option<String>,
    /// Lot numbers. Metadata only.
    pub lots: Vec<u32>,
    /// Platted subdivision name. Metadata only.
    pub subdivision: Option<String>,
}

impl AreaAggregate {
    /// Create an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one atom into the aggregate.
    pub fn absorb(&mut self, atom: Atom) {
        match atom {
            Atom::Acres(amount) => self.acres = Some(amount),
            Atom::Township { number, direction } => {
                self.township = Some(number);
                self.township_dir = Some(direction);
            }
            Atom::Range { number, direction } => {
                self.range = Some(number);
                self.range_dir = Some(direction);
            }
            Atom::Section(number) => self.section = Some(number),
            // Parse order is narrowest-first; inserting at the front
            // turns it into application order.
            Atom::Half(direction) => self.outer_to_inner.insert(0, ScopeOp::Half(direction)),
            Atom::Quarter(corner) => self.outer_to_inner.insert(0, ScopeOp::Quarter(corner)),
            Atom::Edge {
                direction,
                amount,
                unit,
            } => self.trim_edges.push(TrimOp {
                direction,
                amount_feet: unit.to_feet(amount),
            }),
            Atom::LessEdge {
                direction,
                amount,
                unit,
            } => self.trim_edges.push(TrimOp {
                direction,
                amount_feet: -unit.to_feet(amount),
            }),
            Atom::Lot(number) => self.lots.push(number),
            Atom::Lots(numbers) => self.lots.extend(numbers),
            Atom::Subdivision(name) => self.subdivision = Some(name),
        }
    }

    /// Whether anything has been folded in since construction.
    pub fn is_blank(&self) -> bool {
        self.township.is_none()
            && self.range.is_none()
            && self.section.is_none()
            && self.outer_to_inner.is_empty()
            && self.trim_edges.is_empty()
            && self.acres.is_none()
            && self.lots.is_empty()
            && self.subdivision.is_none()
    }

    /// Compute the clause's quadrilateral.
    ///
    /// Returns `Ok(None)` when the clause deliberately yields no
    /// geometry: lot/subdivision-only descriptions (unsupported, logged
    /// and skipped) and clauses with no scoping atoms at all.
    pub fn compute(
        &self,
        registry: &CornerRegistry,
    ) -> Result<Option<Quadrilateral>, SubdivisionError> {
        // A lots-only clause with no scoping atoms is platted, not
        // aliquot, even when the plat name itself went unrecognized.
        let platted = self.subdivision.is_some()
            || (!self.lots.is_empty() && self.outer_to_inner.is_empty());
        if platted {
            warn!(
                subdivision = ?self.subdivision,
                lots = self.lots.len(),
                "skipped: lot/subdivision geometry unsupported"
            );
            return Ok(None);
        }
        let mut ops = self.outer_to_inner.iter();
        let Some(first) = ops.next() else {
            return Ok(None);
        };

        // The outermost scope anchors the quadrilateral to surveyed
        // points; anything narrower is cut from it in working space.
        let ScopeOp::Quarter(corner) = *first else {
            return Err(SubdivisionError::ScopeNotAnchored);
        };
        let township = self
            .township
            .ok_or(SubdivisionError::MissingContext("township"))?;
        let range = self.range.ok_or(SubdivisionError::MissingContext("range"))?;
        let section = self
            .section
            .ok_or(SubdivisionError::MissingContext("section"))?;
        let mut area = registry.quarter(township, range, section, corner)?;

        for op in ops {
            area = match *op {
                ScopeOp::Half(direction) => area.half(direction),
                ScopeOp::Quarter(corner) => area.corner(corner),
            };
        }
        for trim in &self.trim_edges {
            area = area.edge(trim.direction, trim.amount_feet);
        }
        Ok(Some(area))
    }
}
