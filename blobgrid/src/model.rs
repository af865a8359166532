use crate::error::BlobError;
use crate::geometry::limits;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    #[inline]
    pub fn dot(self, o: Vec2) -> f32 {
        self.x * o.x + self.y * o.y
    }
    /// z of the 3D cross product; positive is a right turn in y-down screen space
    #[inline]
    pub fn cross(self, o: Vec2) -> f32 {
        self.x * o.y - self.y * o.x
    }
    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
    #[inline]
    pub fn distance(self, o: Vec2) -> f32 {
        (self - o).length()
    }
    #[inline]
    pub fn normalized(self) -> Vec2 {
        let ((x, y), _) = crate::geometry::tolerance::norm2(self.x, self.y);
        Vec2 { x, y }
    }
    #[inline]
    pub fn lerp(self, o: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: self.x + (o.x - self.x) * t,
            y: self.y + (o.y - self.y) * t,
        }
    }
    /// Outward normal for a boundary walked with the filled side on the right.
    #[inline]
    pub fn outward_normal(self) -> Vec2 {
        Vec2 { x: self.y, y: -self.x }.normalized()
    }
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Integer grid cell. Ordered row-major (y, then x) so iteration is stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> GridPoint {
        GridPoint::new(self.x + dx, self.y + dy)
    }

    /// Cell center in subgrid space (one subgrid unit is half a cell).
    #[inline]
    pub fn center_subgrid(self) -> Vec2 {
        Vec2::new(2.0 * self.x as f32 + 1.0, 2.0 * self.y as f32 + 1.0)
    }

    /// Document key form, `"x,y"`.
    pub fn key(self) -> String {
        format!("{},{}", self.x, self.y)
    }

    pub fn parse_key(key: &str) -> Result<GridPoint, BlobError> {
        let bad = || BlobError::InvalidPointKey { key: key.to_string() };
        let (xs, ys) = key.split_once(',').ok_or_else(bad)?;
        let x: i64 = xs.trim().parse().map_err(|_| bad())?;
        let y: i64 = ys.trim().parse().map_err(|_| bad())?;
        if !limits::in_coord_bounds(x) || !limits::in_coord_bounds(y) {
            return Err(bad());
        }
        Ok(GridPoint::new(x as i32, y as i32))
    }
}

impl Ord for GridPoint {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for GridPoint {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl Serialize for GridPoint {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GridPoint {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct KeyVisitor;
        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = GridPoint;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a point key of the form \"x,y\"")
            }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<GridPoint, E> {
                GridPoint::parse_key(v).map_err(E::custom)
            }
        }
        d.deserialize_str(KeyVisitor)
    }
}

/// Quadrant of a cell. Index convention: 0=SE, 1=SW, 2=NW, 3=NE.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    #[serde(rename = "0", alias = "se")]
    Se = 0,
    #[serde(rename = "1", alias = "sw")]
    Sw = 1,
    #[serde(rename = "2", alias = "nw")]
    Nw = 2,
    #[serde(rename = "3", alias = "ne")]
    Ne = 3,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [Quadrant::Se, Quadrant::Sw, Quadrant::Nw, Quadrant::Ne];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Quadrant> {
        Quadrant::ALL.get(i).copied()
    }

    /// Unit direction from the cell center toward this quadrant's corner (y down).
    #[inline]
    pub fn signs(self) -> (i32, i32) {
        match self {
            Quadrant::Se => (1, 1),
            Quadrant::Sw => (-1, 1),
            Quadrant::Nw => (-1, -1),
            Quadrant::Ne => (1, -1),
        }
    }

    /// The quadrant of the diagonal neighbour that shares this quadrant's corner.
    #[inline]
    pub fn opposite(self) -> Quadrant {
        match self {
            Quadrant::Se => Quadrant::Nw,
            Quadrant::Sw => Quadrant::Ne,
            Quadrant::Nw => Quadrant::Se,
            Quadrant::Ne => Quadrant::Sw,
        }
    }

    /// Mirror across the vertical center line (east <-> west).
    #[inline]
    pub fn mirror_x(self) -> Quadrant {
        match self {
            Quadrant::Se => Quadrant::Sw,
            Quadrant::Sw => Quadrant::Se,
            Quadrant::Nw => Quadrant::Ne,
            Quadrant::Ne => Quadrant::Nw,
        }
    }

    /// Mirror across the horizontal center line (north <-> south).
    #[inline]
    pub fn mirror_y(self) -> Quadrant {
        match self {
            Quadrant::Se => Quadrant::Ne,
            Quadrant::Sw => Quadrant::Nw,
            Quadrant::Nw => Quadrant::Sw,
            Quadrant::Ne => Quadrant::Se,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quadrant::Se => "se",
            Quadrant::Sw => "sw",
            Quadrant::Nw => "nw",
            Quadrant::Ne => "ne",
        }
    }
}

/// Resolved shape of one quadrant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuadrantState {
    Full,
    Empty,
    ConvexSe,
    ConvexSw,
    ConvexNw,
    ConvexNe,
    ConcaveSe,
    ConcaveSw,
    ConcaveNw,
    ConcaveNe,
}

/// Orientation-free shape family of a [`QuadrantState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuadrantShape {
    Empty,
    Convex,
    Concave,
    Full,
}

impl QuadrantState {
    pub fn convex(q: Quadrant) -> QuadrantState {
        match q {
            Quadrant::Se => QuadrantState::ConvexSe,
            Quadrant::Sw => QuadrantState::ConvexSw,
            Quadrant::Nw => QuadrantState::ConvexNw,
            Quadrant::Ne => QuadrantState::ConvexNe,
        }
    }

    pub fn concave(q: Quadrant) -> QuadrantState {
        match q {
            Quadrant::Se => QuadrantState::ConcaveSe,
            Quadrant::Sw => QuadrantState::ConcaveSw,
            Quadrant::Nw => QuadrantState::ConcaveNw,
            Quadrant::Ne => QuadrantState::ConcaveNe,
        }
    }

    pub fn shape(self) -> QuadrantShape {
        match self {
            QuadrantState::Full => QuadrantShape::Full,
            QuadrantState::Empty => QuadrantShape::Empty,
            QuadrantState::ConvexSe
            | QuadrantState::ConvexSw
            | QuadrantState::ConvexNw
            | QuadrantState::ConvexNe => QuadrantShape::Convex,
            QuadrantState::ConcaveSe
            | QuadrantState::ConcaveSw
            | QuadrantState::ConcaveNw
            | QuadrantState::ConcaveNe => QuadrantShape::Concave,
        }
    }

    /// Corner orientation carried by curved states.
    pub fn orientation(self) -> Option<Quadrant> {
        match self {
            QuadrantState::Full | QuadrantState::Empty => None,
            QuadrantState::ConvexSe | QuadrantState::ConcaveSe => Some(Quadrant::Se),
            QuadrantState::ConvexSw | QuadrantState::ConcaveSw => Some(Quadrant::Sw),
            QuadrantState::ConvexNw | QuadrantState::ConcaveNw => Some(Quadrant::Nw),
            QuadrantState::ConvexNe | QuadrantState::ConcaveNe => Some(Quadrant::Ne),
        }
    }

    /// Whether this state may be stored in the slot of quadrant `q`.
    pub fn fits(self, q: Quadrant) -> bool {
        self.orientation().map_or(true, |o| o == q)
    }

    /// Per-slot union of two classifications: the larger covered area wins.
    pub fn merge(self, other: QuadrantState) -> QuadrantState {
        if other.shape() > self.shape() {
            other
        } else {
            self
        }
    }

    pub fn is_empty(self) -> bool {
        self == QuadrantState::Empty
    }

    pub fn name(self) -> &'static str {
        match self {
            QuadrantState::Full => "full",
            QuadrantState::Empty => "empty",
            QuadrantState::ConvexSe => "convex-se",
            QuadrantState::ConvexSw => "convex-sw",
            QuadrantState::ConvexNw => "convex-nw",
            QuadrantState::ConvexNe => "convex-ne",
            QuadrantState::ConcaveSe => "concave-se",
            QuadrantState::ConcaveSw => "concave-sw",
            QuadrantState::ConcaveNw => "concave-nw",
            QuadrantState::ConcaveNe => "concave-ne",
        }
    }
}

/// Where a cutout sits inside its cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutoutAnchor {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Custom,
}

impl CutoutAnchor {
    /// Preset direction from the cell center; `None` for `Custom`.
    pub fn preset_direction(self) -> Option<(f32, f32)> {
        match self {
            CutoutAnchor::Center => Some((0.0, 0.0)),
            CutoutAnchor::Top => Some((0.0, -1.0)),
            CutoutAnchor::Bottom => Some((0.0, 1.0)),
            CutoutAnchor::Left => Some((-1.0, 0.0)),
            CutoutAnchor::Right => Some((1.0, 0.0)),
            CutoutAnchor::TopLeft => Some((-1.0, -1.0)),
            CutoutAnchor::TopRight => Some((1.0, -1.0)),
            CutoutAnchor::BottomLeft => Some((-1.0, 1.0)),
            CutoutAnchor::BottomRight => Some((1.0, 1.0)),
            CutoutAnchor::Custom => None,
        }
    }
}

/// Circular hole placed on a point. Diameter stays in millimetres.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircularCutout {
    #[serde(default)]
    pub anchor: CutoutAnchor,
    pub diameter_mm: f32,
    /// Fine offset in grid units, applied after the anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vec2>,
    /// Offset from the cell center in grid units, used when `anchor` is `Custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_offset: Option<Vec2>,
}

impl CircularCutout {
    pub fn centered(diameter_mm: f32) -> Self {
        CircularCutout {
            anchor: CutoutAnchor::Center,
            diameter_mm,
            offset: None,
            custom_offset: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointModification {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cutouts: Vec<CircularCutout>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub quadrant_overrides: BTreeMap<Quadrant, QuadrantState>,
}

impl PointModification {
    pub fn is_default(&self) -> bool {
        self.cutouts.is_empty() && self.quadrant_overrides.is_empty()
    }

    pub fn with_override(mut self, q: Quadrant, state: QuadrantState) -> Self {
        self.quadrant_overrides.insert(q, state);
        self
    }

    pub fn with_cutout(mut self, c: CircularCutout) -> Self {
        self.cutouts.push(c);
        self
    }
}

/// Immutable, copy-on-write set of grid points.
///
/// Clones share storage; `insert`/`remove` copy only when shared, so a set
/// handed to the engine can never change underneath it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointSet(Arc<BTreeSet<GridPoint>>);

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, p: GridPoint) -> bool {
        self.0.contains(&p)
    }

    pub fn insert(&mut self, p: GridPoint) -> bool {
        if self.0.contains(&p) {
            return false;
        }
        Arc::make_mut(&mut self.0).insert(p)
    }

    pub fn remove(&mut self, p: GridPoint) -> bool {
        if !self.0.contains(&p) {
            return false;
        }
        Arc::make_mut(&mut self.0).remove(&p)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = GridPoint> + '_ {
        self.0.iter().copied()
    }

    pub fn union(&self, other: &PointSet) -> PointSet {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        self.iter().chain(other.iter()).collect()
    }

    /// True when both handles share the same storage.
    pub fn shares_storage(&self, other: &PointSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl FromIterator<GridPoint> for PointSet {
    fn from_iter<I: IntoIterator<Item = GridPoint>>(iter: I) -> Self {
        PointSet(Arc::new(iter.into_iter().collect()))
    }
}

impl Serialize for PointSet {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for PointSet {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Vec::<GridPoint>::deserialize(d)?;
        Ok(v.into_iter().collect())
    }
}

/// Named subset of a layer's points with independent connectivity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionGroup {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub points: PointSet,
}

impl InteractionGroup {
    pub fn new(id: impl Into<String>, points: impl IntoIterator<Item = GridPoint>) -> Self {
        InteractionGroup {
            id: id.into(),
            name: None,
            points: points.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    #[serde(default)]
    pub groups: Vec<InteractionGroup>,
    #[serde(default)]
    pub modifications: BTreeMap<GridPoint, PointModification>,
}

impl Layer {
    pub fn new(id: impl Into<String>) -> Self {
        Layer {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Single-group layer, the common case for freshly painted content.
    pub fn with_points(id: impl Into<String>, points: impl IntoIterator<Item = GridPoint>) -> Self {
        let mut layer = Layer::new(id);
        layer.groups.push(InteractionGroup::new("default", points));
        layer
    }

    pub fn push_group(mut self, group: InteractionGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn modify(mut self, p: GridPoint, m: PointModification) -> Self {
        self.modifications.insert(p, m);
        self
    }

    /// Visible content: union of every group's points.
    pub fn points(&self) -> PointSet {
        self.groups
            .iter()
            .fold(PointSet::new(), |acc, g| acc.union(&g.points))
    }

    pub fn modification(&self, p: GridPoint) -> Option<&PointModification> {
        self.modifications.get(&p).filter(|m| !m.is_default())
    }

    /// Checks every value the pipeline relies on.
    pub fn validate(&self) -> Result<(), BlobError> {
        if self.groups.len() > limits::MAX_GROUPS_PER_LAYER {
            return Err(BlobError::OutOfRange {
                param: "groups",
                min: 0.0,
                max: limits::MAX_GROUPS_PER_LAYER as f64,
                got: self.groups.len() as f64,
            });
        }
        let total: usize = self.groups.iter().map(|g| g.points.len()).sum();
        if total > limits::MAX_POINTS_PER_LAYER {
            return Err(BlobError::TooManyPoints {
                layer: self.id.clone(),
                count: total,
                limit: limits::MAX_POINTS_PER_LAYER,
            });
        }
        for p in self.groups.iter().flat_map(|g| g.points.iter()) {
            for v in [p.x, p.y] {
                if !limits::in_coord_bounds(v as i64) {
                    return Err(BlobError::OutOfRange {
                        param: "point",
                        min: limits::COORD_MIN as f64,
                        max: limits::COORD_MAX as f64,
                        got: v as f64,
                    });
                }
            }
        }
        for (p, m) in &self.modifications {
            for (&q, &state) in &m.quadrant_overrides {
                if !state.fits(q) {
                    return Err(BlobError::InvalidOverride {
                        point: p.key(),
                        quadrant: q as u8,
                        state: state.name().to_string(),
                    });
                }
            }
            if m.cutouts.len() > limits::MAX_CUTOUTS_PER_POINT {
                return Err(BlobError::OutOfRange {
                    param: "cutouts",
                    min: 0.0,
                    max: limits::MAX_CUTOUTS_PER_POINT as f64,
                    got: m.cutouts.len() as f64,
                });
            }
            for c in &m.cutouts {
                BlobError::check_finite("diameter_mm", c.diameter_mm)?;
                if c.diameter_mm < 0.0 {
                    return Err(BlobError::NegativeDiameter {
                        point: p.key(),
                        got: c.diameter_mm as f64,
                    });
                }
                BlobError::check_range("diameter_mm", c.diameter_mm, 0.0, limits::DIAMETER_MAX_MM)?;
                for v in [c.offset, c.custom_offset].into_iter().flatten() {
                    BlobError::check_range("cutout_x", v.x, -limits::CUTOUT_OFFSET_MAX, limits::CUTOUT_OFFSET_MAX)?;
                    BlobError::check_range("cutout_y", v.y, -limits::CUTOUT_OFFSET_MAX, limits::CUTOUT_OFFSET_MAX)?;
                }
            }
        }
        Ok(())
    }
}
