/// Axis-aligned bounding boxes.
///
/// Used as the broad-phase volume everywhere: BVH nodes, mesh bounds, the
/// floor extent that drives the navigability image mapping, and the
/// enclosure pre-check of the collision detector.
use glam::{DMat4, DVec3};

/// World-space axis-aligned bounding box.
///
/// `min` is component-wise less than or equal to `max`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Creates an AABB from `min`/`max` corners.
    #[inline]
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Builds the minimal box around `points`; `None` when there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = DVec3>,
    {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (min, max) = it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Full side lengths.
    #[inline]
    pub fn extents(&self) -> DVec3 {
        self.max - self.min
    }

    /// Index of the longest side (0 = X, 1 = Y, 2 = Z).
    pub fn longest_axis(&self) -> usize {
        let e = self.extents();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Inclusive on faces: touching boxes overlap, so touching meshes still
    /// reach the narrow phase.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    #[inline]
    pub fn contains_point(&self, p: DVec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    /// `true` if `other` lies entirely inside `self` (faces may coincide).
    #[inline]
    pub fn contains_aabb(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grows the box by `margin` on every side.
    #[inline]
    pub fn inflate(&self, margin: f64) -> Self {
        let m = DVec3::splat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Returns the box bounding this one after `transform`.
    ///
    /// Transforms centre + half-extents instead of all 8 corners (Arvo,
    /// Graphics Gems 1990); exact for any affine matrix.
    pub fn transform(&self, transform: &DMat4) -> Self {
        let centre = self.center();
        let half = self.extents() * 0.5;

        let new_centre = transform.transform_point3(centre);

        // Absolute-value of upper-left 3×3 rotates the half-extents.
        let m = transform.to_cols_array_2d();
        let new_half = DVec3::new(
            half.x * m[0][0].abs() + half.y * m[1][0].abs() + half.z * m[2][0].abs(),
            half.x * m[0][1].abs() + half.y * m[1][1].abs() + half.z * m[2][1].abs(),
            half.x * m[0][2].abs() + half.y * m[1][2].abs() + half.z * m[2][2].abs(),
        );

        Self {
            min: new_centre - new_half,
            max: new_centre + new_half,
        }
    }
}
