use crate::geometry::{Aabb, FloatType, Ray, RAY_MISS};

/// One of the six faces of an axis-aligned box.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Face {
    XMin,
    XPlus,
    YMin,
    YPlus,
    ZMin,
    ZPlus,
}

impl Face {
    pub const COUNT: usize = 6;

    pub const ALL: [Face; Face::COUNT] = [
        Face::XMin,
        Face::XPlus,
        Face::YMin,
        Face::YPlus,
        Face::ZMin,
        Face::ZPlus,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The axis this face is orthogonal to.
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    /// The two in-plane axes of this face, used to address the
    /// ray-coherence cache grids.
    pub fn tangent_axes(self) -> [usize; 2] {
        const TANGENTS: [[usize; 2]; 3] = [[1, 2], [0, 2], [0, 1]];
        TANGENTS[self.axis()]
    }

    fn from_axis(axis: usize, max_side: bool) -> Face {
        const FACES: [[Face; 2]; 3] = [
            [Face::XMin, Face::XPlus],
            [Face::YMin, Face::YPlus],
            [Face::ZMin, Face::ZPlus],
        ];
        FACES[axis][max_side as usize]
    }
}

impl Aabb {
    /// Slab-method ray intersection. Returns the entry distance along the
    /// ray, which is negative when the origin is inside the box.
    ///
    /// Uses the precomputed reciprocal direction; axis-parallel rays yield
    /// infinite slab distances and NaNs from `0 * inf` are dropped by the
    /// NaN-ignoring `f32::min`/`f32::max`.
    pub fn ray_cast(&self, ray: &Ray) -> Option<FloatType> {
        let mut tmin = -RAY_MISS;
        let mut tmax = RAY_MISS;

        for axis in 0..3 {
            let t1 = (self.min[axis] - ray.origin[axis]) * ray.inv_direction[axis];
            let t2 = (self.max[axis] - ray.origin[axis]) * ray.inv_direction[axis];

            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        if tmax < tmin {
            None
        } else {
            Some(tmin)
        }
    }

    /// Like [`Aabb::ray_cast`], additionally reporting which face produced
    /// the tightest entry bound. The min-vs-max face on the deciding axis is
    /// resolved by which slab boundary was responsible for the entry.
    pub fn ray_cast_face(&self, ray: &Ray) -> Option<(FloatType, Face)> {
        let mut face = None;
        let mut tmin = -RAY_MISS;
        let mut tmax = RAY_MISS;

        for axis in 0..3 {
            let t1 = (self.min[axis] - ray.origin[axis]) * ray.inv_direction[axis];
            let t2 = (self.max[axis] - ray.origin[axis]) * ray.inv_direction[axis];

            if t1.min(t2) > tmin {
                face = Some(Face::from_axis(axis, t2 < t1));
            }

            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        if tmax < tmin {
            None
        } else {
            face.map(|face| (tmin, face))
        }
    }
}
