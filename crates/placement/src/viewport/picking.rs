use glam::{Mat4, Vec3};

/// Rays closer to parallel with a plane than this never hit it.
pub const PARALLEL_EPSILON: f32 = 1e-4;

/// A ray in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at distance `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box containing nothing; growing it by any point yields that point.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of the given size centred on `center`
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// True for empty, inverted or non-finite boxes
    pub fn is_degenerate(&self) -> bool {
        !(self.min.is_finite() && self.max.is_finite())
            || self.min.x > self.max.x
            || self.min.y > self.max.y
            || self.min.z > self.max.z
    }

    pub fn expand_to(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// The eight corners, min corner first
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Axis-aligned box around this box after `matrix` is applied
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        if self.is_degenerate() {
            return Aabb::EMPTY;
        }
        let mut out = Aabb::EMPTY;
        for corner in self.corners() {
            out.expand_to(matrix.transform_point3(corner));
        }
        out
    }

    /// Midpoints of the four vertical sides at the box's vertical centre,
    /// in front (+Z), back (-Z), right (+X), left (-X) order.
    pub fn side_midpoints(&self) -> [Vec3; 4] {
        let c = self.center();
        [
            Vec3::new(c.x, c.y, self.max.z),
            Vec3::new(c.x, c.y, self.min.z),
            Vec3::new(self.max.x, c.y, c.z),
            Vec3::new(self.min.x, c.y, c.z),
        ]
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    if aabb.is_degenerate() {
        return None;
    }

    let inv_dir = Vec3::new(
        1.0 / ray.direction.x,
        1.0 / ray.direction.y,
        1.0 / ray.direction.z,
    );

    let t1 = (aabb.min.x - ray.origin.x) * inv_dir.x;
    let t2 = (aabb.max.x - ray.origin.x) * inv_dir.x;
    let t3 = (aabb.min.y - ray.origin.y) * inv_dir.y;
    let t4 = (aabb.max.y - ray.origin.y) * inv_dir.y;
    let t5 = (aabb.min.z - ray.origin.z) * inv_dir.z;
    let t6 = (aabb.max.z - ray.origin.z) * inv_dir.z;

    let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Intersect a ray with the horizontal plane `y = plane_y`.
///
/// Returns None when the ray is (nearly) parallel to the plane or the plane
/// lies behind the ray origin.
pub fn ray_plane_y(ray: &Ray, plane_y: f32) -> Option<Vec3> {
    if ray.direction.y.abs() <= PARALLEL_EPSILON {
        return None;
    }

    let t = (plane_y - ray.origin.y) / ray.direction.y;
    if t <= 0.0 {
        return None;
    }

    let mut hit = ray.at(t);
    // pin exactly onto the plane
    hit.y = plane_y;
    Some(hit)
}
