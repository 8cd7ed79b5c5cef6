use glam::{Mat4, Vec2, Vec3, Vec4};

use super::picking::Ray;

/// Camera collaborator: turns normalized device coordinates into world rays
/// and projects world points back.
pub trait CameraRays {
    /// Ray from the camera through `ndc` (both axes in [-1, 1])
    fn ray_from_ndc(&self, ndc: Vec2) -> Ray;

    /// Project a world point to NDC. None when it lies behind the camera.
    fn project(&self, point: Vec3) -> Option<Vec3>;
}

/// Bounding rectangle of the viewing element, in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewRect {
    pub width: f32,
    pub height: f32,
}

impl ViewRect {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Element-relative pixel position → NDC
    pub fn to_ndc(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(
            (pixel.x / self.width) * 2.0 - 1.0,
            -(pixel.y / self.height) * 2.0 + 1.0,
        )
    }

    /// NDC → element-relative pixel position
    pub fn to_pixel(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

/// Arc-ball camera looking at a target point
#[derive(Clone, Debug)]
pub struct ArcBallCamera {
    /// Horizontal rotation angle (radians)
    pub yaw: f32,
    /// Vertical rotation angle (radians)
    pub pitch: f32,
    /// Distance from target
    pub distance: f32,
    /// Camera target point
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov: f32,
    /// Width / height of the viewing element
    pub aspect: f32,
}

impl ArcBallCamera {
    pub fn new(aspect: f32) -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.4,
            distance: 6.0,
            target: Vec3::ZERO,
            fov: 45.0_f32.to_radians(),
            aspect,
        }
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx.to_radians();
        self.pitch = (self.pitch + dy.to_radians()).clamp(-1.5, 1.5);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance * (1.0 - delta)).clamp(0.5, 100.0);
    }

    /// Camera position in world space
    pub fn eye_position(&self) -> Vec3 {
        let cy = self.yaw.cos();
        let sy = self.yaw.sin();
        let cp = self.pitch.cos();
        let sp = self.pitch.sin();

        self.target
            + Vec3::new(
                self.distance * cp * sy,
                self.distance * sp,
                self.distance * cp * cy,
            )
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    /// Projection matrix (camera -> clip)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, self.aspect, 0.1, 200.0)
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl CameraRays for ArcBallCamera {
    fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let vp_inv = self.view_projection().inverse();

        // Unproject near and far points
        let near_world = vp_inv * Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
        let far_world = vp_inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);

        let near = near_world.truncate() / near_world.w;
        let far = far_world.truncate() / far_world.w;

        Ray {
            origin: self.eye_position(),
            direction: (far - near).normalize_or_zero(),
        }
    }

    fn project(&self, point: Vec3) -> Option<Vec3> {
        let p = self.view_projection() * point.extend(1.0);
        if p.w <= 0.0 {
            return None;
        }
        Some(p.truncate() / p.w)
    }
}
