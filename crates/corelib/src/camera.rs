use crate::{
    Mat4, Vec3,
    path::{BezierPath, PathError},
};

pub const DEFAULT_FOV_Y_DEG: f32 = 60.0;
pub const DEFAULT_Z_NEAR: f32 = 0.1;
pub const DEFAULT_Z_FAR: f32 = 2000.0;

/// Projection settings, independent of where the camera is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lens {
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Width / height of the drawing surface.
    pub aspect: f32,
}

impl Lens {
    pub fn with_aspect(aspect: f32) -> Self {
        Self {
            fov_y_rad: DEFAULT_FOV_Y_DEG.to_radians(),
            z_near: DEFAULT_Z_NEAR,
            z_far: DEFAULT_Z_FAR,
            aspect,
        }
    }

    /// OpenGL-style projection (z in [-1, 1]).
    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_rad, self.aspect.max(1e-6), self.z_near, self.z_far)
    }
}

/// Right-handed look-at camera, +Y up.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub lens: Lens,
}

impl Camera {
    pub fn looking_at(eye: Vec3, target: Vec3, lens: Lens) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            lens,
        }
    }

    /// Camera riding the path: eye on the curve, looking at its tangent target.
    pub fn on_path(path: &BezierPath, t: f32, aspect: f32) -> Result<Self, PathError> {
        let (eye, target) = path.pose(t)?;
        Ok(Self::looking_at(eye, target, Lens::with_aspect(aspect)))
    }

    /// Move along the path, keeping the lens.
    pub fn follow(&mut self, path: &BezierPath, t: f32) -> Result<(), PathError> {
        (self.eye, self.target) = path.pose(t)?;
        Ok(())
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    #[inline]
    pub fn proj_view(&self) -> Mat4 {
        self.lens.proj() * self.view()
    }

    /// Unit look direction; zero when eye and target coincide.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    /// Surface resized.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.lens.aspect = width.max(1) as f32 / height.max(1) as f32;
    }
}
