use crate::{Mat4, Quat, Vec3};

/// World placement of a model: yaw about +Y, uniform scale, translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub translation: Vec3,
    /// Radians.
    pub yaw: f32,
    pub scale: f32,
}

impl Placement {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            yaw: 0.0,
            scale: 1.0,
        }
    }

    #[inline]
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    #[inline]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    #[inline]
    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    /// World matrix = T * R * S.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.yaw),
            self.translation,
        )
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::identity()
    }
}
