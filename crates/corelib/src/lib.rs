//! Core types: math re-exports, camera path, path clock, camera.

pub use glam::{Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod clock;
pub mod path;
pub mod transform;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_placement_is_identity_matrix() {
        let p = transform::Placement::identity();
        assert_eq!(p.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translate_then_scale_matrix() {
        let p = transform::Placement::at(vec3(1.0, 2.0, 3.0)).with_scale(0.2);
        // Last column = translation, diagonal = scale (zero yaw).
        let m = p.matrix().to_cols_array();
        assert!((m[12] - 1.0).abs() < 1e-6);
        assert!((m[13] - 2.0).abs() < 1e-6);
        assert!((m[14] - 3.0).abs() < 1e-6);
        assert!((m[0] - 0.2).abs() < 1e-6);
        assert!((m[5] - 0.2).abs() < 1e-6);
        assert!((m[10] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn yaw_turns_forward_axis() {
        let p = transform::Placement::identity().with_yaw(90f32.to_radians());
        let x = p.matrix().transform_vector3(Vec3::Z);
        assert!((x - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn path_camera_pv_is_finite() {
        let pts = path::ControlPoints::new(vec![
            vec3(0.0, 0.0, 4.0),
            vec3(1.0, 0.0, 3.0),
            vec3(2.0, 1.0, 2.0),
            vec3(3.0, 1.0, 1.0),
        ])
        .unwrap();
        let path = path::BezierPath::new(pts);
        let cam = camera::Camera::on_path(&path, 0.3, 16.0 / 9.0).unwrap();
        let a = cam.proj_view().to_cols_array();
        assert!(a.iter().all(|f| f.is_finite()));
    }
}
