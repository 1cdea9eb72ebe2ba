use glam::{Mat4, Vec2, Vec3};

use crate::uniforms::Uniforms;

const MAX_ELEVATION: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// A camera that orbits around a target point.
///
/// Produces the per-draw [`Uniforms`]: positions go to clip space, normals go
/// to camera space, which is where the face shading's light is defined.
///
/// # Example
/// ```
/// use vista::OrbitCamera;
///
/// let camera = OrbitCamera::new().distance(3.0);
/// let uniforms = camera.uniforms(16.0 / 9.0);
/// # let _ = uniforms;
/// ```
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Distance from target.
    pub distance: f32,
    /// Horizontal angle in radians (yaw).
    pub azimuth: f32,
    /// Vertical angle in radians (pitch), clamped short of the poles.
    pub elevation: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Radians per pixel of drag.
    pub sensitivity: f32,
    /// Distance per scroll line.
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 3.0,
            azimuth: 0.0,
            elevation: 0.0,
            fov: std::f32::consts::FRAC_PI_4,
            near: 0.01,
            far: 100.0,
            sensitivity: 0.005,
            zoom_sensitivity: 0.1,
            min_distance: 0.1,
            max_distance: 50.0,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self
    }

    pub fn azimuth(mut self, azimuth: f32) -> Self {
        self.azimuth = azimuth;
        self
    }

    pub fn elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation.clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self
    }

    /// Rotates by a mouse drag delta in pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * self.sensitivity;
        self.elevation =
            (self.elevation + delta.y * self.sensitivity).clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    /// Moves toward the target for positive `lines`, away for negative.
    ///
    /// Zoom is proportional to the current distance, so it feels the same at any scale.
    pub fn zoom(&mut self, lines: f32) {
        let factor = (1.0 - lines * self.zoom_sensitivity).max(0.1);
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        );
        self.target + offset
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Screen-right direction in world space.
    pub fn right(&self) -> Vec3 {
        self.view_matrix().row(0).truncate()
    }

    /// Screen-up direction in world space.
    pub fn up(&self) -> Vec3 {
        self.view_matrix().row(1).truncate()
    }

    /// Uniforms for drawing with this camera at the given aspect ratio.
    pub fn uniforms(&self, aspect: f32) -> Uniforms {
        let view = self.view_matrix();
        let transform = self.projection_matrix(aspect) * view;
        Uniforms::new(transform, view.inverse().transpose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::{ShaderVariant, transform_vertex};
    use crate::vertices::Vertex;
    use glam::Vec4;

    #[test]
    fn default_looks_down_negative_z() {
        let camera = OrbitCamera::new().distance(4.0);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), 1e-6));
        assert!(camera.right().abs_diff_eq(Vec3::X, 1e-6));
        assert!(camera.up().abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = OrbitCamera::new().target([1.0, 2.0, 3.0]).azimuth(0.7).elevation(0.3);
        let clip = camera.uniforms(1.5).transform() * Vec4::new(1.0, 2.0, 3.0, 1.0);

        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
        assert!(clip.w > 0.0);
    }

    #[test]
    fn normals_land_in_camera_space() {
        // Camera sits on +Z of the target, looking down -Z.
        let camera = OrbitCamera::new().target([1.0, 2.0, 3.0]);
        let uniforms = camera.uniforms(1.0);

        let facing = Vertex::new([1.0, 2.0, 3.0], [0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 1.0]);
        let record = transform_vertex(&uniforms, &facing, 0);
        assert_eq!(ShaderVariant::Model.shade(&record), Vec4::ONE);

        let sideways = Vertex::new([1.0, 2.0, 3.0], [1.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0]);
        let record = transform_vertex(&uniforms, &sideways, 0);
        let color = ShaderVariant::Model.shade(&record);
        assert!(color.abs_diff_eq(Vec4::new(0.0, 0.0, 0.0, 1.0), 1e-6), "{color}");
    }

    #[test]
    fn elevation_is_clamped() {
        let mut camera = OrbitCamera::new();
        camera.rotate(Vec2::new(0.0, 1.0e6));
        assert_eq!(camera.elevation, MAX_ELEVATION);

        camera.rotate(Vec2::new(0.0, -1.0e7));
        assert_eq!(camera.elevation, -MAX_ELEVATION);
    }

    #[test]
    fn zoom_stays_within_limits() {
        let mut camera = OrbitCamera::new();
        let start = camera.distance;

        camera.zoom(1.0);
        assert!(camera.distance < start);

        for _ in 0..1000 {
            camera.zoom(-5.0);
        }
        assert_eq!(camera.distance, camera.max_distance);

        for _ in 0..1000 {
            camera.zoom(5.0);
        }
        assert_eq!(camera.distance, camera.min_distance);
    }
}
