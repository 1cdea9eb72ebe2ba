//! The per-draw uniform block shared by every invocation of the pipeline.
//!
//! # Memory Layout
//!
//! | Field               | Type          | Offset | Size |
//! |---------------------|---------------|--------|------|
//! | `transform`         | 4×4 f32, cols | 0      | 64   |
//! | `transform_normals` | 4×4 f32, cols | 64     | 64   |
//!
//! The block is bound at group 0, binding 0 and is read by the vertex stage only.

use glam::Mat4;

/// Transform matrices for one draw call.
///
/// Both matrices are stored column-major, which is what `glam` and WGSL use,
/// so the struct can be uploaded with [`bytemuck::cast_slice`] unchanged.
///
/// # Example
///
/// ```
/// use vista::Uniforms;
/// use glam::Mat4;
///
/// let uniforms = Uniforms::from_transform(Mat4::from_scale(glam::Vec3::splat(2.0)));
/// assert_eq!(uniforms.transform(), Mat4::from_scale(glam::Vec3::splat(2.0)));
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    /// Maps positions into clip space.
    pub transform: [[f32; 4]; 4],
    /// Maps normals into the space the shading variants light in.
    pub transform_normals: [[f32; 4]; 4],
}

impl Uniforms {
    /// Size of the block in bytes, as the bind group layout expects it.
    pub const SIZE: u64 = std::mem::size_of::<Uniforms>() as u64;

    /// Identity transforms for both positions and normals.
    pub fn identity() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }

    /// Builds the block from two explicit matrices.
    ///
    /// `transform_normals` is taken as given; it is the caller's job to supply
    /// the inverse-transpose (or whatever maps normals correctly).
    pub fn new(transform: Mat4, transform_normals: Mat4) -> Self {
        Self {
            transform: transform.to_cols_array_2d(),
            transform_normals: transform_normals.to_cols_array_2d(),
        }
    }

    /// Builds the block from a single transform, deriving the normal matrix
    /// as its inverse-transpose.
    pub fn from_transform(transform: Mat4) -> Self {
        Self::new(transform, transform.inverse().transpose())
    }

    pub fn transform(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transform)
    }

    pub fn transform_normals(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transform_normals)
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn layout_matches_binding() {
        assert_eq!(Uniforms::SIZE, 128);
        assert_eq!(std::mem::offset_of!(Uniforms, transform), 0);
        assert_eq!(std::mem::offset_of!(Uniforms, transform_normals), 64);
    }

    #[test]
    fn matrices_are_column_major() {
        let translation = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let uniforms = Uniforms::new(translation, Mat4::IDENTITY);

        // Translation lives in the fourth column.
        assert_eq!(uniforms.transform[3], [1.0, 2.0, 3.0, 1.0]);

        let bytes: &[u8] = bytemuck::bytes_of(&uniforms);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(&floats[12..16], &[1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn from_transform_uses_inverse_transpose() {
        let scale = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniforms = Uniforms::from_transform(scale);

        let normal = uniforms.transform_normals() * Vec4::new(1.0, 0.0, 0.0, 0.0);
        assert!((normal.x - 0.5).abs() < 1e-6);
        assert_eq!(uniforms.transform(), scale);
    }

    #[test]
    fn default_is_identity() {
        let uniforms = Uniforms::default();
        assert_eq!(uniforms.transform(), Mat4::IDENTITY);
        assert_eq!(uniforms.transform_normals(), Mat4::IDENTITY);
    }
}
