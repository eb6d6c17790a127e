use glam::{Affine3A, Mat4, Vec3};

/// Perspective camera component.
///
/// The view matrix follows the owning node's world matrix; it is refreshed by
/// the transform system whenever that node moves.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view, radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// `fov_degrees` is the vertical field of view.
    #[must_use]
    pub fn new_perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,

            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };

        cam.update_projection_matrix();
        cam
    }

    pub fn update_projection_matrix(&mut self) {
        // glam's perspective_rh maps depth to [0, 1] as wgpu expects
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Updates the aspect ratio from a viewport size and recomputes the
    /// projection. Zero-height viewports (minimized windows) are ignored.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection_matrix();
    }

    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world_matrix.translation.into()
    }
}
