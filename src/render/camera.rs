//! Camera
//!
//! View and projection matrices plus the cached view-projection product the
//! renderers and the frustum filter consume. The camera itself is plain
//! data; a camera system keeps it in sync with its entity's transform.

use glam::{Mat4, Vec3};

/// Projection kind and parameters.
#[derive(Clone, Copy, Debug)]
pub enum Projection {
    Perspective {
        /// Vertical field of view, radians.
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

/// A view point into the scene.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    projection: Projection,
    projection_matrix: Mat4,
    view_matrix: Mat4,
    view_projection: Mat4,
    position: Vec3,
}

impl Camera {
    /// Perspective camera at the origin looking down -Z.
    #[must_use]
    pub fn new_perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let projection = Projection::Perspective {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        };
        let mut camera = Self {
            projection,
            projection_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
        };
        camera.rebuild_projection();
        camera.rebuild_view_projection();
        camera
    }

    /// Orthographic camera at the origin looking down -Z.
    #[must_use]
    pub fn new_orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let projection = Projection::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            far,
        };
        let mut camera = Self {
            projection,
            projection_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
        };
        camera.rebuild_projection();
        camera.rebuild_view_projection();
        camera
    }

    fn rebuild_projection(&mut self) {
        self.projection_matrix = match self.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        };
    }

    fn rebuild_view_projection(&mut self) {
        self.view_projection = self.projection_matrix * self.view_matrix;
    }

    /// Re-derives the view from the camera's world transform (the inverse
    /// of the world matrix).
    pub fn update_view(&mut self, world: Mat4) {
        self.view_matrix = world.inverse();
        self.position = world.w_axis.truncate();
        self.rebuild_view_projection();
    }

    /// Points the camera at `target` from `eye`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.view_matrix = Mat4::look_at_rh(eye, target, up);
        self.position = eye;
        self.rebuild_view_projection();
    }

    /// Replaces the projection parameters.
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.rebuild_projection();
        self.rebuild_view_projection();
    }

    /// Updates the aspect ratio of a perspective camera; no-op for
    /// orthographic ones.
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective {
            fov_y, near, far, ..
        } = self.projection
        {
            self.projection = Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            };
            self.rebuild_projection();
            self.rebuild_view_projection();
        }
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }
}
